//! Type definitions shared by the layout engine and the workbook writers

use std::fmt;

/// Handle to a deduplicated cell format inside a [`crate::workbook::Workbook`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StyleHandle(pub u32);

impl StyleHandle {
    /// The workbook's default (General, no borders) format
    pub const DEFAULT: StyleHandle = StyleHandle(0);

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Handle to a deduplicated font inside a [`crate::workbook::Workbook`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FontHandle(pub u32);

impl FontHandle {
    /// The workbook's default font
    pub const DEFAULT: FontHandle = FontHandle(0);

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// 24-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Squared euclidean distance, used for nearest palette matches
    pub fn distance(&self, other: &Rgb) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }

    /// `FFRRGGBB` as used by SpreadsheetML
    pub fn to_argb_hex(&self) -> String {
        format!("FF{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A colour as understood by the output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorRef {
    /// Index into the workbook palette (8..=63 in BIFF8)
    Indexed(u16),
    /// True colour
    Rgb(Rgb),
}

/// Horizontal alignment of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlign {
    #[default]
    General,
    Left,
    Center,
    Right,
    Justify,
}

impl HorizontalAlign {
    /// Merge two fragment alignments: left beats center beats right
    pub fn negotiate(self, other: HorizontalAlign) -> HorizontalAlign {
        use HorizontalAlign::*;
        match (self, other) {
            (Left, _) | (_, Left) => Left,
            (Center, _) | (_, Center) => Center,
            (Right, _) | (_, Right) => Right,
            (Justify, _) | (_, Justify) => Justify,
            _ => General,
        }
    }
}

/// Vertical alignment of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VerticalAlign {
    Top,
    Center,
    #[default]
    Bottom,
}

/// Line style of one border side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderStyle {
    #[default]
    None,
    Thin,
    Medium,
    Thick,
    Dashed,
    MediumDashed,
    Dotted,
    Double,
    Hair,
}

impl BorderStyle {
    /// SpreadsheetML attribute value
    pub fn as_xlsx(&self) -> &'static str {
        match self {
            BorderStyle::None => "none",
            BorderStyle::Thin => "thin",
            BorderStyle::Medium => "medium",
            BorderStyle::Thick => "thick",
            BorderStyle::Dashed => "dashed",
            BorderStyle::MediumDashed => "mediumDashed",
            BorderStyle::Dotted => "dotted",
            BorderStyle::Double => "double",
            BorderStyle::Hair => "hair",
        }
    }

    /// BIFF8 line style code
    pub fn as_biff(&self) -> u8 {
        match self {
            BorderStyle::None => 0x00,
            BorderStyle::Thin => 0x01,
            BorderStyle::Medium => 0x02,
            BorderStyle::Dashed => 0x03,
            BorderStyle::Dotted => 0x04,
            BorderStyle::Thick => 0x05,
            BorderStyle::Double => 0x06,
            BorderStyle::Hair => 0x07,
            BorderStyle::MediumDashed => 0x08,
        }
    }
}

/// One font change inside a rich string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RichRun {
    /// Character offset where the font starts
    pub offset: usize,
    pub font: FontHandle,
}

/// A string with per-range fonts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RichText {
    pub text: String,
    pub runs: Vec<RichRun>,
}

/// Represents a single cell value in a sheet
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty (styled blank) cell
    Empty,
    /// Numeric value
    Number(f64),
    /// Boolean value
    Bool(bool),
    /// Plain string value
    String(String),
    /// String with font runs
    RichString(RichText),
    /// Date/time as a spreadsheet serial number
    DateTime(f64),
    /// Formula text without the leading '='
    Formula(String),
}

impl CellValue {
    /// Convert cell value to display string
    pub fn as_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(f) => f.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::String(s) => s.clone(),
            CellValue::RichString(r) => r.text.clone(),
            CellValue::DateTime(d) => d.to_string(),
            CellValue::Formula(f) => format!("={}", f),
        }
    }

    /// Check if cell is empty
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.is_empty(),
            CellValue::RichString(r) => r.text.is_empty(),
            _ => false,
        }
    }

    /// Try to convert to float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(f) | CellValue::DateTime(f) => Some(*f),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Whether the value is stored as text
    pub fn is_text(&self) -> bool {
        matches!(self, CellValue::String(_) | CellValue::RichString(_))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Number(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// A grid position (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        CellRef { row, col }
    }

    /// Excel-style reference (e.g., "A1", "B2")
    pub fn reference(&self) -> String {
        format!("{}{}", col_to_letter(self.col), self.row + 1)
    }

    /// Absolute reference (e.g., "$A$1")
    pub fn absolute(&self) -> String {
        format!("${}${}", col_to_letter(self.col), self.row + 1)
    }
}

/// Inclusive rectangular range of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u32,
    pub last_col: u32,
}

impl CellRange {
    pub fn new(first_row: u32, first_col: u32, last_row: u32, last_col: u32) -> Self {
        CellRange {
            first_row,
            last_row,
            first_col,
            last_col,
        }
    }

    pub fn single(row: u32, col: u32) -> Self {
        CellRange::new(row, col, row, col)
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.first_row && row <= self.last_row && col >= self.first_col && col <= self.last_col
    }

    pub fn is_single(&self) -> bool {
        self.first_row == self.last_row && self.first_col == self.last_col
    }

    pub fn width(&self) -> u32 {
        self.last_col - self.first_col + 1
    }

    pub fn height(&self) -> u32 {
        self.last_row - self.first_row + 1
    }

    /// "A1:B2", or "A1" for a single cell
    pub fn reference(&self) -> String {
        let first = CellRef::new(self.first_row, self.first_col).reference();
        if self.is_single() {
            first
        } else {
            format!(
                "{}:{}",
                first,
                CellRef::new(self.last_row, self.last_col).reference()
            )
        }
    }

    /// "$A$1:$B$2"
    pub fn absolute(&self) -> String {
        format!(
            "{}:{}",
            CellRef::new(self.first_row, self.first_col).absolute(),
            CellRef::new(self.last_row, self.last_col).absolute()
        )
    }
}

/// Convert column index to Excel letter (0 -> A, 25 -> Z, 26 -> AA)
pub fn col_to_letter(col: u32) -> String {
    let mut result = String::new();
    let mut col = col + 1;

    while col > 0 {
        col -= 1;
        result.insert(0, (b'A' + (col % 26) as u8) as char);
        col /= 26;
    }

    result
}
