//! In-memory workbook model
//!
//! The layout engine writes into this model; a [`SpreadsheetFlavor`] chosen at
//! creation time supplies the capability limits and colour model and finally
//! serializes it.

pub mod flavor;
pub mod shared_strings;
pub mod sheet;
pub mod xls;
pub mod xlsx;

pub use flavor::{flavor_for, SpreadsheetFlavor};
pub use sheet::{
    AnchorPoint, CellData, Hyperlink, ImageAnchor, ImageFormat, PageMargins, Picture, RowData,
    Sheet, SheetLimits, SheetSettings,
};

use crate::error::{EmitterError, Result};
use crate::types::{
    BorderStyle, CellRange, ColorRef, FontHandle, HorizontalAlign, Rgb, StyleHandle, VerticalAlign,
};
use std::io::Write;

/// A font as stored in the workbook
#[derive(Debug, Clone, PartialEq)]
pub struct FontDef {
    pub name: String,
    pub size_points: f64,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<ColorRef>,
}

/// One resolved border side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BorderDef {
    pub style: BorderStyle,
    pub color: Option<ColorRef>,
}

/// A cell format (an XF in both formats)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellFormat {
    pub font: FontHandle,
    pub number_format: u16,
    pub horizontal: HorizontalAlign,
    pub vertical: VerticalAlign,
    pub wrap: bool,
    /// Degrees, -90..=90
    pub rotation: i16,
    pub fill: Option<ColorRef>,
    pub top: BorderDef,
    pub right: BorderDef,
    pub bottom: BorderDef,
    pub left: BorderDef,
}

/// A custom number format code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    pub id: u16,
    pub code: String,
}

/// First id available to custom number formats
pub const FIRST_CUSTOM_FORMAT_ID: u16 = 164;

/// Built-in format codes shared by both formats
const BUILTIN_FORMATS: &[(u16, &str)] = &[
    (0, "General"),
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00E+00"),
    (14, "m/d/yy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm AM/PM"),
    (19, "h:mm:ss AM/PM"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yy h:mm"),
    (45, "mm:ss"),
    (49, "@"),
];

/// A merged region of cells
pub type MergedRange = CellRange;

/// Workbook-scoped defined name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRange {
    pub name: String,
    pub sheet: usize,
    pub range: CellRange,
}

/// The whole document
pub struct Workbook {
    flavor: Box<dyn SpreadsheetFlavor>,
    sheets: Vec<Sheet>,
    fonts: Vec<FontDef>,
    formats: Vec<CellFormat>,
    number_formats: Vec<NumberFormat>,
    defined_names: Vec<NamedRange>,
    title: Option<String>,
}

impl std::fmt::Debug for Workbook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbook")
            .field("format", &self.flavor.format())
            .field("sheets", &self.sheets.len())
            .field("fonts", &self.fonts.len())
            .field("formats", &self.formats.len())
            .finish()
    }
}

impl Workbook {
    /// Create an empty workbook with the flavor's default font and format
    pub fn new(flavor: Box<dyn SpreadsheetFlavor>) -> Self {
        let default_font = FontDef {
            name: flavor.default_font_name().to_string(),
            size_points: flavor.default_font_size(),
            bold: false,
            italic: false,
            color: None,
        };
        Workbook {
            flavor,
            sheets: Vec::new(),
            fonts: vec![default_font],
            formats: vec![CellFormat::default()],
            number_formats: Vec::new(),
            defined_names: Vec::new(),
            title: None,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn flavor(&self) -> &dyn SpreadsheetFlavor {
        self.flavor.as_ref()
    }

    /// Map a colour onto the output format's colour model
    pub fn resolve_color(&mut self, rgb: Rgb) -> ColorRef {
        self.flavor.resolve_color(rgb)
    }

    pub fn add_font(&mut self, font: FontDef) -> Result<FontHandle> {
        let limit = self.flavor.max_fonts();
        if self.fonts.len() >= limit {
            return Err(EmitterError::FontLimitExceeded { limit });
        }
        self.fonts.push(font);
        Ok(FontHandle((self.fonts.len() - 1) as u32))
    }

    pub fn fonts(&self) -> &[FontDef] {
        &self.fonts
    }

    pub fn font(&self, handle: FontHandle) -> Option<&FontDef> {
        self.fonts.get(handle.index())
    }

    pub fn add_format(&mut self, format: CellFormat) -> Result<StyleHandle> {
        let limit = self.flavor.max_cell_styles();
        if self.formats.len() >= limit {
            return Err(EmitterError::StyleLimitExceeded { limit });
        }
        self.formats.push(format);
        Ok(StyleHandle((self.formats.len() - 1) as u32))
    }

    pub fn formats(&self) -> &[CellFormat] {
        &self.formats
    }

    pub fn format(&self, handle: StyleHandle) -> Option<&CellFormat> {
        self.formats.get(handle.index())
    }

    /// Id for a format code, registering a custom format when needed
    pub fn number_format_id(&mut self, code: &str) -> u16 {
        let code = code.trim();
        if let Some((id, _)) = BUILTIN_FORMATS
            .iter()
            .find(|(_, builtin)| builtin.eq_ignore_ascii_case(code))
        {
            return *id;
        }
        if let Some(existing) = self.number_formats.iter().find(|f| f.code == code) {
            return existing.id;
        }
        let id = FIRST_CUSTOM_FORMAT_ID + self.number_formats.len() as u16;
        self.number_formats.push(NumberFormat {
            id,
            code: code.to_string(),
        });
        id
    }

    pub fn number_formats(&self) -> &[NumberFormat] {
        &self.number_formats
    }

    /// Format code for an id, builtin or custom
    pub fn number_format_code(&self, id: u16) -> Option<&str> {
        BUILTIN_FORMATS
            .iter()
            .find(|(builtin, _)| *builtin == id)
            .map(|(_, code)| *code)
            .or_else(|| {
                self.number_formats
                    .iter()
                    .find(|f| f.id == id)
                    .map(|f| f.code.as_str())
            })
    }

    /// Append a sheet and return its index
    pub fn add_sheet(&mut self, name: Option<String>) -> usize {
        let limits = SheetLimits {
            max_rows: self.flavor.max_rows(),
            max_columns: self.flavor.max_columns(),
        };
        let sheet = Sheet::new(name, limits, self.flavor.default_row_height_points());
        self.sheets.push(sheet);
        self.sheets.len() - 1
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name() == Some(name))
    }

    pub fn add_defined_name(&mut self, name: NamedRange) {
        if self
            .defined_names
            .iter()
            .any(|existing| existing.name.eq_ignore_ascii_case(&name.name))
        {
            log::warn!("Duplicate defined name '{}' ignored", name.name);
            return;
        }
        self.defined_names.push(name);
    }

    pub fn defined_names(&self) -> &[NamedRange] {
        &self.defined_names
    }

    /// Give every sheet a unique, valid name
    pub fn finalize_sheet_names(&mut self) {
        let mut used: Vec<String> = Vec::new();
        for (index, sheet) in self.sheets.iter_mut().enumerate() {
            let base = sheet
                .name()
                .map(sanitize_sheet_name)
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("Sheet{}", index + 1));
            let mut candidate = base.clone();
            let mut counter = 2;
            while used.iter().any(|u| u.eq_ignore_ascii_case(&candidate)) {
                let suffix = format!(" ({})", counter);
                let keep = 31usize.saturating_sub(suffix.chars().count());
                candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
                counter += 1;
            }
            sheet.set_name(candidate.clone());
            used.push(candidate);
        }
    }

    /// Serialize with the workbook's flavor
    pub fn write<W: Write>(&self, mut out: W) -> Result<()> {
        self.flavor.write(self, &mut out)?;
        out.flush()?;
        Ok(())
    }
}

/// Text rotation as stored by both formats: 0..=90 counter-clockwise, 91..=180 clockwise
pub fn rotation_code(degrees: i16) -> u8 {
    let degrees = degrees.clamp(-90, 90);
    if degrees >= 0 {
        degrees as u8
    } else {
        (90 - degrees) as u8
    }
}

/// Quote a sheet name for use in a formula or defined name
pub fn quote_sheet_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// Replace characters sheet names may not contain and cap the length at 31
pub fn sanitize_sheet_name(name: &str) -> String {
    const ILLEGAL: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if ILLEGAL.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches('\'');
    if cleaned.chars().count() > 31 {
        log::warn!("Sheet name '{}' truncated to 31 characters", cleaned);
    }
    cleaned.chars().take(31).collect()
}

/// Make a bookmark usable as a defined name
pub fn sanitize_defined_name(name: &str) -> Option<String> {
    let mut out: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '.' { c } else { '_' })
        .collect();
    if out.is_empty() {
        return None;
    }
    if out.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        out.insert(0, '_');
    }
    // names that look like cell references are rejected by spreadsheet readers
    let letters = out.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    let rest = &out[letters..];
    if letters > 0 && letters <= 3 && !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    Some(out.chars().take(255).collect())
}
