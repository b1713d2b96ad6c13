//! Sheet grid: rows, cells, merges, pictures and print settings

use crate::error::{EmitterError, Result};
use crate::types::{CellRange, CellRef, CellValue, StyleHandle};
use crate::units;
use std::collections::BTreeMap;

/// Addressable grid size of the output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLimits {
    pub max_rows: u32,
    pub max_columns: u32,
}

impl SheetLimits {
    pub fn check(&self, row: u32, col: u32) -> Result<()> {
        if row >= self.max_rows {
            return Err(EmitterError::RowOutOfRange {
                row,
                limit: self.max_rows,
            });
        }
        if col >= self.max_columns {
            return Err(EmitterError::ColumnOutOfRange {
                col,
                limit: self.max_columns,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellData {
    pub value: CellValue,
    pub style: StyleHandle,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowData {
    /// Explicit height in points
    pub height: Option<f64>,
    pub outline_level: u8,
    pub cells: BTreeMap<u32, CellData>,
}

impl RowData {
    pub fn first_col(&self) -> Option<u32> {
        self.cells.keys().next().copied()
    }

    pub fn last_col(&self) -> Option<u32> {
        self.cells.keys().next_back().copied()
    }
}

/// Embedded picture data format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn from_mime(mime: &str) -> Option<ImageFormat> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageFormat::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }
}

/// A cell corner plus a pixel offset into that cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnchorPoint {
    pub col: u32,
    pub col_offset_px: u32,
    pub row: u32,
    pub row_offset_px: u32,
}

/// Two-cell picture anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageAnchor {
    pub from: AnchorPoint,
    pub to: AnchorPoint,
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub anchor: ImageAnchor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperlink {
    pub range: CellRange,
    pub url: String,
}

/// Page margins in inches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMargins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for PageMargins {
    fn default() -> Self {
        PageMargins {
            top: 0.75,
            right: 0.7,
            bottom: 0.75,
            left: 0.7,
        }
    }
}

/// Display and print settings of a sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetSettings {
    pub display_gridlines: Option<bool>,
    pub display_row_col_headings: Option<bool>,
    pub display_zeros: Option<bool>,
    pub display_formulas: Option<bool>,
    pub paper_size: Option<u16>,
    pub landscape: bool,
    pub margins: Option<PageMargins>,
    pub scale: Option<u16>,
    pub fit_to_width: Option<u16>,
    pub fit_to_height: Option<u16>,
    /// Print header in `&L..&C..&R..` form
    pub header: Option<String>,
    pub footer: Option<String>,
    /// First unfrozen cell
    pub freeze: Option<CellRef>,
}

impl SheetSettings {
    pub fn fit_to_page(&self) -> bool {
        self.fit_to_width.is_some() || self.fit_to_height.is_some()
    }
}

/// One worksheet
#[derive(Debug, Clone)]
pub struct Sheet {
    name: Option<String>,
    limits: SheetLimits,
    default_row_height: f64,
    rows: BTreeMap<u32, RowData>,
    column_widths: BTreeMap<u32, u32>,
    merges: Vec<CellRange>,
    pictures: Vec<Picture>,
    hyperlinks: Vec<Hyperlink>,
    pub settings: SheetSettings,
}

impl Sheet {
    pub fn new(name: Option<String>, limits: SheetLimits, default_row_height: f64) -> Self {
        Sheet {
            name,
            limits,
            default_row_height,
            rows: BTreeMap::new(),
            column_widths: BTreeMap::new(),
            merges: Vec::new(),
            pictures: Vec::new(),
            hyperlinks: Vec::new(),
            settings: SheetSettings::default(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn limits(&self) -> SheetLimits {
        self.limits
    }

    /// Write a value, replacing whatever the cell held
    pub fn set_cell(&mut self, row: u32, col: u32, value: CellValue, style: StyleHandle) -> Result<()> {
        self.limits.check(row, col)?;
        self.rows
            .entry(row)
            .or_default()
            .cells
            .insert(col, CellData { value, style });
        Ok(())
    }

    /// Restyle a cell, creating a styled blank when absent
    pub fn set_cell_style(&mut self, row: u32, col: u32, style: StyleHandle) -> Result<()> {
        self.limits.check(row, col)?;
        self.rows
            .entry(row)
            .or_default()
            .cells
            .entry(col)
            .and_modify(|cell| cell.style = style)
            .or_insert(CellData {
                value: CellValue::Empty,
                style,
            });
        Ok(())
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&CellData> {
        self.rows.get(&row).and_then(|r| r.cells.get(&col))
    }

    pub fn row(&self, row: u32) -> Option<&RowData> {
        self.rows.get(&row)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&u32, &RowData)> {
        self.rows.iter()
    }

    /// Make sure a row record exists
    pub fn ensure_row(&mut self, row: u32) -> Result<&mut RowData> {
        self.limits.check(row, 0)?;
        Ok(self.rows.entry(row).or_default())
    }

    pub fn remove_row(&mut self, row: u32) -> Option<RowData> {
        self.rows.remove(&row)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn set_row_height(&mut self, row: u32, points: f64) -> Result<()> {
        let points = points.min(units::MAX_ROW_HEIGHT_POINTS);
        self.ensure_row(row)?.height = Some(points);
        Ok(())
    }

    /// Effective row height in points
    pub fn row_height(&self, row: u32) -> f64 {
        self.rows
            .get(&row)
            .and_then(|r| r.height)
            .unwrap_or(self.default_row_height)
    }

    pub fn default_row_height(&self) -> f64 {
        self.default_row_height
    }

    pub fn set_outline_level(&mut self, row: u32, level: u8) -> Result<()> {
        self.ensure_row(row)?.outline_level = level.min(7);
        Ok(())
    }

    /// Set a column width in width units
    pub fn set_column_width(&mut self, col: u32, width_units: u32) -> Result<()> {
        self.limits.check(0, col)?;
        self.column_widths
            .insert(col, width_units.min(units::MAX_WIDTH_UNITS));
        Ok(())
    }

    pub fn has_column_width(&self, col: u32) -> bool {
        self.column_widths.contains_key(&col)
    }

    /// Effective column width in width units
    pub fn column_width(&self, col: u32) -> u32 {
        self.column_widths
            .get(&col)
            .copied()
            .unwrap_or(units::DEFAULT_COLUMN_WIDTH_UNITS)
    }

    pub fn column_widths(&self) -> &BTreeMap<u32, u32> {
        &self.column_widths
    }

    pub fn add_merge(&mut self, range: CellRange) -> Result<()> {
        self.limits.check(range.last_row, range.last_col)?;
        if range.is_single() {
            return Ok(());
        }
        if let Some(existing) = self.merges.iter().find(|m| overlaps(m, &range)) {
            log::warn!(
                "Merged region {} overlaps {} and is skipped",
                range.reference(),
                existing.reference()
            );
            return Ok(());
        }
        self.merges.push(range);
        Ok(())
    }

    pub fn merges(&self) -> &[CellRange] {
        &self.merges
    }

    /// The merged region whose anchor is at (row, col)
    pub fn merge_at(&self, row: u32, col: u32) -> Option<&CellRange> {
        self.merges
            .iter()
            .find(|m| m.first_row == row && m.first_col == col)
    }

    pub fn add_picture(&mut self, picture: Picture) -> Result<()> {
        self.limits
            .check(picture.anchor.to.row, picture.anchor.to.col)?;
        self.pictures.push(picture);
        Ok(())
    }

    pub fn pictures(&self) -> &[Picture] {
        &self.pictures
    }

    pub fn add_hyperlink(&mut self, range: CellRange, url: impl Into<String>) -> Result<()> {
        self.limits.check(range.last_row, range.last_col)?;
        self.hyperlinks.push(Hyperlink {
            range,
            url: url.into(),
        });
        Ok(())
    }

    pub fn hyperlinks(&self) -> &[Hyperlink] {
        &self.hyperlinks
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.pictures.is_empty()
    }

    /// Used range, covering cells and merges
    pub fn dimensions(&self) -> Option<CellRange> {
        let mut range: Option<CellRange> = None;
        let mut include = |r: u32, c: u32| {
            range = Some(match range {
                None => CellRange::single(r, c),
                Some(cur) => CellRange::new(
                    cur.first_row.min(r),
                    cur.first_col.min(c),
                    cur.last_row.max(r),
                    cur.last_col.max(c),
                ),
            });
        };
        for (row, data) in &self.rows {
            if let (Some(first), Some(last)) = (data.first_col(), data.last_col()) {
                include(*row, first);
                include(*row, last);
            }
        }
        for merge in &self.merges {
            include(merge.first_row, merge.first_col);
            include(merge.last_row, merge.last_col);
        }
        range
    }
}

fn overlaps(a: &CellRange, b: &CellRange) -> bool {
    a.first_row <= b.last_row
        && b.first_row <= a.last_row
        && a.first_col <= b.last_col
        && b.first_col <= a.last_col
}
