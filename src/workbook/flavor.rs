//! Output format capabilities

use super::xls::XlsFlavor;
use super::xlsx::XlsxFlavor;
use super::Workbook;
use crate::config::OutputFormat;
use crate::error::Result;
use crate::types::{ColorRef, Rgb};
use std::io::Write;

/// What an output format can hold and how it writes itself
///
/// The workbook model is format-agnostic; it asks its flavor for limits,
/// maps colours through it and finally hands itself to [`SpreadsheetFlavor::write`].
pub trait SpreadsheetFlavor: Send {
    fn format(&self) -> OutputFormat;

    /// Number of addressable rows
    fn max_rows(&self) -> u32;

    /// Number of addressable columns
    fn max_columns(&self) -> u32;

    /// Ceiling on distinct cell formats
    fn max_cell_styles(&self) -> usize;

    /// Ceiling on distinct fonts
    fn max_fonts(&self) -> usize;

    fn default_font_name(&self) -> &str;

    fn default_font_size(&self) -> f64;

    fn default_row_height_points(&self) -> f64;

    /// Map a colour onto the format's colour model
    fn resolve_color(&mut self, rgb: Rgb) -> ColorRef;

    /// The palette in effect, when the format uses one
    fn palette(&self) -> Option<&[Rgb]>;

    /// Serialize the whole workbook
    fn write(&self, workbook: &Workbook, out: &mut dyn Write) -> Result<()>;
}

/// Create the flavor for an output format
pub fn flavor_for(format: OutputFormat) -> Box<dyn SpreadsheetFlavor> {
    match format {
        OutputFormat::Xlsx => Box::new(XlsxFlavor::new()),
        OutputFormat::Xls => Box::new(XlsFlavor::new()),
    }
}
