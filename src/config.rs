//! Emitter configuration
//!
//! Options come either from the builder or from the host's string-keyed option
//! map (see [`keys`]). Content nodes may override some of them through user
//! properties carrying the same keys.

use crate::error::{EmitterError, Result};
use crate::grid::image::ImageFetcher;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// User-property and option keys
pub mod keys {
    pub const DEBUG: &str = "ExcelEmitter.DEBUG";
    pub const FORMAT: &str = "ExcelEmitter.Format";
    pub const REMOVE_BLANK_ROWS: &str = "ExcelEmitter.RemoveBlankRows";
    pub const SINGLE_SHEET: &str = "ExcelEmitter.SingleSheet";
    pub const DISPLAY_FORMULAS: &str = "ExcelEmitter.DisplayFormulas";
    pub const DISPLAY_GRIDLINES: &str = "ExcelEmitter.DisplayGridlines";
    pub const DISPLAY_ROW_COL_HEADINGS: &str = "ExcelEmitter.DisplayRowColHeadings";
    pub const DISPLAY_ZEROS: &str = "ExcelEmitter.DisplayZeros";
    pub const FORCE_AUTO_COL_WIDTHS: &str = "ExcelEmitter.ForceAutoColWidths";
    pub const STRUCTURED_HEADER: &str = "ExcelEmitter.StructuredHeader";
    pub const IMAGES_SPAN_COLUMNS: &str = "ExcelEmitter.ImagesSpanColumns";
    pub const DISABLE_GROUPING: &str = "ExcelEmitter.DisableGrouping";
    pub const SHEET_NAME: &str = "ExcelEmitter.SheetName";
    pub const FORMULA: &str = "ExcelEmitter.Formula";
    pub const FREEZE_PANES: &str = "ExcelEmitter.FreezePanes";
    pub const PRINT_SCALE: &str = "ExcelEmitter.PrintScale";
    pub const PRINT_PAGES_WIDE: &str = "ExcelEmitter.PrintPagesWide";
    pub const PRINT_PAGES_HIGH: &str = "ExcelEmitter.PrintPagesHigh";
    pub const ROTATION: &str = "ExcelEmitter.Rotation";
    pub const COLUMN_WIDTH: &str = "ExcelEmitter.ColumnWidth";
}

/// Target spreadsheet format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub enum OutputFormat {
    /// Office Open XML, true colour
    #[default]
    Xlsx,
    /// BIFF8, indexed palette
    Xls,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Xls => "xls",
        }
    }

    pub fn parse(text: &str) -> Result<OutputFormat> {
        match text.trim().to_ascii_lowercase().as_str() {
            "xlsx" | "ooxml" => Ok(OutputFormat::Xlsx),
            "xls" | "biff" | "biff8" => Ok(OutputFormat::Xls),
            other => Err(EmitterError::Config(format!(
                "unknown output format '{}'",
                other
            ))),
        }
    }
}

/// Document-level options
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EmitterConfig {
    pub format: OutputFormat,
    pub debug: bool,
    pub remove_blank_rows: bool,
    pub single_sheet: bool,
    pub display_formulas: Option<bool>,
    pub display_gridlines: Option<bool>,
    pub display_row_col_headings: Option<bool>,
    pub display_zeros: Option<bool>,
    pub force_auto_col_widths: bool,
    pub structured_header: bool,
    pub images_span_columns: bool,
    pub disable_grouping: bool,
    pub sheet_name: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub image_fetcher: Option<Arc<dyn ImageFetcher>>,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        EmitterConfig {
            format: OutputFormat::Xlsx,
            debug: false,
            remove_blank_rows: true,
            single_sheet: false,
            display_formulas: None,
            display_gridlines: None,
            display_row_col_headings: None,
            display_zeros: None,
            force_auto_col_widths: false,
            structured_header: false,
            images_span_columns: false,
            disable_grouping: false,
            sheet_name: None,
            image_fetcher: None,
        }
    }
}

impl fmt::Debug for EmitterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitterConfig")
            .field("format", &self.format)
            .field("debug", &self.debug)
            .field("remove_blank_rows", &self.remove_blank_rows)
            .field("single_sheet", &self.single_sheet)
            .field("display_formulas", &self.display_formulas)
            .field("display_gridlines", &self.display_gridlines)
            .field("display_row_col_headings", &self.display_row_col_headings)
            .field("display_zeros", &self.display_zeros)
            .field("force_auto_col_widths", &self.force_auto_col_widths)
            .field("structured_header", &self.structured_header)
            .field("images_span_columns", &self.images_span_columns)
            .field("disable_grouping", &self.disable_grouping)
            .field("sheet_name", &self.sheet_name)
            .field("image_fetcher", &self.image_fetcher.is_some())
            .finish()
    }
}

impl EmitterConfig {
    pub fn builder() -> EmitterConfigBuilder {
        EmitterConfigBuilder::new()
    }

    /// Build from the host's string-keyed options
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self> {
        let mut config = EmitterConfig::default();
        for (key, value) in options {
            match key.as_str() {
                keys::FORMAT => config.format = OutputFormat::parse(value)?,
                keys::DEBUG => config.debug = parse_flag(key, value)?,
                keys::REMOVE_BLANK_ROWS => config.remove_blank_rows = parse_flag(key, value)?,
                keys::SINGLE_SHEET => config.single_sheet = parse_flag(key, value)?,
                keys::DISPLAY_FORMULAS => config.display_formulas = Some(parse_flag(key, value)?),
                keys::DISPLAY_GRIDLINES => {
                    config.display_gridlines = Some(parse_flag(key, value)?)
                }
                keys::DISPLAY_ROW_COL_HEADINGS => {
                    config.display_row_col_headings = Some(parse_flag(key, value)?)
                }
                keys::DISPLAY_ZEROS => config.display_zeros = Some(parse_flag(key, value)?),
                keys::FORCE_AUTO_COL_WIDTHS => {
                    config.force_auto_col_widths = parse_flag(key, value)?
                }
                keys::STRUCTURED_HEADER => config.structured_header = parse_flag(key, value)?,
                keys::IMAGES_SPAN_COLUMNS => {
                    config.images_span_columns = parse_flag(key, value)?
                }
                keys::DISABLE_GROUPING => config.disable_grouping = parse_flag(key, value)?,
                keys::SHEET_NAME => config.sheet_name = Some(value.clone()),
                other => log::debug!("Ignoring unknown emitter option '{}'", other),
            }
        }
        Ok(config)
    }

    /// Log level for the per-event trace
    pub fn trace_level(&self) -> log::Level {
        if self.debug {
            log::Level::Debug
        } else {
            log::Level::Trace
        }
    }
}

/// Parse a boolean option value
pub fn parse_flag(key: &str, value: &str) -> Result<bool> {
    parse_bool(value).ok_or_else(|| {
        EmitterError::Config(format!("option '{}' expects a boolean, got '{}'", key, value))
    })
}

/// Lenient boolean parsing for user properties
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Builder for [`EmitterConfig`]
///
/// # Examples
///
/// ```
/// use excelemitter::config::{EmitterConfig, OutputFormat};
///
/// let config = EmitterConfig::builder()
///     .with_format(OutputFormat::Xls)
///     .with_remove_blank_rows(false)
///     .with_sheet_name("Sales")
///     .build();
/// assert_eq!(config.format, OutputFormat::Xls);
/// assert!(!config.remove_blank_rows);
/// ```
#[derive(Debug, Default)]
pub struct EmitterConfigBuilder {
    config: EmitterConfig,
}

impl EmitterConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    pub fn with_remove_blank_rows(mut self, remove: bool) -> Self {
        self.config.remove_blank_rows = remove;
        self
    }

    pub fn with_single_sheet(mut self, single: bool) -> Self {
        self.config.single_sheet = single;
        self
    }

    pub fn with_display_formulas(mut self, display: bool) -> Self {
        self.config.display_formulas = Some(display);
        self
    }

    pub fn with_display_gridlines(mut self, display: bool) -> Self {
        self.config.display_gridlines = Some(display);
        self
    }

    pub fn with_display_row_col_headings(mut self, display: bool) -> Self {
        self.config.display_row_col_headings = Some(display);
        self
    }

    pub fn with_display_zeros(mut self, display: bool) -> Self {
        self.config.display_zeros = Some(display);
        self
    }

    pub fn with_force_auto_col_widths(mut self, force: bool) -> Self {
        self.config.force_auto_col_widths = force;
        self
    }

    pub fn with_structured_header(mut self, structured: bool) -> Self {
        self.config.structured_header = structured;
        self
    }

    pub fn with_images_span_columns(mut self, span: bool) -> Self {
        self.config.images_span_columns = span;
        self
    }

    pub fn with_disable_grouping(mut self, disable: bool) -> Self {
        self.config.disable_grouping = disable;
        self
    }

    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.config.sheet_name = Some(name.into());
        self
    }

    pub fn with_image_fetcher(mut self, fetcher: Arc<dyn ImageFetcher>) -> Self {
        self.config.image_fetcher = Some(fetcher);
        self
    }

    pub fn build(self) -> EmitterConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EmitterConfig::default();
        assert!(config.remove_blank_rows);
        assert!(!config.single_sheet);
        assert_eq!(config.display_gridlines, None);
        assert_eq!(config.format, OutputFormat::Xlsx);
        assert_eq!(config.trace_level(), log::Level::Trace);
    }

    #[test]
    fn test_from_options() {
        let mut options = HashMap::new();
        options.insert(keys::FORMAT.to_string(), "XLS".to_string());
        options.insert(keys::REMOVE_BLANK_ROWS.to_string(), "no".to_string());
        options.insert(keys::DISPLAY_GRIDLINES.to_string(), "false".to_string());
        options.insert(keys::DEBUG.to_string(), "true".to_string());
        options.insert("Unrelated.Option".to_string(), "x".to_string());

        let config = EmitterConfig::from_options(&options).unwrap();
        assert_eq!(config.format, OutputFormat::Xls);
        assert!(!config.remove_blank_rows);
        assert_eq!(config.display_gridlines, Some(false));
        assert_eq!(config.trace_level(), log::Level::Debug);
    }

    #[test]
    fn test_invalid_options() {
        let mut options = HashMap::new();
        options.insert(keys::SINGLE_SHEET.to_string(), "maybe".to_string());
        assert!(matches!(
            EmitterConfig::from_options(&options),
            Err(EmitterError::Config(_))
        ));

        assert!(OutputFormat::parse("ods").is_err());
    }
}
