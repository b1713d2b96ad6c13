//! # excelemitter
//!
//! Turns a streamed report content tree into Excel workbooks.
//!
//! ## Features
//!
//! - **Event driven**: the report engine calls one method per content start/end
//! - **Two formats**: XLSX with true colour, XLS (BIFF8) with a 56-colour palette
//! - **Table layout**: column and row spans become merged cells, nested tables
//!   get grid cells of their own when the shapes line up
//! - **Style dedupe**: equivalent styles and fonts share one workbook entry
//! - **Bookmarks and hyperlinks**: named ranges and hyperlink cells
//! - **Images**: embedded, `data:`, `file:` and (optionally) remote images
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use excelemitter::content::*;
//! use excelemitter::{EmitterConfig, ExcelEmitter, OutputFormat};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EmitterConfig::builder()
//!     .with_format(OutputFormat::Xlsx)
//!     .with_remove_blank_rows(true)
//!     .build();
//! let mut emitter = ExcelEmitter::initialize(config, Some("products.xlsx".into()))?;
//!
//! let report = ReportContent::default();
//! let page = PageContent::default();
//! let table = TableContent::with_columns(2);
//! let row = RowContent::default();
//! let cell = CellContent::default();
//!
//! emitter.start_report(&report)?;
//! emitter.start_page(&page)?;
//! emitter.start_table(&table)?;
//! emitter.start_row(&row)?;
//! for value in ["Widget", "4.50"] {
//!     emitter.start_cell(&cell)?;
//!     emitter.start_text(&TextContent::new(value))?;
//!     emitter.end_cell(&cell)?;
//! }
//! emitter.end_row(&row)?;
//! emitter.end_table(&table)?;
//! emitter.end_page(&page)?;
//! emitter.end_report(&report)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod content;
pub mod css;
pub mod emitter;
pub mod error;
pub mod grid;
pub mod handlers;
pub mod style;
pub mod types;
pub mod units;
pub mod workbook;

pub use config::{EmitterConfig, EmitterConfigBuilder, OutputFormat};
pub use emitter::{ExcelEmitter, OutputDestination};
pub use error::{EmitterError, Result};
#[cfg(feature = "remote-images")]
pub use grid::image::HttpImageFetcher;
pub use grid::ImageFetcher;
pub use types::{CellRange, CellRef, CellValue, Rgb};
pub use workbook::{Sheet, Workbook};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_imports() {
        let _ = std::marker::PhantomData::<EmitterError>;
        let _ = std::marker::PhantomData::<ExcelEmitter>;
        let _ = std::marker::PhantomData::<Workbook>;
    }
}
