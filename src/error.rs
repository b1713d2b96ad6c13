//! Error types for the emitter

use thiserror::Error;

/// Result type alias for emitter operations
pub type Result<T> = std::result::Result<T, EmitterError>;

/// Main error type for all emitter operations
#[derive(Error, Debug)]
pub enum EmitterError {
    /// Missing or invalid configuration, raised before any content is processed
    #[error("Configuration error: {0}")]
    Config(String),

    /// A content event reached a handler that defines no behaviour for it
    #[error("Unexpected event '{event}' for handler '{handler}'")]
    UnexpectedEvent {
        handler: &'static str,
        event: &'static str,
    },

    /// An earlier fatal error left the emitter unusable for this document
    #[error("Emitter is poisoned by an earlier fatal error")]
    Poisoned,

    /// Content arrived while no sheet was open
    #[error("No active sheet for '{0}'")]
    NoActiveSheet(&'static str),

    /// Row index beyond what the output format can address
    #[error("Row index {row} exceeds the format limit of {limit} rows")]
    RowOutOfRange { row: u32, limit: u32 },

    /// Column index beyond what the output format can address
    #[error("Column index {col} exceeds the format limit of {limit} columns")]
    ColumnOutOfRange { col: u32, limit: u32 },

    /// Too many distinct cell styles for the output format
    #[error("Style limit exceeded: the format allows at most {limit} cell styles")]
    StyleLimitExceeded { limit: usize },

    /// Too many distinct fonts for the output format
    #[error("Font limit exceeded: the format allows at most {limit} fonts")]
    FontLimitExceeded { limit: usize },

    /// Image could not be fetched, sniffed or decoded
    #[error("Image error: {0}")]
    Image(String),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Error occurred while serializing the workbook
    #[error("Failed to write workbook: {0}")]
    WriteError(String),

    /// Error occurred while writing a sheet
    #[error("Failed to write sheet '{sheet}': {source}")]
    WriteSheetError {
        sheet: String,
        #[source]
        source: Box<EmitterError>,
    },

    /// IO error wrapper
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Zip container error
    #[error("Zip error: {0}")]
    ZipError(String),
}

impl From<zip::result::ZipError> for EmitterError {
    fn from(err: zip::result::ZipError) -> Self {
        EmitterError::ZipError(err.to_string())
    }
}

impl From<image::ImageError> for EmitterError {
    fn from(err: image::ImageError) -> Self {
        EmitterError::Image(err.to_string())
    }
}

impl EmitterError {
    /// Whether the error must abort the whole document
    pub fn is_fatal(&self) -> bool {
        !matches!(self, EmitterError::Image(_))
    }
}
