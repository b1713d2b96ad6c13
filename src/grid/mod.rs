//! Per-document grid bookkeeping
//!
//! [`GridState`] tracks where the next row goes on the current sheet, the
//! border overlays and row spans of the constructs that are open, the current
//! outline level and the images waiting for their page to close.

pub mod area;
pub mod image;
pub mod text;

pub use area::{Area, BorderOverlayStack, RowSpanRegistry, OPEN_END};
pub use image::{CellImage, ImageFetcher, ImageSource};
pub use text::TextAccumulator;

/// Deepest outline level the formats support
pub const MAX_OUTLINE_LEVEL: u8 = 7;

#[derive(Debug, Default)]
pub struct GridState {
    sheet: Option<usize>,
    next_row: u32,
    outline_level: u8,
    pub overlays: BorderOverlayStack,
    spans: Vec<RowSpanRegistry>,
    images: Vec<CellImage>,
}

impl GridState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start writing at the top of a sheet
    pub fn begin_sheet(&mut self, sheet: usize) {
        self.sheet = Some(sheet);
        self.next_row = 0;
        self.outline_level = 0;
        self.overlays = BorderOverlayStack::new();
        self.spans.clear();
        self.images.clear();
    }

    pub fn sheet(&self) -> Option<usize> {
        self.sheet
    }

    /// Row index the next row will be written to
    pub fn next_row(&self) -> u32 {
        self.next_row
    }

    /// Consume `rows` grid rows
    pub fn advance(&mut self, rows: u32) {
        self.next_row += rows;
    }

    /// Move the cursor forward to at least `row`
    pub fn advance_to(&mut self, row: u32) {
        self.next_row = self.next_row.max(row);
    }

    pub fn outline_level(&self) -> u8 {
        self.outline_level
    }

    pub fn enter_group(&mut self) {
        self.outline_level = (self.outline_level + 1).min(MAX_OUTLINE_LEVEL);
    }

    pub fn leave_group(&mut self) {
        self.outline_level = self.outline_level.saturating_sub(1);
    }

    /// Open a row-span registry for a table
    pub fn push_spans(&mut self) {
        self.spans.push(RowSpanRegistry::new());
    }

    pub fn pop_spans(&mut self) -> Option<RowSpanRegistry> {
        self.spans.pop()
    }

    /// Registry of the innermost open table
    pub fn spans(&self) -> Option<&RowSpanRegistry> {
        self.spans.last()
    }

    pub fn spans_mut(&mut self) -> Option<&mut RowSpanRegistry> {
        self.spans.last_mut()
    }

    /// Whether any open table has a span running through `row`
    pub fn row_spanned(&self, row: u32) -> bool {
        self.spans
            .iter()
            .any(|s| s.covers_row(row) || s.starts_on_row(row))
    }

    pub fn defer_image(&mut self, image: CellImage) {
        log::debug!("Deferred image at ({}, {})", image.row, image.col);
        self.images.push(image);
    }

    pub fn has_images_in_row(&self, row: u32) -> bool {
        self.images.iter().any(|i| i.row == row)
    }

    pub fn take_images(&mut self) -> Vec<CellImage> {
        std::mem::take(&mut self.images)
    }
}
