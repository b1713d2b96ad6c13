//! Read-only report content delivered with each emitter event
//!
//! The reporting engine owns the content tree; every event borrows one node for
//! the duration of the callback. Nodes expose their resolved style by indexed
//! property lookup, string-keyed user properties, an optional bookmark and
//! hyperlink, and explicit geometry where the report sets it.

use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;

/// Resolved style properties, looked up by index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    TextAlign,
    VerticalAlign,
    BackgroundColor,
    Color,
    FontFamily,
    FontSize,
    FontWeight,
    FontStyle,
    WhiteSpace,
    BorderTopStyle,
    BorderTopWidth,
    BorderTopColor,
    BorderRightStyle,
    BorderRightWidth,
    BorderRightColor,
    BorderBottomStyle,
    BorderBottomWidth,
    BorderBottomColor,
    BorderLeftStyle,
    BorderLeftWidth,
    BorderLeftColor,
    NumberFormat,
    DateFormat,
    DateTimeFormat,
    TimeFormat,
    Display,
}

impl StyleProperty {
    pub const COUNT: usize = 26;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// A fully resolved style; unset properties are `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedStyle {
    values: Vec<Option<String>>,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        ComputedStyle {
            values: vec![None; StyleProperty::COUNT],
        }
    }
}

impl ComputedStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, property: StyleProperty) -> Option<&str> {
        self.values[property.index()].as_deref()
    }

    pub fn set(&mut self, property: StyleProperty, value: impl Into<String>) {
        self.values[property.index()] = Some(value.into());
    }

    pub fn with(mut self, property: StyleProperty, value: impl Into<String>) -> Self {
        self.set(property, value);
        self
    }

    /// Whether the node is laid out inline
    pub fn is_inline(&self) -> bool {
        self.get(StyleProperty::Display)
            .map_or(false, |d| d.trim().eq_ignore_ascii_case("inline"))
    }
}

/// Accessors common to every content node
#[derive(Debug, Clone, Default)]
pub struct ContentMeta {
    pub style: ComputedStyle,
    pub user_properties: HashMap<String, String>,
    pub bookmark: Option<String>,
    pub hyperlink: Option<String>,
    /// Explicit width as a CSS length
    pub width: Option<String>,
    /// Explicit height as a CSS length
    pub height: Option<String>,
}

impl ContentMeta {
    pub fn user_property(&self, key: &str) -> Option<&str> {
        self.user_properties.get(key).map(String::as_str)
    }

    pub fn with_style(mut self, property: StyleProperty, value: impl Into<String>) -> Self {
        self.style.set(property, value);
        self
    }

    pub fn with_user_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.user_properties.insert(key.into(), value.into());
        self
    }

    pub fn with_bookmark(mut self, bookmark: impl Into<String>) -> Self {
        self.bookmark = Some(bookmark.into());
        self
    }

    pub fn with_hyperlink(mut self, url: impl Into<String>) -> Self {
        self.hyperlink = Some(url.into());
        self
    }

    pub fn with_width(mut self, width: impl Into<String>) -> Self {
        self.width = Some(width.into());
        self
    }

    pub fn with_height(mut self, height: impl Into<String>) -> Self {
        self.height = Some(height.into());
        self
    }
}

/// Implemented by every content node
pub trait Content {
    fn meta(&self) -> &ContentMeta;

    fn style(&self) -> &ComputedStyle {
        &self.meta().style
    }
}

macro_rules! impl_content {
    ($($ty:ty),* $(,)?) => {
        $(impl Content for $ty {
            fn meta(&self) -> &ContentMeta {
                &self.meta
            }
        })*
    };
}

#[derive(Debug, Clone, Default)]
pub struct ReportContent {
    pub meta: ContentMeta,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Default)]
pub struct PageMargins {
    pub top: Option<String>,
    pub right: Option<String>,
    pub bottom: Option<String>,
    pub left: Option<String>,
}

/// Three-part page header or footer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRegion {
    pub left: Option<String>,
    pub center: Option<String>,
    pub right: Option<String>,
}

impl PageRegion {
    pub fn is_empty(&self) -> bool {
        [&self.left, &self.center, &self.right]
            .iter()
            .all(|part| part.as_deref().map_or(true, str::is_empty))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub meta: ContentMeta,
    pub name: Option<String>,
    /// Paper name such as "a4" or "us-letter"
    pub page_type: Option<String>,
    pub orientation: Option<Orientation>,
    pub page_width: Option<String>,
    pub page_height: Option<String>,
    pub margins: PageMargins,
    pub header: Option<PageRegion>,
    pub footer: Option<PageRegion>,
}

#[derive(Debug, Clone, Default)]
pub struct ColumnInfo {
    /// CSS length, possibly a percentage of the table width
    pub width: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TableContent {
    pub meta: ContentMeta,
    pub columns: Vec<ColumnInfo>,
    /// Number of header rows, used for frozen panes
    pub header_rows: usize,
}

impl TableContent {
    pub fn with_columns(count: usize) -> Self {
        TableContent {
            columns: vec![ColumnInfo::default(); count],
            ..Default::default()
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BandKind {
    Header,
    #[default]
    Detail,
    Footer,
}

#[derive(Debug, Clone, Default)]
pub struct BandContent {
    pub meta: ContentMeta,
    pub kind: BandKind,
}

#[derive(Debug, Clone, Default)]
pub struct GroupContent {
    pub meta: ContentMeta,
}

#[derive(Debug, Clone, Default)]
pub struct RowContent {
    pub meta: ContentMeta,
}

#[derive(Debug, Clone)]
pub struct CellContent {
    pub meta: ContentMeta,
    /// Logical column index within the table, when the engine provides it
    pub column: Option<usize>,
    pub col_span: usize,
    pub row_span: usize,
    /// Number of direct child elements
    pub child_count: usize,
}

impl Default for CellContent {
    fn default() -> Self {
        CellContent {
            meta: ContentMeta::default(),
            column: None,
            col_span: 1,
            row_span: 1,
            child_count: 1,
        }
    }
}

impl CellContent {
    pub fn spanning(col_span: usize, row_span: usize) -> Self {
        CellContent {
            col_span: col_span.max(1),
            row_span: row_span.max(1),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListContent {
    pub meta: ContentMeta,
}

#[derive(Debug, Clone, Default)]
pub struct ContainerContent {
    pub meta: ContentMeta,
}

/// Text, label and auto-text nodes
#[derive(Debug, Clone, Default)]
pub struct TextContent {
    pub meta: ContentMeta,
    pub text: String,
}

impl TextContent {
    pub fn new(text: impl Into<String>) -> Self {
        TextContent {
            meta: ContentMeta::default(),
            text: text.into(),
        }
    }
}

/// Foreign (embedded markup) content
#[derive(Debug, Clone, Default)]
pub struct ForeignContent {
    pub meta: ContentMeta,
    /// "html", "text", ...
    pub raw_type: String,
    pub raw: String,
}

/// Typed value of a data item
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DataValue {
    #[default]
    Null,
    Number(f64),
    Integer(i64),
    Boolean(bool),
    String(String),
    DateTime(DateTime<FixedOffset>),
}

#[derive(Debug, Clone, Default)]
pub struct DataContent {
    pub meta: ContentMeta,
    pub value: DataValue,
    /// Formatted text as the report would display it
    pub text: String,
}

impl DataContent {
    pub fn new(value: DataValue) -> Self {
        DataContent {
            meta: ContentMeta::default(),
            value,
            text: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageContent {
    pub meta: ContentMeta,
    /// Inline image bytes
    pub data: Option<Vec<u8>>,
    /// Remote, file or data URI when the bytes are not inlined
    pub uri: Option<String>,
    pub mime_type: Option<String>,
    /// Pixel size from image metadata
    pub intrinsic_size: Option<(u32, u32)>,
}

impl_content!(
    ReportContent,
    PageContent,
    TableContent,
    BandContent,
    GroupContent,
    RowContent,
    CellContent,
    ListContent,
    ContainerContent,
    TextContent,
    ForeignContent,
    DataContent,
    ImageContent,
);
