//! Cell appearance: property sets, their caches and number formats

pub mod cache;
pub mod number_format;
pub mod properties;

pub use cache::{FontCache, StyleCache};
pub use number_format::{infer_date_kind, translate_date_format, translate_number_format, DateKind};
pub use properties::{BorderSide, Borders, FontAttributes, Side, StyleProperties};
