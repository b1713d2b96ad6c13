//! Shared strings table for string deduplication
//!
//! Both output formats store cell text once per workbook and reference it by
//! index. Plain strings are deduplicated; rich strings are deduplicated on
//! text plus runs.

use crate::types::{RichRun, RichText};
use indexmap::IndexSet;

/// One entry of the table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SharedString {
    Plain(String),
    Rich(RichText),
}

impl SharedString {
    pub fn text(&self) -> &str {
        match self {
            SharedString::Plain(s) => s,
            SharedString::Rich(r) => &r.text,
        }
    }

    pub fn runs(&self) -> &[RichRun] {
        match self {
            SharedString::Plain(_) => &[],
            SharedString::Rich(r) => &r.runs,
        }
    }
}

/// Shared strings table that deduplicates strings across the workbook
#[derive(Debug, Default)]
pub struct SharedStrings {
    strings: IndexSet<SharedString>,
    references: usize,
}

impl SharedStrings {
    pub fn new() -> Self {
        SharedStrings::default()
    }

    /// Add a plain string and get its index
    pub fn add_string(&mut self, s: &str) -> u32 {
        self.add(SharedString::Plain(s.to_string()))
    }

    /// Add a rich string and get its index
    pub fn add_rich(&mut self, rich: &RichText) -> u32 {
        if rich.runs.is_empty() {
            return self.add_string(&rich.text);
        }
        self.add(SharedString::Rich(rich.clone()))
    }

    fn add(&mut self, entry: SharedString) -> u32 {
        self.references += 1;
        let (index, _) = self.strings.insert_full(entry);
        index as u32
    }

    /// Number of unique strings
    pub fn count(&self) -> usize {
        self.strings.len()
    }

    /// Number of cell references to the table
    pub fn references(&self) -> usize {
        self.references
    }

    pub fn iter(&self) -> impl Iterator<Item = &SharedString> {
        self.strings.iter()
    }
}

/// Split rich text into (text, font) segments by character offset
///
/// Text before the first run gets `None`.
pub fn segments(rich: &RichText) -> Vec<(String, Option<crate::types::FontHandle>)> {
    let chars: Vec<char> = rich.text.chars().collect();
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut font = None;
    for run in &rich.runs {
        let offset = run.offset.min(chars.len());
        if offset > start {
            out.push((chars[start..offset].iter().collect(), font));
        }
        start = start.max(offset);
        font = Some(run.font);
    }
    if start < chars.len() {
        out.push((chars[start..].iter().collect(), font));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FontHandle;

    #[test]
    fn test_shared_strings() {
        let mut ss = SharedStrings::new();

        let idx1 = ss.add_string("Hello");
        let idx2 = ss.add_string("World");
        let idx3 = ss.add_string("Hello");

        assert_eq!(idx1, 0);
        assert_eq!(idx2, 1);
        assert_eq!(idx3, 0);
        assert_eq!(ss.count(), 2);
        assert_eq!(ss.references(), 3);
    }

    #[test]
    fn test_rich_entries_are_distinct_from_plain() {
        let mut ss = SharedStrings::new();
        let plain = ss.add_string("ab");
        let rich = RichText {
            text: "ab".into(),
            runs: vec![RichRun {
                offset: 1,
                font: FontHandle(2),
            }],
        };
        let idx = ss.add_rich(&rich);
        assert_ne!(plain, idx);
        assert_eq!(ss.add_rich(&rich), idx);
    }

    #[test]
    fn test_segments() {
        let rich = RichText {
            text: "héllo world".into(),
            runs: vec![
                RichRun {
                    offset: 0,
                    font: FontHandle(1),
                },
                RichRun {
                    offset: 6,
                    font: FontHandle(2),
                },
            ],
        };
        let parts = segments(&rich);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], ("héllo ".to_string(), Some(FontHandle(1))));
        assert_eq!(parts[1], ("world".to_string(), Some(FontHandle(2))));
    }
}
