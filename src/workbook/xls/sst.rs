//! Shared string table record with CONTINUE splitting
//!
//! A string header never straddles a record boundary. Character data may, in
//! which case the continuation starts with a fresh flags byte. Formatting runs
//! split on whole four-byte runs.

use super::biff::{EncodedChars, MAX_RECORD_DATA};
use crate::workbook::shared_strings::{SharedString, SharedStrings};

/// Split an SST into record payloads: the SST body first, then CONTINUE bodies
pub fn build_sst(strings: &SharedStrings, font_index: impl Fn(u32) -> u16) -> Vec<Vec<u8>> {
    let mut builder = SstBuilder::new();
    builder
        .current
        .extend_from_slice(&(strings.references() as u32).to_le_bytes());
    builder
        .current
        .extend_from_slice(&(strings.count() as u32).to_le_bytes());

    for entry in strings.iter() {
        let runs: Vec<(u16, u16)> = match entry {
            SharedString::Plain(_) => Vec::new(),
            SharedString::Rich(rich) => rich_runs(rich, &font_index),
        };
        builder.push_string(entry.text(), &runs);
    }
    builder.finish()
}

/// Formatting runs as (UTF-16 offset, BIFF font index)
fn rich_runs(rich: &crate::types::RichText, font_index: &impl Fn(u32) -> u16) -> Vec<(u16, u16)> {
    let mut runs = Vec::with_capacity(rich.runs.len());
    for run in &rich.runs {
        let offset: usize = rich
            .text
            .chars()
            .take(run.offset)
            .map(char::len_utf16)
            .sum();
        if offset > u16::MAX as usize {
            break;
        }
        let font = font_index(run.font.0);
        // runs must be strictly increasing
        match runs.last_mut() {
            Some((last_offset, last_font)) if *last_offset as usize == offset => *last_font = font,
            _ => runs.push((offset as u16, font)),
        }
    }
    runs
}

struct SstBuilder {
    parts: Vec<Vec<u8>>,
    current: Vec<u8>,
}

impl SstBuilder {
    fn new() -> Self {
        SstBuilder {
            parts: Vec::new(),
            current: Vec::with_capacity(MAX_RECORD_DATA),
        }
    }

    fn space(&self) -> usize {
        MAX_RECORD_DATA - self.current.len()
    }

    fn next_record(&mut self) {
        let full = std::mem::replace(&mut self.current, Vec::with_capacity(MAX_RECORD_DATA));
        self.parts.push(full);
    }

    fn push_string(&mut self, text: &str, runs: &[(u16, u16)]) {
        let chars = EncodedChars::new(&super::biff::truncate_units(text, u16::MAX as usize));
        let rich = !runs.is_empty();
        let header_len = 3 + if rich { 2 } else { 0 };
        // header plus at least one character
        if self.space() < header_len + chars.bytes_per_char() {
            self.next_record();
        }

        self.current
            .extend_from_slice(&(chars.len() as u16).to_le_bytes());
        self.current
            .push(chars.flags() | if rich { 0x08 } else { 0x00 });
        if rich {
            self.current
                .extend_from_slice(&(runs.len() as u16).to_le_bytes());
        }

        let mut written = 0;
        while written < chars.len() {
            let fit = self.space() / chars.bytes_per_char();
            if fit == 0 {
                self.next_record();
                self.current.push(chars.flags());
                continue;
            }
            let end = (written + fit).min(chars.len());
            self.current.extend(chars.bytes(written, end));
            written = end;
        }

        for (offset, font) in runs {
            if self.space() < 4 {
                self.next_record();
            }
            self.current.extend_from_slice(&offset.to_le_bytes());
            self.current.extend_from_slice(&font.to_le_bytes());
        }
    }

    fn finish(mut self) -> Vec<Vec<u8>> {
        self.parts.push(self.current);
        self.parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FontHandle, RichRun, RichText};

    #[test]
    fn test_simple_table() {
        let mut strings = SharedStrings::new();
        strings.add_string("ab");
        strings.add_string("ab");
        let parts = build_sst(&strings, |f| f as u16);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0], vec![2, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, b'a', b'b']);
    }

    #[test]
    fn test_rich_string_layout() {
        let mut strings = SharedStrings::new();
        strings.add_rich(&RichText {
            text: "xy".into(),
            runs: vec![RichRun {
                offset: 1,
                font: FontHandle(4),
            }],
        });
        let parts = build_sst(&strings, |f| if f >= 4 { f as u16 + 1 } else { f as u16 });
        assert_eq!(
            &parts[0][8..],
            &[2, 0, 0x08, 1, 0, b'x', b'y', 1, 0, 5, 0]
        );
    }

    #[test]
    fn test_long_strings_continue_with_flags() {
        let mut strings = SharedStrings::new();
        let long = "é".repeat(10_000);
        strings.add_string(&long);
        let parts = build_sst(&strings, |f| f as u16);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), MAX_RECORD_DATA);
        // 8 byte header, 3 byte string header, then characters
        let first_chars = MAX_RECORD_DATA - 11;
        assert_eq!(parts[1][0], 0x00);
        assert_eq!(parts[1].len(), 1 + 10_000 - first_chars);
    }
}
