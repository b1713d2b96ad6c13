//! Accumulating cell text from several content fragments

use crate::types::{CellValue, FontHandle, HorizontalAlign, RichRun, RichText};
use crate::units;
use kuchiki::traits::TendrilSink;
use kuchiki::{NodeData, NodeRef};

/// Average character width as a fraction of the font size
const CHAR_WIDTH_FACTOR: f64 = 0.55;
/// Line height as a multiple of the font size
const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// The value a cell collects while its content events arrive
///
/// A single data fragment keeps its typed value. Any further fragment turns
/// the cell into text, joined with a line break around block fragments and a
/// space between inline ones.
#[derive(Debug, Default, Clone)]
pub struct TextAccumulator {
    text: String,
    chars: usize,
    runs: Vec<RichRun>,
    typed: Option<CellValue>,
    number_format: Option<String>,
    last_inline: bool,
    fragments: usize,
    align: Option<HorizontalAlign>,
}

impl TextAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments == 0
    }

    pub fn fragments(&self) -> usize {
        self.fragments
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Format code carried by a typed fragment
    pub fn number_format(&self) -> Option<&str> {
        self.number_format.as_deref()
    }

    /// Negotiated horizontal alignment of the fragments so far
    pub fn alignment(&self) -> Option<HorizontalAlign> {
        self.align
    }

    pub fn negotiate_alignment(&mut self, align: Option<HorizontalAlign>) {
        let Some(align) = align else { return };
        if align == HorizontalAlign::General {
            return;
        }
        self.align = Some(match self.align {
            Some(current) => current.negotiate(align),
            None => align,
        });
    }

    fn separate(&mut self, incoming_inline: bool, incoming: &str) {
        if self.fragments == 0 || self.text.is_empty() || incoming.is_empty() {
            return;
        }
        let separator = if !self.last_inline || !incoming_inline {
            Some('\n')
        } else if !self.text.ends_with(char::is_whitespace)
            && !incoming.starts_with(char::is_whitespace)
        {
            Some(' ')
        } else {
            None
        };
        if let Some(c) = separator {
            if !self.text.ends_with('\n') {
                self.text.push(c);
                self.chars += 1;
            }
        }
    }

    fn push_run(&mut self, font: FontHandle) {
        match self.runs.last_mut() {
            Some(last) if last.offset == self.chars => last.font = font,
            Some(last) if last.font == font => {}
            _ => self.runs.push(RichRun {
                offset: self.chars,
                font,
            }),
        }
    }

    /// Append a text fragment
    pub fn append_text(&mut self, text: &str, font: FontHandle, inline: bool) {
        self.demote_typed();
        self.separate(inline, text);
        self.push_run(font);
        self.text.push_str(text);
        self.chars += text.chars().count();
        self.fragments += 1;
        self.last_inline = inline;
    }

    /// Append a typed value with the text it displays as
    pub fn append_value(
        &mut self,
        value: CellValue,
        display: &str,
        number_format: Option<String>,
        font: FontHandle,
        inline: bool,
    ) {
        if self.fragments == 0 {
            self.push_run(font);
            self.text.push_str(display);
            self.chars = display.chars().count();
            self.typed = Some(value);
            self.number_format = number_format;
            self.fragments = 1;
            self.last_inline = inline;
            return;
        }
        self.append_text(display, font, inline);
    }

    /// Append another accumulator's content as one block fragment
    pub fn append_block(&mut self, other: TextAccumulator) {
        self.append_accumulated(other, false);
    }

    /// Append another accumulator's content on the current line
    pub fn append_inline(&mut self, other: TextAccumulator) {
        self.append_accumulated(other, true);
    }

    fn append_accumulated(&mut self, other: TextAccumulator, inline: bool) {
        if other.text.is_empty() {
            return;
        }
        self.demote_typed();
        self.separate(inline, &other.text);
        let base = self.chars;
        for run in other.runs {
            let offset = base + run.offset;
            match self.runs.last_mut() {
                Some(last) if last.offset == offset => last.font = run.font,
                Some(last) if last.font == run.font => {}
                _ => self.runs.push(RichRun {
                    offset,
                    font: run.font,
                }),
            }
        }
        self.text.push_str(&other.text);
        self.chars += other.chars;
        self.fragments += 1;
        self.last_inline = inline;
    }

    fn demote_typed(&mut self) {
        if self.typed.take().is_some() {
            self.number_format = None;
        }
    }

    /// Fonts used by the collected runs, in order
    pub fn fonts(&self) -> impl Iterator<Item = FontHandle> + '_ {
        self.runs.iter().map(|r| r.font)
    }

    /// The single font of the text, when there is exactly one
    pub fn single_font(&self) -> Option<FontHandle> {
        let first = self.runs.first()?.font;
        self.runs.iter().all(|r| r.font == first).then_some(first)
    }

    /// Final cell value; consecutive runs with the same font are merged
    pub fn finish(self) -> Option<CellValue> {
        if self.fragments == 0 {
            return None;
        }
        if let Some(value) = self.typed {
            return Some(value);
        }
        if self.text.is_empty() {
            return None;
        }
        let mut runs: Vec<RichRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs {
            if run.offset >= self.chars {
                continue;
            }
            match runs.last() {
                Some(last) if last.font == run.font => {}
                _ => runs.push(run),
            }
        }
        if runs.len() <= 1 {
            Some(CellValue::String(self.text))
        } else {
            Some(CellValue::RichString(RichText {
                text: self.text,
                runs,
            }))
        }
    }
}

/// Estimated height in points of wrapped text in a box `width_px` wide
pub fn wrapped_text_height(text: &str, font_points: f64, width_px: f64) -> f64 {
    let char_px = units::points_to_pixels(CHAR_WIDTH_FACTOR * font_points).max(1.0);
    let per_line = (width_px / char_px).floor().max(1.0) as usize;
    let lines: usize = text
        .split('\n')
        .map(|line| line.chars().count().div_ceil(per_line).max(1))
        .sum();
    (lines as f64 * LINE_HEIGHT_FACTOR * font_points).min(units::MAX_ROW_HEIGHT_POINTS)
}

/// Widest line in characters, for automatic column widths
pub fn widest_line(text: &str) -> usize {
    text.split('\n').map(|l| l.chars().count()).max().unwrap_or(0)
}

/// Reduce HTML to text: tags dropped, block ends become line breaks
pub fn strip_html(html: &str) -> String {
    let document = kuchiki::parse_html().one(html);
    let mut out = String::with_capacity(html.len());
    collect_text(&document, &mut out);
    out.replace('\u{a0}', " ")
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

fn collect_text(node: &NodeRef, out: &mut String) {
    match node.data() {
        NodeData::Text(text) => out.push_str(&text.borrow()),
        NodeData::Element(element) => {
            let name = element.name.local.as_ref().to_ascii_lowercase();
            match name.as_str() {
                "script" | "style" | "template" => return,
                "br" => {
                    out.push('\n');
                    return;
                }
                _ => {}
            }
            for child in node.children() {
                collect_text(&child, out);
            }
            if is_block_element(&name) && !out.ends_with('\n') {
                out.push('\n');
            }
        }
        NodeData::Document(_) | NodeData::DocumentFragment => {
            for child in node.children() {
                collect_text(&child, out);
            }
        }
        _ => {}
    }
}

fn is_block_element(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "li"
            | "tr"
            | "ul"
            | "ol"
            | "table"
            | "blockquote"
            | "pre"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
    )
}
