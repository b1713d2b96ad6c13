//! Text, data and images placed directly under a page or list
//!
//! Consecutive inline elements share one row; every block element gets a row
//! of its own in the first column.

use super::cell::{append_leaf, settle, text_height, ImageTarget, LeafInfo};
use super::{Context, Event, Outcome, Transition};
use crate::error::Result;
use crate::grid::{Area, TextAccumulator};
use crate::style::{FontAttributes, StyleProperties};
use crate::types::{CellRange, Rgb, StyleHandle};

#[derive(Debug)]
pub struct TopLevelContentState {
    row: u32,
    background: Option<Rgb>,
    text: TextAccumulator,
    props: Option<StyleProperties>,
    first_font: Option<FontAttributes>,
    bookmarks: Vec<String>,
    hyperlink: Option<String>,
    has_image: bool,
    last_inline: bool,
}

impl TopLevelContentState {
    pub fn new(ctx: &mut Context, inherited: Option<Rgb>) -> Result<Self> {
        let row = ctx.grid.next_row();
        ctx.sheet_mut("start_content")?.limits().check(row, 0)?;
        Ok(TopLevelContentState {
            row,
            background: inherited,
            text: TextAccumulator::new(),
            props: None,
            first_font: None,
            bookmarks: Vec::new(),
            hyperlink: None,
            has_image: false,
            last_inline: false,
        })
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty() && !self.has_image && self.props.is_none()
    }

    pub fn handle(&mut self, ctx: &mut Context, event: &Event<'_>) -> Result<Transition> {
        let Some(meta) = event.meta().filter(|_| event.is_leaf()) else {
            self.flush(ctx)?;
            return Ok(Transition::Redeliver(Outcome::Done));
        };
        let inline = meta.style.is_inline();
        if !self.is_empty() && !(inline && self.last_inline) {
            self.flush(ctx)?;
            return Ok(Transition::Redeliver(Outcome::Done));
        }

        let props = self
            .props
            .get_or_insert_with(|| StyleProperties::from_style(&meta.style, ctx.fonts.base()));
        let base = props.font.clone();
        let target = ImageTarget {
            row: self.row,
            col: 0,
            col_span: 1,
        };
        if let Some(info) = append_leaf(ctx, &mut self.text, &base, target, event)? {
            self.absorb(info);
        }
        self.last_inline = inline;
        Ok(Transition::Stay)
    }

    fn absorb(&mut self, info: LeafInfo) {
        if let Some(bookmark) = info.bookmark {
            self.bookmarks.push(bookmark);
        }
        if self.hyperlink.is_none() {
            self.hyperlink = info.hyperlink;
        }
        if self.first_font.is_none() {
            self.first_font = info.font;
        }
        self.has_image |= info.image;
    }

    /// Write the collected content as one row
    fn flush(&mut self, ctx: &mut Context) -> Result<()> {
        let Some(mut props) = self.props.take() else {
            return Ok(());
        };
        props.background = props.background.or(self.background);
        let row = self.row;
        let area = Area::new(row, 0, row, 0);
        let mut settled = settle(props, std::mem::take(&mut self.text), self.first_font.take());
        if settled.value.is_none()
            && !self.has_image
            && settled.props.background.is_none()
            && self.bookmarks.is_empty()
        {
            log::debug!("Skipped empty content at row {}", row);
            return Ok(());
        }

        ctx.grid.overlays.apply(&area, &mut settled.props.borders);
        let style = ctx.style_handle(&settled.props)?;
        let height = text_height(ctx, &settled, 0, 1);
        let level = ctx.grid.outline_level();
        let sheet = ctx.sheet_mut("end_content")?;
        match settled.value {
            Some(value) => sheet.set_cell(row, 0, value, style)?,
            None if style != StyleHandle::DEFAULT => sheet.set_cell_style(row, 0, style)?,
            None => {
                sheet.ensure_row(row)?;
            }
        }
        if let Some(url) = self.hyperlink.take() {
            sheet.add_hyperlink(CellRange::single(row, 0), url)?;
        }
        if level > 0 {
            sheet.set_outline_level(row, level)?;
        }
        if height > sheet.default_row_height() {
            ctx.raise_row_height(row, height)?;
        }
        for bookmark in std::mem::take(&mut self.bookmarks) {
            ctx.add_bookmark(&bookmark, area);
        }
        ctx.grid.advance(1);
        Ok(())
    }
}
