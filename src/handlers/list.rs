//! Lists, list bands and list groups
//!
//! A list has no columns of its own: each element becomes a row at the list
//! offset, and tables inside a list are laid out like top-level tables.

use super::table::apply_bottom_border;
use super::{unexpected, Context, Event, Handler, Outcome, TableState, TopLevelContentState, Transition};
use crate::content::{ContentMeta, StyleProperty};
use crate::css;
use crate::error::Result;
use crate::grid::{Area, OPEN_END};
use crate::style::Borders;
use crate::types::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    List,
    Band,
    Group,
}

#[derive(Debug)]
pub struct ListState {
    kind: ListKind,
    start_row: u32,
    background: Option<Rgb>,
    borders: Borders,
    overlay: bool,
    grouped: bool,
    bookmark: Option<String>,
}

impl ListState {
    pub fn open(ctx: &mut Context, meta: &ContentMeta, kind: ListKind, inherited: Option<Rgb>) -> Result<Self> {
        let start_row = ctx.grid.next_row();
        ctx.sheet_mut("start_list")?;
        let borders = Borders::from_style(&meta.style);
        let overlay = ctx
            .grid
            .overlays
            .push(Area::new(start_row, 0, OPEN_END, 0), borders);
        let grouped = kind == ListKind::Group && !ctx.config.disable_grouping;
        if grouped {
            ctx.grid.enter_group();
        }
        Ok(ListState {
            kind,
            start_row,
            background: meta
                .style
                .get(StyleProperty::BackgroundColor)
                .and_then(css::parse_color)
                .or(inherited),
            borders,
            overlay,
            grouped,
            bookmark: meta.bookmark.clone(),
        })
    }

    fn closes(&self, event: &Event<'_>) -> bool {
        matches!(
            (self.kind, event),
            (ListKind::List, Event::EndList(_))
                | (ListKind::Band, Event::EndListBand(_))
                | (ListKind::Group, Event::EndListGroup(_))
        )
    }

    pub fn handle(&mut self, ctx: &mut Context, event: &Event<'_>, name: &'static str) -> Result<Transition> {
        if self.closes(event) {
            self.close(ctx)?;
            return Ok(Transition::Pop(Outcome::Done));
        }
        match event {
            Event::StartListBand(band) => Ok(Transition::Push(Handler::ListBand(ListState::open(
                ctx,
                &band.meta,
                ListKind::Band,
                self.background,
            )?))),
            Event::StartListGroup(group) => Ok(Transition::Push(Handler::ListGroup(ListState::open(
                ctx,
                &group.meta,
                ListKind::Group,
                self.background,
            )?))),
            Event::StartList(list) => Ok(Transition::Push(Handler::List(ListState::open(
                ctx,
                &list.meta,
                ListKind::List,
                self.background,
            )?))),
            Event::StartTable(table) => Ok(Transition::Push(Handler::TopLevelTable(
                TableState::top_level(ctx, table, self.background)?,
            ))),
            Event::StartContainer(_) | Event::EndContainer(_) => Ok(Transition::Stay),
            leaf if leaf.is_leaf() => Ok(Transition::Delegate(Handler::TopLevelContent(
                TopLevelContentState::new(ctx, self.background)?,
            ))),
            other => Err(unexpected(name, other)),
        }
    }

    fn close(&mut self, ctx: &mut Context) -> Result<()> {
        if self.overlay {
            ctx.grid.overlays.pop();
        }
        if self.grouped {
            ctx.grid.leave_group();
        }
        let next = ctx.grid.next_row();
        if next > self.start_row {
            let last = next - 1;
            if self.borders.bottom.is_set() {
                apply_bottom_border(ctx, last, 0, 0, self.borders.bottom)?;
            }
            if let Some(bookmark) = &self.bookmark {
                ctx.add_bookmark(bookmark, Area::new(self.start_row, 0, last, 0));
            }
        }
        Ok(())
    }
}
