//! Tables and lists that cannot get their own grid cells
//!
//! Their content becomes text of the enclosing cell: one line per row, cells
//! separated by a space.

use super::cell::{append_leaf, ImageTarget};
use super::{unexpected, Context, Event, Handler, Outcome, Transition};
use crate::error::Result;
use crate::grid::TextAccumulator;
use crate::style::FontAttributes;

#[derive(Debug)]
pub struct FlattenedTableState {
    text: TextAccumulator,
    base_font: FontAttributes,
    target: ImageTarget,
}

impl FlattenedTableState {
    pub fn new(base_font: FontAttributes, target: ImageTarget) -> Self {
        FlattenedTableState {
            text: TextAccumulator::new(),
            base_font,
            target,
        }
    }

    pub fn handle(&mut self, ctx: &mut Context, event: &Event<'_>) -> Result<Transition> {
        match event {
            Event::StartRow(_) => Ok(Transition::Push(Handler::FlattenedRow(FlattenedRowState::new(
                self.base_font.clone(),
                self.target,
            )))),
            Event::StartTable(_) | Event::StartList(_) => Ok(Transition::Push(
                Handler::FlattenedTable(FlattenedTableState::new(self.base_font.clone(), self.target)),
            )),
            Event::StartTableBand(_)
            | Event::EndTableBand(_)
            | Event::StartTableGroup(_)
            | Event::EndTableGroup(_)
            | Event::StartListBand(_)
            | Event::EndListBand(_)
            | Event::StartListGroup(_)
            | Event::EndListGroup(_)
            | Event::StartContainer(_)
            | Event::EndContainer(_) => Ok(Transition::Stay),
            Event::EndTable(_) | Event::EndList(_) => {
                Ok(Transition::Pop(Outcome::Text(std::mem::take(&mut self.text))))
            }
            leaf if leaf.is_leaf() => {
                // list items arrive as leaves, one line each
                let mut line = TextAccumulator::new();
                append_leaf(ctx, &mut line, &self.base_font, self.target, leaf)?;
                self.text.append_block(line);
                Ok(Transition::Stay)
            }
            other => Err(unexpected("FlattenedTable", other)),
        }
    }

    pub fn append(&mut self, text: TextAccumulator) {
        self.text.append_block(text);
    }
}

#[derive(Debug)]
pub struct FlattenedRowState {
    line: TextAccumulator,
    base_font: FontAttributes,
    target: ImageTarget,
}

impl FlattenedRowState {
    pub fn new(base_font: FontAttributes, target: ImageTarget) -> Self {
        FlattenedRowState {
            line: TextAccumulator::new(),
            base_font,
            target,
        }
    }

    pub fn handle(&mut self, _ctx: &mut Context, event: &Event<'_>) -> Result<Transition> {
        match event {
            Event::StartCell(cell) => {
                let font = FontAttributes::from_style(&cell.meta.style, &self.base_font);
                Ok(Transition::Push(Handler::FlattenedCell(FlattenedCellState::new(
                    font,
                    self.target,
                ))))
            }
            Event::StartContainer(_) | Event::EndContainer(_) => Ok(Transition::Stay),
            Event::EndRow(_) => Ok(Transition::Pop(Outcome::Text(std::mem::take(&mut self.line)))),
            other => Err(unexpected("FlattenedRow", other)),
        }
    }

    pub fn append(&mut self, text: TextAccumulator) {
        self.line.append_inline(text);
    }
}

#[derive(Debug)]
pub struct FlattenedCellState {
    text: TextAccumulator,
    base_font: FontAttributes,
    target: ImageTarget,
}

impl FlattenedCellState {
    pub fn new(base_font: FontAttributes, target: ImageTarget) -> Self {
        FlattenedCellState {
            text: TextAccumulator::new(),
            base_font,
            target,
        }
    }

    pub fn handle(&mut self, ctx: &mut Context, event: &Event<'_>) -> Result<Transition> {
        match event {
            Event::StartTable(_) | Event::StartList(_) => Ok(Transition::Push(
                Handler::FlattenedTable(FlattenedTableState::new(self.base_font.clone(), self.target)),
            )),
            Event::StartContainer(_) | Event::EndContainer(_) => Ok(Transition::Stay),
            Event::EndCell(_) => Ok(Transition::Pop(Outcome::Text(std::mem::take(&mut self.text)))),
            leaf if leaf.is_leaf() => {
                append_leaf(ctx, &mut self.text, &self.base_font, self.target, leaf)?;
                Ok(Transition::Stay)
            }
            other => Err(unexpected("FlattenedCell", other)),
        }
    }

    pub fn append(&mut self, text: TextAccumulator) {
        self.text.append_block(text);
    }
}
