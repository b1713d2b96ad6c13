//! Handler state machine
//!
//! Every content event goes to the handler on top of the stack. A handler
//! either absorbs the event, pushes a child handler for a construct that opens,
//! or pops itself when its construct closes, handing an [`Outcome`] to the
//! parent. The page handler sits at the bottom for the whole document.

pub mod cell;
pub mod flattened;
pub mod list;
pub mod page;
pub mod table;
pub mod top_level;

use crate::config::EmitterConfig;
use crate::content::{
    BandContent, CellContent, ContainerContent, ContentMeta, DataContent, ForeignContent,
    GroupContent, ImageContent, ListContent, PageContent, RowContent, TableContent, TextContent,
};
use crate::error::{EmitterError, Result};
use crate::grid::{Area, GridState, ImageFetcher, TextAccumulator};
use crate::style::{FontAttributes, FontCache, StyleCache, StyleProperties};
use crate::types::{CellRange, FontHandle, StyleHandle};
use crate::units;
use crate::workbook::{sanitize_defined_name, NamedRange, Sheet, Workbook};
use std::sync::Arc;

pub use cell::CellState;
pub use flattened::{FlattenedCellState, FlattenedRowState, FlattenedTableState};
pub use list::ListState;
pub use page::PageState;
pub use table::{RowState, TableState};
pub use top_level::TopLevelContentState;

/// One content callback with the node it carries
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    StartPage(&'a PageContent),
    EndPage(&'a PageContent),
    StartTable(&'a TableContent),
    EndTable(&'a TableContent),
    StartTableBand(&'a BandContent),
    EndTableBand(&'a BandContent),
    StartTableGroup(&'a GroupContent),
    EndTableGroup(&'a GroupContent),
    StartRow(&'a RowContent),
    EndRow(&'a RowContent),
    StartCell(&'a CellContent),
    EndCell(&'a CellContent),
    StartList(&'a ListContent),
    EndList(&'a ListContent),
    StartListBand(&'a BandContent),
    EndListBand(&'a BandContent),
    StartListGroup(&'a GroupContent),
    EndListGroup(&'a GroupContent),
    StartContainer(&'a ContainerContent),
    EndContainer(&'a ContainerContent),
    Text(&'a TextContent),
    Label(&'a TextContent),
    AutoText(&'a TextContent),
    Foreign(&'a ForeignContent),
    Data(&'a DataContent),
    Image(&'a ImageContent),
}

impl Event<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Event::StartPage(_) => "start_page",
            Event::EndPage(_) => "end_page",
            Event::StartTable(_) => "start_table",
            Event::EndTable(_) => "end_table",
            Event::StartTableBand(_) => "start_table_band",
            Event::EndTableBand(_) => "end_table_band",
            Event::StartTableGroup(_) => "start_table_group",
            Event::EndTableGroup(_) => "end_table_group",
            Event::StartRow(_) => "start_row",
            Event::EndRow(_) => "end_row",
            Event::StartCell(_) => "start_cell",
            Event::EndCell(_) => "end_cell",
            Event::StartList(_) => "start_list",
            Event::EndList(_) => "end_list",
            Event::StartListBand(_) => "start_list_band",
            Event::EndListBand(_) => "end_list_band",
            Event::StartListGroup(_) => "start_list_group",
            Event::EndListGroup(_) => "end_list_group",
            Event::StartContainer(_) => "start_container",
            Event::EndContainer(_) => "end_container",
            Event::Text(_) => "start_text",
            Event::Label(_) => "start_label",
            Event::AutoText(_) => "start_auto_text",
            Event::Foreign(_) => "start_foreign",
            Event::Data(_) => "start_data",
            Event::Image(_) => "start_image",
        }
    }

    /// Text, label, auto-text, foreign, data and image events
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Event::Text(_)
                | Event::Label(_)
                | Event::AutoText(_)
                | Event::Foreign(_)
                | Event::Data(_)
                | Event::Image(_)
        )
    }

    /// Whether a leaf is laid out inline
    pub fn is_inline(&self) -> bool {
        self.meta().map_or(false, |m| m.style.is_inline())
    }

    pub fn meta(&self) -> Option<&ContentMeta> {
        let meta = match self {
            Event::StartPage(c) | Event::EndPage(c) => &c.meta,
            Event::StartTable(c) | Event::EndTable(c) => &c.meta,
            Event::StartTableBand(c)
            | Event::EndTableBand(c)
            | Event::StartListBand(c)
            | Event::EndListBand(c) => &c.meta,
            Event::StartTableGroup(c)
            | Event::EndTableGroup(c)
            | Event::StartListGroup(c)
            | Event::EndListGroup(c) => &c.meta,
            Event::StartRow(c) | Event::EndRow(c) => &c.meta,
            Event::StartCell(c) | Event::EndCell(c) => &c.meta,
            Event::StartList(c) | Event::EndList(c) => &c.meta,
            Event::StartContainer(c) | Event::EndContainer(c) => &c.meta,
            Event::Text(c) | Event::Label(c) | Event::AutoText(c) => &c.meta,
            Event::Foreign(c) => &c.meta,
            Event::Data(c) => &c.meta,
            Event::Image(c) => &c.meta,
        };
        Some(meta)
    }
}

/// The unreachable-state error for an event a handler has no rule for
pub fn unexpected(handler: &'static str, event: &Event<'_>) -> EmitterError {
    EmitterError::UnexpectedEvent {
        handler,
        event: event.name(),
    }
}

/// What a handler hands its parent when it pops
#[derive(Debug)]
pub enum Outcome {
    Done,
    /// A table or list row closed, using `rows` grid rows (0 when elided)
    Row { rows: u32, header: bool },
    /// A table cell closed
    Cell(cell::CellOutcome),
    /// A promoted nested table closed after using `rows` grid rows
    NestedTable { rows: u32 },
    /// Flattened content to append to the enclosing text
    Text(TextAccumulator),
}

/// Result of handling one event
#[derive(Debug)]
pub enum Transition {
    Stay,
    Push(Handler),
    /// Push and hand the same event to the new handler
    Delegate(Handler),
    Pop(Outcome),
    /// Pop and hand the same event to the parent
    Redeliver(Outcome),
}

/// One layout context per open construct
#[derive(Debug)]
pub enum Handler {
    Page(PageState),
    TopLevelTable(TableState),
    TopLevelRow(RowState),
    TopLevelCell(CellState),
    NestedTable(TableState),
    NestedRow(RowState),
    NestedCell(CellState),
    FlattenedTable(FlattenedTableState),
    FlattenedRow(FlattenedRowState),
    FlattenedCell(FlattenedCellState),
    List(ListState),
    ListBand(ListState),
    ListGroup(ListState),
    TopLevelContent(TopLevelContentState),
}

impl Handler {
    pub fn name(&self) -> &'static str {
        match self {
            Handler::Page(_) => "Page",
            Handler::TopLevelTable(_) => "TopLevelTable",
            Handler::TopLevelRow(_) => "TopLevelRow",
            Handler::TopLevelCell(_) => "TopLevelCell",
            Handler::NestedTable(_) => "NestedTable",
            Handler::NestedRow(_) => "NestedRow",
            Handler::NestedCell(_) => "NestedCell",
            Handler::FlattenedTable(_) => "FlattenedTable",
            Handler::FlattenedRow(_) => "FlattenedRow",
            Handler::FlattenedCell(_) => "FlattenedCell",
            Handler::List(_) => "List",
            Handler::ListBand(_) => "ListBand",
            Handler::ListGroup(_) => "ListGroup",
            Handler::TopLevelContent(_) => "TopLevelContent",
        }
    }

    fn handle(&mut self, ctx: &mut Context, event: &Event<'_>) -> Result<Transition> {
        let name = self.name();
        match self {
            Handler::Page(state) => state.handle(ctx, event),
            Handler::TopLevelTable(state) | Handler::NestedTable(state) => {
                state.handle(ctx, event, name)
            }
            Handler::TopLevelRow(state) | Handler::NestedRow(state) => {
                state.handle(ctx, event, name)
            }
            Handler::TopLevelCell(state) | Handler::NestedCell(state) => {
                state.handle(ctx, event, name)
            }
            Handler::FlattenedTable(state) => state.handle(ctx, event),
            Handler::FlattenedRow(state) => state.handle(ctx, event),
            Handler::FlattenedCell(state) => state.handle(ctx, event),
            Handler::List(state) | Handler::ListBand(state) | Handler::ListGroup(state) => {
                state.handle(ctx, event, name)
            }
            Handler::TopLevelContent(state) => state.handle(ctx, event),
        }
    }

    fn resume(&mut self, ctx: &mut Context, outcome: Outcome) -> Result<()> {
        let name = self.name();
        match (self, outcome) {
            (_, Outcome::Done) => Ok(()),
            (Handler::TopLevelTable(state) | Handler::NestedTable(state), Outcome::Row { rows, header }) => {
                state.row_closed(ctx, rows, header);
                Ok(())
            }
            (Handler::TopLevelRow(state) | Handler::NestedRow(state), Outcome::Cell(cell)) => {
                state.cell_closed(cell);
                Ok(())
            }
            (Handler::TopLevelCell(state) | Handler::NestedCell(state), Outcome::NestedTable { rows }) => {
                state.nested_table_closed(rows);
                Ok(())
            }
            (Handler::TopLevelCell(state) | Handler::NestedCell(state), Outcome::Text(text)) => {
                state.flattened_closed(text);
                Ok(())
            }
            (Handler::FlattenedTable(state), Outcome::Text(text)) => {
                state.append(text);
                Ok(())
            }
            (Handler::FlattenedRow(state), Outcome::Text(text)) => {
                state.append(text);
                Ok(())
            }
            (Handler::FlattenedCell(state), Outcome::Text(text)) => {
                state.append(text);
                Ok(())
            }
            (_, outcome) => Err(EmitterError::UnexpectedEvent {
                handler: name,
                event: outcome.name(),
            }),
        }
    }
}

impl Outcome {
    fn name(&self) -> &'static str {
        match self {
            Outcome::Done => "done",
            Outcome::Row { .. } => "row_closed",
            Outcome::Cell(_) => "cell_closed",
            Outcome::NestedTable { .. } => "nested_table_closed",
            Outcome::Text(_) => "flattened_closed",
        }
    }
}

/// Stack of open layout contexts
#[derive(Debug)]
pub struct HandlerStack {
    frames: Vec<Handler>,
}

impl HandlerStack {
    /// A stack holding only the page handler
    pub fn new() -> Self {
        HandlerStack {
            frames: vec![Handler::Page(PageState::new())],
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn top_name(&self) -> &'static str {
        self.frames.last().map_or("None", Handler::name)
    }

    /// Route an event to the active handler and apply the transition
    pub fn dispatch(&mut self, ctx: &mut Context, event: Event<'_>) -> Result<()> {
        loop {
            let top = self
                .frames
                .last_mut()
                .ok_or_else(|| unexpected("None", &event))?;
            log::log!(ctx.config.trace_level(), "{} <- {}", top.name(), event.name());
            match top.handle(ctx, &event)? {
                Transition::Stay => return Ok(()),
                Transition::Push(handler) => {
                    log::debug!("push {}", handler.name());
                    self.frames.push(handler);
                    return Ok(());
                }
                Transition::Delegate(handler) => {
                    log::debug!("push {}", handler.name());
                    self.frames.push(handler);
                }
                Transition::Pop(outcome) => {
                    self.pop(ctx, outcome)?;
                    return Ok(());
                }
                Transition::Redeliver(outcome) => self.pop(ctx, outcome)?,
            }
        }
    }

    fn pop(&mut self, ctx: &mut Context, outcome: Outcome) -> Result<()> {
        if self.frames.len() < 2 {
            return Err(EmitterError::UnexpectedEvent {
                handler: self.top_name(),
                event: "pop",
            });
        }
        if let Some(done) = self.frames.pop() {
            log::debug!("pop {}", done.name());
        }
        match self.frames.last_mut() {
            Some(parent) => parent.resume(ctx, outcome),
            None => Ok(()),
        }
    }
}

impl Default for HandlerStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Document-wide state shared by all handlers
pub struct Context {
    pub config: EmitterConfig,
    pub workbook: Workbook,
    pub styles: StyleCache,
    pub fonts: FontCache,
    pub grid: GridState,
    /// Printable page width, for percentage column widths
    pub page_width_mm: Option<f64>,
    /// Blank-row removal set on the current page
    pub page_remove_blank_rows: Option<bool>,
    fetcher: Option<Arc<dyn ImageFetcher>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("workbook", &self.workbook)
            .field("grid", &self.grid)
            .finish()
    }
}

impl Context {
    pub fn new(config: EmitterConfig, workbook: Workbook) -> Self {
        let fonts = FontCache::new(&workbook);
        let styles = StyleCache::new(&fonts);
        let fetcher = config.image_fetcher.clone();
        Context {
            config,
            workbook,
            styles,
            fonts,
            grid: GridState::new(),
            page_width_mm: None,
            page_remove_blank_rows: None,
            fetcher,
        }
    }

    pub fn fetcher(&self) -> Option<&dyn ImageFetcher> {
        self.fetcher.as_deref()
    }

    /// The sheet content is written to
    pub fn sheet_mut(&mut self, event: &'static str) -> Result<&mut Sheet> {
        let index = self.grid.sheet().ok_or(EmitterError::NoActiveSheet(event))?;
        self.workbook
            .sheet_mut(index)
            .ok_or(EmitterError::NoActiveSheet(event))
    }

    pub fn sheet(&self) -> Option<&Sheet> {
        self.grid.sheet().and_then(|i| self.workbook.sheet(i))
    }

    pub fn style_handle(&mut self, props: &StyleProperties) -> Result<StyleHandle> {
        self.styles
            .get_style(props, &mut self.workbook, &mut self.fonts)
    }

    pub fn font_handle(&mut self, attrs: &FontAttributes) -> Result<FontHandle> {
        self.fonts.get_font(attrs, &mut self.workbook)
    }

    /// Width in pixels of `count` columns starting at `col`
    pub fn columns_width_px(&self, col: u32, count: u32) -> u32 {
        (col..col + count.max(1))
            .map(|c| {
                let units = self
                    .sheet()
                    .map_or(units::DEFAULT_COLUMN_WIDTH_UNITS, |s| s.column_width(c));
                units::width_units_to_pixels(units)
            })
            .sum()
    }

    /// Register a bookmark as a workbook-scoped name over `area`
    pub fn add_bookmark(&mut self, bookmark: &str, area: Area) {
        let Some(sheet) = self.grid.sheet() else {
            return;
        };
        match sanitize_defined_name(bookmark) {
            Some(name) => self.workbook.add_defined_name(NamedRange {
                name,
                sheet,
                range: CellRange::new(area.top, area.left, area.bottom, area.right),
            }),
            None => log::warn!("Bookmark '{}' cannot be used as a name", bookmark),
        }
    }

    /// Grow a row to at least `points`, keeping any larger height already set
    pub fn raise_row_height(&mut self, row: u32, points: f64) -> Result<()> {
        let sheet = self.sheet_mut("row_height")?;
        let current = sheet.row(row).and_then(|r| r.height);
        if current.map_or(true, |h| points > h) {
            sheet.set_row_height(row, points)?;
        }
        Ok(())
    }

    /// Whether blank rows are dropped on the current page
    pub fn remove_blank_rows(&self) -> bool {
        self.page_remove_blank_rows
            .unwrap_or(self.config.remove_blank_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::workbook::flavor_for;

    pub(crate) fn context(format: OutputFormat) -> Context {
        let config = EmitterConfig::builder().with_format(format).build();
        let workbook = Workbook::new(flavor_for(format));
        Context::new(config, workbook)
    }

    #[test]
    fn test_page_handler_rejects_cells() {
        let mut ctx = context(OutputFormat::Xlsx);
        let mut stack = HandlerStack::new();
        let cell = CellContent::default();
        let err = stack.dispatch(&mut ctx, Event::StartCell(&cell)).unwrap_err();
        assert!(matches!(
            err,
            EmitterError::UnexpectedEvent {
                handler: "Page",
                event: "start_cell"
            }
        ));
    }

    #[test]
    fn test_content_before_page_has_no_sheet() {
        let mut ctx = context(OutputFormat::Xlsx);
        let mut stack = HandlerStack::new();
        let table = TableContent::with_columns(1);
        let err = stack.dispatch(&mut ctx, Event::StartTable(&table)).unwrap_err();
        assert!(matches!(err, EmitterError::NoActiveSheet(_)));
    }

    #[test]
    fn test_push_and_pop_track_nesting() {
        let mut ctx = context(OutputFormat::Xlsx);
        let mut stack = HandlerStack::new();
        let page = PageContent::default();
        let table = TableContent::with_columns(1);
        let row = RowContent::default();
        stack.dispatch(&mut ctx, Event::StartPage(&page)).unwrap();
        stack.dispatch(&mut ctx, Event::StartTable(&table)).unwrap();
        stack.dispatch(&mut ctx, Event::StartRow(&row)).unwrap();
        assert_eq!(stack.depth(), 3);
        assert_eq!(stack.top_name(), "TopLevelRow");
        stack.dispatch(&mut ctx, Event::EndRow(&row)).unwrap();
        stack.dispatch(&mut ctx, Event::EndTable(&table)).unwrap();
        assert_eq!(stack.depth(), 1);
    }
}
