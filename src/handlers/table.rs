//! Tables mapped onto real grid rows and columns

use super::cell::{CellOutcome, PendingMerge};
use super::{unexpected, CellState, Context, Event, Handler, Outcome, Transition};
use crate::config::{keys, parse_bool};
use crate::content::{BandKind, RowContent, StyleProperty, TableContent};
use crate::css::{self, CssLength};
use crate::error::Result;
use crate::grid::{Area, OPEN_END};
use crate::style::{BorderSide, Borders, StyleProperties};
use crate::types::{CellRange, CellRef, Rgb};
use crate::units;

/// Draw a bottom border under `left..=right` of `row`, keeping each cell's other attributes
pub(crate) fn apply_bottom_border(
    ctx: &mut Context,
    row: u32,
    left: u32,
    right: u32,
    side: BorderSide,
) -> Result<()> {
    for col in left..=right {
        let current = ctx.sheet().and_then(|s| s.cell(row, col)).map(|c| c.style);
        let mut props = current
            .and_then(|h| ctx.styles.properties(h))
            .cloned()
            .unwrap_or_else(|| StyleProperties::with_font(ctx.fonts.base().clone()));
        if props.borders.bottom.is_set() {
            continue;
        }
        props.borders.bottom = side;
        let style = ctx.style_handle(&props)?;
        ctx.sheet_mut("end_table")?.set_cell_style(row, col, style)?;
    }
    Ok(())
}

fn background(style: &crate::content::ComputedStyle, inherited: Option<Rgb>) -> Option<Rgb> {
    style
        .get(StyleProperty::BackgroundColor)
        .and_then(css::parse_color)
        .or(inherited)
}

/// An open table, top-level or nested in a cell
#[derive(Debug)]
pub struct TableState {
    nested: bool,
    col_offset: u32,
    columns: u32,
    start_row: u32,
    next_row: u32,
    last_row: Option<u32>,
    background: Option<Rgb>,
    borders: Borders,
    overlay: bool,
    header_band: bool,
    header_rows: u32,
    declared_header_rows: u32,
    freeze: bool,
    bookmark: Option<String>,
    groups: u32,
}

impl TableState {
    /// A table directly under the page or a list, starting at the grid cursor
    pub fn top_level(ctx: &mut Context, table: &TableContent, inherited: Option<Rgb>) -> Result<Self> {
        let row = ctx.grid.next_row();
        let page_width = ctx.page_width_mm;
        let sheet = ctx.sheet_mut("start_table")?;
        if let Some(name) = table.meta.user_property(keys::SHEET_NAME) {
            sheet.set_name(name);
        }
        // the first table to size a column keeps it
        for (index, column) in table.columns.iter().enumerate() {
            let Some(mm) = column
                .width
                .as_deref()
                .and_then(CssLength::parse)
                .and_then(|l| l.to_millimetres_relative(page_width))
            else {
                continue;
            };
            let col = index as u32;
            if !sheet.has_column_width(col) {
                sheet.set_column_width(col, units::millimetres_to_width_units(mm))?;
            }
        }
        Self::open(ctx, table, false, 0, row, inherited)
    }

    /// A table promoted to real cells inside the cell at (`row`, `col`)
    pub fn nested(
        ctx: &mut Context,
        table: &TableContent,
        col: u32,
        row: u32,
        inherited: Option<Rgb>,
    ) -> Result<Self> {
        Self::open(ctx, table, true, col, row, inherited)
    }

    fn open(
        ctx: &mut Context,
        table: &TableContent,
        nested: bool,
        col_offset: u32,
        start_row: u32,
        inherited: Option<Rgb>,
    ) -> Result<Self> {
        let columns = table.column_count().max(1) as u32;
        let borders = Borders::from_style(&table.meta.style);
        let overlay = ctx.grid.overlays.push(
            Area::new(start_row, col_offset, OPEN_END, col_offset + columns - 1),
            borders,
        );
        ctx.grid.push_spans();
        Ok(TableState {
            nested,
            col_offset,
            columns,
            start_row,
            next_row: start_row,
            last_row: None,
            background: background(&table.meta.style, inherited),
            borders,
            overlay,
            header_band: false,
            header_rows: 0,
            declared_header_rows: table.header_rows as u32,
            freeze: table
                .meta
                .user_property(keys::FREEZE_PANES)
                .and_then(parse_bool)
                .unwrap_or(false),
            bookmark: table.meta.bookmark.clone(),
            groups: 0,
        })
    }

    pub fn handle(&mut self, ctx: &mut Context, event: &Event<'_>, name: &'static str) -> Result<Transition> {
        match event {
            Event::StartRow(row) => {
                let state = RowState::new(ctx, row, self)?;
                Ok(Transition::Push(if self.nested {
                    Handler::NestedRow(state)
                } else {
                    Handler::TopLevelRow(state)
                }))
            }
            Event::StartTableBand(band) => {
                self.header_band = band.kind == BandKind::Header;
                Ok(Transition::Stay)
            }
            Event::EndTableBand(_) => {
                self.header_band = false;
                Ok(Transition::Stay)
            }
            Event::StartTableGroup(_) => {
                if !ctx.config.disable_grouping {
                    ctx.grid.enter_group();
                    self.groups += 1;
                }
                Ok(Transition::Stay)
            }
            Event::EndTableGroup(_) => {
                if self.groups > 0 {
                    ctx.grid.leave_group();
                    self.groups -= 1;
                }
                Ok(Transition::Stay)
            }
            Event::StartContainer(_) | Event::EndContainer(_) => Ok(Transition::Stay),
            Event::EndTable(_) => {
                self.close(ctx)?;
                Ok(Transition::Pop(if self.nested {
                    Outcome::NestedTable {
                        rows: self.next_row - self.start_row,
                    }
                } else {
                    Outcome::Done
                }))
            }
            other => Err(unexpected(name, other)),
        }
    }

    pub fn row_closed(&mut self, ctx: &mut Context, rows: u32, header: bool) {
        if rows > 0 {
            self.last_row = Some(self.next_row + rows - 1);
            self.next_row += rows;
            if header {
                self.header_rows += rows;
            }
        }
        if !self.nested {
            ctx.grid.advance_to(self.next_row);
        }
    }

    fn close(&mut self, ctx: &mut Context) -> Result<()> {
        if self.overlay {
            ctx.grid.overlays.pop();
        }
        ctx.grid.pop_spans();
        for _ in 0..self.groups {
            ctx.grid.leave_group();
        }
        self.groups = 0;

        let right = self.col_offset + self.columns - 1;
        if let Some(last) = self.last_row {
            if self.borders.bottom.is_set() {
                apply_bottom_border(ctx, last, self.col_offset, right, self.borders.bottom)?;
            }
            if let Some(bookmark) = &self.bookmark {
                ctx.add_bookmark(bookmark, Area::new(self.start_row, self.col_offset, last, right));
            }
        }
        if self.freeze && !self.nested {
            let header = if self.header_rows > 0 {
                self.header_rows
            } else {
                self.declared_header_rows
            };
            if header > 0 {
                let freeze = CellRef::new(self.start_row + header, 0);
                log::debug!("Freezing panes at {}", freeze.reference());
                ctx.sheet_mut("end_table")?.settings.freeze = Some(freeze);
            }
        }
        if !self.nested {
            ctx.grid.advance_to(self.next_row);
        }
        Ok(())
    }
}

/// An open table row
#[derive(Debug)]
pub struct RowState {
    row: u32,
    col_offset: u32,
    columns: u32,
    next_col: u32,
    nested: bool,
    header: bool,
    background: Option<Rgb>,
    explicit_height: Option<f64>,
    min_height: f64,
    extent: u32,
    has_content: bool,
    bookmark: Option<String>,
    bookmarked: bool,
    overlay: bool,
    remove_blank: bool,
    merges: Vec<PendingMerge>,
}

impl RowState {
    pub fn new(ctx: &mut Context, content: &RowContent, table: &TableState) -> Result<Self> {
        let row = table.next_row;
        ctx.sheet_mut("start_row")?
            .limits()
            .check(row, table.col_offset)?;
        let borders = Borders::from_style(&content.meta.style);
        let overlay = ctx.grid.overlays.push(
            Area::new(row, table.col_offset, row, table.col_offset + table.columns - 1),
            borders,
        );
        let explicit_height = content
            .meta
            .height
            .as_deref()
            .and_then(CssLength::parse)
            .and_then(|l| l.to_points());
        Ok(RowState {
            row,
            col_offset: table.col_offset,
            columns: table.columns,
            next_col: table.col_offset,
            nested: table.nested,
            header: table.header_band,
            background: background(&content.meta.style, table.background),
            explicit_height,
            min_height: 0.0,
            extent: 1,
            has_content: false,
            bookmark: content.meta.bookmark.clone(),
            bookmarked: false,
            overlay,
            remove_blank: content
                .meta
                .user_property(keys::REMOVE_BLANK_ROWS)
                .and_then(parse_bool)
                .unwrap_or_else(|| ctx.remove_blank_rows()),
            merges: Vec::new(),
        })
    }

    pub fn handle(&mut self, ctx: &mut Context, event: &Event<'_>, name: &'static str) -> Result<Transition> {
        match event {
            Event::StartCell(cell) => {
                let requested = match cell.column {
                    Some(column) => self.col_offset + column as u32,
                    None => self.next_col,
                };
                let col = ctx
                    .grid
                    .spans()
                    .map_or(requested, |s| s.next_free_column(self.row, requested));
                let state = CellState::new(ctx, cell, self.row, col, self.background)?;
                Ok(Transition::Push(if self.nested {
                    Handler::NestedCell(state)
                } else {
                    Handler::TopLevelCell(state)
                }))
            }
            Event::StartContainer(_) | Event::EndContainer(_) => Ok(Transition::Stay),
            Event::EndRow(_) => {
                let rows = self.finish(ctx)?;
                Ok(Transition::Pop(Outcome::Row {
                    rows,
                    header: self.header,
                }))
            }
            other => Err(unexpected(name, other)),
        }
    }

    pub fn cell_closed(&mut self, cell: CellOutcome) {
        self.next_col = self.next_col.max(cell.next_col);
        self.extent = self.extent.max(cell.rows);
        self.has_content |= cell.has_content;
        self.bookmarked |= cell.bookmarked;
        self.min_height = self.min_height.max(cell.min_height);
        if let Some(merge) = cell.merge {
            self.merges.push(merge);
        }
    }

    fn is_blank(&self, ctx: &Context) -> bool {
        !self.has_content
            && self.background.is_none()
            && !self.bookmarked
            && self.bookmark.is_none()
            && self.extent == 1
            && !self.nested
            && !ctx.grid.has_images_in_row(self.row)
            && !ctx.grid.row_spanned(self.row)
    }

    /// Close the row; returns the grid rows it uses, 0 when it was dropped
    fn finish(&mut self, ctx: &mut Context) -> Result<u32> {
        if self.overlay {
            ctx.grid.overlays.pop();
        }
        let row = self.row;
        if self.remove_blank && self.is_blank(ctx) {
            ctx.sheet_mut("end_row")?.remove_row(row);
            log::debug!("Dropped blank row {}", row);
            return Ok(0);
        }

        let last = row + self.extent - 1;
        let sheet = ctx.sheet_mut("end_row")?;
        sheet.ensure_row(row)?;
        for merge in self.merges.drain(..) {
            let mut area = merge.area;
            area.bottom = area.bottom.max(last);
            if area.top == area.bottom && area.left == area.right {
                continue;
            }
            sheet.add_merge(CellRange::new(area.top, area.left, area.bottom, area.right))?;
            if merge.fill {
                for r in area.top..=area.bottom {
                    for c in area.left..=area.right {
                        if (r, c) != (area.top, area.left) {
                            sheet.set_cell_style(r, c, merge.style)?;
                        }
                    }
                }
            }
        }

        let level = ctx.grid.outline_level();
        if level > 0 {
            let sheet = ctx.sheet_mut("end_row")?;
            for r in row..=last {
                sheet.set_outline_level(r, level)?;
            }
        }

        let height = match self.explicit_height {
            Some(explicit) => Some(explicit.max(self.min_height)),
            None => {
                let default = ctx.sheet().map_or(0.0, |s| s.default_row_height());
                (self.min_height > default).then_some(self.min_height)
            }
        };
        if let Some(points) = height {
            ctx.raise_row_height(row, points)?;
        }

        if let Some(bookmark) = &self.bookmark {
            let right = self.col_offset + self.columns - 1;
            ctx.add_bookmark(bookmark, Area::new(row, self.col_offset, last, right));
        }
        Ok(self.extent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::content::{CellContent, ContentMeta, DataContent, DataValue, PageContent, TextContent};
    use crate::handlers::tests::context;
    use crate::handlers::HandlerStack;
    use crate::types::CellValue;

    fn run(events: &[Event<'_>]) -> (Context, HandlerStack) {
        let mut ctx = context(OutputFormat::Xlsx);
        let mut stack = HandlerStack::new();
        for event in events {
            stack.dispatch(&mut ctx, *event).unwrap();
        }
        (ctx, stack)
    }

    #[test]
    fn test_blank_row_is_dropped() {
        let page = PageContent::default();
        let table = TableContent::with_columns(1);
        let row = RowContent::default();
        let cell = CellContent::default();
        let text = TextContent::new("kept");
        let (ctx, _) = run(&[
            Event::StartPage(&page),
            Event::StartTable(&table),
            Event::StartRow(&row),
            Event::StartCell(&cell),
            Event::EndCell(&cell),
            Event::EndRow(&row),
            Event::StartRow(&row),
            Event::StartCell(&cell),
            Event::Text(&text),
            Event::EndCell(&cell),
            Event::EndRow(&row),
            Event::EndTable(&table),
        ]);
        let sheet = ctx.sheet().unwrap();
        assert_eq!(sheet.row_count(), 1);
        assert_eq!(sheet.cell(0, 0).unwrap().value, CellValue::String("kept".into()));
        assert_eq!(ctx.grid.next_row(), 1);
    }

    #[test]
    fn test_bookmarked_blank_row_is_kept() {
        let page = PageContent::default();
        let table = TableContent::with_columns(1);
        let row = RowContent {
            meta: ContentMeta::default().with_bookmark("anchor"),
        };
        let cell = CellContent::default();
        let (ctx, _) = run(&[
            Event::StartPage(&page),
            Event::StartTable(&table),
            Event::StartRow(&row),
            Event::StartCell(&cell),
            Event::EndCell(&cell),
            Event::EndRow(&row),
            Event::EndTable(&table),
        ]);
        assert_eq!(ctx.grid.next_row(), 1);
        assert_eq!(ctx.workbook.defined_names()[0].name, "anchor");
    }

    #[test]
    fn test_column_span_merges_once() {
        let page = PageContent::default();
        let table = TableContent::with_columns(3);
        let row = RowContent::default();
        let wide = CellContent::spanning(2, 1);
        let narrow = CellContent::default();
        let value = DataContent::new(DataValue::Number(5.0));
        let (ctx, _) = run(&[
            Event::StartPage(&page),
            Event::StartTable(&table),
            Event::StartRow(&row),
            Event::StartCell(&wide),
            Event::Data(&value),
            Event::EndCell(&wide),
            Event::StartCell(&narrow),
            Event::Data(&value),
            Event::EndCell(&narrow),
            Event::EndRow(&row),
            Event::EndTable(&table),
        ]);
        let sheet = ctx.sheet().unwrap();
        assert_eq!(sheet.merges(), &[CellRange::new(0, 0, 0, 1)]);
        assert!(sheet.cell(0, 1).is_none());
        assert_eq!(sheet.cell(0, 2).unwrap().value, CellValue::Number(5.0));
    }

    #[test]
    fn test_row_span_shifts_next_row_cells() {
        let page = PageContent::default();
        let table = TableContent::with_columns(2);
        let row = RowContent::default();
        let tall = CellContent::spanning(1, 2);
        let cell = CellContent::default();
        let a = TextContent::new("a");
        let b = TextContent::new("b");
        let c = TextContent::new("c");
        let (ctx, _) = run(&[
            Event::StartPage(&page),
            Event::StartTable(&table),
            Event::StartRow(&row),
            Event::StartCell(&tall),
            Event::Text(&a),
            Event::EndCell(&tall),
            Event::StartCell(&cell),
            Event::Text(&b),
            Event::EndCell(&cell),
            Event::EndRow(&row),
            Event::StartRow(&row),
            Event::StartCell(&cell),
            Event::Text(&c),
            Event::EndCell(&cell),
            Event::EndRow(&row),
            Event::EndTable(&table),
        ]);
        let sheet = ctx.sheet().unwrap();
        assert_eq!(sheet.cell(1, 1).unwrap().value, CellValue::String("c".into()));
        assert_eq!(sheet.merges(), &[CellRange::new(0, 0, 1, 0)]);
    }

    #[test]
    fn test_table_bottom_border_lands_on_last_row() {
        let page = PageContent::default();
        let mut table = TableContent::with_columns(1);
        table.meta = ContentMeta::default()
            .with_style(StyleProperty::BorderBottomStyle, "solid")
            .with_style(StyleProperty::BorderTopStyle, "solid");
        let row = RowContent::default();
        let cell = CellContent::default();
        let text = TextContent::new("x");
        let (ctx, _) = run(&[
            Event::StartPage(&page),
            Event::StartTable(&table),
            Event::StartRow(&row),
            Event::StartCell(&cell),
            Event::Text(&text),
            Event::EndCell(&cell),
            Event::EndRow(&row),
            Event::StartRow(&row),
            Event::StartCell(&cell),
            Event::Text(&text),
            Event::EndCell(&cell),
            Event::EndRow(&row),
            Event::EndTable(&table),
        ]);
        let sheet = ctx.sheet().unwrap();
        let first = ctx.styles.properties(sheet.cell(0, 0).unwrap().style).unwrap();
        assert!(first.borders.top.is_set());
        assert!(!first.borders.bottom.is_set());
        let last = ctx.styles.properties(sheet.cell(1, 0).unwrap().style).unwrap();
        assert!(!last.borders.top.is_set());
        assert!(last.borders.bottom.is_set());
    }

    #[test]
    fn test_explicit_height_is_a_floor() {
        let page = PageContent::default();
        let table = TableContent::with_columns(1);
        let row = RowContent {
            meta: ContentMeta::default().with_height("30pt"),
        };
        let cell = CellContent::default();
        let text = TextContent::new("one\ntwo\nthree\nfour");
        let (ctx, _) = run(&[
            Event::StartPage(&page),
            Event::StartTable(&table),
            Event::StartRow(&row),
            Event::StartCell(&cell),
            Event::Text(&text),
            Event::EndCell(&cell),
            Event::EndRow(&row),
            Event::EndTable(&table),
        ]);
        // four 11pt lines need 52.8pt
        let height = ctx.sheet().unwrap().row_height(0);
        assert!((height - 52.8).abs() < 1e-9);
    }
}
