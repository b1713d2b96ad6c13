//! Pages: one sheet each, unless everything goes to a single sheet

use super::list::ListKind;
use super::{unexpected, Context, Event, Handler, ListState, TableState, TopLevelContentState, Transition};
use crate::config::{keys, parse_bool, EmitterConfig};
use crate::content::{Orientation, PageContent, PageMargins as ContentMargins, PageRegion};
use crate::css::CssLength;
use crate::error::Result;
use crate::grid::image;
use crate::grid::text::widest_line;
use crate::types::{CellValue, StyleHandle};
use crate::units;
use crate::workbook::{PageMargins, SheetSettings};
use std::collections::BTreeMap;

/// Extra width units added to computed column widths
const AUTO_WIDTH_PADDING: u32 = 512;

/// Characters assumed for a date cell when sizing columns
const DATE_WIDTH_CHARS: usize = 10;

/// Root handler; lives for the whole document
#[derive(Debug, Default)]
pub struct PageState {
    footer: Option<PageRegion>,
}

impl PageState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, ctx: &mut Context, event: &Event<'_>) -> Result<Transition> {
        match event {
            Event::StartPage(page) => {
                self.open_page(ctx, page)?;
                Ok(Transition::Stay)
            }
            Event::EndPage(_) => {
                self.close_page(ctx)?;
                Ok(Transition::Stay)
            }
            Event::StartTable(table) => Ok(Transition::Push(Handler::TopLevelTable(
                TableState::top_level(ctx, table, None)?,
            ))),
            Event::StartList(list) => Ok(Transition::Push(Handler::List(ListState::open(
                ctx,
                &list.meta,
                ListKind::List,
                None,
            )?))),
            Event::StartContainer(_) | Event::EndContainer(_) => Ok(Transition::Stay),
            leaf if leaf.is_leaf() => Ok(Transition::Delegate(Handler::TopLevelContent(
                TopLevelContentState::new(ctx, None)?,
            ))),
            other => Err(unexpected("Page", other)),
        }
    }

    fn open_page(&mut self, ctx: &mut Context, page: &PageContent) -> Result<()> {
        let reuse = ctx.config.single_sheet && ctx.grid.sheet().is_some();
        if !reuse {
            let name = page
                .meta
                .user_property(keys::SHEET_NAME)
                .map(str::to_string)
                .or_else(|| {
                    if ctx.workbook.sheets().is_empty() {
                        ctx.config.sheet_name.clone()
                    } else {
                        None
                    }
                })
                .or_else(|| page.name.clone());
            let index = ctx.workbook.add_sheet(name);
            ctx.grid.begin_sheet(index);
            log::info!("Started sheet {}", index + 1);
            let settings = page_settings(&ctx.config, page);
            ctx.sheet_mut("start_page")?.settings = settings;
        }
        ctx.page_width_mm = printable_width_mm(page);
        ctx.page_remove_blank_rows = page
            .meta
            .user_property(keys::REMOVE_BLANK_ROWS)
            .and_then(parse_bool);

        if ctx.config.structured_header {
            if let Some(header) = &page.header {
                write_region_row(ctx, header)?;
            }
            self.footer = page.footer.clone();
        }
        Ok(())
    }

    fn close_page(&mut self, ctx: &mut Context) -> Result<()> {
        if let Some(footer) = self.footer.take() {
            write_region_row(ctx, &footer)?;
        }
        place_images(ctx)?;
        if ctx.config.force_auto_col_widths {
            auto_column_widths(ctx)?;
        }
        Ok(())
    }
}

/// Print and display settings for a new sheet
fn page_settings(config: &EmitterConfig, page: &PageContent) -> SheetSettings {
    let meta = &page.meta;
    let flag = |key: &str, default: Option<bool>| {
        meta.user_property(key).and_then(parse_bool).or(default)
    };
    let number = |key: &str| {
        meta.user_property(key)
            .and_then(|v| v.trim().parse::<u16>().ok())
            .filter(|v| *v > 0)
    };
    let region = |region: &Option<PageRegion>| {
        if config.structured_header {
            return None;
        }
        region
            .as_ref()
            .filter(|r| !r.is_empty())
            .map(format_region)
    };
    SheetSettings {
        display_gridlines: flag(keys::DISPLAY_GRIDLINES, config.display_gridlines),
        display_row_col_headings: flag(
            keys::DISPLAY_ROW_COL_HEADINGS,
            config.display_row_col_headings,
        ),
        display_zeros: flag(keys::DISPLAY_ZEROS, config.display_zeros),
        display_formulas: flag(keys::DISPLAY_FORMULAS, config.display_formulas),
        paper_size: page.page_type.as_deref().and_then(paper_size),
        landscape: page.orientation == Some(Orientation::Landscape),
        margins: margins(&page.margins),
        scale: number(keys::PRINT_SCALE).map(|s| s.clamp(10, 400)),
        fit_to_width: number(keys::PRINT_PAGES_WIDE),
        fit_to_height: number(keys::PRINT_PAGES_HIGH),
        header: region(&page.header),
        footer: region(&page.footer),
        freeze: None,
    }
}

/// Paper-size code for a paper name
pub fn paper_size(name: &str) -> Option<u16> {
    let code = match name.trim().to_ascii_lowercase().as_str() {
        "a4" => 9,
        "a3" => 8,
        "a5" => 11,
        "us-letter" | "letter" => 1,
        "us-legal" | "legal" => 5,
        other => {
            log::debug!("Unknown paper type '{}'", other);
            return None;
        }
    };
    Some(code)
}

fn length_inches(length: &Option<String>) -> Option<f64> {
    length
        .as_deref()
        .and_then(CssLength::parse)
        .and_then(|l| l.to_points())
        .map(|p| p / units::POINTS_PER_INCH)
}

fn margins(margins: &ContentMargins) -> Option<PageMargins> {
    let sides = [
        length_inches(&margins.top),
        length_inches(&margins.right),
        length_inches(&margins.bottom),
        length_inches(&margins.left),
    ];
    if sides.iter().all(Option::is_none) {
        return None;
    }
    let default = PageMargins::default();
    Some(PageMargins {
        top: sides[0].unwrap_or(default.top),
        right: sides[1].unwrap_or(default.right),
        bottom: sides[2].unwrap_or(default.bottom),
        left: sides[3].unwrap_or(default.left),
    })
}

/// Page width minus the side margins, in millimetres
fn printable_width_mm(page: &PageContent) -> Option<f64> {
    let width = page
        .page_width
        .as_deref()
        .and_then(CssLength::parse)
        .and_then(|l| l.to_millimetres())?;
    let default = PageMargins::default();
    let left = length_inches(&page.margins.left).unwrap_or(default.left);
    let right = length_inches(&page.margins.right).unwrap_or(default.right);
    let printable = width - (left + right) * units::MM_PER_INCH;
    (printable > 0.0).then_some(printable)
}

/// `&L..&C..&R..` form of a header or footer
pub fn format_region(region: &PageRegion) -> String {
    let mut out = String::new();
    for (code, part) in [("&L", &region.left), ("&C", &region.center), ("&R", &region.right)] {
        if let Some(text) = part.as_deref().filter(|t| !t.is_empty()) {
            out.push_str(code);
            out.push_str(&text.replace('&', "&&"));
        }
    }
    out
}

/// Header or footer as a sheet row: left, centre and right in the first three columns
fn write_region_row(ctx: &mut Context, region: &PageRegion) -> Result<()> {
    if region.is_empty() {
        return Ok(());
    }
    let row = ctx.grid.next_row();
    let sheet = ctx.sheet_mut("page_region")?;
    for (col, part) in [&region.left, &region.center, &region.right].into_iter().enumerate() {
        if let Some(text) = part.as_deref().filter(|t| !t.is_empty()) {
            sheet.set_cell(row, col as u32, CellValue::String(text.to_string()), StyleHandle::DEFAULT)?;
        }
    }
    ctx.grid.advance(1);
    Ok(())
}

/// Anchor every image deferred on this page; failures skip the image
fn place_images(ctx: &mut Context) -> Result<()> {
    for pending in ctx.grid.take_images() {
        let resolved = match image::resolve(&pending, ctx.fetcher()) {
            Ok(resolved) => resolved,
            Err(err) => {
                log::warn!("Skipping image at ({}, {}): {}", pending.row, pending.col, err);
                continue;
            }
        };
        let sheet = ctx.sheet_mut("end_page")?;
        if let Err(err) = image::place(sheet, &pending, resolved) {
            if err.is_fatal() {
                return Err(err);
            }
            log::warn!("Skipping image at ({}, {}): {}", pending.row, pending.col, err);
        }
    }
    Ok(())
}

/// Size columns to their widest unmerged value
fn auto_column_widths(ctx: &mut Context) -> Result<()> {
    let Some(sheet) = ctx.sheet() else {
        return Ok(());
    };
    let mut widest: BTreeMap<u32, usize> = BTreeMap::new();
    for (row, data) in sheet.rows() {
        for (col, cell) in &data.cells {
            if sheet
                .merges()
                .iter()
                .any(|m| !m.is_single() && m.contains(*row, *col))
            {
                continue;
            }
            let chars = match &cell.value {
                CellValue::Empty => continue,
                CellValue::DateTime(_) => DATE_WIDTH_CHARS,
                other => widest_line(&other.as_string()),
            };
            let entry = widest.entry(*col).or_default();
            *entry = (*entry).max(chars);
        }
    }
    let sheet = ctx.sheet_mut("end_page")?;
    for (col, chars) in widest {
        if chars == 0 {
            continue;
        }
        let width = (chars as u32 * units::WIDTH_UNITS_PER_CHAR + AUTO_WIDTH_PADDING)
            .min(units::MAX_WIDTH_UNITS);
        sheet.set_column_width(col, width)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::content::{CellContent, RowContent, TableContent, TextContent};
    use crate::handlers::tests::context;
    use crate::handlers::HandlerStack;

    #[test]
    fn test_paper_sizes() {
        assert_eq!(paper_size("A4"), Some(9));
        assert_eq!(paper_size("a3"), Some(8));
        assert_eq!(paper_size("a5"), Some(11));
        assert_eq!(paper_size("us-letter"), Some(1));
        assert_eq!(paper_size("us-legal"), Some(5));
        assert_eq!(paper_size("b5"), None);
    }

    #[test]
    fn test_region_format() {
        let region = PageRegion {
            left: Some("Q&A".into()),
            center: None,
            right: Some("Page".into()),
        };
        assert_eq!(format_region(&region), "&LQ&&A&RPage");
    }

    #[test]
    fn test_page_settings_overrides() {
        let config = EmitterConfig::builder().with_display_gridlines(true).build();
        let mut page = PageContent {
            page_type: Some("a4".into()),
            orientation: Some(Orientation::Landscape),
            ..Default::default()
        };
        page.margins.left = Some("1in".into());
        page.meta = page
            .meta
            .with_user_property(keys::DISPLAY_GRIDLINES, "false")
            .with_user_property(keys::PRINT_PAGES_WIDE, "1");
        let settings = page_settings(&config, &page);
        assert_eq!(settings.display_gridlines, Some(false));
        assert_eq!(settings.paper_size, Some(9));
        assert!(settings.landscape);
        assert_eq!(settings.fit_to_width, Some(1));
        assert!(settings.fit_to_page());
        let margins = settings.margins.unwrap();
        assert!((margins.left - 1.0).abs() < 1e-9);
        assert!((margins.top - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_printable_width() {
        let page = PageContent {
            page_width: Some("210mm".into()),
            margins: ContentMargins {
                left: Some("10mm".into()),
                right: Some("10mm".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let width = printable_width_mm(&page).unwrap();
        assert!((width - 190.0).abs() < 1e-6);
    }

    #[test]
    fn test_sheet_per_page_and_names() {
        let mut ctx = context(OutputFormat::Xlsx);
        ctx.config.sheet_name = Some("Summary".into());
        let mut stack = HandlerStack::new();
        let first = PageContent::default();
        let second = PageContent {
            name: Some("Detail".into()),
            ..Default::default()
        };
        for event in [
            Event::StartPage(&first),
            Event::EndPage(&first),
            Event::StartPage(&second),
            Event::EndPage(&second),
        ] {
            stack.dispatch(&mut ctx, event).unwrap();
        }
        let names: Vec<_> = ctx.workbook.sheets().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec![Some("Summary"), Some("Detail")]);
    }

    #[test]
    fn test_structured_header_rows() {
        let mut ctx = context(OutputFormat::Xlsx);
        ctx.config.structured_header = true;
        let mut stack = HandlerStack::new();
        let page = PageContent {
            header: Some(PageRegion {
                center: Some("Title".into()),
                ..Default::default()
            }),
            footer: Some(PageRegion {
                right: Some("Page 1".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let body = TextContent::new("body");
        for event in [Event::StartPage(&page), Event::Text(&body), Event::EndPage(&page)] {
            stack.dispatch(&mut ctx, event).unwrap();
        }
        let sheet = ctx.sheet().unwrap();
        assert_eq!(sheet.cell(0, 1).unwrap().value, CellValue::String("Title".into()));
        assert_eq!(sheet.cell(1, 0).unwrap().value, CellValue::String("body".into()));
        assert_eq!(sheet.cell(2, 2).unwrap().value, CellValue::String("Page 1".into()));
        assert_eq!(sheet.settings.header, None);
    }

    #[test]
    fn test_page_keeps_blank_rows() {
        let mut ctx = context(OutputFormat::Xlsx);
        let mut stack = HandlerStack::new();
        let mut page = PageContent::default();
        page.meta = page.meta.with_user_property(keys::REMOVE_BLANK_ROWS, "false");
        let table = TableContent::with_columns(1);
        let row = RowContent::default();
        let cell = CellContent::default();
        let text = TextContent::new("x");
        for event in [
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
            Event::EndPage(&page),
        ] {
            stack.dispatch(&mut ctx, event).unwrap();
        }
        assert!(!ctx.remove_blank_rows());
        let sheet = ctx.sheet().unwrap();
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.cell(1, 0).unwrap().value, CellValue::String("x".into()));

        let next = PageContent::default();
        stack.dispatch(&mut ctx, Event::StartPage(&next)).unwrap();
        assert!(ctx.remove_blank_rows());
    }

    #[test]
    fn test_auto_widths_skip_merges() {
        let mut ctx = context(OutputFormat::Xlsx);
        ctx.config.force_auto_col_widths = true;
        let mut stack = HandlerStack::new();
        let page = PageContent::default();
        let table = TableContent::with_columns(2);
        let row = RowContent::default();
        let wide = CellContent::spanning(2, 1);
        let cell = CellContent::default();
        let long = TextContent::new("a very long heading");
        let short = TextContent::new("abcd");
        for event in [
            Event::StartPage(&page),
            Event::StartTable(&table),
            Event::StartRow(&row),
            Event::StartCell(&wide),
            Event::Text(&long),
            Event::EndCell(&wide),
            Event::EndRow(&row),
            Event::StartRow(&row),
            Event::StartCell(&cell),
            Event::Text(&short),
            Event::EndCell(&cell),
            Event::EndRow(&row),
            Event::EndTable(&table),
            Event::EndPage(&page),
        ] {
            stack.dispatch(&mut ctx, event).unwrap();
        }
        let sheet = ctx.sheet().unwrap();
        assert_eq!(sheet.column_width(0), 4 * 256 + 512);
        assert!(!sheet.has_column_width(1));
    }
}
