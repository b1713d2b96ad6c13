//! Table cells and the leaf content they collect

use super::table::apply_bottom_border;
use super::{unexpected, Context, Event, FlattenedTableState, Handler, Outcome, TableState, Transition};
use crate::config::{keys, parse_bool};
use crate::content::{CellContent, ContentMeta, DataContent, DataValue, StyleProperty};
use crate::css::{self, CssLength};
use crate::error::Result;
use crate::grid::text::{strip_html, wrapped_text_height};
use crate::grid::{Area, CellImage, ImageSource, TextAccumulator, OPEN_END};
use crate::style::{
    infer_date_kind, translate_date_format, translate_number_format, DateKind, FontAttributes,
    StyleProperties,
};
use crate::style::number_format::{in_serial_range, serial_for};
use crate::types::{CellRange, CellValue, Rgb, StyleHandle};
use crate::units;

/// Grid position images of a leaf are anchored to
#[derive(Debug, Clone, Copy)]
pub struct ImageTarget {
    pub row: u32,
    pub col: u32,
    pub col_span: u32,
}

/// What one absorbed leaf carried besides its text
#[derive(Debug, Default)]
pub(crate) struct LeafInfo {
    pub bookmark: Option<String>,
    pub hyperlink: Option<String>,
    pub image: bool,
    /// Font the fragment was written with, if it produced text
    pub font: Option<FontAttributes>,
}

/// Append a leaf event to `acc`; `None` when the event is not a leaf
pub(crate) fn append_leaf(
    ctx: &mut Context,
    acc: &mut TextAccumulator,
    base_font: &FontAttributes,
    target: ImageTarget,
    event: &Event<'_>,
) -> Result<Option<LeafInfo>> {
    let meta = match event.meta() {
        Some(meta) if event.is_leaf() => meta,
        _ => return Ok(None),
    };
    let inline = meta.style.is_inline();
    let font = FontAttributes::from_style(&meta.style, base_font);
    let mut info = LeafInfo {
        bookmark: meta.bookmark.clone(),
        hyperlink: meta.hyperlink.clone(),
        ..Default::default()
    };

    match event {
        Event::Text(t) | Event::Label(t) | Event::AutoText(t) => {
            if !t.text.is_empty() {
                let handle = ctx.font_handle(&font)?;
                acc.append_text(&t.text, handle, inline);
                info.font = Some(font);
            }
        }
        Event::Foreign(f) => {
            let text = if f.raw_type.eq_ignore_ascii_case("html") {
                strip_html(&f.raw)
            } else {
                f.raw.trim().to_string()
            };
            if !text.is_empty() {
                let handle = ctx.font_handle(&font)?;
                acc.append_text(&text, handle, false);
                info.font = Some(font);
            }
        }
        Event::Data(d) => {
            if let Some(data) = data_value(d) {
                let handle = ctx.font_handle(&font)?;
                acc.append_value(data.value, &data.display, data.number_format, handle, inline);
                info.font = Some(font);
            }
        }
        Event::Image(img) => {
            let source = match (&img.data, &img.uri) {
                (Some(data), _) => ImageSource::Inline(data.clone()),
                (None, Some(uri)) => ImageSource::Uri(uri.clone()),
                (None, None) => {
                    log::warn!("Image at ({}, {}) has no data and no URI", target.row, target.col);
                    return Ok(Some(info));
                }
            };
            let cell_width_px =
                (target.col_span > 1).then(|| ctx.columns_width_px(target.col, target.col_span));
            ctx.grid.defer_image(CellImage {
                row: target.row,
                col: target.col,
                source,
                mime_type: img.mime_type.clone(),
                intrinsic_size: img.intrinsic_size,
                declared_size: declared_size(meta, img.intrinsic_size),
                span_columns: ctx.config.images_span_columns,
                cell_width_px,
            });
            info.image = true;
        }
        _ => return Ok(None),
    }

    if info.font.is_some() {
        acc.negotiate_alignment(meta.style.get(StyleProperty::TextAlign).map(css::parse_text_align));
    }
    Ok(Some(info))
}

/// Pixel size requested through the node's width and height
fn declared_size(meta: &ContentMeta, intrinsic: Option<(u32, u32)>) -> Option<(u32, u32)> {
    let px = |length: &Option<String>| {
        length
            .as_deref()
            .and_then(CssLength::parse)
            .and_then(|l| l.to_points())
            .map(|p| units::points_to_pixels(p).round() as u32)
            .filter(|p| *p > 0)
    };
    let scale = |value: u32, num: u32, den: u32| ((value as u64 * num as u64) / den.max(1) as u64) as u32;
    match (px(&meta.width), px(&meta.height)) {
        (Some(w), Some(h)) => Some((w, h)),
        (Some(w), None) => intrinsic.map(|(iw, ih)| (w, scale(ih, w, iw).max(1))),
        (None, Some(h)) => intrinsic.map(|(iw, ih)| (scale(iw, h, ih).max(1), h)),
        (None, None) => None,
    }
}

/// A data item converted to a cell value
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DataCell {
    pub value: CellValue,
    pub display: String,
    pub number_format: Option<String>,
}

/// Convert a data item; `None` for a null value with no display text
pub(crate) fn data_value(data: &DataContent) -> Option<DataCell> {
    let style = &data.meta.style;
    let number_format = style
        .get(StyleProperty::NumberFormat)
        .and_then(translate_number_format);
    let display = |value: &CellValue| {
        if data.text.is_empty() {
            value.as_string()
        } else {
            data.text.clone()
        }
    };

    if let Some(formula) = formula_text(data) {
        return Some(DataCell {
            display: format!("={}", formula),
            value: CellValue::Formula(formula),
            number_format,
        });
    }

    let (value, number_format) = match &data.value {
        DataValue::Null if data.text.is_empty() => return None,
        DataValue::Null => (CellValue::String(data.text.clone()), None),
        DataValue::Number(n) if n.is_finite() => (CellValue::Number(*n), number_format),
        DataValue::Number(n) => (CellValue::String(n.to_string()), None),
        DataValue::Integer(i) => (CellValue::Number(*i as f64), number_format),
        DataValue::Boolean(b) => (CellValue::Bool(*b), None),
        DataValue::String(s) => (CellValue::String(s.clone()), None),
        DataValue::DateTime(dt) => {
            let explicit = [
                (StyleProperty::DateTimeFormat, DateKind::DateTime),
                (StyleProperty::DateFormat, DateKind::Date),
                (StyleProperty::TimeFormat, DateKind::Time),
            ]
            .into_iter()
            .find_map(|(prop, kind)| {
                style
                    .get(prop)
                    .and_then(translate_date_format)
                    .map(|code| (code, kind))
            });
            let (code, kind) = explicit.unwrap_or_else(|| {
                let kind = infer_date_kind(dt);
                (kind.default_format().to_string(), kind)
            });
            if kind != DateKind::Time && !in_serial_range(dt) {
                let text = if data.text.is_empty() {
                    dt.to_rfc3339()
                } else {
                    data.text.clone()
                };
                log::debug!("Date {} outside the serial range, written as text", text);
                (CellValue::String(text), None)
            } else {
                (CellValue::DateTime(serial_for(dt, kind)), Some(code))
            }
        }
    };
    Some(DataCell {
        display: display(&value),
        value,
        number_format,
    })
}

/// Formula requested through the formula user property
///
/// A boolean `true` takes the formula from the item's text; any other value is
/// the formula itself.
fn formula_text(data: &DataContent) -> Option<String> {
    let prop = data.meta.user_property(keys::FORMULA)?;
    let raw = match parse_bool(prop) {
        Some(false) => return None,
        Some(true) if data.text.is_empty() => match &data.value {
            DataValue::String(s) => s.clone(),
            _ => return None,
        },
        Some(true) => data.text.clone(),
        None => prop.to_string(),
    };
    let formula = raw.trim().trim_start_matches('=').trim();
    (!formula.is_empty()).then(|| formula.to_string())
}

/// Final value and style of accumulated content
#[derive(Debug)]
pub(crate) struct Settled {
    pub value: Option<CellValue>,
    pub props: StyleProperties,
    pub text: String,
}

pub(crate) fn settle(
    mut props: StyleProperties,
    text: TextAccumulator,
    first_font: Option<FontAttributes>,
) -> Settled {
    if text.single_font().is_some() {
        if let Some(font) = first_font {
            props.font = font;
        }
    }
    if let Some(align) = text.alignment() {
        props.horizontal_align = Some(align);
    }
    if let Some(code) = text.number_format() {
        props.number_format = Some(code.to_string());
    }
    let display = text.text().to_string();
    let value = text.finish().filter(|v| !v.is_empty());
    if value.as_ref().map_or(false, CellValue::is_text) && display.contains('\n') && props.wrap.is_none() {
        props.wrap = Some(true);
    }
    Settled {
        value,
        props,
        text: display,
    }
}

/// Row height the settled text needs across `col_span` columns, 0 when none
pub(crate) fn text_height(ctx: &Context, settled: &Settled, col: u32, col_span: u32) -> f64 {
    let is_text = settled.value.as_ref().map_or(false, CellValue::is_text);
    let wraps = col_span > 1 || settled.text.contains('\n') || settled.props.wrap == Some(true);
    if !is_text || !wraps || settled.props.wrap == Some(false) {
        return 0.0;
    }
    let size = settled
        .props
        .font
        .size
        .unwrap_or_else(|| ctx.workbook.flavor().default_font_size());
    wrapped_text_height(&settled.text, size, ctx.columns_width_px(col, col_span) as f64)
}

/// Rotation in degrees from the rotation user property
pub(crate) fn rotation(meta: &ContentMeta) -> Option<i16> {
    meta.user_property(keys::ROTATION)
        .and_then(|v| v.trim().parse::<i16>().ok())
        .map(|d| d.clamp(-90, 90))
}

/// Merge to create when the row closes
#[derive(Debug, Clone, Copy)]
pub struct PendingMerge {
    pub area: Area,
    pub style: StyleHandle,
    /// Covered cells get the anchor's style
    pub fill: bool,
}

/// What a closed cell reports to its row
#[derive(Debug)]
pub struct CellOutcome {
    pub next_col: u32,
    /// Grid rows the cell occupies in its row, more than one when it hosts a nested table
    pub rows: u32,
    pub has_content: bool,
    pub bookmarked: bool,
    pub min_height: f64,
    pub merge: Option<PendingMerge>,
}

/// Content of one table cell, written when the cell closes
#[derive(Debug)]
pub struct CellState {
    row: u32,
    col: u32,
    col_span: u32,
    row_span: u32,
    child_count: usize,
    props: StyleProperties,
    base_font: FontAttributes,
    text: TextAccumulator,
    first_font: Option<FontAttributes>,
    bookmarks: Vec<String>,
    hyperlink: Option<String>,
    has_image: bool,
    nested_rows: Option<u32>,
    /// Own borders drawn around a promoted nested table
    overlay: bool,
    depth: u32,
}

impl CellState {
    pub fn new(
        ctx: &mut Context,
        cell: &CellContent,
        row: u32,
        col: u32,
        inherited: Option<Rgb>,
    ) -> Result<Self> {
        let col_span = cell.col_span.max(1) as u32;
        let row_span = cell.row_span.max(1) as u32;
        let page_width = ctx.page_width_mm;
        let sheet = ctx.sheet_mut("start_cell")?;
        sheet
            .limits()
            .check(row + row_span - 1, col + col_span - 1)?;
        if let Some(width) = cell
            .meta
            .user_property(keys::COLUMN_WIDTH)
            .and_then(CssLength::parse)
            .and_then(|l| l.to_millimetres_relative(page_width))
        {
            sheet.set_column_width(col, units::millimetres_to_width_units(width))?;
        }
        if row_span > 1 {
            if let Some(spans) = ctx.grid.spans_mut() {
                spans.register(Area::new(row, col, row + row_span - 1, col + col_span - 1));
            }
        }

        let base = ctx.fonts.base().clone();
        let mut props = StyleProperties::from_style(&cell.meta.style, &base);
        props.background = props.background.or(inherited);
        props.rotation = rotation(&cell.meta);
        Ok(CellState {
            row,
            col,
            col_span,
            row_span,
            child_count: cell.child_count,
            base_font: props.font.clone(),
            props,
            text: TextAccumulator::new(),
            first_font: None,
            bookmarks: cell.meta.bookmark.iter().cloned().collect(),
            hyperlink: cell.meta.hyperlink.clone(),
            has_image: false,
            nested_rows: None,
            overlay: false,
            depth: 0,
        })
    }

    fn target(&self) -> ImageTarget {
        ImageTarget {
            row: self.row,
            col: self.col,
            col_span: self.col_span,
        }
    }

    /// Whether a nested table can take over the cell's grid area
    fn can_promote(&self, columns: usize) -> bool {
        columns as u32 == self.col_span
            && self.child_count == 1
            && self.depth == 0
            && self.nested_rows.is_none()
            && self.text.is_empty()
            && !self.has_image
    }

    pub fn handle(&mut self, ctx: &mut Context, event: &Event<'_>, name: &'static str) -> Result<Transition> {
        match event {
            Event::StartContainer(_) => {
                self.depth += 1;
                Ok(Transition::Stay)
            }
            Event::EndContainer(_) => {
                self.depth = self.depth.saturating_sub(1);
                Ok(Transition::Stay)
            }
            Event::StartTable(table) if self.can_promote(table.column_count()) => {
                self.overlay = ctx.grid.overlays.push(
                    Area::new(self.row, self.col, OPEN_END, self.col + self.col_span - 1),
                    self.props.borders,
                );
                let nested = TableState::nested(ctx, table, self.col, self.row, self.props.background)?;
                Ok(Transition::Push(Handler::NestedTable(nested)))
            }
            Event::StartTable(_) | Event::StartList(_) => Ok(Transition::Push(Handler::FlattenedTable(
                FlattenedTableState::new(self.base_font.clone(), self.target()),
            ))),
            Event::EndCell(_) => Ok(Transition::Pop(Outcome::Cell(self.finish(ctx)?))),
            leaf if leaf.is_leaf() => {
                let base = self.base_font.clone();
                let target = self.target();
                if let Some(info) = append_leaf(ctx, &mut self.text, &base, target, leaf)? {
                    self.absorb(info);
                }
                Ok(Transition::Stay)
            }
            other => Err(unexpected(name, other)),
        }
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

    pub fn nested_table_closed(&mut self, rows: u32) {
        self.nested_rows = Some(rows);
    }

    pub fn flattened_closed(&mut self, text: TextAccumulator) {
        self.text.append_block(text);
    }

    fn finish(&mut self, ctx: &mut Context) -> Result<CellOutcome> {
        let (row, col) = (self.row, self.col);
        let area = Area::new(row, col, row + self.row_span - 1, col + self.col_span - 1);
        let range = CellRange::new(area.top, area.left, area.bottom, area.right);
        for bookmark in &self.bookmarks {
            ctx.add_bookmark(bookmark, area);
        }
        let bookmarked = !self.bookmarks.is_empty();

        if let Some(rows) = self.nested_rows {
            if self.overlay {
                ctx.grid.overlays.pop();
                self.overlay = false;
            }
            let bottom = self.props.borders.bottom;
            if rows > 0 && bottom.is_set() {
                apply_bottom_border(ctx, row + rows - 1, col, col + self.col_span - 1, bottom)?;
            }
            return Ok(CellOutcome {
                next_col: col + self.col_span,
                rows: rows.max(1),
                has_content: rows > 0,
                bookmarked,
                min_height: 0.0,
                merge: None,
            });
        }

        let mut settled = settle(
            self.props.clone(),
            std::mem::take(&mut self.text),
            self.first_font.take(),
        );
        ctx.grid.overlays.apply(&area, &mut settled.props.borders);
        let style = ctx.style_handle(&settled.props)?;
        let min_height = if self.row_span == 1 {
            text_height(ctx, &settled, col, self.col_span)
        } else {
            0.0
        };
        let has_value = settled.value.is_some();

        let sheet = ctx.sheet_mut("end_cell")?;
        match settled.value {
            Some(value) => sheet.set_cell(row, col, value, style)?,
            None if style != StyleHandle::DEFAULT => sheet.set_cell_style(row, col, style)?,
            None => {}
        }
        if let Some(url) = &self.hyperlink {
            sheet.add_hyperlink(range, url.clone())?;
        }

        Ok(CellOutcome {
            next_col: col + self.col_span,
            rows: 1,
            has_content: has_value || settled.props.background.is_some() || self.has_image,
            bookmarked,
            min_height,
            merge: Some(PendingMerge {
                area,
                style,
                fill: settled.props.is_decorated(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn data(value: DataValue) -> DataContent {
        DataContent::new(value)
    }

    #[test]
    fn test_numbers_keep_their_format() {
        let mut item = data(DataValue::Number(0.25));
        item.meta.style.set(StyleProperty::NumberFormat, "Percent");
        let cell = data_value(&item).unwrap();
        assert_eq!(cell.value, CellValue::Number(0.25));
        assert_eq!(cell.number_format.as_deref(), Some("0.00%"));

        let cell = data_value(&data(DataValue::Integer(7))).unwrap();
        assert_eq!(cell.value, CellValue::Number(7.0));
        assert_eq!(cell.display, "7");
    }

    #[test]
    fn test_null_without_text_is_skipped() {
        assert!(data_value(&data(DataValue::Null)).is_none());
        let mut item = data(DataValue::Null);
        item.text = "n/a".into();
        assert_eq!(data_value(&item).unwrap().value, CellValue::String("n/a".into()));
    }

    #[test]
    fn test_dates_get_inferred_formats() {
        let tz = FixedOffset::east_opt(3600).unwrap();
        let midnight = tz.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let cell = data_value(&data(DataValue::DateTime(midnight))).unwrap();
        assert_eq!(cell.number_format.as_deref(), Some("yyyy-mm-dd"));
        assert!(matches!(cell.value, CellValue::DateTime(s) if (s - 45352.0).abs() < 1e-9));

        let time = tz.with_ymd_and_hms(1970, 1, 1, 6, 0, 0).unwrap();
        let cell = data_value(&data(DataValue::DateTime(time))).unwrap();
        assert_eq!(cell.number_format.as_deref(), Some("hh:mm:ss"));
        assert!(matches!(cell.value, CellValue::DateTime(s) if (s - 0.25).abs() < 1e-9));

        let mut item = data(DataValue::DateTime(midnight));
        item.meta.style.set(StyleProperty::DateFormat, "Short Date");
        assert_eq!(data_value(&item).unwrap().number_format.as_deref(), Some("m/d/yy"));
    }

    #[test]
    fn test_out_of_range_date_is_text() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let early = tz.with_ymd_and_hms(1850, 6, 1, 12, 0, 0).unwrap();
        let cell = data_value(&data(DataValue::DateTime(early))).unwrap();
        assert!(cell.value.is_text());
        assert_eq!(cell.number_format, None);
    }

    #[test]
    fn test_formula_property() {
        let mut item = data(DataValue::Number(3.0));
        item.text = "=SUM(A1:A2)".into();
        item.meta = item.meta.with_user_property(keys::FORMULA, "true");
        assert_eq!(
            data_value(&item).unwrap().value,
            CellValue::Formula("SUM(A1:A2)".into())
        );

        let mut item = data(DataValue::Null);
        item.meta = item.meta.with_user_property(keys::FORMULA, "=A1*2");
        assert_eq!(data_value(&item).unwrap().value, CellValue::Formula("A1*2".into()));

        let mut item = data(DataValue::Number(3.0));
        item.meta = item.meta.with_user_property(keys::FORMULA, "no");
        assert_eq!(data_value(&item).unwrap().value, CellValue::Number(3.0));
    }

    #[test]
    fn test_declared_size_keeps_aspect() {
        let meta = ContentMeta::default().with_width("96px");
        assert_eq!(declared_size(&meta, Some((192, 50))), Some((96, 25)));
        let meta = ContentMeta::default().with_width("1in").with_height("0.5in");
        assert_eq!(declared_size(&meta, None), Some((96, 48)));
        assert_eq!(declared_size(&ContentMeta::default(), Some((1, 1))), None);
    }

    #[test]
    fn test_promoted_table_keeps_host_borders() {
        use crate::config::OutputFormat;
        use crate::content::{PageContent, RowContent, TableContent, TextContent};
        use crate::handlers::tests::context;
        use crate::handlers::HandlerStack;

        let mut ctx = context(OutputFormat::Xlsx);
        let mut stack = HandlerStack::new();
        let page = PageContent::default();
        let outer = TableContent::with_columns(2);
        let inner = TableContent::with_columns(2);
        let row = RowContent::default();
        let mut host = CellContent::spanning(2, 1);
        host.meta = ContentMeta::default()
            .with_style(StyleProperty::BorderTopStyle, "solid")
            .with_style(StyleProperty::BorderRightStyle, "solid")
            .with_style(StyleProperty::BorderBottomStyle, "solid")
            .with_style(StyleProperty::BorderLeftStyle, "solid");
        let cell = CellContent::default();
        let text = TextContent::new("v");
        let mut events = vec![
            Event::StartPage(&page),
            Event::StartTable(&outer),
            Event::StartRow(&row),
            Event::StartCell(&host),
            Event::StartTable(&inner),
        ];
        for _ in 0..2 {
            events.push(Event::StartRow(&row));
            for _ in 0..2 {
                events.extend([Event::StartCell(&cell), Event::Text(&text), Event::EndCell(&cell)]);
            }
            events.push(Event::EndRow(&row));
        }
        events.extend([
            Event::EndTable(&inner),
            Event::EndCell(&host),
            Event::EndRow(&row),
            Event::EndTable(&outer),
        ]);
        for event in events {
            stack.dispatch(&mut ctx, event).unwrap();
        }

        let borders = |r: u32, c: u32| {
            let handle = ctx.sheet().unwrap().cell(r, c).unwrap().style;
            ctx.styles.properties(handle).unwrap().borders
        };
        let top_left = borders(0, 0);
        assert!(top_left.top.is_set() && top_left.left.is_set());
        assert!(!top_left.right.is_set() && !top_left.bottom.is_set());
        let bottom_right = borders(1, 1);
        assert!(bottom_right.bottom.is_set() && bottom_right.right.is_set());
        assert!(!bottom_right.top.is_set() && !bottom_right.left.is_set());
        assert!(ctx.grid.overlays.is_empty());
    }

    #[test]
    fn test_rotation_is_clamped() {
        let meta = ContentMeta::default().with_user_property(keys::ROTATION, "120");
        assert_eq!(rotation(&meta), Some(90));
        assert_eq!(rotation(&ContentMeta::default()), None);
    }
}
