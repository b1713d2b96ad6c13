//! Excel 97-2003 (.xls) output: a BIFF8 `Workbook` stream in an OLE compound file

pub mod biff;
pub mod escher;
pub mod palette;
pub mod sst;

use self::biff::{id, short_unicode_string, unicode_string, BiffWriter, EncodedChars, Payload};
use self::escher::{Blip, DrawingInfo};
use self::palette::{Palette, AUTOMATIC, FONT_AUTOMATIC};
use super::flavor::SpreadsheetFlavor;
use super::shared_strings::SharedStrings;
use super::{rotation_code, BorderDef, CellFormat, FontDef, Sheet, Workbook};
use crate::config::OutputFormat;
use crate::error::{EmitterError, Result};
use crate::types::{CellValue, ColorRef, HorizontalAlign, Rgb, VerticalAlign};
use crate::units;
use std::io::{Cursor, Write};

/// XF records 0..=14 are style XFs; cell formats follow
pub const FIRST_CELL_XF: u16 = 15;
const MERGES_PER_RECORD: usize = 1026;
const ROW_BLOCK: usize = 32;
/// Excel reads small streams more reliably when they stay out of the mini stream
const MIN_STREAM_SIZE: usize = 4096;

const STD_LINK_CLSID: [u8; 16] = [
    0xD0, 0xC9, 0xEA, 0x79, 0xF9, 0xBA, 0xCE, 0x11, 0x8C, 0x82, 0x00, 0xAA, 0x00, 0x4B, 0xA9, 0x0B,
];
const URL_MONIKER_CLSID: [u8; 16] = [
    0xE0, 0xC9, 0xEA, 0x79, 0xF9, 0xBA, 0xCE, 0x11, 0x8C, 0x82, 0x00, 0xAA, 0x00, 0x4B, 0xA9, 0x0B,
];

/// Palette-based flavor writing BIFF8
#[derive(Debug, Default)]
pub struct XlsFlavor {
    palette: Palette,
}

impl XlsFlavor {
    pub fn new() -> Self {
        XlsFlavor::default()
    }
}

impl SpreadsheetFlavor for XlsFlavor {
    fn format(&self) -> OutputFormat {
        OutputFormat::Xls
    }

    fn max_rows(&self) -> u32 {
        65_536
    }

    fn max_columns(&self) -> u32 {
        256
    }

    fn max_cell_styles(&self) -> usize {
        4_000
    }

    fn max_fonts(&self) -> usize {
        510
    }

    fn default_font_name(&self) -> &str {
        "Arial"
    }

    fn default_font_size(&self) -> f64 {
        10.0
    }

    fn default_row_height_points(&self) -> f64 {
        12.75
    }

    fn resolve_color(&mut self, rgb: Rgb) -> ColorRef {
        ColorRef::Indexed(self.palette.resolve(rgb))
    }

    fn palette(&self) -> Option<&[Rgb]> {
        Some(self.palette.colors())
    }

    fn write(&self, workbook: &Workbook, out: &mut dyn Write) -> Result<()> {
        let stream = write_biff_stream(workbook, &self.palette)?;
        let container = write_compound_file(&stream)?;
        out.write_all(&container)?;
        log::info!(
            "Wrote xls workbook: {} sheet(s), {} bytes",
            workbook.sheets().len(),
            container.len()
        );
        Ok(())
    }
}

/// Wrap a BIFF stream in a version 3 (512-byte sector) OLE compound file
pub fn write_compound_file(stream: &[u8]) -> Result<Vec<u8>> {
    let mut compound =
        cfb::CompoundFile::create_with_version(cfb::Version::V3, Cursor::new(Vec::new()))?;
    {
        let mut workbook_stream = compound.create_stream("/Workbook")?;
        workbook_stream.write_all(stream)?;
        if stream.len() < MIN_STREAM_SIZE {
            workbook_stream.write_all(&vec![0u8; MIN_STREAM_SIZE - stream.len()])?;
        }
        workbook_stream.flush()?;
    }
    compound.flush()?;
    Ok(compound.into_inner().into_inner())
}

/// BIFF font index for a font handle; index 4 does not exist
pub fn biff_font_index(handle: u32) -> u16 {
    if handle >= 4 {
        handle as u16 + 1
    } else {
        handle as u16
    }
}

fn color_index(color: &Option<ColorRef>, palette: &Palette, automatic: u16) -> u16 {
    match color {
        None => automatic,
        Some(ColorRef::Indexed(index)) => *index,
        Some(ColorRef::Rgb(rgb)) => palette.nearest(*rgb),
    }
}

/// Build the whole `Workbook` stream
pub fn write_biff_stream(workbook: &Workbook, palette: &Palette) -> Result<Vec<u8>> {
    let mut strings = SharedStrings::new();
    let mut blips: Vec<Blip<'_>> = Vec::new();
    let mut drawings: Vec<Option<(DrawingInfo, Vec<u32>)>> = Vec::new();
    let mut drawing_id = 0;
    for sheet in workbook.sheets() {
        if sheet.pictures().is_empty() {
            drawings.push(None);
            continue;
        }
        drawing_id += 1;
        let mut ids = Vec::with_capacity(sheet.pictures().len());
        for picture in sheet.pictures() {
            let blip = Blip::new(&picture.data, picture.format);
            let position = match blips.iter().position(|b| b.uid == blip.uid) {
                Some(existing) => existing,
                None => {
                    blips.push(blip);
                    blips.len() - 1
                }
            };
            ids.push(position as u32 + 1);
        }
        let info = DrawingInfo {
            drawing_id,
            picture_count: sheet.pictures().len() as u32,
        };
        drawings.push(Some((info, ids)));
    }

    // sheets first, so the SST holds every string they reference
    let mut sheet_streams = Vec::with_capacity(workbook.sheets().len());
    for (index, sheet) in workbook.sheets().iter().enumerate() {
        let drawing = drawings[index].as_ref();
        let stream = write_sheet(sheet, index == 0, &mut strings, drawing).map_err(|e| {
            EmitterError::WriteSheetError {
                sheet: sheet.name().unwrap_or_default().to_string(),
                source: Box::new(e),
            }
        })?;
        sheet_streams.push(stream);
    }

    let mut globals = BiffWriter::new();
    globals.record(id::BOF, &bof(0x0005));
    globals.record(id::CODEPAGE, &1200u16.to_le_bytes());
    globals.record(
        id::WINDOW1,
        Payload::new()
            .u16(0)
            .u16(0)
            .u16(0x3A5C)
            .u16(0x1D4C)
            .u16(0x0038)
            .u16(0)
            .u16(0)
            .u16(1)
            .u16(0x0258)
            .take()
            .as_slice(),
    );
    globals.record(id::DATEMODE, &0u16.to_le_bytes());

    let fonts = workbook.fonts();
    for font in fonts {
        globals.record(id::FONT, &font_record(font, palette));
    }
    for _ in fonts.len()..4 {
        globals.record(id::FONT, &font_record(&fonts[0], palette));
    }

    for number_format in workbook.number_formats() {
        let mut payload = Payload::new();
        payload
            .u16(number_format.id)
            .bytes(&unicode_string(&number_format.code));
        globals.record(id::FORMAT, &payload.take());
    }

    for _ in 0..FIRST_CELL_XF {
        globals.record(id::XF, &xf_record(&CellFormat::default(), true, palette));
    }
    for format in workbook.formats() {
        globals.record(id::XF, &xf_record(format, false, palette));
    }
    globals.record(id::STYLE, Payload::new().u16(0x8000).u8(0).u8(0xFF).take().as_slice());

    if palette.is_modified() {
        let mut payload = Payload::new();
        payload.u16(palette.colors().len() as u16);
        for color in palette.colors() {
            payload.u8(color.r).u8(color.g).u8(color.b).u8(0);
        }
        globals.record(id::PALETTE, &payload.take());
    }

    let mut sheet_offset_positions = Vec::with_capacity(workbook.sheets().len());
    for (index, sheet) in workbook.sheets().iter().enumerate() {
        let name = sheet
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Sheet{}", index + 1));
        // lbPlyPos is patched once every stream length is known
        sheet_offset_positions.push(globals.position() + 4);
        let mut payload = Payload::new();
        payload.u32(0).u8(0).u8(0).bytes(&short_unicode_string(&name));
        globals.record(id::BOUNDSHEET, &payload.take());
    }

    write_defined_names(&mut globals, workbook);

    if !blips.is_empty() {
        let infos: Vec<DrawingInfo> = drawings.iter().flatten().map(|(info, _)| *info).collect();
        globals.record(id::MSODRAWINGGROUP, &escher::drawing_group(&infos, &blips));
    }

    let fonts_len = fonts.len();
    let sst_parts = sst::build_sst(&strings, |handle| {
        if (handle as usize) < fonts_len {
            biff_font_index(handle)
        } else {
            0
        }
    });
    globals.record_parts(id::SST, &sst_parts);
    globals.record(id::EOF, &[]);

    let mut offset = globals.len();
    for (position, stream) in sheet_offset_positions.iter().zip(&sheet_streams) {
        globals.patch_u32(*position, offset as u32);
        offset += stream.len();
    }
    for stream in sheet_streams {
        globals.append(stream);
    }
    Ok(globals.into_bytes())
}

fn bof(kind: u16) -> Vec<u8> {
    Payload::new()
        .u16(0x0600)
        .u16(kind)
        .u16(0x0DBB)
        .u16(0x07CC)
        .u32(0)
        .u32(0x0006)
        .take()
}

fn font_record(font: &FontDef, palette: &Palette) -> Vec<u8> {
    let mut payload = Payload::new();
    payload
        .u16(units::points_to_twips(font.size_points))
        .u16(if font.italic { 0x0002 } else { 0 })
        .u16(color_index(&font.color, palette, FONT_AUTOMATIC))
        .u16(if font.bold { 700 } else { 400 })
        .u16(0)
        .u8(0)
        .u8(0)
        .u8(0)
        .u8(0)
        .bytes(&short_unicode_string(&font.name));
    payload.take()
}

fn xf_record(format: &CellFormat, style_xf: bool, palette: &Palette) -> Vec<u8> {
    let horizontal: u8 = match format.horizontal {
        HorizontalAlign::General => 0,
        HorizontalAlign::Left => 1,
        HorizontalAlign::Center => 2,
        HorizontalAlign::Right => 3,
        HorizontalAlign::Justify => 5,
    };
    let vertical: u8 = match format.vertical {
        VerticalAlign::Top => 0,
        VerticalAlign::Center => 1,
        VerticalAlign::Bottom => 2,
    };
    let alignment = horizontal | if format.wrap { 0x08 } else { 0 } | (vertical << 4);

    let side = |border: &BorderDef| -> (u32, u32) {
        let style = border.style.as_biff() as u32;
        let color = if style == 0 {
            0
        } else {
            color_index(&border.color, palette, AUTOMATIC) as u32
        };
        (style, color & 0x7F)
    };
    let (left, left_color) = side(&format.left);
    let (right, right_color) = side(&format.right);
    let (top, top_color) = side(&format.top);
    let (bottom, bottom_color) = side(&format.bottom);
    let lines = left | (right << 4) | (top << 8) | (bottom << 12) | (left_color << 16) | (right_color << 23);

    let (pattern, fore) = match &format.fill {
        Some(color) => (1u32, color_index(&Some(*color), palette, AUTOMATIC)),
        None => (0u32, AUTOMATIC),
    };
    let colors = top_color | (bottom_color << 7) | (pattern << 26);
    let fill = (fore & 0x7F) | (0x41 << 7);

    let (ifnt, protection, used) = if style_xf {
        (0u16, 0xFFF5u16, 0xF4u8)
    } else {
        (biff_font_index(format.font.0), 0x0001u16, 0xFCu8)
    };

    let mut payload = Payload::new();
    payload
        .u16(ifnt)
        .u16(format.number_format)
        .u16(protection)
        .u8(alignment)
        .u8(rotation_code(format.rotation))
        .u8(0)
        .u8(used)
        .u32(lines)
        .u32(colors)
        .u16(fill);
    payload.take()
}

fn write_defined_names(globals: &mut BiffWriter, workbook: &Workbook) {
    let names = workbook.defined_names();
    if names.is_empty() {
        return;
    }
    let sheet_count = workbook.sheets().len() as u16;
    globals.record(id::SUPBOOK, Payload::new().u16(sheet_count).u16(0x0401).take().as_slice());

    // one XTI per sheet, so a sheet index is its XTI index
    let mut externs = Payload::new();
    externs.u16(sheet_count);
    for sheet in 0..sheet_count {
        externs.u16(0).u16(sheet).u16(sheet);
    }
    globals.record(id::EXTERNSHEET, &externs.take());

    for name in names {
        if name.range.last_row > u16::MAX as u32 || name.range.last_col > 0xFF {
            log::warn!("Defined name '{}' is out of range and skipped", name.name);
            continue;
        }
        let chars = EncodedChars::new(&biff::truncate_units(&name.name, 255));
        let mut formula = Payload::new();
        formula
            .u8(0x3B)
            .u16(name.sheet as u16)
            .u16(name.range.first_row as u16)
            .u16(name.range.last_row as u16)
            .u16(name.range.first_col as u16)
            .u16(name.range.last_col as u16);
        let formula = formula.take();

        let mut payload = Payload::new();
        payload
            .u16(0)
            .u8(0)
            .u8(chars.len() as u8)
            .u16(formula.len() as u16)
            .u16(0)
            .u16(0)
            .u8(0)
            .u8(0)
            .u8(0)
            .u8(0)
            .u8(chars.flags())
            .bytes(&chars.bytes(0, chars.len()))
            .bytes(&formula);
        globals.record(id::NAME, &payload.take());
    }
}

fn write_sheet(
    sheet: &Sheet,
    selected: bool,
    strings: &mut SharedStrings,
    drawing: Option<&(DrawingInfo, Vec<u32>)>,
) -> Result<BiffWriter> {
    let mut w = BiffWriter::new();
    let settings = &sheet.settings;
    w.record(id::BOF, &bof(0x0010));

    let max_outline = sheet.rows().map(|(_, r)| r.outline_level).max().unwrap_or(0) as u16;
    let gutter = if max_outline > 0 { 12 * (max_outline + 1) } else { 0 };
    let levels = if max_outline > 0 { max_outline + 1 } else { 0 };
    w.record(id::GUTS, Payload::new().u16(gutter).u16(0).u16(levels).u16(0).take().as_slice());

    let mut wsbool: u16 = 0x04C1;
    if settings.fit_to_page() {
        wsbool |= 0x0100;
    }
    w.record(id::WSBOOL, &wsbool.to_le_bytes());

    if let Some(header) = &settings.header {
        w.record(id::HEADER, &unicode_string(&biff::truncate_units(header, 255)));
    }
    if let Some(footer) = &settings.footer {
        w.record(id::FOOTER, &unicode_string(&biff::truncate_units(footer, 255)));
    }

    let margins = settings.margins.unwrap_or_default();
    w.record(id::LEFTMARGIN, &margins.left.to_le_bytes());
    w.record(id::RIGHTMARGIN, &margins.right.to_le_bytes());
    w.record(id::TOPMARGIN, &margins.top.to_le_bytes());
    w.record(id::BOTTOMMARGIN, &margins.bottom.to_le_bytes());

    w.record(
        id::SETUP,
        Payload::new()
            .u16(settings.paper_size.unwrap_or(0))
            .u16(settings.scale.map(|s| s.clamp(10, 400)).unwrap_or(100))
            .u16(1)
            .u16(settings.fit_to_width.unwrap_or(1))
            .u16(settings.fit_to_height.unwrap_or(1))
            .u16(if settings.landscape { 0x0000 } else { 0x0002 })
            .u16(600)
            .u16(600)
            .f64(0.3)
            .f64(0.3)
            .u16(1)
            .take()
            .as_slice(),
    );

    for (col, width) in sheet.column_widths() {
        w.record(
            id::COLINFO,
            Payload::new()
                .u16(*col as u16)
                .u16(*col as u16)
                .u16((*width).min(u16::MAX as u32) as u16)
                .u16(FIRST_CELL_XF)
                .u16(0)
                .u16(0)
                .take()
                .as_slice(),
        );
    }

    let dims = sheet.dimensions();
    let mut payload = Payload::new();
    match dims {
        Some(d) => payload
            .u32(d.first_row)
            .u32(d.last_row + 1)
            .u16(d.first_col as u16)
            .u16(d.last_col as u16 + 1)
            .u16(0),
        None => payload.u32(0).u32(0).u16(0).u16(0).u16(0),
    };
    w.record(id::DIMENSIONS, &payload.take());

    write_rows(&mut w, sheet, strings);

    if let Some((info, blip_ids)) = drawing {
        for (drawing_record, obj) in escher::sheet_drawing(sheet, *info, blip_ids) {
            w.record(id::MSODRAWING, &drawing_record);
            w.record(id::OBJ, &obj);
        }
    }

    let mut grbit: u16 = 0x0020 | 0x0080;
    let flag = |value: Option<bool>, default: bool| value.unwrap_or(default);
    if flag(settings.display_formulas, false) {
        grbit |= 0x0001;
    }
    if flag(settings.display_gridlines, true) {
        grbit |= 0x0002;
    }
    if flag(settings.display_row_col_headings, true) {
        grbit |= 0x0004;
    }
    if flag(settings.display_zeros, true) {
        grbit |= 0x0010;
    }
    let freeze = settings.freeze.filter(|f| f.row > 0 || f.col > 0);
    if freeze.is_some() {
        grbit |= 0x0008 | 0x0100;
    }
    if selected {
        grbit |= 0x0200 | 0x0400;
    }
    w.record(
        id::WINDOW2,
        Payload::new()
            .u16(grbit)
            .u16(0)
            .u16(0)
            .u32(AUTOMATIC as u32)
            .u16(0)
            .u16(0)
            .u32(0)
            .take()
            .as_slice(),
    );

    if let Some(freeze) = freeze {
        let active = match (freeze.row > 0, freeze.col > 0) {
            (true, true) => 0,
            (true, false) => 2,
            _ => 1,
        };
        w.record(
            id::PANE,
            Payload::new()
                .u16(freeze.col as u16)
                .u16(freeze.row as u16)
                .u16(freeze.row as u16)
                .u16(freeze.col as u16)
                .u8(active)
                .u8(0)
                .take()
                .as_slice(),
        );
    }

    for chunk in sheet.merges().chunks(MERGES_PER_RECORD) {
        let mut payload = Payload::new();
        payload.u16(chunk.len() as u16);
        for merge in chunk {
            payload
                .u16(merge.first_row as u16)
                .u16(merge.last_row as u16)
                .u16(merge.first_col as u16)
                .u16(merge.last_col as u16);
        }
        w.record(id::MERGEDCELLS, &payload.take());
    }

    for link in sheet.hyperlinks() {
        w.record(id::HLINK, &hlink_record(link));
    }

    w.record(id::EOF, &[]);
    Ok(w)
}

fn write_rows(w: &mut BiffWriter, sheet: &Sheet, strings: &mut SharedStrings) {
    let default_twips = units::points_to_twips(sheet.default_row_height());
    let rows: Vec<_> = sheet.rows().collect();
    let mut warned_formula = false;
    for block in rows.chunks(ROW_BLOCK) {
        for (row_index, row) in block {
            let (first, last) = match (row.first_col(), row.last_col()) {
                (Some(first), Some(last)) => (first as u16, last as u16 + 1),
                _ => (0, 0),
            };
            let (height, custom) = match row.height {
                Some(points) => (units::points_to_twips(points), 0x40u32),
                None => (default_twips, 0),
            };
            let flags = (row.outline_level as u32 & 0x07) | custom | 0x100 | ((FIRST_CELL_XF as u32) << 16);
            w.record(
                id::ROW,
                Payload::new()
                    .u16(**row_index as u16)
                    .u16(first)
                    .u16(last)
                    .u16(height)
                    .u16(0)
                    .u16(0)
                    .u32(flags)
                    .take()
                    .as_slice(),
            );
        }
        for (row_index, row) in block {
            for (col, cell) in &row.cells {
                let xf = FIRST_CELL_XF + cell.style.0 as u16;
                let mut payload = Payload::new();
                payload.u16(**row_index as u16).u16(*col as u16).u16(xf);
                let record_id = match &cell.value {
                    CellValue::Empty => id::BLANK,
                    CellValue::Number(n) | CellValue::DateTime(n) => {
                        payload.f64(*n);
                        id::NUMBER
                    }
                    CellValue::Bool(b) => {
                        payload.u8(*b as u8).u8(0);
                        id::BOOLERR
                    }
                    CellValue::String(s) => {
                        payload.u32(strings.add_string(s));
                        id::LABELSST
                    }
                    CellValue::RichString(rich) => {
                        payload.u32(strings.add_rich(rich));
                        id::LABELSST
                    }
                    CellValue::Formula(formula) => {
                        if !warned_formula {
                            log::warn!(
                                "Formulas are written as text in xls output (sheet '{}')",
                                sheet.name().unwrap_or_default()
                            );
                            warned_formula = true;
                        }
                        let text = format!("={}", formula.trim_start_matches('='));
                        payload.u32(strings.add_string(&text));
                        id::LABELSST
                    }
                };
                w.record(record_id, &payload.take());
            }
        }
    }
}

fn hlink_record(link: &super::Hyperlink) -> Vec<u8> {
    let mut payload = Payload::new();
    payload
        .u16(link.range.first_row as u16)
        .u16(link.range.last_row as u16)
        .u16(link.range.first_col as u16)
        .u16(link.range.last_col as u16)
        .bytes(&STD_LINK_CLSID)
        .u32(2);
    if let Some(location) = link.url.strip_prefix('#') {
        let units: Vec<u16> = location.encode_utf16().collect();
        payload.u32(0x08).u32(units.len() as u32 + 1);
        for unit in units {
            payload.u16(unit);
        }
        payload.u16(0);
    } else {
        let units: Vec<u16> = link.url.encode_utf16().collect();
        payload
            .u32(0x03)
            .bytes(&URL_MONIKER_CLSID)
            .u32((units.len() as u32 + 1) * 2);
        for unit in units {
            payload.u16(unit);
        }
        payload.u16(0);
    }
    payload.take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellRange, StyleHandle};
    use crate::workbook::flavor_for;

    fn records(stream: &[u8]) -> Vec<(u16, Vec<u8>)> {
        let mut out = Vec::new();
        let mut pos = 0;
        while pos + 4 <= stream.len() {
            let record_id = u16::from_le_bytes([stream[pos], stream[pos + 1]]);
            let len = u16::from_le_bytes([stream[pos + 2], stream[pos + 3]]) as usize;
            out.push((record_id, stream[pos + 4..pos + 4 + len].to_vec()));
            pos += 4 + len;
        }
        out
    }

    fn sample() -> Workbook {
        let mut workbook = Workbook::new(flavor_for(OutputFormat::Xls));
        let index = workbook.add_sheet(Some("Data".into()));
        let sheet = workbook.sheet_mut(index).unwrap();
        sheet.set_cell(0, 0, CellValue::from("x"), StyleHandle::DEFAULT).unwrap();
        sheet.set_cell(0, 1, CellValue::Number(2.5), StyleHandle::DEFAULT).unwrap();
        sheet.add_merge(CellRange::new(1, 0, 1, 1)).unwrap();
        sheet.add_hyperlink(CellRange::single(0, 0), "http://a.b").unwrap();
        workbook
    }

    #[test]
    fn test_stream_layout() {
        let workbook = sample();
        let stream = write_biff_stream(&workbook, &Palette::new()).unwrap();
        let recs = records(&stream);
        assert_eq!(recs[0].0, id::BOF);
        let ids: Vec<u16> = recs.iter().map(|(i, _)| *i).collect();
        assert_eq!(ids.iter().filter(|i| **i == id::BOF).count(), 2);
        assert_eq!(ids.iter().filter(|i| **i == id::EOF).count(), 2);
        assert_eq!(ids.iter().filter(|i| **i == id::FONT).count(), 4);
        assert_eq!(ids.iter().filter(|i| **i == id::XF).count(), 16);
        assert!(ids.contains(&id::LABELSST));
        assert!(ids.contains(&id::NUMBER));
        assert!(ids.contains(&id::MERGEDCELLS));
        assert!(ids.contains(&id::HLINK));
        assert!(!ids.contains(&id::PALETTE));
    }

    #[test]
    fn test_boundsheet_offset_points_at_sheet_bof() {
        let workbook = sample();
        let stream = write_biff_stream(&workbook, &Palette::new()).unwrap();
        let mut pos = 0;
        let mut offset = None;
        while pos + 4 <= stream.len() {
            let record_id = u16::from_le_bytes([stream[pos], stream[pos + 1]]);
            let len = u16::from_le_bytes([stream[pos + 2], stream[pos + 3]]) as usize;
            if record_id == id::BOUNDSHEET {
                offset = Some(u32::from_le_bytes([
                    stream[pos + 4],
                    stream[pos + 5],
                    stream[pos + 6],
                    stream[pos + 7],
                ]) as usize);
            }
            pos += 4 + len;
        }
        let offset = offset.unwrap();
        assert_eq!(&stream[offset..offset + 2], &id::BOF.to_le_bytes());
        assert_eq!(&stream[offset + 6..offset + 8], &0x0010u16.to_le_bytes());
    }

    #[test]
    fn test_font_index_skips_four() {
        assert_eq!(biff_font_index(3), 3);
        assert_eq!(biff_font_index(4), 5);
    }

    #[test]
    fn test_compound_file_has_workbook_stream() {
        let workbook = sample();
        let mut out = Vec::new();
        workbook.write(&mut out).unwrap();
        let mut compound = cfb::CompoundFile::open(Cursor::new(out)).unwrap();
        assert_eq!(compound.version(), cfb::Version::V3);
        assert!(compound.is_stream("/Workbook"));
        let mut stream = compound.open_stream("/Workbook").unwrap();
        let mut data = Vec::new();
        std::io::Read::read_to_end(&mut stream, &mut data).unwrap();
        assert_eq!(&data[..2], &id::BOF.to_le_bytes());
    }
}
