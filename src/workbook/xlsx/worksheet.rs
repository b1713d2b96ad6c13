//! Worksheet part writer

use super::xml_writer::{format_number, XmlWriter};
use crate::error::Result;
use crate::types::{CellRef, CellValue};
use crate::units;
use crate::workbook::shared_strings::SharedStrings;
use crate::workbook::Sheet;
use std::io::Write;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Relationship ids the worksheet refers to
#[derive(Debug, Default)]
pub struct SheetRelationships {
    pub drawing: Option<String>,
    /// One entry per hyperlink, in sheet order; `None` for links inside the workbook
    pub hyperlinks: Vec<Option<String>>,
}

pub fn write_worksheet<W: Write>(
    xml: &mut XmlWriter<W>,
    sheet: &Sheet,
    selected: bool,
    strings: &mut SharedStrings,
    rels: &SheetRelationships,
) -> Result<()> {
    xml.declaration()?;
    xml.start_element("worksheet")?;
    xml.attribute("xmlns", MAIN_NS)?;
    xml.attribute("xmlns:r", REL_NS)?;
    xml.close_start_tag()?;

    let settings = &sheet.settings;
    let max_outline = sheet.rows().map(|(_, r)| r.outline_level).max().unwrap_or(0);
    if settings.fit_to_page() || max_outline > 0 {
        xml.open("sheetPr")?;
        if max_outline > 0 {
            xml.write_str("<outlinePr summaryBelow=\"1\"/>")?;
        }
        if settings.fit_to_page() {
            xml.write_str("<pageSetUpPr fitToPage=\"1\"/>")?;
        }
        xml.end_element("sheetPr")?;
    }

    xml.start_element("dimension")?;
    let dimension = sheet
        .dimensions()
        .map(|d| d.reference())
        .unwrap_or_else(|| "A1".to_string());
    xml.attribute("ref", &dimension)?;
    xml.self_close()?;

    write_sheet_views(xml, sheet, selected)?;

    xml.start_element("sheetFormatPr")?;
    xml.attribute_f64("defaultRowHeight", sheet.default_row_height())?;
    if max_outline > 0 {
        xml.attribute_int("outlineLevelRow", max_outline as i64)?;
    }
    xml.self_close()?;

    if !sheet.column_widths().is_empty() {
        xml.open("cols")?;
        for (col, width) in sheet.column_widths() {
            xml.start_element("col")?;
            xml.attribute_int("min", *col as i64 + 1)?;
            xml.attribute_int("max", *col as i64 + 1)?;
            xml.attribute_f64("width", *width as f64 / units::WIDTH_UNITS_PER_CHAR as f64)?;
            xml.attribute_int("customWidth", 1)?;
            xml.self_close()?;
        }
        xml.end_element("cols")?;
    }

    write_sheet_data(xml, sheet, strings)?;

    if !sheet.merges().is_empty() {
        xml.start_element("mergeCells")?;
        xml.attribute_int("count", sheet.merges().len() as i64)?;
        xml.close_start_tag()?;
        for merge in sheet.merges() {
            xml.start_element("mergeCell")?;
            xml.attribute("ref", &merge.reference())?;
            xml.self_close()?;
        }
        xml.end_element("mergeCells")?;
    }

    if !sheet.hyperlinks().is_empty() {
        xml.open("hyperlinks")?;
        for (link, id) in sheet.hyperlinks().iter().zip(&rels.hyperlinks) {
            xml.start_element("hyperlink")?;
            xml.attribute("ref", &link.range.reference())?;
            match id {
                Some(id) => xml.attribute("r:id", id)?,
                None => xml.attribute("location", link.url.trim_start_matches('#'))?,
            }
            xml.self_close()?;
        }
        xml.end_element("hyperlinks")?;
    }

    let margins = settings.margins.unwrap_or_default();
    xml.start_element("pageMargins")?;
    xml.attribute_f64("left", margins.left)?;
    xml.attribute_f64("right", margins.right)?;
    xml.attribute_f64("top", margins.top)?;
    xml.attribute_f64("bottom", margins.bottom)?;
    xml.attribute_f64("header", 0.3)?;
    xml.attribute_f64("footer", 0.3)?;
    xml.self_close()?;

    xml.start_element("pageSetup")?;
    if let Some(paper) = settings.paper_size {
        xml.attribute_int("paperSize", paper as i64)?;
    }
    if let Some(scale) = settings.scale {
        xml.attribute_int("scale", scale.clamp(10, 400) as i64)?;
    }
    if settings.fit_to_page() {
        xml.attribute_int("fitToWidth", settings.fit_to_width.unwrap_or(0) as i64)?;
        xml.attribute_int("fitToHeight", settings.fit_to_height.unwrap_or(0) as i64)?;
    }
    xml.attribute(
        "orientation",
        if settings.landscape { "landscape" } else { "portrait" },
    )?;
    xml.self_close()?;

    if settings.header.is_some() || settings.footer.is_some() {
        xml.open("headerFooter")?;
        if let Some(header) = &settings.header {
            xml.text_element("oddHeader", header)?;
        }
        if let Some(footer) = &settings.footer {
            xml.text_element("oddFooter", footer)?;
        }
        xml.end_element("headerFooter")?;
    }

    if let Some(id) = &rels.drawing {
        xml.start_element("drawing")?;
        xml.attribute("r:id", id)?;
        xml.self_close()?;
    }

    xml.end_element("worksheet")?;
    xml.flush()
}

fn write_sheet_views<W: Write>(xml: &mut XmlWriter<W>, sheet: &Sheet, selected: bool) -> Result<()> {
    let settings = &sheet.settings;
    xml.open("sheetViews")?;
    xml.start_element("sheetView")?;
    if selected {
        xml.attribute_int("tabSelected", 1)?;
    }
    let flags = [
        ("showGridLines", settings.display_gridlines),
        ("showRowColHeaders", settings.display_row_col_headings),
        ("showZeros", settings.display_zeros),
        ("showFormulas", settings.display_formulas),
    ];
    for (name, flag) in flags {
        if let Some(value) = flag {
            xml.attribute_int(name, value as i64)?;
        }
    }
    xml.attribute_int("workbookViewId", 0)?;

    let freeze = settings.freeze.filter(|f| f.row > 0 || f.col > 0);
    let Some(freeze) = freeze else {
        xml.self_close()?;
        return xml.end_element("sheetViews");
    };
    xml.close_start_tag()?;
    let pane = match (freeze.row > 0, freeze.col > 0) {
        (true, true) => "bottomRight",
        (true, false) => "bottomLeft",
        _ => "topRight",
    };
    xml.start_element("pane")?;
    if freeze.col > 0 {
        xml.attribute_int("xSplit", freeze.col as i64)?;
    }
    if freeze.row > 0 {
        xml.attribute_int("ySplit", freeze.row as i64)?;
    }
    xml.attribute("topLeftCell", &CellRef::new(freeze.row, freeze.col).reference())?;
    xml.attribute("activePane", pane)?;
    xml.attribute("state", "frozen")?;
    xml.self_close()?;
    xml.start_element("selection")?;
    xml.attribute("pane", pane)?;
    xml.self_close()?;
    xml.end_element("sheetView")?;
    xml.end_element("sheetViews")
}

fn write_sheet_data<W: Write>(
    xml: &mut XmlWriter<W>,
    sheet: &Sheet,
    strings: &mut SharedStrings,
) -> Result<()> {
    let mut cell_ref = String::with_capacity(12);
    xml.open("sheetData")?;
    for (row_index, row) in sheet.rows() {
        xml.start_element("row")?;
        xml.attribute_int("r", *row_index as i64 + 1)?;
        if let Some(height) = row.height {
            xml.attribute_f64("ht", height)?;
            xml.attribute_int("customHeight", 1)?;
        }
        if row.outline_level > 0 {
            xml.attribute_int("outlineLevel", row.outline_level as i64)?;
        }
        if row.cells.is_empty() {
            xml.self_close()?;
            continue;
        }
        xml.close_start_tag()?;

        for (col, cell) in &row.cells {
            cell_ref.clear();
            cell_ref.push_str(&CellRef::new(*row_index, *col).reference());
            xml.start_element("c")?;
            xml.attribute("r", &cell_ref)?;
            if cell.style.index() != 0 {
                xml.attribute_int("s", cell.style.index() as i64)?;
            }
            match &cell.value {
                CellValue::Empty => xml.self_close()?,
                CellValue::Number(n) | CellValue::DateTime(n) => {
                    if n.is_finite() {
                        xml.close_start_tag()?;
                        xml.text_element("v", &format_number(*n))?;
                        xml.end_element("c")?;
                    } else {
                        log::warn!("Non-finite number at {} written as blank", cell_ref);
                        xml.self_close()?;
                    }
                }
                CellValue::Bool(b) => {
                    xml.attribute("t", "b")?;
                    xml.close_start_tag()?;
                    xml.text_element("v", if *b { "1" } else { "0" })?;
                    xml.end_element("c")?;
                }
                CellValue::String(s) => {
                    let index = strings.add_string(s);
                    write_string_cell(xml, index)?;
                }
                CellValue::RichString(rich) => {
                    let index = strings.add_rich(rich);
                    write_string_cell(xml, index)?;
                }
                CellValue::Formula(formula) => {
                    xml.close_start_tag()?;
                    xml.text_element("f", formula.trim_start_matches('='))?;
                    xml.end_element("c")?;
                }
            }
        }
        xml.end_element("row")?;
    }
    xml.end_element("sheetData")
}

fn write_string_cell<W: Write>(xml: &mut XmlWriter<W>, index: u32) -> Result<()> {
    xml.attribute("t", "s")?;
    xml.close_start_tag()?;
    xml.text_element("v", itoa::Buffer::new().format(index))?;
    xml.end_element("c")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellRange, StyleHandle};
    use crate::workbook::SheetLimits;

    fn sheet() -> Sheet {
        Sheet::new(
            Some("S".into()),
            SheetLimits {
                max_rows: 1_048_576,
                max_columns: 16_384,
            },
            15.0,
        )
    }

    fn render(sheet: &Sheet, strings: &mut SharedStrings) -> String {
        let mut out = Vec::new();
        let mut xml = XmlWriter::new(&mut out);
        write_worksheet(&mut xml, sheet, true, strings, &SheetRelationships::default()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_cells_and_merges() {
        let mut sheet = sheet();
        sheet.set_cell(0, 0, CellValue::from("Name"), StyleHandle::DEFAULT).unwrap();
        sheet.set_cell(0, 1, CellValue::Number(3.0), StyleHandle(2)).unwrap();
        sheet.set_cell(1, 0, CellValue::Bool(true), StyleHandle::DEFAULT).unwrap();
        sheet.add_merge(CellRange::new(1, 0, 1, 2)).unwrap();
        sheet.set_row_height(1, 30.0).unwrap();

        let mut strings = SharedStrings::new();
        let text = render(&sheet, &mut strings);
        assert!(text.contains("<c r=\"A1\" t=\"s\"><v>0</v></c>"));
        assert!(text.contains("<c r=\"B1\" s=\"2\"><v>3</v></c>"));
        assert!(text.contains("<c r=\"A2\" t=\"b\"><v>1</v></c>"));
        assert!(text.contains("<row r=\"2\" ht=\"30\" customHeight=\"1\">"));
        assert!(text.contains("<mergeCell ref=\"A2:C2\"/>"));
        assert!(text.contains("<dimension ref=\"A1:C2\"/>"));
        assert_eq!(strings.count(), 1);
    }

    #[test]
    fn test_view_flags_and_freeze() {
        let mut sheet = sheet();
        sheet.settings.display_gridlines = Some(false);
        sheet.settings.freeze = Some(CellRef::new(2, 0));
        let text = render(&sheet, &mut SharedStrings::new());
        assert!(text.contains("showGridLines=\"0\""));
        assert!(text.contains("ySplit=\"2\""));
        assert!(text.contains("topLeftCell=\"A3\""));
        assert!(text.contains("state=\"frozen\""));
    }
}
