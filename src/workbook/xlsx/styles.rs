//! styles.xml: number formats, fonts, fills, borders and cell formats

use super::xml_writer::XmlWriter;
use crate::error::Result;
use crate::types::{ColorRef, HorizontalAlign, VerticalAlign};
use crate::workbook::{rotation_code, BorderDef, CellFormat, FontDef, Workbook};
use std::io::Write;

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Write a `<color>`-like element carrying either `rgb` or `indexed`
pub fn write_color<W: Write>(xml: &mut XmlWriter<W>, element: &str, color: &ColorRef) -> Result<()> {
    xml.start_element(element)?;
    match color {
        ColorRef::Rgb(rgb) => xml.attribute("rgb", &rgb.to_argb_hex())?,
        ColorRef::Indexed(index) => xml.attribute_int("indexed", *index as i64)?,
    }
    xml.self_close()
}

/// Font properties shared by `<font>` and rich-text `<rPr>`
pub fn write_font_properties<W: Write>(
    xml: &mut XmlWriter<W>,
    font: &FontDef,
    name_element: &str,
) -> Result<()> {
    if font.bold {
        xml.empty_element("b")?;
    }
    if font.italic {
        xml.empty_element("i")?;
    }
    xml.start_element("sz")?;
    xml.attribute_f64("val", font.size_points)?;
    xml.self_close()?;
    if let Some(color) = &font.color {
        write_color(xml, "color", color)?;
    }
    xml.start_element(name_element)?;
    xml.attribute("val", &font.name)?;
    xml.self_close()
}

pub fn write_styles<W: Write>(xml: &mut XmlWriter<W>, workbook: &Workbook) -> Result<()> {
    // fills 0 and 1 are reserved
    let mut fills: Vec<ColorRef> = Vec::new();
    let mut borders: Vec<[BorderDef; 4]> = vec![[BorderDef::default(); 4]];
    let mut xf_refs: Vec<(usize, usize)> = Vec::with_capacity(workbook.formats().len());
    for format in workbook.formats() {
        let fill_id = match &format.fill {
            None => 0,
            Some(color) => match fills.iter().position(|c| c == color) {
                Some(pos) => pos + 2,
                None => {
                    fills.push(*color);
                    fills.len() + 1
                }
            },
        };
        let sides = [format.left, format.right, format.top, format.bottom];
        let border_id = match borders.iter().position(|b| *b == sides) {
            Some(pos) => pos,
            None => {
                borders.push(sides);
                borders.len() - 1
            }
        };
        xf_refs.push((fill_id, border_id));
    }

    xml.declaration()?;
    xml.start_element("styleSheet")?;
    xml.attribute("xmlns", MAIN_NS)?;
    xml.close_start_tag()?;

    if !workbook.number_formats().is_empty() {
        xml.start_element("numFmts")?;
        xml.attribute_int("count", workbook.number_formats().len() as i64)?;
        xml.close_start_tag()?;
        for number_format in workbook.number_formats() {
            xml.start_element("numFmt")?;
            xml.attribute_int("numFmtId", number_format.id as i64)?;
            xml.attribute("formatCode", &number_format.code)?;
            xml.self_close()?;
        }
        xml.end_element("numFmts")?;
    }

    xml.start_element("fonts")?;
    xml.attribute_int("count", workbook.fonts().len() as i64)?;
    xml.close_start_tag()?;
    for font in workbook.fonts() {
        xml.open("font")?;
        write_font_properties(xml, font, "name")?;
        xml.start_element("family")?;
        xml.attribute_int("val", 2)?;
        xml.self_close()?;
        xml.end_element("font")?;
    }
    xml.end_element("fonts")?;

    xml.start_element("fills")?;
    xml.attribute_int("count", fills.len() as i64 + 2)?;
    xml.close_start_tag()?;
    xml.write_str("<fill><patternFill patternType=\"none\"/></fill>")?;
    xml.write_str("<fill><patternFill patternType=\"gray125\"/></fill>")?;
    for color in &fills {
        xml.open("fill")?;
        xml.start_element("patternFill")?;
        xml.attribute("patternType", "solid")?;
        xml.close_start_tag()?;
        write_color(xml, "fgColor", color)?;
        xml.write_str("<bgColor indexed=\"64\"/>")?;
        xml.end_element("patternFill")?;
        xml.end_element("fill")?;
    }
    xml.end_element("fills")?;

    xml.start_element("borders")?;
    xml.attribute_int("count", borders.len() as i64)?;
    xml.close_start_tag()?;
    for sides in &borders {
        xml.open("border")?;
        for (name, side) in ["left", "right", "top", "bottom"].iter().zip(sides.iter()) {
            write_border_side(xml, name, side)?;
        }
        xml.empty_element("diagonal")?;
        xml.end_element("border")?;
    }
    xml.end_element("borders")?;

    xml.write_str("<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>")?;

    xml.start_element("cellXfs")?;
    xml.attribute_int("count", workbook.formats().len() as i64)?;
    xml.close_start_tag()?;
    for (format, (fill_id, border_id)) in workbook.formats().iter().zip(xf_refs) {
        write_xf(xml, format, fill_id, border_id)?;
    }
    xml.end_element("cellXfs")?;

    xml.write_str("<cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>")?;
    xml.end_element("styleSheet")?;
    xml.flush()
}

fn write_border_side<W: Write>(xml: &mut XmlWriter<W>, name: &str, side: &BorderDef) -> Result<()> {
    if side.style == crate::types::BorderStyle::None {
        return xml.empty_element(name);
    }
    xml.start_element(name)?;
    xml.attribute("style", side.style.as_xlsx())?;
    xml.close_start_tag()?;
    match &side.color {
        Some(color) => write_color(xml, "color", color)?,
        None => xml.write_str("<color auto=\"1\"/>")?,
    }
    xml.end_element(name)
}

fn write_xf<W: Write>(
    xml: &mut XmlWriter<W>,
    format: &CellFormat,
    fill_id: usize,
    border_id: usize,
) -> Result<()> {
    xml.start_element("xf")?;
    xml.attribute_int("numFmtId", format.number_format as i64)?;
    xml.attribute_int("fontId", format.font.index() as i64)?;
    xml.attribute_int("fillId", fill_id as i64)?;
    xml.attribute_int("borderId", border_id as i64)?;
    xml.attribute_int("xfId", 0)?;
    if format.number_format != 0 {
        xml.attribute_int("applyNumberFormat", 1)?;
    }
    if format.font.index() != 0 {
        xml.attribute_int("applyFont", 1)?;
    }
    if fill_id != 0 {
        xml.attribute_int("applyFill", 1)?;
    }
    if border_id != 0 {
        xml.attribute_int("applyBorder", 1)?;
    }
    let has_alignment = format.horizontal != HorizontalAlign::General
        || format.vertical != VerticalAlign::Bottom
        || format.wrap
        || format.rotation != 0;
    if !has_alignment {
        return xml.self_close();
    }
    xml.attribute_int("applyAlignment", 1)?;
    xml.close_start_tag()?;
    xml.start_element("alignment")?;
    let horizontal = match format.horizontal {
        HorizontalAlign::General => None,
        HorizontalAlign::Left => Some("left"),
        HorizontalAlign::Center => Some("center"),
        HorizontalAlign::Right => Some("right"),
        HorizontalAlign::Justify => Some("justify"),
    };
    if let Some(h) = horizontal {
        xml.attribute("horizontal", h)?;
    }
    match format.vertical {
        VerticalAlign::Top => xml.attribute("vertical", "top")?,
        VerticalAlign::Center => xml.attribute("vertical", "center")?,
        VerticalAlign::Bottom => {}
    }
    if format.wrap {
        xml.attribute_int("wrapText", 1)?;
    }
    if format.rotation != 0 {
        xml.attribute_int("textRotation", rotation_code(format.rotation) as i64)?;
    }
    xml.self_close()?;
    xml.end_element("xf")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::types::{BorderStyle, Rgb};
    use crate::workbook::flavor_for;

    #[test]
    fn test_styles_dedupe_fills_and_borders() {
        let mut workbook = Workbook::new(flavor_for(OutputFormat::Xlsx));
        let red = ColorRef::Rgb(Rgb::new(255, 0, 0));
        let thin = BorderDef {
            style: BorderStyle::Thin,
            color: None,
        };
        for wrap in [false, true] {
            workbook
                .add_format(CellFormat {
                    fill: Some(red),
                    top: thin,
                    wrap,
                    ..Default::default()
                })
                .unwrap();
        }

        let mut out = Vec::new();
        let mut xml = XmlWriter::new(&mut out);
        write_styles(&mut xml, &workbook).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("<fills count=\"3\">"));
        assert!(text.contains("<borders count=\"2\">"));
        assert!(text.contains("<cellXfs count=\"3\">"));
        assert!(text.contains("<top style=\"thin\"><color auto=\"1\"/></top>"));
        assert!(text.contains("wrapText=\"1\""));
        assert!(text.contains("rgb=\"FFFF0000\""));
    }
}
