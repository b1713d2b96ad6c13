//! DrawingML part holding a sheet's pictures

use super::xml_writer::XmlWriter;
use crate::error::Result;
use crate::units::EMU_PER_PIXEL;
use crate::workbook::{AnchorPoint, Picture};
use std::io::Write;

const XDR_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Write `drawingN.xml`; `image_rel_ids[i]` is the relationship of picture `i`
pub fn write_drawing<W: Write>(
    xml: &mut XmlWriter<W>,
    pictures: &[Picture],
    image_rel_ids: &[String],
) -> Result<()> {
    xml.declaration()?;
    xml.start_element("xdr:wsDr")?;
    xml.attribute("xmlns:xdr", XDR_NS)?;
    xml.attribute("xmlns:a", A_NS)?;
    xml.close_start_tag()?;

    for (index, (picture, rel_id)) in pictures.iter().zip(image_rel_ids).enumerate() {
        let anchor = &picture.anchor;
        xml.start_element("xdr:twoCellAnchor")?;
        xml.attribute("editAs", "oneCell")?;
        xml.close_start_tag()?;
        write_anchor_point(xml, "xdr:from", &anchor.from)?;
        write_anchor_point(xml, "xdr:to", &anchor.to)?;

        xml.open("xdr:pic")?;
        xml.open("xdr:nvPicPr")?;
        xml.start_element("xdr:cNvPr")?;
        xml.attribute_int("id", index as i64 + 2)?;
        xml.attribute("name", &format!("Picture {}", index + 1))?;
        xml.self_close()?;
        xml.write_str("<xdr:cNvPicPr><a:picLocks noChangeAspect=\"1\"/></xdr:cNvPicPr>")?;
        xml.end_element("xdr:nvPicPr")?;

        xml.open("xdr:blipFill")?;
        xml.start_element("a:blip")?;
        xml.attribute("xmlns:r", R_NS)?;
        xml.attribute("r:embed", rel_id)?;
        xml.self_close()?;
        xml.write_str("<a:stretch><a:fillRect/></a:stretch>")?;
        xml.end_element("xdr:blipFill")?;

        xml.open("xdr:spPr")?;
        xml.open("a:xfrm")?;
        xml.write_str("<a:off x=\"0\" y=\"0\"/>")?;
        xml.start_element("a:ext")?;
        xml.attribute_int("cx", anchor.width_px as i64 * EMU_PER_PIXEL)?;
        xml.attribute_int("cy", anchor.height_px as i64 * EMU_PER_PIXEL)?;
        xml.self_close()?;
        xml.end_element("a:xfrm")?;
        xml.write_str("<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom>")?;
        xml.end_element("xdr:spPr")?;
        xml.end_element("xdr:pic")?;

        xml.empty_element("xdr:clientData")?;
        xml.end_element("xdr:twoCellAnchor")?;
    }

    xml.end_element("xdr:wsDr")?;
    xml.flush()
}

fn write_anchor_point<W: Write>(xml: &mut XmlWriter<W>, name: &str, point: &AnchorPoint) -> Result<()> {
    let mut buf = itoa::Buffer::new();
    xml.open(name)?;
    xml.text_element("xdr:col", buf.format(point.col))?;
    xml.text_element("xdr:colOff", buf.format(point.col_offset_px as i64 * EMU_PER_PIXEL))?;
    xml.text_element("xdr:row", buf.format(point.row))?;
    xml.text_element("xdr:rowOff", buf.format(point.row_offset_px as i64 * EMU_PER_PIXEL))?;
    xml.end_element(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::{ImageAnchor, ImageFormat};

    #[test]
    fn test_anchor_in_emu() {
        let picture = Picture {
            data: vec![0x89, b'P', b'N', b'G'],
            format: ImageFormat::Png,
            anchor: ImageAnchor {
                from: AnchorPoint {
                    col: 1,
                    col_offset_px: 0,
                    row: 2,
                    row_offset_px: 0,
                },
                to: AnchorPoint {
                    col: 3,
                    col_offset_px: 10,
                    row: 4,
                    row_offset_px: 5,
                },
                width_px: 200,
                height_px: 50,
            },
        };
        let mut out = Vec::new();
        let mut xml = XmlWriter::new(&mut out);
        write_drawing(&mut xml, &[picture], &["rId1".to_string()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("<xdr:colOff>95250</xdr:colOff>"));
        assert!(text.contains("<xdr:rowOff>47625</xdr:rowOff>"));
        assert!(text.contains("cx=\"1905000\""));
        assert!(text.contains("r:embed=\"rId1\""));
    }
}
