//! Office Open XML (.xlsx) output
//!
//! The package is assembled in memory and copied to the destination once the
//! zip directory is complete, so the destination does not need to be seekable.

pub mod drawing;
pub mod styles;
pub mod worksheet;
pub mod xml_writer;

use self::worksheet::SheetRelationships;
use self::xml_writer::XmlWriter;
use super::flavor::SpreadsheetFlavor;
use super::shared_strings::{segments, SharedString, SharedStrings};
use super::{quote_sheet_name, Workbook};
use crate::config::OutputFormat;
use crate::error::Result;
use crate::types::{ColorRef, Rgb};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_TYPE_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/";

/// True-colour flavor writing SpreadsheetML packages
#[derive(Debug, Default)]
pub struct XlsxFlavor;

impl XlsxFlavor {
    pub fn new() -> Self {
        XlsxFlavor
    }
}

impl SpreadsheetFlavor for XlsxFlavor {
    fn format(&self) -> OutputFormat {
        OutputFormat::Xlsx
    }

    fn max_rows(&self) -> u32 {
        1_048_576
    }

    fn max_columns(&self) -> u32 {
        16_384
    }

    fn max_cell_styles(&self) -> usize {
        64_000
    }

    fn max_fonts(&self) -> usize {
        1_024
    }

    fn default_font_name(&self) -> &str {
        "Calibri"
    }

    fn default_font_size(&self) -> f64 {
        11.0
    }

    fn default_row_height_points(&self) -> f64 {
        15.0
    }

    fn resolve_color(&mut self, rgb: Rgb) -> ColorRef {
        ColorRef::Rgb(rgb)
    }

    fn palette(&self) -> Option<&[Rgb]> {
        None
    }

    fn write(&self, workbook: &Workbook, out: &mut dyn Write) -> Result<()> {
        let package = write_package(workbook)?;
        out.write_all(&package)?;
        log::info!(
            "Wrote xlsx package: {} sheet(s), {} bytes",
            workbook.sheets().len(),
            package.len()
        );
        Ok(())
    }
}

/// Build the complete package in memory
pub fn write_package(workbook: &Workbook) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(6));

    let mut strings = SharedStrings::new();
    let mut image_counter = 0usize;
    let mut drawing_counter = 0usize;
    let mut image_extensions: Vec<&'static str> = Vec::new();
    let mut drawing_parts: Vec<usize> = Vec::new();

    for (index, sheet) in workbook.sheets().iter().enumerate() {
        let sheet_number = index + 1;
        let mut rels = SheetRelationships::default();
        let mut sheet_rels: Vec<(String, String, String, bool)> = Vec::new();

        if !sheet.pictures().is_empty() {
            drawing_counter += 1;
            drawing_parts.push(drawing_counter);
            let id = format!("rId{}", sheet_rels.len() + 1);
            sheet_rels.push((
                id.clone(),
                format!("{}drawing", REL_TYPE_BASE),
                format!("../drawings/drawing{}.xml", drawing_counter),
                false,
            ));
            rels.drawing = Some(id);

            let mut image_rel_ids = Vec::new();
            let mut drawing_rels = Vec::new();
            for picture in sheet.pictures() {
                image_counter += 1;
                let ext = picture.format.extension();
                if !image_extensions.contains(&ext) {
                    image_extensions.push(ext);
                }
                let media = format!("xl/media/image{}.{}", image_counter, ext);
                zip.start_file(media, options)?;
                zip.write_all(&picture.data)?;

                let rel_id = format!("rId{}", image_rel_ids.len() + 1);
                drawing_rels.push((
                    rel_id.clone(),
                    format!("{}image", REL_TYPE_BASE),
                    format!("../media/image{}.{}", image_counter, ext),
                    false,
                ));
                image_rel_ids.push(rel_id);
            }

            zip.start_file(format!("xl/drawings/drawing{}.xml", drawing_counter), options)?;
            drawing::write_drawing(&mut XmlWriter::new(&mut zip), sheet.pictures(), &image_rel_ids)?;
            zip.start_file(
                format!("xl/drawings/_rels/drawing{}.xml.rels", drawing_counter),
                options,
            )?;
            write_relationships(&mut XmlWriter::new(&mut zip), &drawing_rels)?;
        }

        for link in sheet.hyperlinks() {
            if link.url.starts_with('#') {
                rels.hyperlinks.push(None);
                continue;
            }
            let id = format!("rId{}", sheet_rels.len() + 1);
            sheet_rels.push((
                id.clone(),
                format!("{}hyperlink", REL_TYPE_BASE),
                link.url.clone(),
                true,
            ));
            rels.hyperlinks.push(Some(id));
        }

        zip.start_file(format!("xl/worksheets/sheet{}.xml", sheet_number), options)?;
        worksheet::write_worksheet(
            &mut XmlWriter::new(&mut zip),
            sheet,
            index == 0,
            &mut strings,
            &rels,
        )
        .map_err(|e| crate::error::EmitterError::WriteSheetError {
            sheet: sheet.name().unwrap_or_default().to_string(),
            source: Box::new(e),
        })?;

        if !sheet_rels.is_empty() {
            zip.start_file(
                format!("xl/worksheets/_rels/sheet{}.xml.rels", sheet_number),
                options,
            )?;
            write_relationships(&mut XmlWriter::new(&mut zip), &sheet_rels)?;
        }
    }

    zip.start_file("xl/sharedStrings.xml", options)?;
    write_shared_strings(&mut XmlWriter::new(&mut zip), &strings, workbook)?;

    zip.start_file("xl/styles.xml", options)?;
    styles::write_styles(&mut XmlWriter::new(&mut zip), workbook)?;

    zip.start_file("xl/workbook.xml", options)?;
    write_workbook_xml(&mut XmlWriter::new(&mut zip), workbook)?;

    zip.start_file("xl/_rels/workbook.xml.rels", options)?;
    write_workbook_rels(&mut XmlWriter::new(&mut zip), workbook.sheets().len())?;

    zip.start_file("[Content_Types].xml", options)?;
    write_content_types(
        &mut XmlWriter::new(&mut zip),
        workbook.sheets().len(),
        &drawing_parts,
        &image_extensions,
    )?;

    zip.start_file("_rels/.rels", options)?;
    write_root_rels(&mut zip)?;

    zip.start_file("docProps/core.xml", options)?;
    write_core_props(&mut XmlWriter::new(&mut zip), workbook.title())?;

    zip.start_file("docProps/app.xml", options)?;
    write_app_props(&mut zip)?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn write_relationships<W: Write>(
    xml: &mut XmlWriter<W>,
    rels: &[(String, String, String, bool)],
) -> Result<()> {
    xml.declaration()?;
    xml.start_element("Relationships")?;
    xml.attribute("xmlns", PKG_REL_NS)?;
    xml.close_start_tag()?;
    for (id, rel_type, target, external) in rels {
        xml.start_element("Relationship")?;
        xml.attribute("Id", id)?;
        xml.attribute("Type", rel_type)?;
        xml.attribute("Target", target)?;
        if *external {
            xml.attribute("TargetMode", "External")?;
        }
        xml.self_close()?;
    }
    xml.end_element("Relationships")?;
    xml.flush()
}

fn write_shared_strings<W: Write>(
    xml: &mut XmlWriter<W>,
    strings: &SharedStrings,
    workbook: &Workbook,
) -> Result<()> {
    xml.declaration()?;
    xml.start_element("sst")?;
    xml.attribute("xmlns", MAIN_NS)?;
    xml.attribute_int("count", strings.references() as i64)?;
    xml.attribute_int("uniqueCount", strings.count() as i64)?;
    xml.close_start_tag()?;

    for entry in strings.iter() {
        xml.open("si")?;
        match entry {
            SharedString::Plain(text) => write_text(xml, text)?,
            SharedString::Rich(rich) => {
                for (text, font) in segments(rich) {
                    xml.open("r")?;
                    if let Some(font) = font.and_then(|f| workbook.font(f)) {
                        xml.open("rPr")?;
                        styles::write_font_properties(xml, font, "rFont")?;
                        xml.end_element("rPr")?;
                    }
                    write_text(xml, &text)?;
                    xml.end_element("r")?;
                }
            }
        }
        xml.end_element("si")?;
    }

    xml.end_element("sst")?;
    xml.flush()
}

fn write_text<W: Write>(xml: &mut XmlWriter<W>, text: &str) -> Result<()> {
    xml.start_element("t")?;
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        xml.attribute("xml:space", "preserve")?;
    }
    xml.close_start_tag()?;
    xml.write_escaped(text)?;
    xml.end_element("t")
}

fn write_workbook_xml<W: Write>(xml: &mut XmlWriter<W>, workbook: &Workbook) -> Result<()> {
    xml.declaration()?;
    xml.start_element("workbook")?;
    xml.attribute("xmlns", MAIN_NS)?;
    xml.attribute("xmlns:r", REL_NS)?;
    xml.close_start_tag()?;
    xml.write_str("<bookViews><workbookView activeTab=\"0\"/></bookViews>")?;

    xml.open("sheets")?;
    for (i, sheet) in workbook.sheets().iter().enumerate() {
        let sheet_id = i + 1;
        let name = sheet
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Sheet{}", sheet_id));
        xml.start_element("sheet")?;
        xml.attribute("name", &name)?;
        xml.attribute_int("sheetId", sheet_id as i64)?;
        xml.attribute("r:id", &format!("rId{}", sheet_id))?;
        xml.self_close()?;
    }
    xml.end_element("sheets")?;

    if !workbook.defined_names().is_empty() {
        xml.open("definedNames")?;
        for defined in workbook.defined_names() {
            let Some(sheet) = workbook.sheet(defined.sheet) else {
                log::warn!("Defined name '{}' points at a missing sheet", defined.name);
                continue;
            };
            let sheet_name = sheet
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Sheet{}", defined.sheet + 1));
            xml.start_element("definedName")?;
            xml.attribute("name", &defined.name)?;
            xml.close_start_tag()?;
            xml.write_escaped(&format!(
                "{}!{}",
                quote_sheet_name(&sheet_name),
                defined.range.absolute()
            ))?;
            xml.end_element("definedName")?;
        }
        xml.end_element("definedNames")?;
    }

    xml.end_element("workbook")?;
    xml.flush()
}

fn write_workbook_rels<W: Write>(xml: &mut XmlWriter<W>, sheet_count: usize) -> Result<()> {
    let mut rels: Vec<(String, String, String, bool)> = (1..=sheet_count)
        .map(|i| {
            (
                format!("rId{}", i),
                format!("{}worksheet", REL_TYPE_BASE),
                format!("worksheets/sheet{}.xml", i),
                false,
            )
        })
        .collect();
    rels.push((
        format!("rId{}", sheet_count + 1),
        format!("{}styles", REL_TYPE_BASE),
        "styles.xml".to_string(),
        false,
    ));
    rels.push((
        format!("rId{}", sheet_count + 2),
        format!("{}sharedStrings", REL_TYPE_BASE),
        "sharedStrings.xml".to_string(),
        false,
    ));
    write_relationships(xml, &rels)
}

fn write_content_types<W: Write>(
    xml: &mut XmlWriter<W>,
    sheet_count: usize,
    drawings: &[usize],
    image_extensions: &[&str],
) -> Result<()> {
    xml.declaration()?;
    xml.start_element("Types")?;
    xml.attribute("xmlns", "http://schemas.openxmlformats.org/package/2006/content-types")?;
    xml.close_start_tag()?;
    xml.write_str("<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>")?;
    xml.write_str("<Default Extension=\"xml\" ContentType=\"application/xml\"/>")?;
    for ext in image_extensions {
        xml.start_element("Default")?;
        xml.attribute("Extension", ext)?;
        xml.attribute("ContentType", &format!("image/{}", ext))?;
        xml.self_close()?;
    }

    let mut overrides = vec![(
        "/xl/workbook.xml".to_string(),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
    )];
    for i in 1..=sheet_count {
        overrides.push((
            format!("/xl/worksheets/sheet{}.xml", i),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
        ));
    }
    for i in drawings {
        overrides.push((
            format!("/xl/drawings/drawing{}.xml", i),
            "application/vnd.openxmlformats-officedocument.drawing+xml",
        ));
    }
    overrides.push((
        "/xl/styles.xml".to_string(),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml",
    ));
    overrides.push((
        "/xl/sharedStrings.xml".to_string(),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml",
    ));
    overrides.push((
        "/docProps/core.xml".to_string(),
        "application/vnd.openxmlformats-package.core-properties+xml",
    ));
    overrides.push((
        "/docProps/app.xml".to_string(),
        "application/vnd.openxmlformats-officedocument.extended-properties+xml",
    ));
    for (part, content_type) in overrides {
        xml.start_element("Override")?;
        xml.attribute("PartName", &part)?;
        xml.attribute("ContentType", content_type)?;
        xml.self_close()?;
    }
    xml.end_element("Types")?;
    xml.flush()
}

fn write_root_rels<W: Write>(writer: &mut W) -> Result<()> {
    let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;
    writer.write_all(xml.as_bytes())?;
    Ok(())
}

fn write_core_props<W: Write>(xml: &mut XmlWriter<W>, title: Option<&str>) -> Result<()> {
    let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    xml.declaration()?;
    xml.write_str("<cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:dcterms=\"http://purl.org/dc/terms/\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">")?;
    if let Some(title) = title {
        xml.text_element("dc:title", title)?;
    }
    xml.text_element("dc:creator", "excelemitter")?;
    xml.write_str("<dcterms:created xsi:type=\"dcterms:W3CDTF\">")?;
    xml.write_str(&now)?;
    xml.write_str("</dcterms:created><dcterms:modified xsi:type=\"dcterms:W3CDTF\">")?;
    xml.write_str(&now)?;
    xml.write_str("</dcterms:modified></cp:coreProperties>")?;
    xml.flush()
}

fn write_app_props<W: Write>(writer: &mut W) -> Result<()> {
    let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
<Application>excelemitter</Application>
<DocSecurity>0</DocSecurity>
<ScaleCrop>false</ScaleCrop>
<LinksUpToDate>false</LinksUpToDate>
<SharedDoc>false</SharedDoc>
<HyperlinksChanged>false</HyperlinksChanged>
</Properties>"#;
    writer.write_all(xml.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellRange, CellValue, StyleHandle};
    use crate::workbook::{flavor_for, NamedRange};
    use std::io::Read;

    fn part(package: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(package)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut text = String::new();
        file.read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn test_package_parts() {
        let mut workbook = Workbook::new(flavor_for(OutputFormat::Xlsx));
        let index = workbook.add_sheet(Some("Report".into()));
        let sheet = workbook.sheet_mut(index).unwrap();
        sheet.set_cell(0, 0, CellValue::from("Total"), StyleHandle::DEFAULT).unwrap();
        sheet
            .add_hyperlink(CellRange::single(0, 0), "https://example.com/?a=1&b=2")
            .unwrap();
        workbook.add_defined_name(NamedRange {
            name: "Total".into(),
            sheet: 0,
            range: CellRange::single(0, 0),
        });

        let package = write_package(&workbook).unwrap();
        let book = part(&package, "xl/workbook.xml");
        assert!(book.contains("<sheet name=\"Report\" sheetId=\"1\" r:id=\"rId1\"/>"));
        assert!(book.contains("<definedName name=\"Total\">&apos;Report&apos;!$A$1:$A$1</definedName>"));

        let rels = part(&package, "xl/worksheets/_rels/sheet1.xml.rels");
        assert!(rels.contains("TargetMode=\"External\""));
        assert!(rels.contains("a=1&amp;b=2"));

        let sst = part(&package, "xl/sharedStrings.xml");
        assert!(sst.contains("<t>Total</t>"));
    }
}
