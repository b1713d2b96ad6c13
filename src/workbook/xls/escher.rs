//! Office drawing (Escher) records for BIFF8 pictures
//!
//! Pictures are stored once in the workbook's blip store. Each sheet holds a
//! drawing container whose shapes reference a blip by its 1-based position in
//! the store. The drawing container is split across MSODRAWING records, one
//! per shape, each followed by the shape's OBJ record.

use super::biff::Payload;
use crate::units;
use crate::workbook::{AnchorPoint, ImageFormat, Picture, Sheet};
use md5::{Digest, Md5};

const DGG_CONTAINER: u16 = 0xF000;
const BSTORE_CONTAINER: u16 = 0xF001;
const DG_CONTAINER: u16 = 0xF002;
const SPGR_CONTAINER: u16 = 0xF003;
const SP_CONTAINER: u16 = 0xF004;
const FDGG: u16 = 0xF006;
const FBSE: u16 = 0xF007;
const FDG: u16 = 0xF008;
const FSPGR: u16 = 0xF009;
const FSP: u16 = 0xF00A;
const OPT: u16 = 0xF00B;
const CLIENT_ANCHOR: u16 = 0xF010;
const CLIENT_DATA: u16 = 0xF011;
const BLIP_JPEG: u16 = 0xF01D;
const BLIP_PNG: u16 = 0xF01E;

const SHAPE_PICTURE_FRAME: u16 = 75;
const PROP_PIB: u16 = 0x4104;
const SHAPES_PER_DRAWING: u32 = 1024;

fn header(out: &mut Payload, version: u16, instance: u16, record_type: u16, length: usize) {
    out.u16((instance << 4) | (version & 0x0F))
        .u16(record_type)
        .u32(length as u32);
}

fn atom(out: &mut Payload, version: u16, instance: u16, record_type: u16, body: &[u8]) {
    header(out, version, instance, record_type, body.len());
    out.bytes(body);
}

/// A picture stored in the blip store
#[derive(Debug, Clone)]
pub struct Blip<'a> {
    pub data: &'a [u8],
    pub format: ImageFormat,
    pub uid: [u8; 16],
}

impl<'a> Blip<'a> {
    pub fn new(data: &'a [u8], format: ImageFormat) -> Self {
        let digest = Md5::digest(data);
        let mut uid = [0u8; 16];
        uid.copy_from_slice(&digest);
        Blip { data, format, uid }
    }

    fn blip_type(&self) -> u8 {
        match self.format {
            ImageFormat::Jpeg => 5,
            ImageFormat::Png => 6,
        }
    }

    fn record(&self) -> Vec<u8> {
        let (record_type, instance) = match self.format {
            ImageFormat::Jpeg => (BLIP_JPEG, 0x46A),
            ImageFormat::Png => (BLIP_PNG, 0x6E0),
        };
        let mut out = Payload::new();
        header(&mut out, 0, instance, record_type, 17 + self.data.len());
        out.bytes(&self.uid).u8(0xFF).bytes(self.data);
        out.take()
    }
}

/// Per-sheet drawing bookkeeping for the FDGG cluster table
#[derive(Debug, Clone, Copy)]
pub struct DrawingInfo {
    /// 1-based drawing id
    pub drawing_id: u32,
    pub picture_count: u32,
}

impl DrawingInfo {
    fn first_spid(&self) -> u32 {
        self.drawing_id * SHAPES_PER_DRAWING
    }

    /// Group shape plus one shape per picture
    fn shape_count(&self) -> u32 {
        self.picture_count + 1
    }

    fn last_spid(&self) -> u32 {
        self.first_spid() + self.picture_count
    }
}

/// The MSODRAWINGGROUP payload
pub fn drawing_group(drawings: &[DrawingInfo], blips: &[Blip<'_>]) -> Vec<u8> {
    let mut fdgg = Payload::new();
    let spid_max = drawings.iter().map(|d| d.last_spid() + 1).max().unwrap_or(SHAPES_PER_DRAWING);
    let shapes: u32 = drawings.iter().map(|d| d.shape_count()).sum();
    fdgg.u32(spid_max)
        .u32(drawings.len() as u32 + 1)
        .u32(shapes)
        .u32(drawings.len() as u32);
    for drawing in drawings {
        fdgg.u32(drawing.drawing_id).u32(drawing.shape_count() + 1);
    }
    let fdgg = fdgg.take();

    let mut store = Payload::new();
    for blip in blips {
        let record = blip.record();
        let mut body = Payload::new();
        body.u8(blip.blip_type())
            .u8(blip.blip_type())
            .bytes(&blip.uid)
            .u16(0xFF)
            .u32(record.len() as u32)
            .u32(1)
            .u32(0)
            .u8(0)
            .u8(0)
            .u8(0)
            .u8(0)
            .bytes(&record);
        atom(&mut store, 2, blip.blip_type() as u16, FBSE, &body.take());
    }
    let store = store.take();

    let mut content = Payload::new();
    atom(&mut content, 0, 0, FDGG, &fdgg);
    header(&mut content, 0xF, blips.len() as u16, BSTORE_CONTAINER, store.len());
    content.bytes(&store);
    let content = content.take();

    let mut out = Payload::new();
    header(&mut out, 0xF, 0, DGG_CONTAINER, content.len());
    out.bytes(&content);
    out.take()
}

/// MSODRAWING and OBJ payload pairs for one sheet
///
/// `blip_ids[i]` is the 1-based blip store position of picture `i`.
pub fn sheet_drawing(sheet: &Sheet, info: DrawingInfo, blip_ids: &[u32]) -> Vec<(Vec<u8>, Vec<u8>)> {
    let shape_containers: Vec<Vec<u8>> = sheet
        .pictures()
        .iter()
        .zip(blip_ids)
        .enumerate()
        .map(|(i, (picture, blip))| picture_shape(sheet, picture, info.first_spid() + 1 + i as u32, *blip))
        .collect();

    let mut group = Payload::new();
    {
        let mut body = Payload::new();
        atom(&mut body, 1, 0, FSPGR, &[0u8; 16]);
        let mut fsp = Payload::new();
        fsp.u32(info.first_spid()).u32(0x0005);
        atom(&mut body, 2, 0, FSP, &fsp.take());
        let body = body.take();
        header(&mut group, 0xF, 0, SP_CONTAINER, body.len());
        group.bytes(&body);
    }
    let group = group.take();

    let spgr_len = group.len() + shape_containers.iter().map(Vec::len).sum::<usize>();
    let mut fdg = Payload::new();
    fdg.u32(info.shape_count()).u32(info.last_spid());
    let fdg = fdg.take();
    let dg_len = 8 + fdg.len() + 8 + spgr_len;

    let mut records = Vec::with_capacity(shape_containers.len());
    for (i, shape) in shape_containers.into_iter().enumerate() {
        let mut drawing = Payload::new();
        if i == 0 {
            header(&mut drawing, 0xF, 0, DG_CONTAINER, dg_len);
            atom(&mut drawing, 0, info.drawing_id as u16, FDG, &fdg);
            header(&mut drawing, 0xF, 0, SPGR_CONTAINER, spgr_len);
            drawing.bytes(&group);
        }
        drawing.bytes(&shape);
        records.push((drawing.take(), picture_obj(i as u16 + 1)));
    }
    records
}

fn picture_shape(sheet: &Sheet, picture: &Picture, spid: u32, blip_id: u32) -> Vec<u8> {
    let mut body = Payload::new();
    let mut fsp = Payload::new();
    fsp.u32(spid).u32(0x0A00);
    atom(&mut body, 2, SHAPE_PICTURE_FRAME, FSP, &fsp.take());

    let mut opt = Payload::new();
    opt.u16(PROP_PIB).u32(blip_id);
    atom(&mut body, 3, 1, OPT, &opt.take());

    let (col1, dx1) = column_offset(sheet, &picture.anchor.from);
    let (row1, dy1) = row_offset(sheet, &picture.anchor.from);
    let (col2, dx2) = column_offset(sheet, &picture.anchor.to);
    let (row2, dy2) = row_offset(sheet, &picture.anchor.to);
    let mut anchor = Payload::new();
    anchor
        .u16(0x0000)
        .u16(col1)
        .u16(dx1)
        .u16(row1)
        .u16(dy1)
        .u16(col2)
        .u16(dx2)
        .u16(row2)
        .u16(dy2);
    atom(&mut body, 0, 0, CLIENT_ANCHOR, &anchor.take());
    atom(&mut body, 0, 0, CLIENT_DATA, &[]);

    let body = body.take();
    let mut out = Payload::new();
    header(&mut out, 0xF, 0, SP_CONTAINER, body.len());
    out.bytes(&body);
    out.take()
}

/// Column and offset in 1/1024 of the column width
fn column_offset(sheet: &Sheet, point: &AnchorPoint) -> (u16, u16) {
    let width_px = units::width_units_to_pixels(sheet.column_width(point.col)).max(1);
    let dx = (point.col_offset_px.min(width_px) as u64 * 1024 / width_px as u64).min(1023);
    (point.col as u16, dx as u16)
}

/// Row and offset in 1/256 of the row height
fn row_offset(sheet: &Sheet, point: &AnchorPoint) -> (u16, u16) {
    let height_px = (units::points_to_pixels(sheet.row_height(point.row)).round() as u32).max(1);
    let dy = (point.row_offset_px.min(height_px) as u64 * 256 / height_px as u64).min(255);
    (point.row as u16, dy as u16)
}

/// OBJ record for a picture: ftCmo, ftCf, ftPioGrbit, ftEnd
fn picture_obj(object_id: u16) -> Vec<u8> {
    let mut obj = Payload::new();
    obj.u16(0x0015)
        .u16(0x0012)
        .u16(0x0008)
        .u16(object_id)
        .u16(0x6011)
        .zeros(12);
    obj.u16(0x0007).u16(0x0002).u16(0xFFFF);
    obj.u16(0x0008).u16(0x0002).u16(0x0001);
    obj.u16(0x0000).u16(0x0000);
    obj.take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::{ImageAnchor, SheetLimits};

    fn picture() -> Picture {
        Picture {
            data: vec![0x89, b'P', b'N', b'G', 1, 2, 3],
            format: ImageFormat::Png,
            anchor: ImageAnchor {
                from: AnchorPoint::default(),
                to: AnchorPoint {
                    col: 2,
                    col_offset_px: 10,
                    row: 3,
                    row_offset_px: 4,
                },
                width_px: 100,
                height_px: 60,
            },
        }
    }

    #[test]
    fn test_blip_uid_is_md5() {
        let data = b"abc";
        let blip = Blip::new(data, ImageFormat::Png);
        assert_eq!(blip.uid[..4], [0x90, 0x01, 0x50, 0x98]);
    }

    #[test]
    fn test_drawing_group_lengths() {
        let pic = picture();
        let blips = vec![Blip::new(&pic.data, pic.format)];
        let info = DrawingInfo {
            drawing_id: 1,
            picture_count: 1,
        };
        let group = drawing_group(&[info], &blips);
        let declared = u32::from_le_bytes([group[4], group[5], group[6], group[7]]) as usize;
        assert_eq!(declared + 8, group.len());
        assert_eq!(&group[2..4], &DGG_CONTAINER.to_le_bytes());
    }

    #[test]
    fn test_sheet_drawing_container_covers_all_shapes() {
        let mut sheet = Sheet::new(
            None,
            SheetLimits {
                max_rows: 65_536,
                max_columns: 256,
            },
            12.75,
        );
        sheet.add_picture(picture()).unwrap();
        sheet.add_picture(picture()).unwrap();
        let info = DrawingInfo {
            drawing_id: 1,
            picture_count: 2,
        };
        let records = sheet_drawing(&sheet, info, &[1, 1]);
        assert_eq!(records.len(), 2);
        let total: usize = records.iter().map(|(d, _)| d.len()).sum();
        let first = &records[0].0;
        let declared = u32::from_le_bytes([first[4], first[5], first[6], first[7]]) as usize;
        assert_eq!(declared + 8, total);
        assert_eq!(records[1].1[6..8], [2, 0]);
    }
}
