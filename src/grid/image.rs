//! Deferred images: fetching, format detection and grid anchoring

use crate::error::{EmitterError, Result};
use crate::units;
use crate::workbook::{AnchorPoint, ImageAnchor, ImageFormat, Picture, Sheet};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::io::Cursor;

/// Source of image bytes for images referenced by URI
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP(S) download
#[cfg(feature = "remote-images")]
#[derive(Debug)]
pub struct HttpImageFetcher {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "remote-images")]
impl HttpImageFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| EmitterError::Image(e.to_string()))?;
        Ok(HttpImageFetcher { client })
    }
}

#[cfg(feature = "remote-images")]
impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(uri)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| EmitterError::Image(format!("{}: {}", uri, e)))?;
        let bytes = response
            .bytes()
            .map_err(|e| EmitterError::Image(format!("{}: {}", uri, e)))?;
        Ok(bytes.to_vec())
    }
}

/// Where the bytes of an image come from
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Inline(Vec<u8>),
    Uri(String),
}

/// An image waiting for its page to close
#[derive(Debug, Clone)]
pub struct CellImage {
    pub row: u32,
    pub col: u32,
    pub source: ImageSource,
    pub mime_type: Option<String>,
    /// Pixel size from metadata
    pub intrinsic_size: Option<(u32, u32)>,
    /// Pixel size requested by the report
    pub declared_size: Option<(u32, u32)>,
    /// May extend to the right over following columns
    pub span_columns: bool,
    /// Width available when the image may not span, in pixels
    pub cell_width_px: Option<u32>,
}

/// Bytes for a source; `data:` and `file:` URIs are handled locally
pub fn load_bytes(source: &ImageSource, fetcher: Option<&dyn ImageFetcher>) -> Result<Vec<u8>> {
    let uri = match source {
        ImageSource::Inline(data) => return Ok(data.clone()),
        ImageSource::Uri(uri) => uri.trim(),
    };
    if let Some(rest) = uri.strip_prefix("data:") {
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| EmitterError::Image("malformed data URI".into()))?;
        if !header.ends_with(";base64") {
            return Err(EmitterError::Image("data URI is not base64 encoded".into()));
        }
        return BASE64
            .decode(payload.trim())
            .map_err(|e| EmitterError::Image(e.to_string()));
    }
    if let Some(path) = uri.strip_prefix("file://").or_else(|| uri.strip_prefix("file:")) {
        return std::fs::read(path).map_err(|e| EmitterError::Image(format!("{}: {}", path, e)));
    }
    match fetcher {
        Some(fetcher) => fetcher.fetch(uri),
        None => Err(EmitterError::Image(format!(
            "no image fetcher configured for {}",
            uri
        ))),
    }
}

/// Image format from leading bytes
pub fn sniff_format(data: &[u8]) -> Option<ImageFormat> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(ImageFormat::Jpeg)
    } else if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Some(ImageFormat::Png)
    } else {
        None
    }
}

/// Picture bytes ready to embed, plus the pixel size to draw at
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width_px: u32,
    pub height_px: u32,
}

/// Fetch, identify and size an image; other raster formats are converted to PNG
pub fn resolve(image: &CellImage, fetcher: Option<&dyn ImageFetcher>) -> Result<ResolvedImage> {
    let mut data = load_bytes(&image.source, fetcher)?;
    let mut format = image
        .mime_type
        .as_deref()
        .and_then(ImageFormat::from_mime)
        .or_else(|| sniff_format(&data));
    let mut size = image.declared_size.or(image.intrinsic_size);

    if format.is_none() || size.is_none() {
        let decoded = image::load_from_memory(&data)?;
        if size.is_none() {
            size = Some((decoded.width(), decoded.height()));
        }
        if format.is_none() {
            let mut png = Vec::new();
            decoded.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
            log::debug!("Converted {} byte image to PNG", data.len());
            data = png;
            format = Some(ImageFormat::Png);
        }
    }

    let (width_px, height_px) = size.unwrap_or((0, 0));
    if width_px == 0 || height_px == 0 {
        return Err(EmitterError::Image("image has no size".into()));
    }
    Ok(ResolvedImage {
        data,
        format: format.unwrap_or(ImageFormat::Png),
        width_px,
        height_px,
    })
}

/// Anchor a resolved image at its cell
///
/// A non-spanning image is scaled down to the cell width. The anchor row grows
/// to the image height up to the format maximum; taller images continue over
/// the following rows. Column widths are never changed.
pub fn place(sheet: &mut Sheet, image: &CellImage, resolved: ResolvedImage) -> Result<()> {
    let (mut width, mut height) = (resolved.width_px, resolved.height_px);
    if !image.span_columns {
        let available = image
            .cell_width_px
            .unwrap_or_else(|| units::width_units_to_pixels(sheet.column_width(image.col)))
            .max(1);
        if width > available {
            height = ((height as u64 * available as u64) / width as u64).max(1) as u32;
            width = available;
        }
    }

    let needed_points = units::pixels_to_points(height as f64);
    if sheet.row_height(image.row) < needed_points {
        sheet.set_row_height(image.row, needed_points)?;
    }

    // the anchor stops at the last addressable column or row
    let limits = sheet.limits();
    let mut col = image.col;
    let mut remaining_w = width;
    let col_offset_px = loop {
        let col_px = units::width_units_to_pixels(sheet.column_width(col)).max(1);
        if remaining_w <= col_px || !image.span_columns || col + 1 >= limits.max_columns {
            break remaining_w.min(col_px);
        }
        remaining_w -= col_px;
        col += 1;
    };
    if image.span_columns && remaining_w > col_offset_px {
        width -= remaining_w - col_offset_px;
        log::warn!("Image at ({}, {}) cut at the last column", image.row, image.col);
    }

    let mut row = image.row;
    let mut remaining_h = height;
    let row_offset_px = loop {
        let row_px = (units::points_to_pixels(sheet.row_height(row)).round() as u32).max(1);
        if remaining_h <= row_px || row + 1 >= limits.max_rows {
            break remaining_h.min(row_px);
        }
        remaining_h -= row_px;
        row += 1;
    };
    if remaining_h > row_offset_px {
        height -= remaining_h - row_offset_px;
        log::warn!("Image at ({}, {}) cut at the last row", image.row, image.col);
    }

    log::debug!(
        "Placed {}x{} image at ({}, {}) to ({}, {})",
        width,
        height,
        image.row,
        image.col,
        row,
        col
    );
    sheet.add_picture(Picture {
        data: resolved.data,
        format: resolved.format,
        anchor: ImageAnchor {
            from: AnchorPoint {
                col: image.col,
                col_offset_px: 0,
                row: image.row,
                row_offset_px: 0,
            },
            to: AnchorPoint {
                col,
                col_offset_px,
                row,
                row_offset_px,
            },
            width_px: width,
            height_px: height,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::SheetLimits;

    const PNG_1X1: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    fn sheet() -> Sheet {
        Sheet::new(
            None,
            SheetLimits {
                max_rows: 1_048_576,
                max_columns: 16_384,
            },
            15.0,
        )
    }

    fn cell_image(span_columns: bool, size: (u32, u32)) -> CellImage {
        CellImage {
            row: 2,
            col: 1,
            source: ImageSource::Inline(PNG_1X1.to_vec()),
            mime_type: None,
            intrinsic_size: Some(size),
            declared_size: None,
            span_columns,
            cell_width_px: None,
        }
    }

    #[test]
    fn test_sniff_format() {
        assert_eq!(sniff_format(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(sniff_format(PNG_1X1), Some(ImageFormat::Png));
        assert_eq!(sniff_format(b"GIF89a"), None);
    }

    #[test]
    fn test_data_uri() {
        let uri = format!("data:image/png;base64,{}", BASE64.encode(PNG_1X1));
        let bytes = load_bytes(&ImageSource::Uri(uri), None).unwrap();
        assert_eq!(bytes, PNG_1X1);
        assert!(load_bytes(&ImageSource::Uri("http://x/y.png".into()), None).is_err());
    }

    #[test]
    fn test_resolve_decodes_size() {
        let mut image = cell_image(false, (1, 1));
        image.intrinsic_size = None;
        let resolved = resolve(&image, None).unwrap();
        assert_eq!((resolved.width_px, resolved.height_px), (1, 1));
        assert_eq!(resolved.format, ImageFormat::Png);
    }

    #[test]
    fn test_spanning_image_walks_columns() {
        let mut sheet = sheet();
        let image = cell_image(true, (150, 20));
        let resolved = resolve(&image, None).unwrap();
        place(&mut sheet, &image, resolved).unwrap();

        let anchor = sheet.pictures()[0].anchor;
        // default columns are 64px: 150 = 64 + 64 + 22
        assert_eq!(anchor.to.col, 3);
        assert_eq!(anchor.to.col_offset_px, 22);
        assert_eq!(anchor.to.row, 2);
        assert_eq!(anchor.to.row_offset_px, 20);
        assert!(!sheet.has_column_width(1));
        assert_eq!(sheet.row_height(2), 15.0);
    }

    #[test]
    fn test_narrow_cell_scales_and_grows_row() {
        let mut sheet = sheet();
        let image = cell_image(false, (128, 80));
        let resolved = resolve(&image, None).unwrap();
        place(&mut sheet, &image, resolved).unwrap();

        let anchor = sheet.pictures()[0].anchor;
        assert_eq!((anchor.width_px, anchor.height_px), (64, 40));
        assert_eq!(anchor.to.col, 1);
        assert_eq!(anchor.to.col_offset_px, 64);
        assert_eq!(sheet.row_height(2), 30.0);
    }

    #[test]
    fn test_spanning_image_stops_at_last_column() {
        let mut sheet = Sheet::new(
            None,
            SheetLimits {
                max_rows: 65_536,
                max_columns: 256,
            },
            15.0,
        );
        let mut image = cell_image(true, (300, 20));
        image.col = 254;
        let resolved = resolve(&image, None).unwrap();
        place(&mut sheet, &image, resolved).unwrap();

        let anchor = sheet.pictures()[0].anchor;
        assert_eq!(anchor.to.col, 255);
        assert_eq!(anchor.to.col_offset_px, 64);
        assert_eq!(anchor.width_px, 128);
    }
}
