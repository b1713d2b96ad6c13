//! Unit and geometry conversion
//!
//! Column widths are stored in 256ths of the default character width ("width
//! units"). One character is 7 pixels wide, and pixel widths that are not a
//! multiple of 7 map onto the fractional part through [`UNIT_OFFSET_MAP`].
//! Row heights are stored in twips (1/20 of a point).

/// Width units per character
pub const WIDTH_UNITS_PER_CHAR: u32 = 256;
/// Pixels per character at the default font
pub const PIXELS_PER_CHAR: u32 = 7;
/// Width units for each pixel remainder 0..7
pub const UNIT_OFFSET_MAP: [u32; 7] = [0, 36, 73, 109, 146, 182, 219];
/// Widest column the formats accept (255 characters)
pub const MAX_WIDTH_UNITS: u32 = 255 * WIDTH_UNITS_PER_CHAR;

pub const PIXELS_PER_INCH: f64 = 96.0;
pub const POINTS_PER_INCH: f64 = 72.0;
pub const MM_PER_INCH: f64 = 25.4;
pub const PIXELS_PER_MM: f64 = PIXELS_PER_INCH / MM_PER_INCH;
pub const TWIPS_PER_POINT: f64 = 20.0;
/// Tallest row the formats accept, in points
pub const MAX_ROW_HEIGHT_POINTS: f64 = 409.0;
/// DrawingML English Metric Units per pixel
pub const EMU_PER_PIXEL: i64 = 9525;

/// 8.43 characters, 64 pixels
pub const DEFAULT_COLUMN_WIDTH_UNITS: u32 = 2340;

/// Pixels to width units, exact for the 7-pixel character grid
pub fn pixels_to_width_units(pixels: u32) -> u32 {
    let units = WIDTH_UNITS_PER_CHAR * (pixels / PIXELS_PER_CHAR)
        + UNIT_OFFSET_MAP[(pixels % PIXELS_PER_CHAR) as usize];
    units.min(MAX_WIDTH_UNITS)
}

/// Width units to whole pixels
pub fn width_units_to_pixels(width_units: u32) -> u32 {
    let whole = (width_units / WIDTH_UNITS_PER_CHAR) * PIXELS_PER_CHAR;
    let offset = width_units % WIDTH_UNITS_PER_CHAR;
    let fraction =
        (offset as f64 / (WIDTH_UNITS_PER_CHAR as f64 / PIXELS_PER_CHAR as f64)).round() as u32;
    whole + fraction
}

/// Millimetres to width units
pub fn millimetres_to_width_units(mm: f64) -> u32 {
    if mm <= 0.0 || !mm.is_finite() {
        return 0;
    }
    let units = mm * PIXELS_PER_MM * WIDTH_UNITS_PER_CHAR as f64 / PIXELS_PER_CHAR as f64;
    (units.round() as u32).min(MAX_WIDTH_UNITS)
}

/// Width units to millimetres
pub fn width_units_to_millimetres(width_units: u32) -> f64 {
    width_units as f64 * PIXELS_PER_CHAR as f64 / WIDTH_UNITS_PER_CHAR as f64 / PIXELS_PER_MM
}

/// Millimetres to (fractional) pixels
pub fn millimetres_to_pixels(mm: f64) -> f64 {
    mm * PIXELS_PER_MM
}

/// Pixels to millimetres
pub fn pixels_to_millimetres(pixels: f64) -> f64 {
    pixels / PIXELS_PER_MM
}

/// Points to row height units (twips), clamped to the format maximum
pub fn points_to_twips(points: f64) -> u16 {
    let clamped = points.clamp(0.0, MAX_ROW_HEIGHT_POINTS);
    (clamped * TWIPS_PER_POINT).round() as u16
}

/// Row height units (twips) to points
pub fn twips_to_points(twips: u16) -> f64 {
    twips as f64 / TWIPS_PER_POINT
}

pub fn points_to_pixels(points: f64) -> f64 {
    points * PIXELS_PER_INCH / POINTS_PER_INCH
}

pub fn pixels_to_points(pixels: f64) -> f64 {
    pixels * POINTS_PER_INCH / PIXELS_PER_INCH
}

pub fn millimetres_to_points(mm: f64) -> f64 {
    mm / MM_PER_INCH * POINTS_PER_INCH
}

pub fn points_to_millimetres(points: f64) -> f64 {
    points / POINTS_PER_INCH * MM_PER_INCH
}

/// Points for a CSS absolute font-size keyword
pub fn font_size_keyword_points(keyword: &str) -> Option<f64> {
    let points = match keyword.trim().to_ascii_lowercase().as_str() {
        "xx-small" => 7.0,
        "x-small" => 7.5,
        "small" => 10.0,
        "medium" => 12.0,
        "large" => 13.5,
        "x-large" => 18.0,
        "xx-large" => 24.0,
        // relative keywords resolve against the default medium size
        "smaller" => 10.0,
        "larger" => 13.5,
        _ => return None,
    };
    Some(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_width_units() {
        assert_eq!(pixels_to_width_units(0), 0);
        assert_eq!(pixels_to_width_units(7), 256);
        assert_eq!(pixels_to_width_units(64), DEFAULT_COLUMN_WIDTH_UNITS);
        assert_eq!(width_units_to_pixels(DEFAULT_COLUMN_WIDTH_UNITS), 64);
        for px in 0..500 {
            assert_eq!(width_units_to_pixels(pixels_to_width_units(px)), px);
        }
    }

    #[test]
    fn test_width_units_millimetre_round_trip() {
        for units in (0..=MAX_WIDTH_UNITS).step_by(17) {
            let back = millimetres_to_width_units(width_units_to_millimetres(units));
            assert!(
                (back as i64 - units as i64).abs() <= 1,
                "{} -> {}",
                units,
                back
            );
        }
    }

    #[test]
    fn test_row_height_units() {
        assert_eq!(points_to_twips(15.0), 300);
        assert_eq!(twips_to_points(255), 12.75);
        assert_eq!(points_to_twips(1000.0), 8180);
        assert_eq!(points_to_twips(-3.0), 0);
    }

    #[test]
    fn test_font_size_keywords() {
        assert_eq!(font_size_keyword_points("small"), Some(10.0));
        assert_eq!(font_size_keyword_points("X-Large"), Some(18.0));
        assert_eq!(font_size_keyword_points("12pt"), None);
    }

    #[test]
    fn test_physical_conversions() {
        assert!((millimetres_to_points(25.4) - 72.0).abs() < 1e-9);
        assert!((points_to_pixels(72.0) - 96.0).abs() < 1e-9);
        assert!((pixels_to_millimetres(millimetres_to_pixels(10.0)) - 10.0).abs() < 1e-9);
    }
}
