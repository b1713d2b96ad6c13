//! Parsing of resolved CSS property values

use crate::types::{BorderStyle, HorizontalAlign, Rgb, VerticalAlign};
use crate::units;

/// CSS length unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CssUnit {
    Points,
    Pixels,
    Inches,
    Centimetres,
    Millimetres,
    Picas,
    Em,
    Ex,
    Percent,
}

/// A parsed CSS length
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CssLength {
    pub value: f64,
    pub unit: CssUnit,
}

impl CssLength {
    /// Parse "12pt", "1.5in", "50%", ... A bare number is taken as points.
    pub fn parse(text: &str) -> Option<CssLength> {
        let text = text.trim().to_ascii_lowercase();
        if text.is_empty() {
            return None;
        }
        let split = text
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
            .unwrap_or(text.len());
        let (number, suffix) = text.split_at(split);
        let value: f64 = number.parse().ok()?;
        let unit = match suffix.trim() {
            "" | "pt" => CssUnit::Points,
            "px" => CssUnit::Pixels,
            "in" => CssUnit::Inches,
            "cm" => CssUnit::Centimetres,
            "mm" => CssUnit::Millimetres,
            "pc" => CssUnit::Picas,
            "em" => CssUnit::Em,
            "ex" => CssUnit::Ex,
            "%" => CssUnit::Percent,
            _ => return None,
        };
        Some(CssLength { value, unit })
    }

    /// Whether the length can be converted without a reference size
    pub fn is_absolute(&self) -> bool {
        !matches!(self.unit, CssUnit::Em | CssUnit::Ex | CssUnit::Percent)
    }

    /// Absolute length in points
    pub fn to_points(&self) -> Option<f64> {
        let points = match self.unit {
            CssUnit::Points => self.value,
            CssUnit::Pixels => units::pixels_to_points(self.value),
            CssUnit::Inches => self.value * units::POINTS_PER_INCH,
            CssUnit::Centimetres => units::millimetres_to_points(self.value * 10.0),
            CssUnit::Millimetres => units::millimetres_to_points(self.value),
            CssUnit::Picas => self.value * 12.0,
            CssUnit::Em | CssUnit::Ex | CssUnit::Percent => return None,
        };
        Some(points)
    }

    /// Absolute length in millimetres
    pub fn to_millimetres(&self) -> Option<f64> {
        self.to_points().map(units::points_to_millimetres)
    }

    /// Length in millimetres, resolving percentages against `reference_mm`
    pub fn to_millimetres_relative(&self, reference_mm: Option<f64>) -> Option<f64> {
        match self.unit {
            CssUnit::Percent => reference_mm.map(|r| r * self.value / 100.0),
            _ => self.to_millimetres(),
        }
    }
}

/// Parse a colour value; `transparent` and unknown values yield `None`
pub fn parse_color(text: &str) -> Option<Rgb> {
    let text = text.trim().to_ascii_lowercase();
    if let Some(hex) = text.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(args) = text
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts: Vec<u8> = args
            .split(',')
            .filter_map(|part| parse_channel(part.trim()))
            .collect();
        if parts.len() == 3 {
            return Some(Rgb::new(parts[0], parts[1], parts[2]));
        }
        return None;
    }
    named_color(&text)
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let mut channels = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
            Some(Rgb::new(
                channels.next()??,
                channels.next()??,
                channels.next()??,
            ))
        }
        6 => Some(Rgb::new(
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        )),
        _ => None,
    }
}

fn parse_channel(text: &str) -> Option<u8> {
    if let Some(percent) = text.strip_suffix('%') {
        let value: f64 = percent.trim().parse().ok()?;
        return Some((value.clamp(0.0, 100.0) * 2.55).round() as u8);
    }
    let value: f64 = text.parse().ok()?;
    Some(value.clamp(0.0, 255.0).round() as u8)
}

fn named_color(name: &str) -> Option<Rgb> {
    let rgb = match name {
        "black" => Rgb::new(0, 0, 0),
        "white" => Rgb::new(255, 255, 255),
        "red" => Rgb::new(255, 0, 0),
        "lime" => Rgb::new(0, 255, 0),
        "blue" => Rgb::new(0, 0, 255),
        "yellow" => Rgb::new(255, 255, 0),
        "aqua" | "cyan" => Rgb::new(0, 255, 255),
        "fuchsia" | "magenta" => Rgb::new(255, 0, 255),
        "maroon" => Rgb::new(128, 0, 0),
        "green" => Rgb::new(0, 128, 0),
        "navy" => Rgb::new(0, 0, 128),
        "olive" => Rgb::new(128, 128, 0),
        "purple" => Rgb::new(128, 0, 128),
        "teal" => Rgb::new(0, 128, 128),
        "silver" => Rgb::new(192, 192, 192),
        "gray" | "grey" => Rgb::new(128, 128, 128),
        "orange" => Rgb::new(255, 165, 0),
        _ => return None,
    };
    Some(rgb)
}

/// Map CSS border-style + border-width onto a spreadsheet line style
pub fn parse_border(style: Option<&str>, width: Option<&str>) -> BorderStyle {
    let style = match style {
        Some(s) => s.trim().to_ascii_lowercase(),
        None => return BorderStyle::None,
    };
    let width_points = width.and_then(|w| match w.trim().to_ascii_lowercase().as_str() {
        "thin" => Some(0.75),
        "medium" => Some(1.5),
        "thick" => Some(2.25),
        other => CssLength::parse(other).and_then(|l| l.to_points()),
    });
    if width_points == Some(0.0) {
        return BorderStyle::None;
    }
    let heavy = width_points.map_or(false, |w| w > 1.0);
    let very_heavy = width_points.map_or(false, |w| w >= 2.0);
    match style.as_str() {
        "solid" if very_heavy => BorderStyle::Thick,
        "solid" if heavy => BorderStyle::Medium,
        "solid" => BorderStyle::Thin,
        "dashed" if heavy => BorderStyle::MediumDashed,
        "dashed" => BorderStyle::Dashed,
        "dotted" => BorderStyle::Dotted,
        "double" => BorderStyle::Double,
        "groove" | "ridge" | "inset" | "outset" => BorderStyle::Thin,
        _ => BorderStyle::None,
    }
}

/// CSS font-weight to bold flag
pub fn is_bold(weight: &str) -> bool {
    match weight.trim().to_ascii_lowercase().as_str() {
        "bold" | "bolder" => true,
        other => other.parse::<u32>().map_or(false, |w| w >= 600),
    }
}

/// CSS font-style to italic flag
pub fn is_italic(style: &str) -> bool {
    matches!(
        style.trim().to_ascii_lowercase().as_str(),
        "italic" | "oblique"
    )
}

/// CSS font-size (keyword or length) to points
pub fn parse_font_size(text: &str) -> Option<f64> {
    units::font_size_keyword_points(text).or_else(|| {
        CssLength::parse(text).and_then(|len| match len.unit {
            CssUnit::Em => Some(len.value * 12.0),
            CssUnit::Percent => Some(len.value * 12.0 / 100.0),
            _ => len.to_points(),
        })
    })
}

/// First family of a CSS font-family list, unquoted
pub fn primary_font_family(text: &str) -> Option<String> {
    let first = text.split(',').next()?.trim().trim_matches(|c| c == '"' || c == '\'');
    let mapped = match first.to_ascii_lowercase().as_str() {
        "" => return None,
        "serif" => "Times New Roman",
        "sans-serif" => "Arial",
        "monospace" => "Courier New",
        "cursive" => "Comic Sans MS",
        "fantasy" => "Impact",
        _ => first,
    };
    Some(mapped.to_string())
}

pub fn parse_text_align(text: &str) -> HorizontalAlign {
    match text.trim().to_ascii_lowercase().as_str() {
        "left" | "start" => HorizontalAlign::Left,
        "center" => HorizontalAlign::Center,
        "right" | "end" => HorizontalAlign::Right,
        "justify" => HorizontalAlign::Justify,
        _ => HorizontalAlign::General,
    }
}

pub fn parse_vertical_align(text: &str) -> VerticalAlign {
    match text.trim().to_ascii_lowercase().as_str() {
        "top" | "text-top" => VerticalAlign::Top,
        "middle" => VerticalAlign::Center,
        _ => VerticalAlign::Bottom,
    }
}

/// Whether a CSS white-space value allows wrapping
pub fn allows_wrap(white_space: &str) -> bool {
    !matches!(
        white_space.trim().to_ascii_lowercase().as_str(),
        "nowrap" | "pre"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_colors() {
        assert_eq!(parse_color("#FF8000"), Some(Rgb::new(255, 128, 0)));
        assert_eq!(parse_color("#f00"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(parse_color("rgb(0, 128, 255)"), Some(Rgb::new(0, 128, 255)));
        assert_eq!(parse_color("rgb(100%, 0%, 0%)"), Some(Rgb::new(255, 0, 0)));
        assert_eq!(parse_color("Navy"), Some(Rgb::new(0, 0, 128)));
        assert_eq!(parse_color("transparent"), None);
        assert_eq!(parse_color("#12"), None);
    }

    #[test]
    fn test_parse_lengths() {
        let len = CssLength::parse("1in").unwrap();
        assert_eq!(len.to_points(), Some(72.0));
        let len = CssLength::parse("25.4mm").unwrap();
        assert!((len.to_points().unwrap() - 72.0).abs() < 1e-9);
        let len = CssLength::parse("50%").unwrap();
        assert!(!len.is_absolute());
        assert_eq!(len.to_millimetres_relative(Some(200.0)), Some(100.0));
        assert_eq!(CssLength::parse("12").unwrap().to_points(), Some(12.0));
        assert!(CssLength::parse("auto").is_none());
    }

    #[test]
    fn test_parse_border() {
        assert_eq!(parse_border(Some("solid"), Some("thin")), BorderStyle::Thin);
        assert_eq!(parse_border(Some("solid"), Some("3pt")), BorderStyle::Thick);
        assert_eq!(parse_border(Some("dashed"), Some("medium")), BorderStyle::MediumDashed);
        assert_eq!(parse_border(Some("none"), Some("thin")), BorderStyle::None);
        assert_eq!(parse_border(Some("solid"), Some("0")), BorderStyle::None);
        assert_eq!(parse_border(None, Some("thin")), BorderStyle::None);
    }

    #[test]
    fn test_font_values() {
        assert!(is_bold("bold"));
        assert!(is_bold("700"));
        assert!(!is_bold("normal"));
        assert!(is_italic("italic"));
        assert_eq!(parse_font_size("x-large"), Some(18.0));
        assert_eq!(parse_font_size("10pt"), Some(10.0));
        assert_eq!(
            primary_font_family("\"Segoe UI\", sans-serif"),
            Some("Segoe UI".to_string())
        );
        assert_eq!(primary_font_family("serif"), Some("Times New Roman".to_string()));
    }
}
