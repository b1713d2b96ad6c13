//! Flat visual attribute sets and their equivalence rules

use crate::content::{ComputedStyle, StyleProperty};
use crate::css;
use crate::types::{BorderStyle, HorizontalAlign, Rgb, VerticalAlign};

/// Font attributes; every field is optional so equality is null-safe
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FontAttributes {
    pub family: Option<String>,
    /// Size in points
    pub size: Option<f64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub color: Option<Rgb>,
}

impl FontAttributes {
    /// Workbook default font for a family and size
    pub fn base(family: &str, size: f64) -> Self {
        FontAttributes {
            family: Some(family.to_string()),
            size: Some(size),
            bold: Some(false),
            italic: Some(false),
            color: None,
        }
    }

    /// Resolve font attributes from a style, falling back to `base`
    pub fn from_style(style: &ComputedStyle, base: &FontAttributes) -> Self {
        FontAttributes {
            family: style
                .get(StyleProperty::FontFamily)
                .and_then(css::primary_font_family)
                .or_else(|| base.family.clone()),
            size: style
                .get(StyleProperty::FontSize)
                .and_then(css::parse_font_size)
                .or(base.size),
            bold: style
                .get(StyleProperty::FontWeight)
                .map(css::is_bold)
                .or(base.bold),
            italic: style
                .get(StyleProperty::FontStyle)
                .map(css::is_italic)
                .or(base.italic),
            color: style
                .get(StyleProperty::Color)
                .and_then(css::parse_color)
                .or(base.color),
        }
    }

    /// Font equivalence: an unset family matches any font
    pub fn equivalent(&self, other: &FontAttributes) -> bool {
        if self.family.is_none() || other.family.is_none() {
            return true;
        }
        self.family == other.family
            && self.size == other.size
            && self.bold == other.bold
            && self.italic == other.italic
            && self.color == other.color
    }

    pub fn is_bold(&self) -> bool {
        self.bold.unwrap_or(false)
    }

    pub fn is_italic(&self) -> bool {
        self.italic.unwrap_or(false)
    }
}

/// One border side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BorderSide {
    pub style: BorderStyle,
    pub color: Option<Rgb>,
}

impl BorderSide {
    pub fn is_set(&self) -> bool {
        self.style != BorderStyle::None
    }
}

/// Border sides in CSS order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    fn properties(self) -> (StyleProperty, StyleProperty, StyleProperty) {
        match self {
            Side::Top => (
                StyleProperty::BorderTopStyle,
                StyleProperty::BorderTopWidth,
                StyleProperty::BorderTopColor,
            ),
            Side::Right => (
                StyleProperty::BorderRightStyle,
                StyleProperty::BorderRightWidth,
                StyleProperty::BorderRightColor,
            ),
            Side::Bottom => (
                StyleProperty::BorderBottomStyle,
                StyleProperty::BorderBottomWidth,
                StyleProperty::BorderBottomColor,
            ),
            Side::Left => (
                StyleProperty::BorderLeftStyle,
                StyleProperty::BorderLeftWidth,
                StyleProperty::BorderLeftColor,
            ),
        }
    }
}

/// Four border sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Borders {
    pub top: BorderSide,
    pub right: BorderSide,
    pub bottom: BorderSide,
    pub left: BorderSide,
}

impl Borders {
    pub fn from_style(style: &ComputedStyle) -> Self {
        let mut borders = Borders::default();
        for side in Side::ALL {
            let (style_prop, width_prop, color_prop) = side.properties();
            let line = css::parse_border(style.get(style_prop), style.get(width_prop));
            let color = style.get(color_prop).and_then(css::parse_color);
            *borders.side_mut(side) = BorderSide { style: line, color };
        }
        borders
    }

    pub fn side(&self, side: Side) -> &BorderSide {
        match side {
            Side::Top => &self.top,
            Side::Right => &self.right,
            Side::Bottom => &self.bottom,
            Side::Left => &self.left,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut BorderSide {
        match side {
            Side::Top => &mut self.top,
            Side::Right => &mut self.right,
            Side::Bottom => &mut self.bottom,
            Side::Left => &mut self.left,
        }
    }

    pub fn any(&self) -> bool {
        Side::ALL.iter().any(|s| self.side(*s).is_set())
    }
}

/// Everything that decides how a cell looks
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleProperties {
    pub horizontal_align: Option<HorizontalAlign>,
    pub background: Option<Rgb>,
    pub borders: Borders,
    pub font: FontAttributes,
    /// Spreadsheet number format code
    pub number_format: Option<String>,
    pub wrap: Option<bool>,
    pub vertical_align: Option<VerticalAlign>,
    /// Degrees, -90..=90
    pub rotation: Option<i16>,
}

impl StyleProperties {
    /// No visual attributes beyond a font
    pub fn with_font(font: FontAttributes) -> Self {
        StyleProperties {
            font,
            ..Default::default()
        }
    }

    /// Whether the cell would look different from an unstyled one, ignoring the font
    pub fn is_decorated(&self) -> bool {
        self.background.is_some() || self.borders.any()
    }

    /// Build from a resolved element style; number formats are decided by the caller
    pub fn from_style(style: &ComputedStyle, base_font: &FontAttributes) -> Self {
        StyleProperties {
            horizontal_align: style
                .get(StyleProperty::TextAlign)
                .map(css::parse_text_align),
            background: style
                .get(StyleProperty::BackgroundColor)
                .and_then(css::parse_color),
            borders: Borders::from_style(style),
            font: FontAttributes::from_style(style, base_font),
            number_format: None,
            wrap: style.get(StyleProperty::WhiteSpace).map(css::allows_wrap),
            vertical_align: style
                .get(StyleProperty::VerticalAlign)
                .map(css::parse_vertical_align),
            rotation: None,
        }
    }

    /// Style equivalence used by the style cache
    pub fn equivalent(&self, other: &StyleProperties) -> bool {
        self.horizontal_align == other.horizontal_align
            && self.background == other.background
            && self.borders == other.borders
            && self.wrap == other.wrap
            && self.vertical_align == other.vertical_align
            && self.rotation == other.rotation
            && formats_equivalent(self.number_format.as_deref(), other.number_format.as_deref())
            && self.font.equivalent(&other.font)
    }
}

/// Format strings compare case-insensitively, ignoring surrounding whitespace
pub fn formats_equivalent(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> FontAttributes {
        FontAttributes::base("Calibri", 11.0)
    }

    #[test]
    fn test_font_from_style() {
        let style = ComputedStyle::new()
            .with(StyleProperty::FontWeight, "bold")
            .with(StyleProperty::FontSize, "small")
            .with(StyleProperty::Color, "#ff0000");
        let font = FontAttributes::from_style(&style, &base());
        assert_eq!(font.family.as_deref(), Some("Calibri"));
        assert_eq!(font.size, Some(10.0));
        assert!(font.is_bold());
        assert!(!font.is_italic());
        assert_eq!(font.color, Some(Rgb::new(255, 0, 0)));
    }

    #[test]
    fn test_font_equivalence() {
        let a = base();
        let mut b = base();
        assert!(a.equivalent(&b));
        b.bold = Some(true);
        assert!(!a.equivalent(&b));

        let unnamed = FontAttributes {
            bold: Some(true),
            ..Default::default()
        };
        assert!(unnamed.equivalent(&a));
        assert!(a.equivalent(&unnamed));
    }

    #[test]
    fn test_style_equivalence() {
        let style = ComputedStyle::new()
            .with(StyleProperty::TextAlign, "right")
            .with(StyleProperty::BorderTopStyle, "solid")
            .with(StyleProperty::BorderTopWidth, "thin");
        let mut a = StyleProperties::from_style(&style, &base());
        let mut b = StyleProperties::from_style(&style, &base());
        a.number_format = Some("0.00".into());
        b.number_format = Some(" 0.00 ".into());
        assert!(a.equivalent(&b));

        b.background = Some(Rgb::WHITE);
        assert!(!a.equivalent(&b));
        b.background = None;
        b.number_format = None;
        assert!(!a.equivalent(&b));
    }

    #[test]
    fn test_borders_from_style() {
        let style = ComputedStyle::new()
            .with(StyleProperty::BorderLeftStyle, "dotted")
            .with(StyleProperty::BorderLeftColor, "blue");
        let borders = Borders::from_style(&style);
        assert_eq!(borders.left.style, BorderStyle::Dotted);
        assert_eq!(borders.left.color, Some(Rgb::new(0, 0, 255)));
        assert!(!borders.top.is_set());
        assert!(borders.any());
    }

    #[test]
    fn test_formats_equivalent() {
        assert!(formats_equivalent(None, None));
        assert!(formats_equivalent(Some("YYYY-MM-DD"), Some("yyyy-mm-dd")));
        assert!(!formats_equivalent(Some("0"), None));
    }
}
