//! Equivalence caches for fonts and cell styles
//!
//! Both caches scan their entries linearly and hand back the handle of the
//! first equivalent entry, creating the workbook object only on a miss. They
//! live as long as the document.

use super::properties::{BorderSide, FontAttributes, StyleProperties};
use crate::error::Result;
use crate::types::{FontHandle, StyleHandle};
use crate::workbook::{BorderDef, CellFormat, FontDef, Workbook};

/// Deduplicates fonts by font equivalence
#[derive(Debug)]
pub struct FontCache {
    entries: Vec<(FontAttributes, FontHandle)>,
    base: FontAttributes,
}

impl FontCache {
    /// Seeded with the workbook's default font as handle 0
    pub fn new(workbook: &Workbook) -> Self {
        let flavor = workbook.flavor();
        let base = FontAttributes::base(flavor.default_font_name(), flavor.default_font_size());
        FontCache {
            entries: vec![(base.clone(), FontHandle::DEFAULT)],
            base,
        }
    }

    /// The workbook default font
    pub fn base(&self) -> &FontAttributes {
        &self.base
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_font(&mut self, attrs: &FontAttributes, workbook: &mut Workbook) -> Result<FontHandle> {
        if let Some((_, handle)) = self.entries.iter().find(|(a, _)| a.equivalent(attrs)) {
            return Ok(*handle);
        }
        let font = FontDef {
            name: attrs
                .family
                .clone()
                .or_else(|| self.base.family.clone())
                .unwrap_or_default(),
            size_points: attrs.size.or(self.base.size).unwrap_or(10.0),
            bold: attrs.is_bold(),
            italic: attrs.is_italic(),
            color: attrs.color.map(|c| workbook.resolve_color(c)),
        };
        let handle = workbook.add_font(font)?;
        log::debug!("Font cache miss: {:?} -> font {}", attrs, handle.0);
        self.entries.push((attrs.clone(), handle));
        Ok(handle)
    }
}

/// Deduplicates cell formats by style equivalence
#[derive(Debug)]
pub struct StyleCache {
    entries: Vec<(StyleProperties, StyleHandle)>,
}

impl StyleCache {
    /// Seeded with the workbook's default format as handle 0
    pub fn new(fonts: &FontCache) -> Self {
        StyleCache {
            entries: vec![(StyleProperties::with_font(fonts.base().clone()), StyleHandle::DEFAULT)],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_style(
        &mut self,
        props: &StyleProperties,
        workbook: &mut Workbook,
        fonts: &mut FontCache,
    ) -> Result<StyleHandle> {
        if let Some((_, handle)) = self.entries.iter().find(|(p, _)| p.equivalent(props)) {
            return Ok(*handle);
        }
        let format = build_format(props, workbook, fonts)?;
        let handle = workbook.add_format(format)?;
        log::debug!("Style cache miss: created format {}", handle.0);
        self.entries.push((props.clone(), handle));
        Ok(handle)
    }

    /// Properties a handle was created from
    pub fn properties(&self, handle: StyleHandle) -> Option<&StyleProperties> {
        self.entries
            .iter()
            .find(|(_, h)| *h == handle)
            .map(|(p, _)| p)
    }
}

fn build_format(
    props: &StyleProperties,
    workbook: &mut Workbook,
    fonts: &mut FontCache,
) -> Result<CellFormat> {
    let font = fonts.get_font(&props.font, workbook)?;
    let number_format = props
        .number_format
        .as_deref()
        .map(|code| workbook.number_format_id(code))
        .unwrap_or(0);
    let mut border = |side: &BorderSide| BorderDef {
        style: side.style,
        color: side.color.map(|c| workbook.resolve_color(c)),
    };
    let top = border(&props.borders.top);
    let right = border(&props.borders.right);
    let bottom = border(&props.borders.bottom);
    let left = border(&props.borders.left);
    Ok(CellFormat {
        font,
        number_format,
        horizontal: props.horizontal_align.unwrap_or_default(),
        vertical: props.vertical_align.unwrap_or_default(),
        wrap: props.wrap.unwrap_or(false),
        rotation: props.rotation.unwrap_or(0).clamp(-90, 90),
        fill: props.background.map(|c| workbook.resolve_color(c)),
        top,
        right,
        bottom,
        left,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::types::{BorderStyle, ColorRef, HorizontalAlign, Rgb};
    use crate::workbook::flavor_for;

    fn setup(format: OutputFormat) -> (Workbook, FontCache, StyleCache) {
        let workbook = Workbook::new(flavor_for(format));
        let fonts = FontCache::new(&workbook);
        let styles = StyleCache::new(&fonts);
        (workbook, fonts, styles)
    }

    #[test]
    fn test_equivalent_styles_share_one_handle() {
        let (mut workbook, mut fonts, mut styles) = setup(OutputFormat::Xlsx);
        let mut props = StyleProperties::with_font(fonts.base().clone());
        props.horizontal_align = Some(HorizontalAlign::Right);
        props.number_format = Some("0.00".into());

        let first = styles.get_style(&props, &mut workbook, &mut fonts).unwrap();
        for i in 0..50 {
            let mut again = props.clone();
            again.number_format = Some(if i % 2 == 0 { "0.00" } else { " 0.00" }.into());
            assert_eq!(styles.get_style(&again, &mut workbook, &mut fonts).unwrap(), first);
        }
        assert_eq!(workbook.formats().len(), 2);
        assert_eq!(styles.len(), 2);
    }

    #[test]
    fn test_default_properties_map_to_default_handle() {
        let (mut workbook, mut fonts, mut styles) = setup(OutputFormat::Xls);
        let props = StyleProperties::with_font(fonts.base().clone());
        assert_eq!(
            styles.get_style(&props, &mut workbook, &mut fonts).unwrap(),
            StyleHandle::DEFAULT
        );
        assert_eq!(workbook.formats().len(), 1);
    }

    #[test]
    fn test_font_cache_is_independent_of_style_cache() {
        let (mut workbook, mut fonts, mut styles) = setup(OutputFormat::Xlsx);
        let mut bold = fonts.base().clone();
        bold.bold = Some(true);

        let mut a = StyleProperties::with_font(bold.clone());
        a.background = Some(Rgb::new(255, 0, 0));
        let mut b = StyleProperties::with_font(bold.clone());
        b.background = Some(Rgb::new(0, 0, 255));

        let ha = styles.get_style(&a, &mut workbook, &mut fonts).unwrap();
        let hb = styles.get_style(&b, &mut workbook, &mut fonts).unwrap();
        assert_ne!(ha, hb);
        assert_eq!(fonts.len(), 2);
        assert_eq!(workbook.fonts().len(), 2);
        assert_eq!(
            workbook.format(ha).unwrap().font,
            workbook.format(hb).unwrap().font
        );
        assert_eq!(fonts.get_font(&bold, &mut workbook).unwrap(), FontHandle(1));
    }

    #[test]
    fn test_palette_colours_resolved_for_xls() {
        let (mut workbook, mut fonts, mut styles) = setup(OutputFormat::Xls);
        let mut props = StyleProperties::with_font(fonts.base().clone());
        props.background = Some(Rgb::new(255, 0, 0));
        props.borders.top = BorderSide {
            style: BorderStyle::Thin,
            color: Some(Rgb::new(1, 2, 3)),
        };
        let handle = styles.get_style(&props, &mut workbook, &mut fonts).unwrap();
        let format = workbook.format(handle).unwrap();
        assert_eq!(format.fill, Some(ColorRef::Indexed(10)));
        assert_eq!(format.top.color, Some(ColorRef::Indexed(63)));
        assert_eq!(styles.properties(handle), Some(&props));
    }
}
