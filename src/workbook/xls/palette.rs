//! BIFF8 colour palette
//!
//! Cells reference colours by index 8..=63. Colours missing from the default
//! palette take over slots from the top down; slots already handed out keep
//! their colour for the rest of the document.

use crate::types::Rgb;

pub const PALETTE_SIZE: usize = 56;
pub const FIRST_INDEX: u16 = 8;
/// Slots below this array position are never reassigned
const PROTECTED_SLOTS: usize = 8;

/// Automatic / system foreground colour
pub const AUTOMATIC: u16 = 0x40;
/// Automatic font colour
pub const FONT_AUTOMATIC: u16 = 0x7FFF;

const fn rgb(v: u32) -> Rgb {
    Rgb::new((v >> 16) as u8, (v >> 8) as u8, v as u8)
}

pub const DEFAULT_PALETTE: [Rgb; PALETTE_SIZE] = [
    rgb(0x000000),
    rgb(0xFFFFFF),
    rgb(0xFF0000),
    rgb(0x00FF00),
    rgb(0x0000FF),
    rgb(0xFFFF00),
    rgb(0xFF00FF),
    rgb(0x00FFFF),
    rgb(0x800000),
    rgb(0x008000),
    rgb(0x000080),
    rgb(0x808000),
    rgb(0x800080),
    rgb(0x008080),
    rgb(0xC0C0C0),
    rgb(0x808080),
    rgb(0x9999FF),
    rgb(0x993366),
    rgb(0xFFFFCC),
    rgb(0xCCFFFF),
    rgb(0x660066),
    rgb(0xFF8080),
    rgb(0x0066CC),
    rgb(0xCCCCFF),
    rgb(0x000080),
    rgb(0xFF00FF),
    rgb(0xFFFF00),
    rgb(0x00FFFF),
    rgb(0x800080),
    rgb(0x800000),
    rgb(0x008080),
    rgb(0x0000FF),
    rgb(0x00CCFF),
    rgb(0xCCFFFF),
    rgb(0xCCFFCC),
    rgb(0xFFFF99),
    rgb(0x99CCFF),
    rgb(0xFF99CC),
    rgb(0xCC99FF),
    rgb(0xFFCC99),
    rgb(0x3366FF),
    rgb(0x33CCCC),
    rgb(0x99CC00),
    rgb(0xFFCC00),
    rgb(0xFF9900),
    rgb(0xFF6600),
    rgb(0x666699),
    rgb(0x969696),
    rgb(0x003366),
    rgb(0x339966),
    rgb(0x003300),
    rgb(0x333300),
    rgb(0x993300),
    rgb(0x993366),
    rgb(0x333399),
    rgb(0x333333),
];

#[derive(Debug, Clone)]
pub struct Palette {
    colors: [Rgb; PALETTE_SIZE],
    used: [bool; PALETTE_SIZE],
    modified: bool,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            colors: DEFAULT_PALETTE,
            used: [false; PALETTE_SIZE],
            modified: false,
        }
    }
}

impl Palette {
    pub fn new() -> Self {
        Palette::default()
    }

    /// Palette index for a colour: exact match, then a free custom slot, then nearest
    pub fn resolve(&mut self, color: Rgb) -> u16 {
        if let Some(slot) = self.colors.iter().position(|c| *c == color) {
            self.used[slot] = true;
            return FIRST_INDEX + slot as u16;
        }
        if let Some(slot) = (PROTECTED_SLOTS..PALETTE_SIZE).rev().find(|s| !self.used[*s]) {
            log::debug!(
                "Palette slot {} reassigned from {} to {}",
                FIRST_INDEX as usize + slot,
                self.colors[slot],
                color
            );
            self.colors[slot] = color;
            self.used[slot] = true;
            self.modified = true;
            return FIRST_INDEX + slot as u16;
        }
        self.nearest(color)
    }

    /// Closest existing colour by squared RGB distance
    pub fn nearest(&self, color: Rgb) -> u16 {
        let slot = self
            .colors
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| c.distance(&color))
            .map(|(i, _)| i)
            .unwrap_or(0);
        FIRST_INDEX + slot as u16
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let mut palette = Palette::new();
        assert_eq!(palette.resolve(Rgb::BLACK), 8);
        assert_eq!(palette.resolve(Rgb::new(0x99, 0xCC, 0xFF)), 44);
        assert!(!palette.is_modified());
    }

    #[test]
    fn test_custom_slots_count_down() {
        let mut palette = Palette::new();
        assert_eq!(palette.resolve(Rgb::new(1, 2, 3)), 63);
        assert_eq!(palette.resolve(Rgb::new(4, 5, 6)), 62);
        assert_eq!(palette.resolve(Rgb::new(1, 2, 3)), 63);
        assert!(palette.is_modified());
        assert_eq!(palette.colors()[55], Rgb::new(1, 2, 3));
    }

    #[test]
    fn test_used_slots_are_kept() {
        let mut palette = Palette::new();
        // #333333 lives in slot 63
        assert_eq!(palette.resolve(Rgb::new(0x33, 0x33, 0x33)), 63);
        assert_eq!(palette.resolve(Rgb::new(1, 2, 3)), 62);
    }

    #[test]
    fn test_nearest_when_full() {
        let mut palette = Palette::new();
        for i in 0..(PALETTE_SIZE - PROTECTED_SLOTS) as u8 {
            palette.resolve(Rgb::new(i, 1, 250));
        }
        let index = palette.resolve(Rgb::new(254, 1, 1));
        assert_eq!(index, 10);
    }
}
