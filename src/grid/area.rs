//! Rectangular grid regions: border overlays and row-span bookkeeping

use crate::style::{Borders, Side};

/// Rows with no known end yet
pub const OPEN_END: u32 = u32::MAX;

/// Inclusive rectangle of grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

impl Area {
    pub fn new(top: u32, left: u32, bottom: u32, right: u32) -> Self {
        Area {
            top,
            left,
            bottom,
            right,
        }
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.top && row <= self.bottom && col >= self.left && col <= self.right
    }

    pub fn contains_area(&self, other: &Area) -> bool {
        self.contains(other.top, other.left) && self.contains(other.bottom, other.right)
    }
}

#[derive(Debug, Clone)]
struct Overlay {
    area: Area,
    borders: Borders,
}

/// Borders declared by a table, row or list, applied to the outer edges of
/// the cells inside the region
#[derive(Debug, Default)]
pub struct BorderOverlayStack {
    entries: Vec<Overlay>,
}

impl BorderOverlayStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an overlay; returns false when there is nothing to draw
    pub fn push(&mut self, area: Area, borders: Borders) -> bool {
        if !borders.any() {
            return false;
        }
        self.entries.push(Overlay { area, borders });
        true
    }

    pub fn pop(&mut self) -> Option<(Area, Borders)> {
        self.entries.pop().map(|o| (o.area, o.borders))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fill the sides of `own` that lie on an overlay edge and are still unset
    ///
    /// Inner overlays are consulted first, so a row border beats a table border.
    pub fn apply(&self, cell: &Area, own: &mut Borders) {
        for overlay in self.entries.iter().rev() {
            if !overlay.area.contains_area(cell) {
                continue;
            }
            for side in Side::ALL {
                let on_edge = match side {
                    Side::Top => cell.top == overlay.area.top,
                    Side::Bottom => cell.bottom == overlay.area.bottom,
                    Side::Left => cell.left == overlay.area.left,
                    Side::Right => cell.right == overlay.area.right,
                };
                let declared = *overlay.borders.side(side);
                if on_edge && declared.is_set() && !own.side(side).is_set() {
                    *own.side_mut(side) = declared;
                }
            }
        }
    }
}

/// Row-spanning cells of one table
///
/// Entries are never removed while the table is open; spans whose last row has
/// passed are simply skipped.
#[derive(Debug, Default)]
pub struct RowSpanRegistry {
    spans: Vec<Area>,
}

impl RowSpanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, area: Area) {
        self.spans.push(area);
    }

    /// Spans covering `row` that started on an earlier row
    fn carried_into(&self, row: u32) -> impl Iterator<Item = &Area> {
        self.spans
            .iter()
            .filter(move |span| span.top < row && span.bottom >= row)
    }

    /// First column at or after `col` not occupied by a span from an earlier row
    pub fn next_free_column(&self, row: u32, col: u32) -> u32 {
        let mut col = col;
        loop {
            match self
                .carried_into(row)
                .find(|span| span.left <= col && span.right >= col)
            {
                Some(span) => col = span.right + 1,
                None => return col,
            }
        }
    }

    /// Number of grid columns before `col` taken by spans from earlier rows
    pub fn occupied_before(&self, row: u32, col: u32) -> u32 {
        self.carried_into(row)
            .map(|span| {
                if span.left >= col {
                    0
                } else {
                    span.right.min(col - 1) - span.left + 1
                }
            })
            .sum()
    }

    /// Whether a span started on an earlier row still covers `row`
    pub fn covers_row(&self, row: u32) -> bool {
        self.carried_into(row).next().is_some()
    }

    /// Whether a span starting on `row` continues below it
    pub fn starts_on_row(&self, row: u32) -> bool {
        self.spans.iter().any(|s| s.top == row && s.bottom > row)
    }

    /// Last row any span reaches
    pub fn last_row(&self) -> Option<u32> {
        self.spans.iter().map(|s| s.bottom).max()
    }

    pub fn clear(&mut self) {
        self.spans.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::BorderSide;
    use crate::types::BorderStyle;

    fn side(style: BorderStyle) -> BorderSide {
        BorderSide { style, color: None }
    }

    #[test]
    fn test_overlay_fills_outer_edges_only() {
        let mut stack = BorderOverlayStack::new();
        let all = Borders {
            top: side(BorderStyle::Thick),
            right: side(BorderStyle::Thick),
            bottom: side(BorderStyle::Thick),
            left: side(BorderStyle::Thick),
        };
        assert!(stack.push(Area::new(0, 0, OPEN_END, 2), all));

        let mut corner = Borders::default();
        stack.apply(&Area::new(0, 0, 0, 0), &mut corner);
        assert!(corner.top.is_set() && corner.left.is_set());
        assert!(!corner.right.is_set() && !corner.bottom.is_set());

        let mut middle = Borders::default();
        stack.apply(&Area::new(1, 1, 1, 1), &mut middle);
        assert!(!middle.any());

        let mut spanning = Borders::default();
        stack.apply(&Area::new(1, 1, 1, 2), &mut spanning);
        assert!(spanning.right.is_set());
    }

    #[test]
    fn test_own_border_wins() {
        let mut stack = BorderOverlayStack::new();
        let top = Borders {
            top: side(BorderStyle::Double),
            ..Default::default()
        };
        stack.push(Area::new(3, 0, 3, 4), top);
        let mut own = Borders {
            top: side(BorderStyle::Dotted),
            ..Default::default()
        };
        stack.apply(&Area::new(3, 2, 3, 2), &mut own);
        assert_eq!(own.top.style, BorderStyle::Dotted);
        assert!(!stack.push(Area::new(0, 0, 0, 0), Borders::default()));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_row_span_shifts_columns() {
        let mut spans = RowSpanRegistry::new();
        // column 0 spans rows 0..=2, columns 2..=3 span rows 0..=1
        spans.register(Area::new(0, 0, 2, 0));
        spans.register(Area::new(0, 2, 1, 3));

        assert_eq!(spans.next_free_column(0, 0), 0);
        assert_eq!(spans.next_free_column(1, 0), 1);
        assert_eq!(spans.next_free_column(1, 2), 4);
        assert_eq!(spans.occupied_before(1, 4), 3);
        assert_eq!(spans.next_free_column(2, 2), 2);
        assert_eq!(spans.next_free_column(3, 0), 0);
        assert!(spans.covers_row(2));
        assert!(!spans.covers_row(3));
        assert!(spans.starts_on_row(0));
        assert_eq!(spans.last_row(), Some(2));
    }
}
