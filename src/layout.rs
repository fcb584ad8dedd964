//! Keyboard geometry - key rectangles and hit-testing
//!
//! Keys are laid out as centered rows near the bottom of the frame. Rows are
//! staggered by half a key width per row so they read like a real keyboard.
//! Rectangles are recomputed from the frame size every frame; a key has no
//! identity across frames beyond its label.

use crate::config::KeyboardConfig;

/// A point in frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Open-interior containment: points on the border are outside
    pub fn contains(&self, p: Point) -> bool {
        self.x < p.x && p.x < self.right() && self.y < p.y && p.y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// One on-screen key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub label: String,
    pub rect: Rect,
    pub row: usize,
}

/// Upper bound for any single key dimension, gap or margin, in pixels
pub const MAX_GEOMETRY: i32 = 100_000;

/// Fixed key geometry and row labels
///
/// Positions are computed in `i64` and saturated into frame coordinates, so
/// any geometry and frame size yields a layout.
#[derive(Debug, Clone)]
pub struct KeyboardLayout {
    rows: Vec<Vec<String>>,
    key_width: i64,
    key_height: i64,
    key_gap: i64,
    bottom_margin: i64,
    side_margin: i64,
}

fn saturate(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

impl KeyboardLayout {
    pub fn new(config: &KeyboardConfig) -> Self {
        let dim = |v: i32, min: i32| v.clamp(min, MAX_GEOMETRY) as i64;
        Self {
            rows: config.rows.clone(),
            key_width: dim(config.key_width, 1),
            key_height: dim(config.key_height, 1),
            key_gap: dim(config.key_gap, 0),
            bottom_margin: dim(config.bottom_margin, 0),
            side_margin: dim(config.side_margin, 0),
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    fn row_width(&self, keys: usize) -> i64 {
        if keys == 0 {
            return 0;
        }
        keys as i64 * (self.key_width + self.key_gap) - self.key_gap
    }

    fn row_stagger(&self, row_index: usize) -> i64 {
        row_index as i64 * self.key_width / 2
    }

    /// Lay the keys out for a `width` x `height` frame
    pub fn compute(&self, width: i32, height: i32) -> Vec<Key> {
        let rows = self.rows.len() as i64;
        let pitch_y = self.key_height + self.key_gap;
        let top = height as i64 - self.bottom_margin - rows * pitch_y + self.key_gap;

        let mut keys = Vec::with_capacity(self.rows.iter().map(Vec::len).sum());
        for (row_index, row) in self.rows.iter().enumerate() {
            let total = self.row_width(row.len());
            let offset_x = ((width as i64 - total).div_euclid(2)).max(self.side_margin)
                + self.row_stagger(row_index);
            let y = top + row_index as i64 * pitch_y;

            for (col, label) in row.iter().enumerate() {
                keys.push(Key {
                    label: label.clone(),
                    rect: Rect {
                        x: saturate(offset_x + col as i64 * (self.key_width + self.key_gap)),
                        y: saturate(y),
                        width: self.key_width as i32,
                        height: self.key_height as i32,
                    },
                    row: row_index,
                });
            }
        }
        keys
    }

    /// Smallest frame for which every key lies inside the frame bounds
    pub fn min_frame_size(&self) -> (i32, i32) {
        let min_width = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let stagger = self.row_stagger(i);
                self.row_width(row.len()) + stagger + self.side_margin.max(stagger)
            })
            .max()
            .unwrap_or(0);
        let rows = self.rows.len() as i64;
        let min_height = if rows == 0 {
            0
        } else {
            self.bottom_margin + rows * (self.key_height + self.key_gap) - self.key_gap
        };
        (saturate(min_width), saturate(min_height))
    }
}

/// Label of the first key whose rectangle contains `point`
pub fn hit_test(keys: &[Key], point: Point) -> Option<&str> {
    keys.iter()
        .find(|key| key.rect.contains(point))
        .map(|key| key.label.as_str())
}
