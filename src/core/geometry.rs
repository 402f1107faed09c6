use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle, origin top-left.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct BBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds the tight box around inclusive pixel extents.
    pub fn from_extents(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Fraction of a `image_width` x `image_height` page this box covers.
    pub fn coverage(&self, image_width: u32, image_height: u32) -> f64 {
        let image_area = image_width as u64 * image_height as u64;
        if image_area == 0 {
            0.0
        } else {
            self.area() as f64 / image_area as f64
        }
    }

    pub fn union(&self, other: &Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    /// True when the boxes intersect once each side is padded by `padding`.
    pub fn intersects_padded(&self, other: &Self, padding: u32) -> bool {
        let (x1, y1, r1, b1) = self.signed_edges();
        let (x2, y2, r2, b2) = other.signed_edges();
        let t = padding as i64;
        x1 < r2 + t && x2 < r1 + t && y1 < b2 + t && y2 < b1 + t
    }

    /// True when a pair of facing edges lies within `tolerance` pixels and the
    /// boxes overlap along the perpendicular axis.
    pub fn is_edge_adjacent(&self, other: &Self, tolerance: u32) -> bool {
        let (x1, y1, r1, b1) = self.signed_edges();
        let (x2, y2, r2, b2) = other.signed_edges();
        let t = tolerance as i64;

        let share_left = (x1 - r2).abs() < t;
        let share_right = (r1 - x2).abs() < t;
        let share_top = (y1 - b2).abs() < t;
        let share_bottom = (b1 - y2).abs() < t;

        let vertical_overlap = y1 < b2 && y2 < b1;
        let horizontal_overlap = x1 < r2 && x2 < r1;

        ((share_left || share_right) && vertical_overlap)
            || ((share_top || share_bottom) && horizontal_overlap)
    }

    fn signed_edges(&self) -> (i64, i64, i64, i64) {
        (
            self.x as i64,
            self.y as i64,
            self.right() as i64,
            self.bottom() as i64,
        )
    }
}
