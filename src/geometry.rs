//! Axis-aligned rectangles in page space.
//!
//! All coordinates use a top-left origin: `y` grows downward, so `y0` is the
//! top edge and `y1` the bottom edge of a box.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    /// Left edge
    pub x0: f32,
    /// Top edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub y1: f32,
}

impl BBox {
    /// Create a box from two corners, normalizing their order.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Center point as `(x, y)`.
    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Overlapping part of two boxes, if any.
    pub fn intersection(&self, other: &BBox) -> Option<BBox> {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        let x1 = self.x1.min(other.x1);
        let y1 = self.y1.min(other.y1);
        if x1 > x0 && y1 > y0 {
            Some(BBox { x0, y0, x1, y1 })
        } else {
            None
        }
    }

    pub fn intersection_area(&self, other: &BBox) -> f32 {
        self.intersection(other).map(|b| b.area()).unwrap_or(0.0)
    }

    /// Intersection area divided by the smaller of the two areas.
    pub fn overlap_ratio_min(&self, other: &BBox) -> f32 {
        let min_area = self.area().min(other.area());
        if min_area <= 0.0 {
            return 0.0;
        }
        self.intersection_area(other) / min_area
    }

    /// Share of this box covered by `other` (intersection ÷ own area).
    pub fn coverage_by(&self, other: &BBox) -> f32 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        self.intersection_area(other) / area
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Grow by `margin` on every side.
    pub fn expand(&self, margin: f32) -> BBox {
        BBox {
            x0: self.x0 - margin,
            y0: self.y0 - margin,
            x1: self.x1 + margin,
            y1: self.y1 + margin,
        }
    }

    /// Restrict to the page rectangle `[0, width] × [0, height]`.
    pub fn clamp(&self, width: f32, height: f32) -> BBox {
        BBox {
            x0: self.x0.clamp(0.0, width),
            y0: self.y0.clamp(0.0, height),
            x1: self.x1.clamp(0.0, width),
            y1: self.y1.clamp(0.0, height),
        }
    }

    /// Whether `other` lies completely inside this box.
    pub fn contains(&self, other: &BBox) -> bool {
        other.x0 >= self.x0 && other.x1 <= self.x1 && other.y0 >= self.y0 && other.y1 <= self.y1
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    /// Coordinates rounded to two decimals for output.
    pub fn rounded(&self) -> BBox {
        BBox {
            x0: round2(self.x0),
            y0: round2(self.y0),
            x1: round2(self.x1),
            y1: round2(self.y1),
        }
    }
}

/// Round to two decimal places.
pub fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_corners() {
        let b = BBox::new(10.0, 20.0, 0.0, 5.0);
        assert_eq!(b, BBox { x0: 0.0, y0: 5.0, x1: 10.0, y1: 20.0 });
    }

    #[test]
    fn test_intersection_and_ratios() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(5.0, 5.0, 25.0, 25.0);
        assert_eq!(a.intersection_area(&b), 25.0);
        assert!((a.overlap_ratio_min(&b) - 0.25).abs() < 1e-6);
        assert!((a.coverage_by(&b) - 0.25).abs() < 1e-6);
        assert!((b.coverage_by(&a) - 25.0 / 400.0).abs() < 1e-6);
    }

    #[test]
    fn test_disjoint_boxes() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(10.0, 0.0, 20.0, 10.0);
        assert!(a.intersection(&b).is_none());
        assert_eq!(a.overlap_ratio_min(&b), 0.0);
    }

    #[test]
    fn test_degenerate_box_has_no_ratio() {
        let line = BBox::new(0.0, 5.0, 100.0, 5.0);
        let b = BBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(line.area(), 0.0);
        assert_eq!(line.overlap_ratio_min(&b), 0.0);
        assert_eq!(line.coverage_by(&b), 0.0);
    }

    #[test]
    fn test_expand_clamp_union() {
        let b = BBox::new(10.0, 10.0, 20.0, 20.0).expand(15.0).clamp(100.0, 25.0);
        assert_eq!(b, BBox { x0: 0.0, y0: 0.0, x1: 35.0, y1: 25.0 });

        let u = BBox::new(0.0, 0.0, 1.0, 1.0).union(&BBox::new(5.0, 5.0, 6.0, 7.0));
        assert_eq!(u, BBox { x0: 0.0, y0: 0.0, x1: 6.0, y1: 7.0 });
    }

    #[test]
    fn test_rounded() {
        let b = BBox::new(1.234, 2.345, 3.456, 4.5678).rounded();
        assert!((b.x0 - 1.23).abs() < 1e-4);
        assert!((b.y1 - 4.57).abs() < 1e-4);
    }
}
