//! Axis-aligned rectangles.
//!
//! A [`Rectangle`] is stored as a center point and an absolute size; edges
//! and corners are derived on demand. Coordinates are screen-style: `y` grows
//! downwards, so `top() < bottom()`.

use serde::{Deserialize, Serialize};

use crate::{is_finite_vector, Vector};

/// Side of an anchor rectangle used by [`Rectangle::placed_relative_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Towards `-x`
    Left,
    /// Towards `+x`
    Right,
    /// Towards `-y`
    Top,
    /// Towards `+y`
    Bottom,
}

/// Whether a placed rectangle sits inside or outside the anchor edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    /// Flush against the inner side of the anchor edge
    Inside,
    /// Flush against the outer side of the anchor edge
    Outside,
}

/// Axis-aligned rectangle described by its center and size.
///
/// # Invariants
///
/// - `size.x >= 0 && size.y >= 0` (sizes are stored as absolute values)
/// - all components are finite
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    center: Vector,
    size: Vector,
}

impl Rectangle {
    /// Create a rectangle from its center and size.
    ///
    /// Negative sizes are stored as their absolute value.
    #[must_use]
    pub fn new(center: Vector, size: Vector) -> Self {
        debug_assert!(is_finite_vector(center), "rectangle center must be finite");
        debug_assert!(is_finite_vector(size), "rectangle size must be finite");
        Self {
            center,
            size: size.abs(),
        }
    }

    /// Create a rectangle from its top-left corner and size.
    #[must_use]
    pub fn from_top_left(top_left: Vector, size: Vector) -> Self {
        let size = size.abs();
        Self::new(top_left + size * 0.5, size)
    }

    /// Create a rectangle spanning `[0, width] x [0, height]`.
    #[must_use]
    pub fn from_origin(width: f32, height: f32) -> Self {
        Self::from_top_left(Vector::ZERO, Vector::new(width, height))
    }

    /// Center point.
    #[must_use]
    pub const fn center(&self) -> Vector {
        self.center
    }

    /// Width and height.
    #[must_use]
    pub const fn size(&self) -> Vector {
        self.size
    }

    /// Half of the size.
    #[must_use]
    pub fn half_size(&self) -> Vector {
        self.size * 0.5
    }

    /// Smallest `x` covered.
    #[must_use]
    pub fn left(&self) -> f32 {
        self.center.x - self.size.x * 0.5
    }

    /// Largest `x` covered.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.center.x + self.size.x * 0.5
    }

    /// Smallest `y` covered.
    #[must_use]
    pub fn top(&self) -> f32 {
        self.center.y - self.size.y * 0.5
    }

    /// Largest `y` covered.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.center.y + self.size.y * 0.5
    }

    /// Top-left corner.
    #[must_use]
    pub fn top_left(&self) -> Vector {
        Vector::new(self.left(), self.top())
    }

    /// Top-right corner.
    #[must_use]
    pub fn top_right(&self) -> Vector {
        Vector::new(self.right(), self.top())
    }

    /// Bottom-left corner.
    #[must_use]
    pub fn bottom_left(&self) -> Vector {
        Vector::new(self.left(), self.bottom())
    }

    /// Bottom-right corner.
    #[must_use]
    pub fn bottom_right(&self) -> Vector {
        Vector::new(self.right(), self.bottom())
    }

    /// All four corners, clockwise from the top-left.
    #[must_use]
    pub fn corners(&self) -> [Vector; 4] {
        [
            self.top_left(),
            self.top_right(),
            self.bottom_right(),
            self.bottom_left(),
        ]
    }

    /// Check if a point lies inside or on the edge of the rectangle.
    #[must_use]
    pub fn contains_point(&self, point: Vector) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// Check if `other` lies entirely inside this rectangle (edges inclusive).
    #[must_use]
    pub fn contains_rect(&self, other: &Rectangle) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.top() >= self.top()
            && other.bottom() <= self.bottom()
    }

    /// Check if two rectangles share interior area.
    ///
    /// Rectangles that only touch along an edge do not intersect. The test is
    /// done per axis, so it catches both the case where a corner of one
    /// rectangle lies inside the other and the cross-shaped case where each
    /// rectangle straddles the other along one axis with no corner inside.
    #[must_use]
    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Distance between the centers of two rectangles.
    #[must_use]
    pub fn center_distance(&self, other: &Rectangle) -> f32 {
        self.center.distance(other.center)
    }

    /// Shortest distance between the two rectangles' areas (0 when touching).
    #[must_use]
    pub fn gap_to(&self, other: &Rectangle) -> f32 {
        let dx = (other.left() - self.right())
            .max(self.left() - other.right())
            .max(0.0);
        let dy = (other.top() - self.bottom())
            .max(self.top() - other.bottom())
            .max(0.0);
        Vector::new(dx, dy).length()
    }

    /// Move the rectangle in place.
    pub fn translate(&mut self, distance: Vector) {
        self.center += distance;
    }

    /// Return a copy moved by `distance`.
    #[must_use]
    pub fn translated(&self, distance: Vector) -> Self {
        Self::new(self.center + distance, self.size)
    }

    /// Move the center in place.
    pub fn set_center(&mut self, center: Vector) {
        self.center = center;
    }

    /// Return a copy with a new center.
    #[must_use]
    pub fn with_center(&self, center: Vector) -> Self {
        Self::new(center, self.size)
    }

    /// Resize in place, keeping the center.
    pub fn set_size(&mut self, size: Vector) {
        self.size = size.abs();
    }

    /// Return a copy with a new size and the same center.
    #[must_use]
    pub fn with_size(&self, size: Vector) -> Self {
        Self::new(self.center, size)
    }

    /// Return a copy grown by `margin` on every side.
    #[must_use]
    pub fn expanded(&self, margin: f32) -> Self {
        Self::new(self.center, self.size + Vector::splat(margin * 2.0))
    }

    /// Return a copy of `self` placed against a side of `anchor`.
    ///
    /// The cross-axis centers are aligned. With [`Placement::Outside`] the
    /// rectangle sits beyond the anchor edge, `padding` away from it; with
    /// [`Placement::Inside`] it sits within the anchor, `padding` in from the
    /// edge.
    #[must_use]
    pub fn placed_relative_to(
        &self,
        anchor: &Rectangle,
        side: Side,
        placement: Placement,
        padding: f32,
    ) -> Self {
        let half = self.half_size();
        let anchor_center = anchor.center();
        let center = match (side, placement) {
            (Side::Right, Placement::Outside) => {
                Vector::new(anchor.right() + padding + half.x, anchor_center.y)
            }
            (Side::Right, Placement::Inside) => {
                Vector::new(anchor.right() - padding - half.x, anchor_center.y)
            }
            (Side::Left, Placement::Outside) => {
                Vector::new(anchor.left() - padding - half.x, anchor_center.y)
            }
            (Side::Left, Placement::Inside) => {
                Vector::new(anchor.left() + padding + half.x, anchor_center.y)
            }
            (Side::Bottom, Placement::Outside) => {
                Vector::new(anchor_center.x, anchor.bottom() + padding + half.y)
            }
            (Side::Bottom, Placement::Inside) => {
                Vector::new(anchor_center.x, anchor.bottom() - padding - half.y)
            }
            (Side::Top, Placement::Outside) => {
                Vector::new(anchor_center.x, anchor.top() - padding - half.y)
            }
            (Side::Top, Placement::Inside) => {
                Vector::new(anchor_center.x, anchor.top() + padding + half.y)
            }
        };
        self.with_center(center)
    }
}

impl Default for Rectangle {
    fn default() -> Self {
        Self::new(Vector::ZERO, Vector::ZERO)
    }
}
