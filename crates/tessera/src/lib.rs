//! # Tessera
//!
//! Rectangle geometry and a uniform segment grid for 2D proximity queries.
//!
//! Tessera is the spatial substrate of the Warden simulation. It has no notion
//! of agents: the grid stores opaque keys and answers "which keys are near this
//! rectangle?". Callers own the canonical objects and keep the grid in sync.
//!
//! - **Geometry**: [`Vector`] (a `Copy` value type) and [`Rectangle`]
//!   (center + absolute size) with containment, intersection and relative
//!   placement.
//! - **Segment grid**: [`SegmentGrid`] buckets keys by the fixed-size cells
//!   their rectangle overlaps. Queries are a broad phase only; results are a
//!   superset of true overlaps and must be filtered with
//!   [`Rectangle::intersects`].
//!
//! ## Quick Start
//!
//! ```
//! use tessera::{GridConfig, Rectangle, SegmentGrid, Vector};
//!
//! let mut grid: SegmentGrid<u32> = SegmentGrid::new(GridConfig::default()).unwrap();
//!
//! let wall = Rectangle::new(Vector::new(60.0, 50.0), Vector::new(10.0, 10.0));
//! grid.insert(7, &wall);
//!
//! let area = Rectangle::new(Vector::new(58.0, 50.0), Vector::new(10.0, 10.0));
//! let candidates = grid.query_rect(&area);
//! assert_eq!(candidates, vec![7]);
//! assert!(area.intersects(&wall));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod grid;
pub mod rect;

pub use grid::{CellCoord, GridConfig, GridError, SegmentGrid};
pub use rect::{Placement, Rectangle, Side};

/// 2D vector used for positions, sizes and translations.
///
/// `glam::Vec2` is `Copy`: `a + b` returns a new value and `a += b` mutates
/// in place, so there is no aliasing between agents sharing a value.
pub type Vector = glam::Vec2;

/// Returns `true` if both components of `v` are finite.
#[must_use]
pub fn is_finite_vector(v: Vector) -> bool {
    v.x.is_finite() && v.y.is_finite()
}
