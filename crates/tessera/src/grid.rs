//! Uniform segment grid for broad-phase proximity queries.
//!
//! The world plane is divided into square cells of `cell_size`. Every key is
//! stored in the bucket of each cell its rectangle overlaps, so a rectangle
//! that straddles a cell boundary is found from either side.
//!
//! # Consistency
//!
//! The grid keeps a reverse table from key to occupied cells. [`SegmentGrid::remove`]
//! uses that table rather than the caller's current rectangle, so removing
//! after the rectangle has already changed cannot leave stale memberships
//! behind. Removing an unknown key is a no-op.
//!
//! # Soundness
//!
//! For any stored rectangle `r` and query rectangle `q` with
//! `r.intersects(&q)`, the key of `r` is in the result of
//! [`SegmentGrid::query_rect`]. False positives are allowed: callers must run
//! an exact [`Rectangle::intersects`] test on the candidates.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Rectangle, Vector};

/// Errors emitted when configuring a grid.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    /// Configuration values that cannot be used (e.g. non-positive cell size).
    #[error("invalid grid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Integer coordinate of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    /// Column (`floor(x / cell_size)`)
    pub x: i32,
    /// Row (`floor(y / cell_size)`)
    pub y: i32,
}

impl CellCoord {
    /// Create a cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Configuration for a [`SegmentGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Edge length of each cell in world units
    pub cell_size: f32,
    /// Extra rings of cells added around every query
    pub query_margin: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 50.0,
            query_margin: 1,
        }
    }
}

impl GridConfig {
    /// Create a config with the given cell size and the default margin.
    #[must_use]
    pub fn with_cell_size(cell_size: f32) -> Self {
        Self {
            cell_size,
            ..Default::default()
        }
    }

    /// Check the configuration can be used to build a grid.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidConfig`] if `cell_size` is not a positive
    /// finite number.
    pub fn validate(&self) -> Result<(), GridError> {
        if !self.cell_size.is_finite() {
            return Err(GridError::InvalidConfig("cell_size must be finite"));
        }
        if self.cell_size <= 0.0 {
            return Err(GridError::InvalidConfig("cell_size must be positive"));
        }
        Ok(())
    }
}

/// Inclusive range of cells covered by a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellSpan {
    min: CellCoord,
    max: CellCoord,
}

impl CellSpan {
    fn grown(self, margin: i32) -> Self {
        Self {
            min: CellCoord::new(
                self.min.x.saturating_sub(margin),
                self.min.y.saturating_sub(margin),
            ),
            max: CellCoord::new(
                self.max.x.saturating_add(margin),
                self.max.y.saturating_add(margin),
            ),
        }
    }

    fn iter(self) -> impl Iterator<Item = CellCoord> {
        (self.min.y..=self.max.y)
            .flat_map(move |y| (self.min.x..=self.max.x).map(move |x| CellCoord::new(x, y)))
    }
}

/// Uniform grid mapping cells to the keys whose rectangle overlaps them.
///
/// The grid holds keys only; it never owns the objects they identify.
///
/// # Example
///
/// ```
/// use tessera::{GridConfig, Rectangle, SegmentGrid, Vector};
///
/// let mut grid = SegmentGrid::new(GridConfig::with_cell_size(10.0)).unwrap();
///
/// // A 15x15 rectangle centered on a cell corner spans four cells.
/// grid.insert(1_u64, &Rectangle::new(Vector::new(10.0, 10.0), Vector::new(15.0, 15.0)));
/// assert_eq!(grid.cells_of(1).unwrap().len(), 4);
///
/// grid.remove(1);
/// assert!(grid.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct SegmentGrid<K> {
    config: GridConfig,
    /// Cell -> keys overlapping it. Empty buckets are dropped.
    cells: HashMap<CellCoord, BTreeSet<K>>,
    /// Key -> cells it currently occupies.
    memberships: HashMap<K, Vec<CellCoord>>,
}

impl<K> SegmentGrid<K>
where
    K: Copy + Ord + Hash + Debug,
{
    /// Create an empty grid.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: GridConfig) -> Result<Self, GridError> {
        config.validate()?;
        Ok(Self {
            config,
            cells: HashMap::new(),
            memberships: HashMap::new(),
        })
    }

    /// The configuration this grid was built with.
    #[must_use]
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Cell containing a world position.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_of(&self, point: Vector) -> CellCoord {
        // `as` saturates for out-of-range floats.
        CellCoord::new(
            (point.x / self.config.cell_size).floor() as i32,
            (point.y / self.config.cell_size).floor() as i32,
        )
    }

    fn span_of(&self, rect: &Rectangle) -> CellSpan {
        CellSpan {
            min: self.cell_of(rect.top_left()),
            max: self.cell_of(rect.bottom_right()),
        }
    }

    /// All cells a rectangle overlaps, row by row.
    #[must_use]
    pub fn cells_overlapping(&self, rect: &Rectangle) -> Vec<CellCoord> {
        self.span_of(rect).iter().collect()
    }

    /// Add a key to every cell its rectangle overlaps.
    ///
    /// Inserting a key that is already present replaces its old membership.
    pub fn insert(&mut self, key: K, rect: &Rectangle) {
        if self.memberships.contains_key(&key) {
            self.remove(key);
        }
        let cells = self.cells_overlapping(rect);
        for cell in &cells {
            self.cells.entry(*cell).or_default().insert(key);
        }
        tracing::trace!(?key, cells = cells.len(), "grid insert");
        self.memberships.insert(key, cells);
    }

    /// Remove a key from every cell it occupies.
    ///
    /// Returns `false` if the key was not present.
    pub fn remove(&mut self, key: K) -> bool {
        let Some(cells) = self.memberships.remove(&key) else {
            return false;
        };
        for cell in cells {
            if let Some(bucket) = self.cells.get_mut(&cell) {
                bucket.remove(&key);
                if bucket.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }
        tracing::trace!(?key, "grid remove");
        true
    }

    /// Re-index a key after its rectangle changed.
    pub fn update(&mut self, key: K, rect: &Rectangle) {
        self.remove(key);
        self.insert(key, rect);
    }

    /// Keys found in the cells around `rect`, sorted and deduplicated.
    ///
    /// The searched area is the rectangle's cells grown by `query_margin`
    /// rings.
    #[must_use]
    pub fn query_rect(&self, rect: &Rectangle) -> Vec<K> {
        if self.cells.is_empty() {
            return Vec::new();
        }
        let margin = i32::try_from(self.config.query_margin).unwrap_or(i32::MAX);
        let mut found = BTreeSet::new();
        for cell in self.span_of(rect).grown(margin).iter() {
            if let Some(bucket) = self.cells.get(&cell) {
                found.extend(bucket.iter().copied());
            }
        }
        found.into_iter().collect()
    }

    /// Keys found in the cells around a point.
    #[must_use]
    pub fn query_point(&self, point: Vector) -> Vec<K> {
        self.query_rect(&Rectangle::new(point, Vector::ZERO))
    }

    /// Cells currently occupied by a key.
    #[must_use]
    pub fn cells_of(&self, key: K) -> Option<&[CellCoord]> {
        self.memberships.get(&key).map(Vec::as_slice)
    }

    /// Keys stored in a single cell.
    pub fn keys_in_cell(&self, cell: CellCoord) -> impl Iterator<Item = K> + '_ {
        self.cells.get(&cell).into_iter().flatten().copied()
    }

    /// Returns true if the key is indexed.
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.memberships.contains_key(&key)
    }

    /// Number of indexed keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.memberships.len()
    }

    /// Returns true if no key is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.memberships.is_empty()
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Drop every key.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.memberships.clear();
    }
}
