#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial indexes for parcel adjacency candidate lookup.
//!
//! Two indexes are provided:
//!
//! * [`SpatialIndex`] buckets each parcel into a uniform grid cell by its
//!   *first* boundary vertex only, and answers "which parcels sit in the
//!   surrounding 3x3 block of cells". This is cheap but approximate: a
//!   parcel whose first vertex is far from a shared vertex can be missed.
//! * [`VertexIndex`] loads every boundary vertex into an R-tree and answers
//!   exact neighborhood queries around a single vertex.
//!
//! Neither index decides adjacency. They only narrow down candidates.

mod vertex;

use std::collections::{BTreeMap, BTreeSet};

use landswap_parcel_models::{Parcel, Vertex};

pub use vertex::{VertexEntry, VertexIndex};

/// Default grid cell edge length, in map units.
pub const DEFAULT_CELL_SIZE: f64 = 250.0;

/// Min/max coordinate extents across a set of vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    /// Smallest x.
    pub min_x: f64,
    /// Smallest y.
    pub min_y: f64,
    /// Largest x.
    pub max_x: f64,
    /// Largest y.
    pub max_y: f64,
}

impl Extent {
    /// Computes the extent of every finite boundary vertex of `parcels`.
    ///
    /// Returns `None` if there are no finite vertices.
    #[must_use]
    pub fn of<'a>(parcels: impl IntoIterator<Item = &'a Parcel>) -> Option<Self> {
        parcels
            .into_iter()
            .flat_map(|p| p.boundary.iter())
            .filter(|v| v.x.is_finite() && v.y.is_finite())
            .fold(None, |acc: Option<Self>, v| {
                Some(acc.map_or(
                    Self {
                        min_x: v.x,
                        min_y: v.y,
                        max_x: v.x,
                        max_y: v.y,
                    },
                    |e| Self {
                        min_x: e.min_x.min(v.x),
                        min_y: e.min_y.min(v.y),
                        max_x: e.max_x.max(v.x),
                        max_y: e.max_y.max(v.y),
                    },
                ))
            })
    }
}

/// Uniform grid over the parcel extents.
///
/// Each parcel lives in exactly one cell, chosen by its first boundary
/// vertex. Cells are stored sparsely, so parcels inserted after
/// construction may fall outside the original extents.
pub struct SpatialIndex<'a> {
    cell_size: f64,
    origin: Vertex,
    columns: usize,
    rows: usize,
    cells: BTreeMap<(i64, i64), Vec<&'a Parcel>>,
    len: usize,
}

impl<'a> SpatialIndex<'a> {
    /// Builds a grid with [`DEFAULT_CELL_SIZE`] cells and inserts every parcel.
    #[must_use]
    pub fn new(parcels: &'a [Parcel]) -> Self {
        Self::with_cell_size(parcels, DEFAULT_CELL_SIZE)
    }

    /// Builds a grid with the given cell size and inserts every parcel.
    ///
    /// A non-positive or non-finite `cell_size` falls back to
    /// [`DEFAULT_CELL_SIZE`]. An empty parcel list yields a single empty
    /// cell.
    #[must_use]
    pub fn with_cell_size(parcels: &'a [Parcel], cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            log::warn!("Invalid grid cell size {cell_size}; using {DEFAULT_CELL_SIZE}");
            DEFAULT_CELL_SIZE
        };

        let (origin, columns, rows) = Extent::of(parcels).map_or_else(
            || (Vertex::new(0.0, 0.0), 1, 1),
            |e| {
                (
                    Vertex::new(e.min_x, e.min_y),
                    cells_along(e.max_x - e.min_x, cell_size),
                    cells_along(e.max_y - e.min_y, cell_size),
                )
            },
        );

        let mut index = Self {
            cell_size,
            origin,
            columns,
            rows,
            cells: BTreeMap::new(),
            len: 0,
        };

        for parcel in parcels {
            index.insert(parcel);
        }

        log::debug!(
            "Indexed {} parcels into a {}x{} grid ({} occupied cells, cell size {})",
            index.len,
            index.columns,
            index.rows,
            index.cells.len(),
            index.cell_size
        );

        index
    }

    /// Places a parcel into the cell containing its first boundary vertex.
    ///
    /// Parcels without a (finite) boundary vertex are not indexed.
    pub fn insert(&mut self, parcel: &'a Parcel) {
        let Some(cell) = self.cell_of(parcel) else {
            log::debug!("Parcel {} has no usable boundary vertex; not indexed", parcel.id);
            return;
        };
        self.cells.entry(cell).or_default().push(parcel);
        self.len += 1;
    }

    /// Returns every indexed parcel in the parcel's own cell and its eight
    /// neighboring cells, excluding the parcel itself, without duplicates.
    #[must_use]
    pub fn nearby(&self, parcel: &Parcel) -> Vec<&'a Parcel> {
        let Some((col, row)) = self.cell_of(parcel) else {
            return Vec::new();
        };

        let mut seen = BTreeSet::new();
        let mut found = Vec::new();

        for dy in -1..=1 {
            for dx in -1..=1 {
                let key = (col.saturating_add(dx), row.saturating_add(dy));
                let Some(bucket) = self.cells.get(&key) else {
                    continue;
                };
                for &candidate in bucket {
                    if candidate.id != parcel.id && seen.insert(candidate.id) {
                        found.push(candidate);
                    }
                }
            }
        }

        found
    }

    /// Cell edge length in map units.
    #[must_use]
    pub const fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Grid dimensions `(columns, rows)` derived from the construction extents.
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    /// Number of parcels placed into a cell.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether no parcel has been indexed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn cell_of(&self, parcel: &Parcel) -> Option<(i64, i64)> {
        let v = parcel.first_vertex()?;
        if !(v.x.is_finite() && v.y.is_finite()) {
            return None;
        }
        Some((
            cell_coord(v.x - self.origin.x, self.cell_size),
            cell_coord(v.y - self.origin.y, self.cell_size),
        ))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn cell_coord(offset: f64, cell_size: f64) -> i64 {
    (offset / cell_size).floor() as i64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cells_along(span: f64, cell_size: f64) -> usize {
    (span / cell_size).floor().max(0.0) as usize + 1
}
