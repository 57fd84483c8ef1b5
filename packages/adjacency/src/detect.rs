//! Pairwise adjacency detection.

use std::collections::BTreeSet;

use landswap_parcel_models::{AdjacencyPair, Parcel, Vertex};
use landswap_spatial::{DEFAULT_CELL_SIZE, SpatialIndex, VertexIndex};
use rayon::prelude::*;

use crate::{ADJACENCY_TOLERANCE, DetectionStrategy};

/// Whether two vertices are the same boundary point.
#[must_use]
pub fn vertices_coincide(a: Vertex, b: Vertex) -> bool {
    (a.x - b.x).abs() < ADJACENCY_TOLERANCE && (a.y - b.y).abs() < ADJACENCY_TOLERANCE
}

/// Whether two distinct parcels share at least one boundary vertex.
///
/// A parcel is never adjacent to itself, and a parcel with an empty
/// boundary is adjacent to nothing.
#[must_use]
pub fn are_adjacent(a: &Parcel, b: &Parcel) -> bool {
    a.id != b.id
        && a.boundary
            .iter()
            .any(|&va| b.boundary.iter().any(|&vb| vertices_coincide(va, vb)))
}

/// Finds every adjacent parcel pair using the default strategy.
#[must_use]
pub fn find_adjacent_pairs(parcels: &[Parcel]) -> BTreeSet<AdjacencyPair> {
    AdjacencyDetector::default().find_adjacent_pairs(parcels)
}

/// Configurable adjacency detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjacencyDetector {
    strategy: DetectionStrategy,
    cell_size: f64,
}

impl Default for AdjacencyDetector {
    fn default() -> Self {
        Self::new(DetectionStrategy::default())
    }
}

impl AdjacencyDetector {
    /// Creates a detector using `strategy` and the default grid cell size.
    #[must_use]
    pub const fn new(strategy: DetectionStrategy) -> Self {
        Self {
            strategy,
            cell_size: DEFAULT_CELL_SIZE,
        }
    }

    /// Sets the grid cell size used by [`DetectionStrategy::Grid`].
    #[must_use]
    pub const fn with_cell_size(mut self, cell_size: f64) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// The configured strategy.
    #[must_use]
    pub const fn strategy(&self) -> DetectionStrategy {
        self.strategy
    }

    /// Returns every unordered adjacent pair exactly once, with no
    /// self-pairs.
    ///
    /// Candidates are tested in parallel per parcel; the result is an
    /// ordered set, so output does not depend on scheduling.
    #[must_use]
    pub fn find_adjacent_pairs(&self, parcels: &[Parcel]) -> BTreeSet<AdjacencyPair> {
        let pairs = match self.strategy {
            DetectionStrategy::Naive => naive_pairs(parcels),
            DetectionStrategy::Grid => grid_pairs(parcels, self.cell_size),
            DetectionStrategy::VertexIndex => vertex_index_pairs(parcels),
        };

        log::info!(
            "Found {} adjacent pairs among {} parcels ({} strategy)",
            pairs.len(),
            parcels.len(),
            self.strategy
        );

        pairs
    }
}

fn naive_pairs(parcels: &[Parcel]) -> BTreeSet<AdjacencyPair> {
    (0..parcels.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let a = &parcels[i];
            parcels[i + 1..]
                .iter()
                .filter(move |b| are_adjacent(a, b))
                .filter_map(move |b| AdjacencyPair::new(a.id, b.id))
        })
        .collect()
}

fn grid_pairs(parcels: &[Parcel], cell_size: f64) -> BTreeSet<AdjacencyPair> {
    let index = SpatialIndex::with_cell_size(parcels, cell_size);

    parcels
        .par_iter()
        .flat_map_iter(|a| {
            index
                .nearby(a)
                .into_iter()
                .filter(move |b| are_adjacent(a, b))
                .filter_map(move |b| AdjacencyPair::new(a.id, b.id))
        })
        .collect()
}

fn vertex_index_pairs(parcels: &[Parcel]) -> BTreeSet<AdjacencyPair> {
    let index = VertexIndex::new(parcels);

    parcels
        .par_iter()
        .flat_map_iter(|a| {
            let mut found = BTreeSet::new();
            for &vertex in &a.boundary {
                for entry in index.around(vertex, ADJACENCY_TOLERANCE) {
                    if entry.parcel.id != a.id && vertices_coincide(vertex, entry.vertex) {
                        found.extend(AdjacencyPair::new(a.id, entry.parcel.id));
                    }
                }
            }
            found
        })
        .collect()
}
