#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Parcel adjacency detection and adjacency graph construction.
//!
//! Two parcels are adjacent when at least one vertex of the first lies
//! within [`ADJACENCY_TOLERANCE`] of a vertex of the second on both axes.
//! [`find_adjacent_pairs`] returns every adjacent pair exactly once;
//! [`build_adjacency_graph`] materializes shared-vertex adjacency as a
//! traversable [`AdjacencyGraph`].
//!
//! Adjacency equality is independent of the grid cell size used by
//! [`landswap_spatial::SpatialIndex`] and of the coordinate key resolution
//! used by the graph builder.

pub mod detect;
pub mod graph;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use detect::{AdjacencyDetector, are_adjacent, find_adjacent_pairs, vertices_coincide};
pub use graph::{AdjacencyGraph, build_adjacency_graph, shared_vertex_adjacency};

/// Per-axis tolerance under which two vertices are the same boundary point.
pub const ADJACENCY_TOLERANCE: f64 = 1e-4;

/// How candidate parcel pairs are enumerated before the exact vertex test.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DetectionStrategy {
    /// Every pair of parcels is tested. Exact, quadratic.
    Naive,
    /// Candidates come from the first-vertex grid. Fast, but misses
    /// neighbors whose first vertex lands outside the 3x3 cell block.
    Grid,
    /// Candidates come from an R-tree over every boundary vertex. Exact.
    #[default]
    VertexIndex,
}

impl DetectionStrategy {
    /// All strategies, in increasing order of sophistication.
    pub const ALL: &[Self] = &[Self::Naive, Self::Grid, Self::VertexIndex];

    /// Whether the strategy can miss true adjacencies.
    #[must_use]
    pub const fn is_approximate(self) -> bool {
        matches!(self, Self::Grid)
    }
}
