//! Undirected adjacency graph over parcels.
//!
//! Edges come from shared boundary coordinates: every vertex is snapped
//! to a fixed decimal resolution and parcels that land on the same key are
//! connected. The key resolution is independent of
//! [`crate::ADJACENCY_TOLERANCE`].

use std::collections::{BTreeMap, BTreeSet};

use landswap_parcel_models::{AdjacencyPair, Parcel, Vertex};
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

/// Number of decimal places kept when snapping vertices to graph keys.
pub const GRAPH_KEY_DECIMALS: i32 = 6;

/// Snapped coordinate used to group coincident vertices.
pub type VertexKey = (i64, i64);

/// Snaps a vertex to [`GRAPH_KEY_DECIMALS`] decimal places.
///
/// Returns `None` for non-finite coordinates.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn vertex_key(vertex: Vertex) -> Option<VertexKey> {
    if !(vertex.x.is_finite() && vertex.y.is_finite()) {
        return None;
    }
    let scale = 10f64.powi(GRAPH_KEY_DECIMALS);
    Some((
        (vertex.x * scale).round() as i64,
        (vertex.y * scale).round() as i64,
    ))
}

/// Builds the vertex-sharing adjacency map: parcel id -> ids of every other
/// parcel with a boundary vertex on the same [`VertexKey`].
///
/// Every parcel id appears as a key, including isolated ones. Only the
/// first record of a repeated id contributes vertices.
#[must_use]
pub fn shared_vertex_adjacency(parcels: &[Parcel]) -> BTreeMap<i64, BTreeSet<i64>> {
    let mut by_key: BTreeMap<VertexKey, BTreeSet<i64>> = BTreeMap::new();
    let mut adjacency: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();

    for parcel in parcels {
        if adjacency.contains_key(&parcel.id) {
            continue;
        }
        adjacency.insert(parcel.id, BTreeSet::new());
        for key in parcel.boundary.iter().copied().filter_map(vertex_key) {
            by_key.entry(key).or_default().insert(parcel.id);
        }
    }

    for ids in by_key.values().filter(|ids| ids.len() > 1) {
        for &a in ids {
            for &b in ids {
                if a != b {
                    adjacency.entry(a).or_default().insert(b);
                }
            }
        }
    }

    adjacency
}

/// Builds the adjacency graph for a parcel collection.
#[must_use]
pub fn build_adjacency_graph(parcels: &[Parcel]) -> AdjacencyGraph {
    AdjacencyGraph::build(parcels)
}

/// Parcels as nodes, shared-vertex adjacency as edges.
///
/// No self-edges and no parallel edges. Parcel ids are unique within the
/// graph; later records with an already-seen id are ignored.
pub struct AdjacencyGraph {
    graph: UnGraph<Parcel, ()>,
    nodes: BTreeMap<i64, NodeIndex>,
}

impl AdjacencyGraph {
    /// Adds every parcel as a node, then connects parcels that share a
    /// snapped boundary coordinate.
    #[must_use]
    pub fn build(parcels: &[Parcel]) -> Self {
        let mut graph = UnGraph::with_capacity(parcels.len(), parcels.len());
        let mut nodes = BTreeMap::new();

        for parcel in parcels {
            if nodes.contains_key(&parcel.id) {
                log::warn!("Duplicate parcel id {}; keeping first record", parcel.id);
                continue;
            }
            nodes.insert(parcel.id, graph.add_node(parcel.clone()));
        }

        for (id, neighbors) in shared_vertex_adjacency(parcels) {
            for neighbor in neighbors.into_iter().filter(|&n| n > id) {
                let (Some(&a), Some(&b)) = (nodes.get(&id), nodes.get(&neighbor)) else {
                    continue;
                };
                if graph.find_edge(a, b).is_none() {
                    graph.add_edge(a, b, ());
                }
            }
        }

        log::debug!(
            "Built adjacency graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Self { graph, nodes }
    }

    /// Number of parcels in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of adjacency edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether a parcel with this id is in the graph.
    #[must_use]
    pub fn contains(&self, id: i64) -> bool {
        self.nodes.contains_key(&id)
    }

    /// The parcel stored for `id`.
    #[must_use]
    pub fn parcel(&self, id: i64) -> Option<&Parcel> {
        self.nodes.get(&id).map(|&idx| &self.graph[idx])
    }

    /// All parcels, in id order.
    pub fn parcels(&self) -> impl Iterator<Item = &Parcel> {
        self.nodes.values().map(|&idx| &self.graph[idx])
    }

    /// Parcels adjacent to `id`, in id order. Empty for unknown ids.
    #[must_use]
    pub fn neighbors(&self, id: i64) -> Vec<&Parcel> {
        let Some(&idx) = self.nodes.get(&id) else {
            return Vec::new();
        };
        let mut neighbors: Vec<&Parcel> = self
            .graph
            .neighbors(idx)
            .map(|n| &self.graph[n])
            .collect();
        neighbors.sort_by_key(|p| p.id);
        neighbors
    }

    /// Every edge as an id pair, in pair order.
    #[must_use]
    pub fn edges(&self) -> Vec<AdjacencyPair> {
        let mut edges: Vec<AdjacencyPair> = self
            .graph
            .edge_references()
            .filter_map(|e| {
                AdjacencyPair::new(self.graph[e.source()].id, self.graph[e.target()].id)
            })
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Connected components as sorted id lists, ordered by smallest id.
    #[must_use]
    pub fn connected_components(&self) -> Vec<Vec<i64>> {
        let mut sets = UnionFind::<usize>::new(self.graph.node_count());
        for edge in self.graph.edge_references() {
            sets.union(edge.source().index(), edge.target().index());
        }

        let labels = sets.into_labeling();
        let mut components: BTreeMap<usize, Vec<i64>> = BTreeMap::new();
        for idx in self.graph.node_indices() {
            components
                .entry(labels[idx.index()])
                .or_default()
                .push(self.graph[idx].id);
        }

        let mut components: Vec<Vec<i64>> = components
            .into_values()
            .map(|mut ids| {
                ids.sort_unstable();
                ids
            })
            .collect();
        components.sort_unstable_by_key(|ids| ids.first().copied());
        components
    }

    /// The underlying `petgraph` graph, for renderers.
    #[must_use]
    pub const fn as_graph(&self) -> &UnGraph<Parcel, ()> {
        &self.graph
    }
}
