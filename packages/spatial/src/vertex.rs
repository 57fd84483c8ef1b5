//! R-tree over every boundary vertex of every parcel.

use landswap_parcel_models::{Parcel, Vertex};
use rstar::{AABB, RTree, RTreeObject};

/// A single boundary vertex stored in the R-tree with its owning parcel.
pub struct VertexEntry<'a> {
    /// The vertex position.
    pub vertex: Vertex,
    /// The parcel this vertex belongs to.
    pub parcel: &'a Parcel,
}

impl RTreeObject for VertexEntry<'_> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.vertex.x, self.vertex.y])
    }
}

/// Pre-built R-tree of all parcel boundary vertices.
///
/// Unlike the grid index, every vertex is indexed, so a query around any
/// vertex sees every other parcel that has a vertex nearby.
pub struct VertexIndex<'a> {
    tree: RTree<VertexEntry<'a>>,
}

impl<'a> VertexIndex<'a> {
    /// Bulk-loads every finite boundary vertex of `parcels`.
    #[must_use]
    pub fn new(parcels: &'a [Parcel]) -> Self {
        let entries: Vec<VertexEntry<'a>> = parcels
            .iter()
            .flat_map(|parcel| {
                parcel
                    .boundary
                    .iter()
                    .filter(|v| v.x.is_finite() && v.y.is_finite())
                    .map(move |&vertex| VertexEntry { vertex, parcel })
            })
            .collect();

        let tree = RTree::bulk_load(entries);
        log::debug!("Loaded {} boundary vertices into vertex index", tree.size());

        Self { tree }
    }

    /// Entries whose vertex lies inside the square of half-width `radius`
    /// centred on `center` (inclusive bounds).
    pub fn around(&self, center: Vertex, radius: f64) -> impl Iterator<Item = &VertexEntry<'a>> {
        let envelope = AABB::from_corners(
            [center.x - radius, center.y - radius],
            [center.x + radius, center.y + radius],
        );
        self.tree.locate_in_envelope_intersecting(&envelope)
    }

    /// Number of indexed vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether no vertex was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parcel(id: i64, vertices: &[(f64, f64)]) -> Parcel {
        Parcel {
            id,
            parcel_ref: format!("P{id}"),
            perimeter: 0.0,
            area: 1.0,
            boundary: vertices.iter().copied().map(Vertex::from).collect(),
            owner: "Ana".to_string(),
            parish: String::new(),
            municipality: String::new(),
            district: String::new(),
            urbanization_score: 0.0,
            tourism_score: 0.0,
        }
    }

    #[test]
    fn indexes_every_vertex() {
        let parcels = [
            parcel(1, &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]),
            parcel(2, &[(5.0, 5.0), (f64::NAN, 2.0)]),
        ];
        let index = VertexIndex::new(&parcels);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn around_finds_vertices_far_from_first_vertex() {
        let parcels = [
            parcel(1, &[(0.0, 0.0), (1.0, 0.0)]),
            parcel(2, &[(2000.0, 0.0), (1.0, 0.0)]),
        ];
        let index = VertexIndex::new(&parcels);
        let mut ids: Vec<i64> = index
            .around(Vertex::new(1.0, 0.0), 1e-4)
            .map(|e| e.parcel.id)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn around_respects_radius() {
        let parcels = [parcel(1, &[(0.0, 0.0)]), parcel(2, &[(0.5, 0.5)])];
        let index = VertexIndex::new(&parcels);
        assert_eq!(index.around(Vertex::new(0.0, 0.0), 0.1).count(), 1);
        assert_eq!(index.around(Vertex::new(0.0, 0.0), 0.5).count(), 2);
    }

    #[test]
    fn empty_index() {
        let index = VertexIndex::new(&[]);
        assert!(index.is_empty());
        assert_eq!(index.around(Vertex::new(0.0, 0.0), 1.0).count(), 0);
    }
}
