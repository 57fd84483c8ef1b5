//! District -> municipality -> parish containment tree.
//!
//! Built once from ingested parcels. Each parish keeps the ids of the
//! parcels registered in it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::Parcel;

/// All districts, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionTree {
    /// District name -> district.
    pub districts: BTreeMap<String, District>,
}

/// A district and its municipalities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    /// Municipality name -> municipality.
    pub municipalities: BTreeMap<String, Municipality>,
}

/// A municipality and its parishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Municipality {
    /// Parish name -> parish.
    pub parishes: BTreeMap<String, Parish>,
}

/// A parish and the parcels registered in it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parish {
    /// Ids of the parcels in this parish.
    pub parcel_ids: BTreeSet<i64>,
}

impl RegionTree {
    /// Builds the tree from a parcel collection.
    #[must_use]
    pub fn from_parcels<'a>(parcels: impl IntoIterator<Item = &'a Parcel>) -> Self {
        let mut tree = Self::default();
        for parcel in parcels {
            tree.insert(parcel);
        }
        tree
    }

    /// Registers a parcel under its district, municipality and parish,
    /// creating any missing level.
    pub fn insert(&mut self, parcel: &Parcel) {
        self.districts
            .entry(parcel.district.clone())
            .or_default()
            .municipalities
            .entry(parcel.municipality.clone())
            .or_default()
            .parishes
            .entry(parcel.parish.clone())
            .or_default()
            .parcel_ids
            .insert(parcel.id);
    }

    /// Looks up a parish by its full path.
    #[must_use]
    pub fn parish(&self, district: &str, municipality: &str, parish: &str) -> Option<&Parish> {
        self.districts
            .get(district)?
            .municipalities
            .get(municipality)?
            .parishes
            .get(parish)
    }

    /// Iterates `(district, municipality, parish, parish data)` in name order.
    pub fn parishes(&self) -> impl Iterator<Item = (&str, &str, &str, &Parish)> {
        self.districts.iter().flat_map(|(d, district)| {
            district.municipalities.iter().flat_map(move |(m, municipality)| {
                municipality
                    .parishes
                    .iter()
                    .map(move |(p, parish)| (d.as_str(), m.as_str(), p.as_str(), parish))
            })
        })
    }

    /// Total number of parcels registered across all parishes.
    #[must_use]
    pub fn parcel_count(&self) -> usize {
        self.parishes().map(|(_, _, _, p)| p.parcel_ids.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vertex;

    fn parcel(id: i64, district: &str, municipality: &str, parish: &str) -> Parcel {
        Parcel {
            id,
            parcel_ref: format!("P{id}"),
            perimeter: 4.0,
            area: 1.0,
            boundary: vec![Vertex::new(0.0, 0.0)],
            owner: "Ana".to_string(),
            parish: parish.to_string(),
            municipality: municipality.to_string(),
            district: district.to_string(),
            urbanization_score: 0.0,
            tourism_score: 0.0,
        }
    }

    #[test]
    fn builds_nested_levels() {
        let parcels = [
            parcel(1, "Faro", "Loulé", "Almancil"),
            parcel(2, "Faro", "Loulé", "Almancil"),
            parcel(3, "Faro", "Loulé", "Quarteira"),
            parcel(4, "Beja", "Mértola", "Alcaria"),
        ];
        let tree = RegionTree::from_parcels(&parcels);

        assert_eq!(tree.districts.len(), 2);
        assert_eq!(tree.parcel_count(), 4);
        let almancil = tree.parish("Faro", "Loulé", "Almancil").unwrap();
        assert_eq!(almancil.parcel_ids, BTreeSet::from([1, 2]));
        assert!(tree.parish("Faro", "Loulé", "Nowhere").is_none());
    }

    #[test]
    fn parishes_iterate_in_name_order() {
        let parcels = [
            parcel(1, "Faro", "Loulé", "Quarteira"),
            parcel(2, "Beja", "Mértola", "Alcaria"),
        ];
        let tree = RegionTree::from_parcels(&parcels);
        let names: Vec<&str> = tree.parishes().map(|(_, _, p, _)| p).collect();
        assert_eq!(names, vec!["Alcaria", "Quarteira"]);
    }
}
