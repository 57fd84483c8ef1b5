#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Cadastral parcel types shared across the landswap toolchain.
//!
//! A [`Parcel`] is a registered land unit with a polygon boundary, an owner
//! and an administrative location. The analysis crates consume parcels and
//! produce [`AdjacencyPair`]s, merged parcels and [`ExchangeSuggestion`]s.

pub mod region;

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A boundary vertex in projected map units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Easting.
    pub x: f64,
    /// Northing.
    pub y: f64,
}

impl Vertex {
    /// Creates a vertex from its coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the vertex shifted by `(dx, dy)`.
    #[must_use]
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl From<(f64, f64)> for Vertex {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// A cadastral parcel.
///
/// Identity and equality are defined by [`Parcel::id`] alone. Negative ids
/// denote points of interest that only feed the external scoring pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
    /// Unique parcel identifier.
    pub id: i64,
    /// External cadastral reference code.
    pub parcel_ref: String,
    /// Perimeter in map units.
    pub perimeter: f64,
    /// Area in square map units.
    pub area: f64,
    /// Ordered boundary vertices. Multi-ring geometries are flattened.
    pub boundary: Vec<Vertex>,
    /// Registered owner.
    pub owner: String,
    /// Parish name.
    pub parish: String,
    /// Municipality name.
    pub municipality: String,
    /// District name.
    pub district: String,
    /// Urbanization score in `[0, 1]`, set by the scoring pass.
    #[serde(default)]
    pub urbanization_score: f64,
    /// Tourism score in `[0, 1]`, set by the scoring pass.
    #[serde(default)]
    pub tourism_score: f64,
}

impl Parcel {
    /// Whether this record is a point of interest rather than a land unit.
    #[must_use]
    pub const fn is_point_of_interest(&self) -> bool {
        self.id < 0
    }

    /// Sets both derived scores, clamping each into `[0, 1]`.
    pub fn set_scores(&mut self, urbanization: f64, tourism: f64) {
        self.urbanization_score = clamp_unit(urbanization);
        self.tourism_score = clamp_unit(tourism);
    }

    /// The first boundary vertex, if any.
    #[must_use]
    pub fn first_vertex(&self) -> Option<Vertex> {
        self.boundary.first().copied()
    }
}

impl PartialEq for Parcel {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Parcel {}

impl Hash for Parcel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// An unordered pair of adjacent parcel ids.
///
/// Stored with the smaller id first so that `(a, b)` and `(b, a)` compare
/// equal. Self-pairs cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AdjacencyPair {
    low: i64,
    high: i64,
}

impl AdjacencyPair {
    /// Creates a pair from two ids in either order.
    ///
    /// Returns `None` when both ids are the same parcel.
    #[must_use]
    pub fn new(a: i64, b: i64) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// The smaller id.
    #[must_use]
    pub const fn low(&self) -> i64 {
        self.low
    }

    /// The larger id.
    #[must_use]
    pub const fn high(&self) -> i64 {
        self.high
    }

    /// Both ids, smaller first.
    #[must_use]
    pub const fn ids(&self) -> (i64, i64) {
        (self.low, self.high)
    }

    /// Whether `id` is one of the two ends.
    #[must_use]
    pub const fn contains(&self, id: i64) -> bool {
        self.low == id || self.high == id
    }

    /// The opposite end from `id`, if `id` belongs to this pair.
    #[must_use]
    pub const fn other(&self, id: i64) -> Option<i64> {
        if self.low == id {
            Some(self.high)
        } else if self.high == id {
            Some(self.low)
        } else {
            None
        }
    }
}

/// A proposed 2-for-2 exchange between the owners of two adjacent parcels.
///
/// `parcel_a` belongs to `owner_a`, the lexicographically smaller owner of
/// the pair, and is traded for `parcel_b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeSuggestion {
    /// Parcel given up by `owner_a`.
    pub parcel_a: i64,
    /// Parcel given up by `owner_b`.
    pub parcel_b: i64,
    /// Owner of `parcel_a`.
    pub owner_a: String,
    /// Owner of `parcel_b`.
    pub owner_b: String,
    /// Area similarity of the two parcels, in `[0, 1]`.
    pub area_feasibility: f64,
    /// Signed fractional change of `owner_a`'s holding.
    pub percent_change_a: f64,
    /// Signed fractional change of `owner_b`'s holding.
    pub percent_change_b: f64,
    /// Urbanization/tourism similarity, in `[0, 1]`.
    pub value_similarity: f64,
    /// Ranking score. Higher is better.
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parcel(id: i64) -> Parcel {
        Parcel {
            id,
            parcel_ref: format!("P{id}"),
            perimeter: 4.0,
            area: 1.0,
            boundary: vec![Vertex::new(0.0, 0.0)],
            owner: "Ana".to_string(),
            parish: "Sé".to_string(),
            municipality: "Faro".to_string(),
            district: "Faro".to_string(),
            urbanization_score: 0.0,
            tourism_score: 0.0,
        }
    }

    #[test]
    fn pair_is_unordered() {
        assert_eq!(AdjacencyPair::new(3, 7), AdjacencyPair::new(7, 3));
        let pair = AdjacencyPair::new(7, 3).unwrap();
        assert_eq!(pair.ids(), (3, 7));
        assert_eq!(pair.other(3), Some(7));
        assert_eq!(pair.other(7), Some(3));
        assert_eq!(pair.other(5), None);
    }

    #[test]
    fn pair_rejects_self() {
        assert_eq!(AdjacencyPair::new(4, 4), None);
    }

    #[test]
    fn parcel_identity_is_id_only() {
        let a = parcel(1);
        let mut b = parcel(1);
        b.owner = "Rui".to_string();
        b.area = 99.0;
        assert_eq!(a, b);
        assert_ne!(a, parcel(2));
    }

    #[test]
    fn scores_are_clamped() {
        let mut p = parcel(1);
        p.set_scores(1.7, -0.2);
        assert!((p.urbanization_score - 1.0).abs() < f64::EPSILON);
        assert!(p.tourism_score.abs() < f64::EPSILON);
        p.set_scores(f64::NAN, 0.4);
        assert!(p.urbanization_score.abs() < f64::EPSILON);
        assert!((p.tourism_score - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_ids_are_points_of_interest() {
        assert!(parcel(-3).is_point_of_interest());
        assert!(!parcel(0).is_point_of_interest());
    }

    #[test]
    fn parcel_serializes_camel_case() {
        let json = serde_json::to_value(parcel(9)).unwrap();
        assert_eq!(json["parcelRef"], "P9");
        assert!(json.get("urbanizationScore").is_some());
    }
}
