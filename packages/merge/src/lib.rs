#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Consolidation of contiguous same-owner holdings.
//!
//! Parcels that share a boundary vertex and have the same owner are grouped
//! into connected components. Every component with two or more parcels is
//! collapsed into one synthetic merged parcel; singletons pass through.
//!
//! Merging aggregates attributes only. Boundaries are concatenated, never
//! unioned, and areas are summed rather than recomputed.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use landswap_adjacency::shared_vertex_adjacency;
use landswap_parcel_models::Parcel;

/// Separator between source parcel references in a merged reference.
pub const MERGED_REF_SEPARATOR: &str = "+";

/// Merges contiguous same-owner parcels.
///
/// Output holds every merged parcel first (in component discovery order),
/// followed by every untouched parcel (in input order). No id appears twice;
/// later records with an already-seen id are dropped. Total area of the
/// output equals total area of the distinct input parcels.
#[must_use]
pub fn merge_same_owner_adjacent(parcels: &[Parcel]) -> Vec<Parcel> {
    let lookup = unique_parcels(parcels);
    let components = same_owner_components(parcels);

    let mut merged = Vec::new();
    let mut untouched_ids = BTreeSet::new();

    for component in &components {
        match component.as_slice() {
            [] => {}
            [id] => {
                untouched_ids.insert(*id);
            }
            ids => {
                let members: Vec<&Parcel> = ids
                    .iter()
                    .filter_map(|id| lookup.get(id).copied())
                    .collect();
                merged.extend(merge_group(&members));
            }
        }
    }

    // Untouched parcels keep their input order.
    let mut seen = BTreeSet::new();
    let untouched = parcels
        .iter()
        .filter(|p| untouched_ids.contains(&p.id) && seen.insert(p.id))
        .cloned();

    log::info!(
        "Merged {} parcels into {} holdings ({} untouched)",
        lookup.len() - untouched_ids.len(),
        merged.len(),
        untouched_ids.len()
    );

    merged.into_iter().chain(untouched).collect()
}

/// Connected components of the same-owner adjacency map, discovered by
/// breadth-first traversal from each unvisited parcel in input order.
///
/// Each component lists ids in visit order. Singletons are included.
#[must_use]
pub fn same_owner_components(parcels: &[Parcel]) -> Vec<Vec<i64>> {
    let lookup = unique_parcels(parcels);
    let adjacency = owner_filtered_adjacency(parcels, &lookup);

    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();
    let mut components = Vec::new();

    for parcel in parcels {
        if !visited.insert(parcel.id) {
            continue;
        }

        let mut component = Vec::new();
        queue.push_back(parcel.id);

        while let Some(id) = queue.pop_front() {
            component.push(id);
            let Some(neighbors) = adjacency.get(&id) else {
                continue;
            };
            for &neighbor in neighbors {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }

        components.push(component);
    }

    components
}

/// Collapses a group of parcels into one merged parcel.
///
/// The merged parcel takes the smallest id, the summed area and perimeter,
/// the concatenated boundaries (in id order), and the owner and location of
/// the smallest-id member. Source references are joined with
/// [`MERGED_REF_SEPARATOR`]. Scores are the area-weighted mean.
///
/// Returns `None` for an empty group.
#[must_use]
pub fn merge_group(members: &[&Parcel]) -> Option<Parcel> {
    let mut members = members.to_vec();
    members.sort_by_key(|p| p.id);
    let first = *members.first()?;

    let area: f64 = members.iter().map(|p| p.area).sum();
    let perimeter: f64 = members.iter().map(|p| p.perimeter).sum();

    let (urbanization, tourism) = if area > 0.0 {
        (
            members.iter().map(|p| p.urbanization_score * p.area).sum::<f64>() / area,
            members.iter().map(|p| p.tourism_score * p.area).sum::<f64>() / area,
        )
    } else {
        #[allow(clippy::cast_precision_loss)]
        let count = members.len() as f64;
        (
            members.iter().map(|p| p.urbanization_score).sum::<f64>() / count,
            members.iter().map(|p| p.tourism_score).sum::<f64>() / count,
        )
    };

    let mut merged = Parcel {
        id: first.id,
        parcel_ref: members
            .iter()
            .map(|p| p.parcel_ref.as_str())
            .collect::<Vec<_>>()
            .join(MERGED_REF_SEPARATOR),
        perimeter,
        area,
        boundary: members.iter().flat_map(|p| p.boundary.iter().copied()).collect(),
        owner: first.owner.clone(),
        parish: first.parish.clone(),
        municipality: first.municipality.clone(),
        district: first.district.clone(),
        urbanization_score: 0.0,
        tourism_score: 0.0,
    };
    merged.set_scores(urbanization, tourism);

    log::debug!(
        "Merged parcels {:?} of owner {} into parcel {} (area {area})",
        members.iter().map(|p| p.id).collect::<Vec<_>>(),
        merged.owner,
        merged.id
    );

    Some(merged)
}

fn unique_parcels(parcels: &[Parcel]) -> BTreeMap<i64, &Parcel> {
    let mut lookup = BTreeMap::new();
    for parcel in parcels {
        lookup.entry(parcel.id).or_insert(parcel);
    }
    lookup
}

fn owner_filtered_adjacency(
    parcels: &[Parcel],
    lookup: &BTreeMap<i64, &Parcel>,
) -> BTreeMap<i64, BTreeSet<i64>> {
    shared_vertex_adjacency(parcels)
        .into_iter()
        .map(|(id, neighbors)| {
            let owner = lookup.get(&id).map(|p| p.owner.as_str());
            let same_owner = neighbors
                .into_iter()
                .filter(|n| lookup.get(n).map(|p| p.owner.as_str()) == owner)
                .collect();
            (id, same_owner)
        })
        .collect()
}
