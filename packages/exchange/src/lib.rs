#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Scored 2-for-2 land exchange suggestions.
//!
//! Cross-owner adjacency pairs are grouped by the (sorted) pair of owners
//! involved. For each group, the first two pairs define four parcels, two
//! per owner. Both one-to-one matchings are scored for area feasibility,
//! equity of the resulting holding changes and overall size, and the best
//! one per owner pair is kept. Ties keep the first matching.
//!
//! ## Scoring
//!
//! | Term | Formula |
//! |------|---------|
//! | `area_feasibility` | `1 - |a - b| / max(a, b)`, `0` for non-positive areas |
//! | `percent_change` | `(after - before) / before`, `0` for non-positive `before` |
//! | `value_similarity` | `0.6 * (1 - |du|) + 0.4 * (1 - |dt|)` |
//! | `equity` | `100 - |100 * change_a - 100 * change_b|` |
//! | `area_factor` | `min(1, mean(a, b) / area_normalizer)` |
//! | `score` | `equity * area_factor * area_feasibility` |

use std::collections::{BTreeMap, BTreeSet};

use landswap_parcel_models::{AdjacencyPair, ExchangeSuggestion, Parcel};
use serde::{Deserialize, Serialize};

/// Trades whose area feasibility falls below this are rejected.
pub const DEFAULT_FEASIBILITY_FLOOR: f64 = 0.85;

/// Mean area at which the size factor saturates at `1`.
pub const DEFAULT_AREA_NORMALIZER: f64 = 1000.0;

/// Weight of the urbanization score in [`value_similarity`].
pub const URBANIZATION_WEIGHT: f64 = 0.6;

/// Weight of the tourism score in [`value_similarity`].
pub const TOURISM_WEIGHT: f64 = 0.4;

/// Tunable scoring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuggestionParams {
    /// Minimum accepted area feasibility.
    pub feasibility_floor: f64,
    /// Mean area at which the size factor saturates.
    pub area_normalizer: f64,
}

impl Default for SuggestionParams {
    fn default() -> Self {
        Self {
            feasibility_floor: DEFAULT_FEASIBILITY_FLOOR,
            area_normalizer: DEFAULT_AREA_NORMALIZER,
        }
    }
}

/// Generates suggestions with the default parameters.
///
/// See [`SuggestionEngine::generate`].
#[must_use]
pub fn generate_suggestions<'a>(
    pairs: impl IntoIterator<Item = &'a AdjacencyPair>,
    parcels: &[Parcel],
) -> Vec<ExchangeSuggestion> {
    SuggestionEngine::default().generate(pairs, parcels)
}

/// Keeps only the pairs whose two parcels are known and have different
/// owners, in input order.
#[must_use]
pub fn cross_owner_pairs<'a>(
    pairs: impl IntoIterator<Item = &'a AdjacencyPair>,
    parcels: &[Parcel],
) -> Vec<AdjacencyPair> {
    let lookup = parcel_lookup(parcels);
    pairs
        .into_iter()
        .filter(|pair| {
            matches!(
                (lookup.get(&pair.low()), lookup.get(&pair.high())),
                (Some(a), Some(b)) if a.owner != b.owner
            )
        })
        .copied()
        .collect()
}

/// Similarity of two areas in `[0, 1]`. `0` if either area is not positive.
#[must_use]
pub fn area_feasibility(a: f64, b: f64) -> f64 {
    if !(a > 0.0 && b > 0.0) {
        return 0.0;
    }
    let feasibility = 1.0 - (a - b).abs() / a.max(b);
    if feasibility.is_finite() {
        feasibility.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Signed fractional change from `before` to `after`. `0` if `before` is
/// not positive.
#[must_use]
pub fn percent_change(before: f64, after: f64) -> f64 {
    if before > 0.0 {
        (after - before) / before
    } else {
        0.0
    }
}

/// Similarity of the urbanization and tourism scores of two parcels, in
/// `[0, 1]`.
#[must_use]
pub fn value_similarity(a: &Parcel, b: &Parcel) -> f64 {
    let urbanization = 1.0 - (a.urbanization_score - b.urbanization_score).abs();
    let tourism = 1.0 - (a.tourism_score - b.tourism_score).abs();
    let similarity = URBANIZATION_WEIGHT * urbanization + TOURISM_WEIGHT * tourism;
    if similarity.is_nan() {
        0.0
    } else {
        similarity.clamp(0.0, 1.0)
    }
}

/// Cross-owner adjacency links between one pair of owners, oriented so the
/// first parcel of each link belongs to the lexicographically smaller owner.
struct OwnerGroup<'p> {
    owners: (&'p str, &'p str),
    links: Vec<(&'p Parcel, &'p Parcel)>,
}

/// One trade under evaluation: `given_a` goes to owner B and `given_b` to
/// owner A, while each owner keeps its `retained_*` parcel.
struct Trade<'p> {
    given_a: &'p Parcel,
    given_b: &'p Parcel,
    retained_a: &'p Parcel,
    retained_b: &'p Parcel,
}

/// Proposes and ranks 2-for-2 exchanges.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SuggestionEngine {
    params: SuggestionParams,
}

impl SuggestionEngine {
    /// Creates an engine with the given parameters.
    #[must_use]
    pub const fn new(params: SuggestionParams) -> Self {
        Self { params }
    }

    /// The scoring parameters in use.
    #[must_use]
    pub const fn params(&self) -> &SuggestionParams {
        &self.params
    }

    /// Emits at most one suggestion per pair of owners, sorted by score
    /// descending.
    ///
    /// Pairs referencing unknown parcel ids are skipped. Owner-pair groups
    /// with fewer than two adjacency links, or whose first two links do not
    /// involve four distinct parcels split two-and-two by owner, produce
    /// nothing. Only the first two links of a group (in input order) are
    /// considered.
    #[must_use]
    pub fn generate<'a>(
        &self,
        pairs: impl IntoIterator<Item = &'a AdjacencyPair>,
        parcels: &[Parcel],
    ) -> Vec<ExchangeSuggestion> {
        let lookup = parcel_lookup(parcels);
        let groups = group_by_owners(pairs, &lookup);

        let mut suggestions: Vec<ExchangeSuggestion> = groups
            .iter()
            .filter_map(|group| self.evaluate(group))
            .collect();

        suggestions.sort_by(|a, b| b.score.total_cmp(&a.score));

        log::info!(
            "Generated {} exchange suggestions from {} owner pairs",
            suggestions.len(),
            groups.len()
        );

        suggestions
    }

    fn evaluate(&self, group: &OwnerGroup<'_>) -> Option<ExchangeSuggestion> {
        let &[(a1, b1), (a2, b2), ..] = group.links.as_slice() else {
            log::debug!(
                "Owners {} / {} share a single adjacency; no exchange possible",
                group.owners.0,
                group.owners.1
            );
            return None;
        };

        // Links are oriented by owner, so four distinct ids always split
        // two-and-two.
        let ids: BTreeSet<i64> = [a1.id, b1.id, a2.id, b2.id].into_iter().collect();
        if ids.len() != 4 {
            log::debug!(
                "Skipping owners {} / {}: ambiguous topology ({} distinct parcels)",
                group.owners.0,
                group.owners.1,
                ids.len()
            );
            return None;
        }

        // The two one-to-one matchings, as (A1, B1) and (A1, B2).
        let trades = [
            Trade {
                given_a: a1,
                given_b: b1,
                retained_a: a2,
                retained_b: b2,
            },
            Trade {
                given_a: a1,
                given_b: b2,
                retained_a: a2,
                retained_b: b1,
            },
        ];

        let mut best: Option<ExchangeSuggestion> = None;
        for trade in &trades {
            let Some(candidate) = self.score(trade, group.owners) else {
                continue;
            };
            if best.as_ref().is_none_or(|b| candidate.score > b.score) {
                best = Some(candidate);
            }
        }

        best
    }

    fn score(&self, trade: &Trade<'_>, owners: (&str, &str)) -> Option<ExchangeSuggestion> {
        let (a, b) = (trade.given_a, trade.given_b);

        let area_feasibility = area_feasibility(a.area, b.area);
        if area_feasibility < self.params.feasibility_floor {
            return None;
        }

        let kept_a = trade.retained_a.area;
        let kept_b = trade.retained_b.area;
        let percent_change_a = percent_change(kept_a + a.area, kept_a + b.area);
        let percent_change_b = percent_change(kept_b + b.area, kept_b + a.area);

        let equity = 100.0 - (percent_change_a * 100.0 - percent_change_b * 100.0).abs();
        let mean_area = (a.area + b.area) / 2.0;
        let area_factor = if self.params.area_normalizer > 0.0 {
            (mean_area / self.params.area_normalizer).min(1.0)
        } else {
            1.0
        };

        Some(ExchangeSuggestion {
            parcel_a: a.id,
            parcel_b: b.id,
            owner_a: owners.0.to_string(),
            owner_b: owners.1.to_string(),
            area_feasibility,
            percent_change_a,
            percent_change_b,
            value_similarity: value_similarity(a, b),
            score: equity * area_factor * area_feasibility,
        })
    }
}

fn parcel_lookup(parcels: &[Parcel]) -> BTreeMap<i64, &Parcel> {
    let mut lookup = BTreeMap::new();
    for parcel in parcels {
        lookup.entry(parcel.id).or_insert(parcel);
    }
    lookup
}

fn group_by_owners<'a, 'p>(
    pairs: impl IntoIterator<Item = &'a AdjacencyPair>,
    lookup: &BTreeMap<i64, &'p Parcel>,
) -> Vec<OwnerGroup<'p>> {
    let mut groups: Vec<OwnerGroup<'p>> = Vec::new();
    let mut index: BTreeMap<(&'p str, &'p str), usize> = BTreeMap::new();
    let mut dangling = 0_usize;

    for pair in pairs {
        let (Some(&p), Some(&q)) = (lookup.get(&pair.low()), lookup.get(&pair.high())) else {
            dangling += 1;
            continue;
        };
        if p.owner == q.owner {
            continue;
        }

        let link = if p.owner < q.owner { (p, q) } else { (q, p) };
        let owners = (link.0.owner.as_str(), link.1.owner.as_str());

        let slot = *index.entry(owners).or_insert_with(|| {
            groups.push(OwnerGroup {
                owners,
                links: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].links.push(link);
    }

    if dangling > 0 {
        log::warn!("Skipped {dangling} adjacency pairs referencing unknown parcels");
    }

    groups
}
