//! Analysis pipeline: detect -> graph -> merge -> suggest.
//!
//! Each step recomputes from the validated parcel list; nothing is cached
//! between runs.

use std::collections::BTreeSet;
use std::time::Instant;

use landswap_adjacency::{AdjacencyDetector, AdjacencyGraph, DetectionStrategy};
use landswap_exchange::{SuggestionEngine, cross_owner_pairs};
use landswap_merge::merge_same_owner_adjacent;
use landswap_parcel_models::region::RegionTree;
use landswap_parcel_models::{AdjacencyPair, ExchangeSuggestion, Parcel};
use serde::Serialize;

use crate::config::AnalysisConfig;

/// Relative tolerance for the area conservation check after merging.
const AREA_CONSERVATION_TOLERANCE: f64 = 1e-9;

/// Shape of the adjacency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    pub components: usize,
    pub largest_component: usize,
    pub isolated: usize,
}

impl GraphSummary {
    #[must_use]
    pub fn of(graph: &AdjacencyGraph) -> Self {
        let components = graph.connected_components();

        Self {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            components: components.len(),
            largest_component: components.iter().map(Vec::len).max().unwrap_or(0),
            isolated: components.iter().filter(|c| c.len() == 1).count(),
        }
    }
}

/// Everything one `analyze` run produces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub parcel_count: usize,
    pub strategy: DetectionStrategy,
    pub adjacency_pairs: Vec<AdjacencyPair>,
    pub graph: GraphSummary,
    pub merged: Vec<Parcel>,
    pub suggestions: Vec<ExchangeSuggestion>,
}

/// Parcel count of one parish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParishSummary {
    pub district: String,
    pub municipality: String,
    pub parish: String,
    pub parcel_count: usize,
}

/// Flattens the region tree into one row per parish, in name order.
#[must_use]
pub fn region_summary(regions: &RegionTree) -> Vec<ParishSummary> {
    regions
        .parishes()
        .map(|(district, municipality, parish, data)| ParishSummary {
            district: district.to_string(),
            municipality: municipality.to_string(),
            parish: parish.to_string(),
            parcel_count: data.parcel_ids.len(),
        })
        .collect()
}

/// Finds adjacent pairs with the configured strategy.
#[must_use]
pub fn detect(parcels: &[Parcel], config: &AnalysisConfig) -> BTreeSet<AdjacencyPair> {
    if config.strategy.is_approximate() {
        log::warn!(
            "Strategy '{}' may miss adjacencies between large parcels",
            config.strategy
        );
    }

    AdjacencyDetector::new(config.strategy)
        .with_cell_size(config.cell_size)
        .find_adjacent_pairs(parcels)
}

/// Scores exchanges over the cross-owner subset of `pairs`.
#[must_use]
pub fn suggest(
    parcels: &[Parcel],
    pairs: &BTreeSet<AdjacencyPair>,
    config: &AnalysisConfig,
) -> Vec<ExchangeSuggestion> {
    let cross = cross_owner_pairs(pairs, parcels);
    log::debug!("{} of {} adjacent pairs cross owners", cross.len(), pairs.len());

    SuggestionEngine::new(config.suggestions).generate(&cross, parcels)
}

/// Merges same-owner holdings and checks that no area was lost.
#[must_use]
pub fn merge(parcels: &[Parcel]) -> Vec<Parcel> {
    let merged = merge_same_owner_adjacent(parcels);

    let before: f64 = parcels.iter().map(|p| p.area).sum();
    let after: f64 = merged.iter().map(|p| p.area).sum();
    if (before - after).abs() > AREA_CONSERVATION_TOLERANCE * before.abs().max(1.0) {
        log::warn!("Merged area {after} differs from input area {before}");
    }

    merged
}

/// Runs the full analysis.
#[must_use]
pub fn run(parcels: &[Parcel], config: &AnalysisConfig) -> AnalysisReport {
    let start = Instant::now();

    let pairs = detect(parcels, config);
    let graph = GraphSummary::of(&AdjacencyGraph::build(parcels));
    let merged = merge(parcels);
    let suggestions = suggest(parcels, &pairs, config);

    log::info!(
        "Analysis finished in {:.2}s: {} holdings, {} suggestions",
        start.elapsed().as_secs_f64(),
        merged.len(),
        suggestions.len()
    );

    AnalysisReport {
        parcel_count: parcels.len(),
        strategy: config.strategy,
        adjacency_pairs: pairs.into_iter().collect(),
        graph,
        merged,
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use landswap_parcel_models::Vertex;

    use super::*;

    fn square(id: i64, owner: &str, x: f64, y: f64, side: f64) -> Parcel {
        Parcel {
            id,
            parcel_ref: format!("P{id}"),
            perimeter: side * 4.0,
            area: side * side,
            boundary: vec![
                Vertex::new(x, y),
                Vertex::new(x + side, y),
                Vertex::new(x + side, y + side),
                Vertex::new(x, y + side),
            ],
            owner: owner.to_string(),
            parish: String::new(),
            municipality: String::new(),
            district: String::new(),
            urbanization_score: 0.5,
            tourism_score: 0.5,
        }
    }

    /// Two rows of two squares; X owns the left column, Y the right.
    fn checkerboard() -> Vec<Parcel> {
        vec![
            square(1, "X", 0.0, 0.0, 10.0),
            square(2, "X", 0.0, 10.0, 10.0),
            square(3, "Y", 10.0, 0.0, 10.0),
            square(4, "Y", 10.0, 10.0, 10.0),
        ]
    }

    #[test]
    fn graph_summary_counts_components() {
        let mut parcels = checkerboard();
        parcels.push(square(9, "Z", 500.0, 500.0, 10.0));
        let summary = GraphSummary::of(&AdjacencyGraph::build(&parcels));

        assert_eq!(summary.node_count, 5);
        assert_eq!(summary.components, 2);
        assert_eq!(summary.largest_component, 4);
        assert_eq!(summary.isolated, 1);
    }

    #[test]
    fn run_on_checkerboard() {
        let parcels = checkerboard();
        let report = run(&parcels, &AnalysisConfig::default());

        assert_eq!(report.parcel_count, 4);
        // Squares sharing only a corner are adjacent too.
        assert_eq!(report.adjacency_pairs.len(), 6);
        assert_eq!(report.graph.edge_count, 6);
        assert_eq!(report.merged.len(), 2, "{:?}", report.merged);
        // The first two X/Y links, (1,3) and (1,4), share parcel 1.
        assert!(report.suggestions.is_empty(), "{:?}", report.suggestions);
    }

    #[test]
    fn run_suggests_exchange_between_separate_borders() {
        let parcels = vec![
            square(1, "X", 0.0, 0.0, 10.0),
            square(3, "Y", 10.0, 0.0, 10.0),
            square(2, "X", 0.0, 100.0, 10.0),
            square(4, "Y", 10.0, 100.0, 10.0),
        ];
        let report = run(&parcels, &AnalysisConfig::default());

        assert_eq!(report.adjacency_pairs.len(), 2);
        assert_eq!(report.graph.components, 2);
        assert_eq!(report.merged.len(), 4);
        assert_eq!(report.suggestions.len(), 1);

        let suggestion = &report.suggestions[0];
        assert_eq!((suggestion.owner_a.as_str(), suggestion.owner_b.as_str()), ("X", "Y"));
        assert!((suggestion.area_feasibility - 1.0).abs() < 1e-9);
        // equity 100, mean area 100 / 1000, feasibility 1
        assert!((suggestion.score - 10.0).abs() < 1e-9, "{}", suggestion.score);
    }

    #[test]
    fn merge_conserves_area() {
        let parcels = checkerboard();
        let merged = merge(&parcels);
        let total: f64 = merged.iter().map(|p| p.area).sum();
        assert!((total - 400.0).abs() < 1e-9);
    }

    #[test]
    fn suggest_ignores_same_owner_pairs() {
        let parcels = vec![
            square(1, "X", 0.0, 0.0, 10.0),
            square(2, "X", 10.0, 0.0, 10.0),
        ];
        let pairs = detect(&parcels, &AnalysisConfig::default());
        assert_eq!(pairs.len(), 1);
        assert!(suggest(&parcels, &pairs, &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn every_strategy_finds_the_checkerboard_pairs() {
        let parcels = checkerboard();
        for &strategy in DetectionStrategy::ALL {
            let config = AnalysisConfig {
                strategy,
                ..AnalysisConfig::default()
            };
            assert_eq!(detect(&parcels, &config).len(), 6, "{strategy}");
        }
    }

    #[test]
    fn region_summary_lists_parishes_in_name_order() {
        let mut parcels = checkerboard();
        let parishes = ["Quarteira", "Almancil", "Almancil", "Boliqueime"];
        for (parcel, parish) in parcels.iter_mut().zip(parishes) {
            parcel.district = "Faro".to_string();
            parcel.municipality = "Loulé".to_string();
            parcel.parish = parish.to_string();
        }
        let rows = region_summary(&RegionTree::from_parcels(&parcels));

        let names: Vec<&str> = rows.iter().map(|r| r.parish.as_str()).collect();
        assert_eq!(names, ["Almancil", "Boliqueime", "Quarteira"]);
        assert_eq!(rows[0].parcel_count, 2);
        assert_eq!(rows[0].district, "Faro");
    }
}
