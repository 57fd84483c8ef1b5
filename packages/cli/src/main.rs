#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `landswap`: parcel adjacency, same-owner consolidation and 2-for-2
//! exchange suggestions over a cadastral CSV file.
//!
//! Results are printed to stdout as JSON unless `--output` is given. Set
//! `RUST_LOG=info` (or `debug`) for progress logging on stderr.

mod config;
mod output;
mod pipeline;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use landswap_adjacency::{AdjacencyGraph, DetectionStrategy};
use landswap_exchange::cross_owner_pairs;
use landswap_ingest::{ParcelSet, load_parcels};

use crate::config::{AnalysisConfig, Overrides};
use crate::pipeline::GraphSummary;

#[derive(Parser)]
#[command(
    name = "landswap",
    about = "Cadastral parcel adjacency, consolidation and exchange analysis"
)]
struct Cli {
    /// TOML analysis config. Flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Adjacency detection strategy (`naive`, `grid`, `vertex-index`)
    #[arg(long, global = true)]
    strategy: Option<DetectionStrategy>,
    /// Grid cell size for the `grid` strategy
    #[arg(long, global = true)]
    cell_size: Option<f64>,
    /// Write the result to this file instead of stdout
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List adjacent parcel pairs
    Adjacency {
        /// Parcel CSV file
        input: PathBuf,
        /// Only list pairs whose parcels have different owners
        #[arg(long)]
        cross_owner: bool,
    },
    /// Summarize the adjacency graph and list its connected components
    Graph {
        /// Parcel CSV file
        input: PathBuf,
    },
    /// Merge contiguous parcels held by the same owner
    Merge {
        /// Parcel CSV file
        input: PathBuf,
        /// Emit a `GeoJSON` feature collection instead of plain JSON
        #[arg(long)]
        geojson: bool,
    },
    /// Propose 2-for-2 exchanges between owners of adjacent parcels
    Suggest {
        /// Parcel CSV file
        input: PathBuf,
        /// Minimum area feasibility in [0, 1]
        #[arg(long)]
        min_feasibility: Option<f64>,
        /// Keep only the best N suggestions
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Run detection, graph, merge and suggestion in one pass
    Analyze {
        /// Parcel CSV file
        input: PathBuf,
    },
    /// Parcel counts per district, municipality and parish
    Regions {
        /// Parcel CSV file
        input: PathBuf,
    },
}

impl Commands {
    fn input(&self) -> &Path {
        match self {
            Self::Adjacency { input, .. }
            | Self::Graph { input }
            | Self::Merge { input, .. }
            | Self::Suggest { input, .. }
            | Self::Analyze { input }
            | Self::Regions { input } => input.as_path(),
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    let feasibility_floor = match cli.command {
        Commands::Suggest { min_feasibility, .. } => min_feasibility,
        _ => None,
    };

    Ok(config.with_overrides(Overrides {
        strategy: cli.strategy,
        cell_size: cli.cell_size,
        feasibility_floor,
    })?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = resolve_config(&cli)?;
    log::debug!("Using {config:?}");

    let start = Instant::now();
    let ParcelSet {
        parcels,
        points_of_interest,
        regions,
    } = load_parcels(cli.command.input())?;
    if !points_of_interest.is_empty() {
        log::info!(
            "Ignoring {} points of interest for adjacency analysis",
            points_of_interest.len()
        );
    }

    let destination = cli.output.as_deref();

    match &cli.command {
        Commands::Adjacency { cross_owner, .. } => {
            let pairs = pipeline::detect(&parcels, &config);
            if *cross_owner {
                output::write_json(&cross_owner_pairs(&pairs, &parcels), destination)?;
            } else {
                output::write_json(&pairs, destination)?;
            }
        }
        Commands::Graph { .. } => {
            let graph = AdjacencyGraph::build(&parcels);
            let report = serde_json::json!({
                "summary": GraphSummary::of(&graph),
                "components": graph.connected_components(),
            });
            output::write_json(&report, destination)?;
        }
        Commands::Merge { geojson, .. } => {
            let merged = pipeline::merge(&parcels);
            if *geojson {
                output::write_json(&output::parcels_to_geojson(&merged), destination)?;
            } else {
                output::write_json(&merged, destination)?;
            }
        }
        Commands::Suggest { limit, .. } => {
            let pairs = pipeline::detect(&parcels, &config);
            let mut suggestions = pipeline::suggest(&parcels, &pairs, &config);
            if let Some(limit) = limit {
                suggestions.truncate(*limit);
            }
            output::write_json(&suggestions, destination)?;
        }
        Commands::Analyze { .. } => {
            let report = pipeline::run(&parcels, &config);
            output::write_json(&report, destination)?;
        }
        Commands::Regions { .. } => {
            output::write_json(&pipeline::region_summary(&regions), destination)?;
        }
    }

    log::info!("Done in {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}
