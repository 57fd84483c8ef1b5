#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV ingestion of cadastral parcel records.
//!
//! Reads parcel rows, parses their `GeoJSON` geometry into boundary
//! vertices, validates the schema and splits points of interest (negative
//! ids) from real land units. The analysis crates assume everything they
//! receive has already passed through here.

pub mod geometry;
pub mod records;

use std::path::Path;

use landswap_parcel_models::Parcel;
use landswap_parcel_models::region::RegionTree;

pub use records::{ParcelRecord, read_parcels};

/// Errors that can occur while ingesting parcel records.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// I/O error opening the input.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Malformed CSV or a field that failed to parse.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A row parsed but violates the parcel schema.
    #[error("Invalid parcel on line {line}: {message}")]
    Validation {
        /// 1-based CSV line number.
        line: u64,
        /// Description of what went wrong.
        message: String,
    },

    /// The geometry column could not be turned into boundary vertices.
    #[error("Invalid geometry for parcel {parcel_ref}: {message}")]
    Geometry {
        /// External reference of the offending parcel.
        parcel_ref: String,
        /// Description of what went wrong.
        message: String,
    },
}

/// Validated parcels ready for analysis.
#[derive(Debug, Clone, Default)]
pub struct ParcelSet {
    /// Land parcels (non-negative ids), in file order.
    pub parcels: Vec<Parcel>,
    /// Points of interest (negative ids), in file order.
    pub points_of_interest: Vec<Parcel>,
    /// District -> municipality -> parish hierarchy of `parcels`.
    pub regions: RegionTree,
}

impl ParcelSet {
    /// Splits validated records into parcels and points of interest and
    /// builds the region hierarchy.
    #[must_use]
    pub fn from_records(records: Vec<Parcel>) -> Self {
        let (points_of_interest, parcels): (Vec<Parcel>, Vec<Parcel>) =
            records.into_iter().partition(Parcel::is_point_of_interest);
        let regions = RegionTree::from_parcels(&parcels);

        Self {
            parcels,
            points_of_interest,
            regions,
        }
    }

    /// Total area of the land parcels.
    #[must_use]
    pub fn total_area(&self) -> f64 {
        self.parcels.iter().map(|p| p.area).sum()
    }
}

/// Loads and validates a parcel CSV file.
///
/// # Errors
///
/// * [`IngestError::Io`] if the file cannot be opened.
/// * [`IngestError::Csv`] if a row is malformed.
/// * [`IngestError::Validation`] or [`IngestError::Geometry`] for the first
///   row that violates the schema.
pub fn load_parcels(path: &Path) -> Result<ParcelSet, IngestError> {
    let file = std::fs::File::open(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let set = read_parcels(file)?;

    log::info!(
        "Loaded {} parcels and {} points of interest from {} ({} parishes)",
        set.parcels.len(),
        set.points_of_interest.len(),
        path.display(),
        set.regions.parishes().count()
    );

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_io_error() {
        let err = load_parcels(Path::new("/nonexistent/parcels.csv")).unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }), "{err}");
    }
}
