//! Parcel CSV schema and row validation.

use std::collections::BTreeSet;
use std::io::Read;

use landswap_parcel_models::Parcel;
use serde::Deserialize;

use crate::geometry::parse_boundary;
use crate::{IngestError, ParcelSet};

/// A raw row from a parcel CSV file.
///
/// `geometry` holds a `GeoJSON` geometry string. Location and score
/// columns are optional.
#[derive(Debug, Deserialize)]
pub struct ParcelRecord {
    /// Parcel id. Negative ids are points of interest.
    pub id: i64,
    /// External cadastral reference.
    pub parcel_ref: String,
    /// Perimeter in map units.
    pub perimeter: f64,
    /// Area in square map units.
    pub area: f64,
    /// `GeoJSON` geometry.
    pub geometry: String,
    /// Registered owner.
    pub owner: String,
    /// Parish name.
    #[serde(default)]
    pub parish: String,
    /// Municipality name.
    #[serde(default)]
    pub municipality: String,
    /// District name.
    #[serde(default)]
    pub district: String,
    /// Urbanization score, clamped into `[0, 1]`.
    #[serde(default)]
    pub urbanization_score: Option<f64>,
    /// Tourism score, clamped into `[0, 1]`.
    #[serde(default)]
    pub tourism_score: Option<f64>,
}

impl ParcelRecord {
    /// Validates the row and converts it into a [`Parcel`].
    ///
    /// Land parcels need a positive area; points of interest may have zero
    /// area. Every record needs a non-empty owner, a finite non-negative
    /// perimeter and at least one geometry vertex.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Validation`] or [`IngestError::Geometry`].
    pub fn into_parcel(self, line: u64) -> Result<Parcel, IngestError> {
        let invalid = |message: String| IngestError::Validation { line, message };

        let owner = self.owner.trim();
        if owner.is_empty() {
            return Err(invalid(format!("parcel {} has no owner", self.id)));
        }

        let min_area_ok = if self.id < 0 {
            self.area >= 0.0
        } else {
            self.area > 0.0
        };
        if !(self.area.is_finite() && min_area_ok) {
            return Err(invalid(format!(
                "parcel {} has invalid area {}",
                self.id, self.area
            )));
        }

        if !(self.perimeter.is_finite() && self.perimeter >= 0.0) {
            return Err(invalid(format!(
                "parcel {} has invalid perimeter {}",
                self.id, self.perimeter
            )));
        }

        let boundary = parse_boundary(&self.parcel_ref, &self.geometry)?;

        let mut parcel = Parcel {
            id: self.id,
            parcel_ref: self.parcel_ref.trim().to_string(),
            perimeter: self.perimeter,
            area: self.area,
            boundary,
            owner: owner.to_string(),
            parish: self.parish.trim().to_string(),
            municipality: self.municipality.trim().to_string(),
            district: self.district.trim().to_string(),
            urbanization_score: 0.0,
            tourism_score: 0.0,
        };
        parcel.set_scores(
            self.urbanization_score.unwrap_or(0.0),
            self.tourism_score.unwrap_or(0.0),
        );

        Ok(parcel)
    }
}

/// Reads, validates and splits parcel records from any CSV source.
///
/// Stops at the first invalid row.
///
/// # Errors
///
/// Returns [`IngestError::Csv`] for malformed rows and
/// [`IngestError::Validation`]/[`IngestError::Geometry`] for rows that
/// violate the schema, including duplicate ids.
pub fn read_parcels(reader: impl Read) -> Result<ParcelSet, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut seen = BTreeSet::new();
    let mut parcels = Vec::new();

    for result in csv_reader.records() {
        let row = result?;
        let line = row.position().map_or(0, csv::Position::line);
        let record: ParcelRecord = row.deserialize(Some(&headers))?;

        if !seen.insert(record.id) {
            return Err(IngestError::Validation {
                line,
                message: format!("duplicate parcel id {}", record.id),
            });
        }

        parcels.push(record.into_parcel(line)?);
    }

    log::debug!("Read {} valid parcel records", parcels.len());

    Ok(ParcelSet::from_records(parcels))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "id,parcel_ref,perimeter,area,geometry,owner,parish,municipality,district";

    fn square(x: f64) -> String {
        format!(
            r#""{{""type"":""Polygon"",""coordinates"":[[[{x},0],[{x1},0],[{x1},1],[{x},1],[{x},0]]]}}""#,
            x1 = x + 1.0
        )
    }

    fn csv(rows: &[String]) -> String {
        let mut text = HEADER.to_string();
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    #[test]
    fn reads_valid_rows() {
        let text = csv(&[
            format!("1,A-1,4,100,{},Ana,Almancil,Loulé,Faro", square(0.0)),
            format!("2,A-2,4,150,{},Rui,Almancil,Loulé,Faro", square(1.0)),
        ]);
        let set = read_parcels(text.as_bytes()).unwrap();
        assert_eq!(set.parcels.len(), 2);
        assert_eq!(set.parcels[0].boundary.len(), 5);
        assert_eq!(set.parcels[1].owner, "Rui");
        assert!((set.total_area() - 250.0).abs() < 1e-9);
        assert_eq!(set.regions.parcel_count(), 2);
    }

    #[test]
    fn points_of_interest_are_split_off() {
        let text = csv(&[
            format!("1,A-1,4,100,{},Ana,Almancil,Loulé,Faro", square(0.0)),
            r#"-1,POI-1,0,0,"{""type"":""Point"",""coordinates"":[0.5,0.5]}",Municipality,Almancil,Loulé,Faro"#
                .to_string(),
        ]);
        let set = read_parcels(text.as_bytes()).unwrap();
        assert_eq!(set.parcels.len(), 1);
        assert_eq!(set.points_of_interest.len(), 1);
        assert_eq!(set.regions.parcel_count(), 1);
    }

    #[test]
    fn optional_scores_are_clamped() {
        let text = format!(
            "{HEADER},urbanization_score,tourism_score\n1,A-1,4,100,{},Ana,Almancil,Loulé,Faro,1.4,",
            square(0.0)
        );
        let set = read_parcels(text.as_bytes()).unwrap();
        let parcel = &set.parcels[0];
        assert!((parcel.urbanization_score - 1.0).abs() < f64::EPSILON);
        assert!(parcel.tourism_score.abs() < f64::EPSILON);
    }

    #[test]
    fn empty_owner_is_rejected() {
        let text = csv(&[format!("1,A-1,4,100,{},  ,Almancil,Loulé,Faro", square(0.0))]);
        let err = read_parcels(text.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::Validation { line: 2, .. }), "{err}");
    }

    #[test]
    fn non_positive_area_is_rejected() {
        let text = csv(&[format!("1,A-1,4,0,{},Ana,Almancil,Loulé,Faro", square(0.0))]);
        let err = read_parcels(text.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::Validation { .. }), "{err}");
    }

    #[test]
    fn unparsable_number_is_csv_error() {
        let text = csv(&[format!("1,A-1,4,lots,{},Ana,Almancil,Loulé,Faro", square(0.0))]);
        let err = read_parcels(text.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::Csv(_)), "{err}");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let text = csv(&[
            format!("1,A-1,4,100,{},Ana,Almancil,Loulé,Faro", square(0.0)),
            format!("1,A-2,4,100,{},Ana,Almancil,Loulé,Faro", square(1.0)),
        ]);
        let err = read_parcels(text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("duplicate"), "{err}");
    }

    #[test]
    fn bad_geometry_is_rejected() {
        let text = csv(&["1,A-1,4,100,not-json,Ana,Almancil,Loulé,Faro".to_string()]);
        let err = read_parcels(text.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::Geometry { .. }), "{err}");
    }
}
