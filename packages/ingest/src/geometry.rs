//! `GeoJSON` geometry column parsing.

use geo::CoordsIter;
use geojson::GeoJson;
use landswap_parcel_models::Vertex;

use crate::IngestError;

/// Parses a `GeoJSON` geometry (or a single feature wrapping one) into the
/// ordered list of its vertices.
///
/// Polygons contribute their exterior ring followed by any interior rings;
/// multi-polygons contribute each polygon in turn. Ring closing vertices
/// are kept.
///
/// # Errors
///
/// Returns [`IngestError::Geometry`] if the text is not valid `GeoJSON`,
/// is a feature collection, or has no vertices.
pub fn parse_boundary(parcel_ref: &str, geojson_str: &str) -> Result<Vec<Vertex>, IngestError> {
    let invalid = |message: String| IngestError::Geometry {
        parcel_ref: parcel_ref.to_string(),
        message,
    };

    let geojson: GeoJson = geojson_str
        .parse()
        .map_err(|e: geojson::Error| invalid(e.to_string()))?;

    let geometry = match geojson {
        GeoJson::Geometry(geometry) => geometry,
        GeoJson::Feature(feature) => feature
            .geometry
            .ok_or_else(|| invalid("feature has no geometry".to_string()))?,
        GeoJson::FeatureCollection(_) => {
            return Err(invalid(
                "expected a single geometry, found a feature collection".to_string(),
            ));
        }
    };

    let geometry: geo::Geometry<f64> = geometry
        .try_into()
        .map_err(|e: geojson::Error| invalid(e.to_string()))?;

    let vertices: Vec<Vertex> = geometry
        .coords_iter()
        .map(|c| Vertex::new(c.x, c.y))
        .collect();

    if vertices.is_empty() {
        return Err(invalid("geometry has no vertices".to_string()));
    }

    Ok(vertices)
}
