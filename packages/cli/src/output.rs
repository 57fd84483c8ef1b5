//! JSON and `GeoJSON` writers.

use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value, feature::Id};
use landswap_parcel_models::Parcel;
use serde::Serialize;

/// Pretty-prints `value` as JSON to `path`, or to stdout when `path` is
/// `None`.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written.
pub fn write_json<T: Serialize + ?Sized>(
    value: &T,
    path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let contents = serde_json::to_string_pretty(value)?;

    match path {
        Some(path) => {
            std::fs::write(path, contents)?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{contents}"),
    }

    Ok(())
}

/// Converts parcels into a feature collection.
///
/// Boundaries are emitted as `MultiPoint` geometries since merged parcels
/// carry the concatenated vertices of their members rather than a polygon.
#[must_use]
pub fn parcels_to_geojson(parcels: &[Parcel]) -> FeatureCollection {
    let features = parcels.iter().map(parcel_feature).collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn parcel_feature(parcel: &Parcel) -> Feature {
    let points = parcel.boundary.iter().map(|v| vec![v.x, v.y]).collect();

    let mut properties = JsonObject::new();
    properties.insert("parcelRef".to_string(), parcel.parcel_ref.clone().into());
    properties.insert("owner".to_string(), parcel.owner.clone().into());
    properties.insert("area".to_string(), parcel.area.into());
    properties.insert("perimeter".to_string(), parcel.perimeter.into());
    properties.insert("parish".to_string(), parcel.parish.clone().into());
    properties.insert("municipality".to_string(), parcel.municipality.clone().into());
    properties.insert("district".to_string(), parcel.district.clone().into());

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::MultiPoint(points))),
        id: Some(Id::Number(parcel.id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}
