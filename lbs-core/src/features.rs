//! GeoJSON serialization boundary.
//!
//! Entities become `geojson::Feature`s whose `properties` carry the
//! non-geometry fields and whose geometry uses `[lon, lat]` positions.

use geo::Coord;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value, feature::Id};
use serde_json::json;
use thiserror::Error;

use crate::geometry::{Boundary, GeometryError, Location};
use crate::query::NearbyAmenity;
use crate::{Amenity, Area, Route};

/// Errors raised when reading geometries from GeoJSON text.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// The text was not GeoJSON.
    #[error("failed to parse GeoJSON: {0}")]
    Parse(#[from] geojson::Error),
    /// The document held no geometry.
    #[error("GeoJSON document contains no geometry")]
    MissingGeometry,
    /// The geometry was not the expected type.
    #[error("expected a {expected} geometry, found {found}")]
    UnexpectedGeometry {
        /// Required geometry type.
        expected: &'static str,
        /// Type present in the document.
        found: &'static str,
    },
    /// A position had fewer than two members.
    #[error("position {index} has {found} members; expected [longitude, latitude]")]
    ShortPosition {
        /// Zero-based position index.
        index: usize,
        /// Members supplied.
        found: usize,
    },
    /// The polygon had no outer ring.
    #[error("polygon has no outer ring")]
    MissingRing,
    /// The positions did not form a valid geometry.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Conversion into a GeoJSON feature.
pub trait ToFeature {
    /// Build the feature for this value.
    fn to_feature(&self) -> Feature;
}

fn position(location: Location) -> Vec<f64> {
    vec![location.x, location.y]
}

fn feature(id: u64, geometry: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geometry)),
        id: Some(Id::Number(id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

fn properties(value: serde_json::Value) -> JsonObject {
    match value {
        serde_json::Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

impl ToFeature for Amenity {
    fn to_feature(&self) -> Feature {
        feature(
            self.id.get(),
            Value::Point(position(self.location)),
            properties(json!({
                "name": self.name,
                "category": self.category.as_str(),
                "category_label": self.category.label(),
                "description": self.description,
            })),
        )
    }
}

impl ToFeature for NearbyAmenity {
    fn to_feature(&self) -> Feature {
        let mut feature = self.amenity.to_feature();
        if let Some(props) = feature.properties.as_mut() {
            props.insert("distance_m".to_owned(), json!(self.distance_m));
        }
        feature
    }
}

impl ToFeature for Area {
    fn to_feature(&self) -> Feature {
        let ring = self.boundary.positions().iter().copied().map(position).collect();
        feature(
            self.id.get(),
            Value::Polygon(vec![ring]),
            properties(json!({ "name": self.name })),
        )
    }
}

impl ToFeature for Route {
    fn to_feature(&self) -> Feature {
        let line = self.path.positions().iter().copied().map(position).collect();
        feature(
            self.id.get(),
            Value::LineString(line),
            properties(json!({ "name": self.name })),
        )
    }
}

/// Wrap query results as a feature collection.
///
/// # Examples
/// ```
/// use lbs_core::{AmenityDraft, AmenityId, Category, features::feature_collection};
///
/// let amenity = AmenityDraft::new("Brew Lab", Category::Cafe, -6.26, 53.35)
///     .expect("valid")
///     .into_amenity(AmenityId::new(1));
/// let collection = feature_collection(&[amenity]);
/// assert_eq!(collection.features.len(), 1);
/// ```
pub fn feature_collection<T: ToFeature>(items: &[T]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: items.iter().map(ToFeature::to_feature).collect(),
        foreign_members: None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Read an area boundary from a GeoJSON geometry, feature or collection.
///
/// Only the outer ring of the first polygon is used. An open ring is closed.
pub fn boundary_from_geojson(text: &str) -> Result<Boundary, FeatureError> {
    let geometry = match text.parse::<GeoJson>()? {
        GeoJson::Geometry(geometry) => Some(geometry),
        GeoJson::Feature(feature) => feature.geometry,
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .find_map(|feature| feature.geometry),
    }
    .ok_or(FeatureError::MissingGeometry)?;

    let Value::Polygon(rings) = geometry.value else {
        return Err(FeatureError::UnexpectedGeometry {
            expected: "Polygon",
            found: type_name(&geometry.value),
        });
    };
    let outer = rings.into_iter().next().ok_or(FeatureError::MissingRing)?;
    let vertices = outer
        .iter()
        .enumerate()
        .map(|(index, pos)| match pos.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(FeatureError::ShortPosition {
                index,
                found: pos.len(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Boundary::closing(vertices)?)
}
