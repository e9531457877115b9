//! Lenient GeoJSON shapes for route files.
//!
//! Route files come from hand-exported datasets, so features are decoded
//! loosely: missing geometry, unknown types and short lines are skipped by
//! the importer rather than rejected at parse time.

use lbs_core::{Location, Polyline, geometry::validated_location};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Top-level feature collection.
#[derive(Debug, Deserialize)]
pub(crate) struct RawCollection {
    #[serde(default)]
    pub(crate) features: Option<Vec<RawFeature>>,
}

/// One feature; every member is optional.
#[derive(Debug, Deserialize)]
pub(crate) struct RawFeature {
    #[serde(default)]
    pub(crate) geometry: Option<RawGeometry>,
    #[serde(default)]
    pub(crate) properties: Option<Map<String, Value>>,
}

/// Geometry with its coordinates left undecoded.
#[derive(Debug, Deserialize)]
pub(crate) struct RawGeometry {
    #[serde(rename = "type", default)]
    pub(crate) kind: Option<String>,
    #[serde(default)]
    pub(crate) coordinates: Option<Value>,
}

/// A feature's geometry split into candidate route segments.
#[derive(Debug, PartialEq)]
pub(crate) enum Segments<'a> {
    /// Coordinates absent or empty.
    Empty,
    /// Not a line geometry.
    Unsupported(&'a str),
    /// Line parts in file order; `dropped` counts multi-line members with
    /// fewer than two positions.
    Lines {
        parts: Vec<&'a [Value]>,
        dropped: usize,
    },
}

/// Structural coordinate fault: 1-based segment and a description.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ShapeFault {
    pub(crate) segment: usize,
    pub(crate) reason: String,
}

impl ShapeFault {
    fn new(segment: usize, reason: impl Into<String>) -> Self {
        Self {
            segment,
            reason: reason.into(),
        }
    }
}

impl RawGeometry {
    /// Normalise the geometry into line segments.
    pub(crate) fn segments(&self) -> Result<Segments<'_>, ShapeFault> {
        let Some(members) = non_empty_array(self.coordinates.as_ref()).map_err(|found| {
            ShapeFault::new(1, format!("coordinates must be an array, found {found}"))
        })?
        else {
            return Ok(Segments::Empty);
        };
        match self.kind.as_deref() {
            Some("LineString") => Ok(Segments::Lines {
                parts: vec![members],
                dropped: 0,
            }),
            Some("MultiLineString") => multi_line_parts(members),
            other => Ok(Segments::Unsupported(other.unwrap_or("<missing>"))),
        }
    }
}

fn non_empty_array(value: Option<&Value>) -> Result<Option<&[Value]>, &'static str> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) if items.is_empty() => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items.as_slice())),
        Some(other) => Err(json_kind(other)),
    }
}

fn multi_line_parts(members: &[Value]) -> Result<Segments<'_>, ShapeFault> {
    let mut parts = Vec::with_capacity(members.len());
    let mut dropped = 0;
    for (position, member) in members.iter().enumerate() {
        let Value::Array(line) = member else {
            return Err(ShapeFault::new(
                position + 1,
                format!("line must be an array, found {}", json_kind(member)),
            ));
        };
        if line.len() < 2 {
            dropped += 1;
        } else {
            parts.push(line.as_slice());
        }
    }
    Ok(Segments::Lines { parts, dropped })
}

/// Decode `[lon, lat]` or `[lon, lat, altitude]` positions into a polyline.
///
/// Altitude is discarded. Any other arity, non-numeric members or
/// out-of-range coordinates are reported as the position's fault.
pub(crate) fn polyline(positions: &[Value]) -> Result<Polyline, String> {
    let locations = positions
        .iter()
        .enumerate()
        .map(|(index, value)| {
            location(value).map_err(|reason| format!("position {index}: {reason}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Polyline::new(locations).map_err(|err| err.to_string())
}

fn location(value: &Value) -> Result<Location, String> {
    let Value::Array(members) = value else {
        return Err(format!("expected an array, found {}", json_kind(value)));
    };
    let (lon, lat) = match members.as_slice() {
        [lon, lat] | [lon, lat, _] => (number(lon)?, number(lat)?),
        other => return Err(format!("expected 2 or 3 members, found {}", other.len())),
    };
    validated_location(lon, lat).map_err(|err| err.to_string())
}

fn number(value: &Value) -> Result<f64, String> {
    value
        .as_f64()
        .ok_or_else(|| format!("expected a number, found {}", json_kind(value)))
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
