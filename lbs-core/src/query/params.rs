//! Loosely-typed query parameters and the typed requests built from them.

use std::collections::HashMap;

use thiserror::Error;

use crate::AreaId;
use crate::geometry::Location;
use geo::Coord;

/// Results returned when `limit` is omitted.
pub const DEFAULT_LIMIT: usize = 10;

/// Upper bound applied to every `limit`.
pub const MAX_LIMIT: usize = 100;

/// Radius used when `km` is omitted.
pub const DEFAULT_RADIUS_KM: f64 = 1.0;

/// Broad class of a [`QueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Malformed, missing or out-of-range input.
    InvalidArgument,
    /// A referenced area does not exist. Reported to callers as invalid input.
    NotFound,
}

/// Rejection of a query request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// A required parameter was absent or blank.
    #[error("query param '{name}' is required")]
    MissingParam {
        /// Parameter name.
        name: &'static str,
    },
    /// A parameter could not be parsed.
    #[error("query param '{name}' must be {expected}, got '{value}'")]
    Malformed {
        /// Parameter name.
        name: &'static str,
        /// Description of the accepted form.
        expected: &'static str,
        /// Raw value supplied.
        value: String,
    },
    /// A count or distance was zero or negative.
    #[error("query param '{name}' must be greater than zero, got '{value}'")]
    NonPositive {
        /// Parameter name.
        name: &'static str,
        /// Raw value supplied.
        value: String,
    },
    /// A coordinate fell outside its WGS84 range.
    #[error("query param '{name}' must be within [{min}, {max}], got {value}")]
    OutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Parsed value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
    /// The referenced area does not exist.
    #[error("area not found: {id}")]
    AreaNotFound {
        /// Requested area.
        id: AreaId,
    },
}

impl QueryError {
    /// Classify the error for transport layers.
    #[must_use]
    pub const fn kind(&self) -> QueryErrorKind {
        match self {
            Self::AreaNotFound { .. } => QueryErrorKind::NotFound,
            _ => QueryErrorKind::InvalidArgument,
        }
    }
}

/// Raw string parameters as received from a transport.
///
/// # Examples
/// ```
/// use lbs_core::query::{NearestRequest, QueryParams};
///
/// let params = QueryParams::from_pairs([("lat", "53.35"), ("lng", "-6.26"), ("limit", "500")]);
/// let request = NearestRequest::from_params(&params).expect("valid request");
/// assert_eq!(request.limit(), 100);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    /// Collect parameters from key/value pairs. Later keys win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Set one parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Raw value, trimmed, or `None` when absent or blank.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<&str, QueryError> {
        self.get(name).ok_or(QueryError::MissingParam { name })
    }

    fn float(&self, name: &'static str) -> Result<f64, QueryError> {
        parse_float(name, self.required(name)?)
    }

    fn origin(&self) -> Result<Location, QueryError> {
        let lat = self.float("lat")?;
        let lng = self.float("lng")?;
        checked_origin(Coord { x: lng, y: lat })
    }

    fn area(&self) -> Result<Option<AreaId>, QueryError> {
        self.get("area_id").map(parse_area_id).transpose()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

fn parse_float(name: &'static str, raw: &str) -> Result<f64, QueryError> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| QueryError::Malformed {
            name,
            expected: "a finite number",
            value: raw.to_owned(),
        })
}

fn in_range(name: &'static str, value: f64, bound: f64) -> Result<f64, QueryError> {
    if (-bound..=bound).contains(&value) {
        Ok(value)
    } else {
        Err(QueryError::OutOfRange {
            name,
            value,
            min: -bound,
            max: bound,
        })
    }
}

fn finite(name: &'static str, value: f64) -> Result<f64, QueryError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(QueryError::Malformed {
            name,
            expected: "a finite number",
            value: value.to_string(),
        })
    }
}

/// Reject origins that are not finite WGS84 positions.
fn checked_origin(origin: Location) -> Result<Location, QueryError> {
    let lat = in_range("lat", finite("lat", origin.y)?, 90.0)?;
    let lng = in_range("lng", finite("lng", origin.x)?, 180.0)?;
    Ok(Coord { x: lng, y: lat })
}

fn parse_area_id(raw: &str) -> Result<AreaId, QueryError> {
    raw.parse().map_err(|_| QueryError::Malformed {
        name: "area_id",
        expected: "a numeric area id",
        value: raw.to_owned(),
    })
}

fn parse_limit(raw: Option<&str>) -> Result<usize, QueryError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_LIMIT);
    };
    let value: i64 = raw.parse().map_err(|_| QueryError::Malformed {
        name: "limit",
        expected: "a positive integer",
        value: raw.to_owned(),
    })?;
    if value <= 0 {
        return Err(QueryError::NonPositive {
            name: "limit",
            value: raw.to_owned(),
        });
    }
    Ok(usize::try_from(value).map_or(MAX_LIMIT, |limit| limit.min(MAX_LIMIT)))
}

/// Validated input for nearest-amenity queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestRequest {
    origin: Location,
    limit: usize,
    area: Option<AreaId>,
}

impl NearestRequest {
    /// Build a request, clamping `limit` to [`MAX_LIMIT`].
    ///
    /// # Errors
    /// Returns [`QueryError::NonPositive`] for a zero `limit` and
    /// [`QueryError::Malformed`] or [`QueryError::OutOfRange`] for an origin
    /// that is not a valid WGS84 position.
    pub fn new(origin: Location, limit: usize, area: Option<AreaId>) -> Result<Self, QueryError> {
        if limit == 0 {
            return Err(QueryError::NonPositive {
                name: "limit",
                value: limit.to_string(),
            });
        }
        Ok(Self {
            origin: checked_origin(origin)?,
            limit: limit.min(MAX_LIMIT),
            area,
        })
    }

    /// Parse `lat`, `lng`, `limit` and `area_id`.
    pub fn from_params(params: &QueryParams) -> Result<Self, QueryError> {
        let origin = params.origin()?;
        let limit = parse_limit(params.get("limit"))?;
        Ok(Self {
            origin,
            limit,
            area: params.area()?,
        })
    }

    /// Search origin.
    #[must_use]
    pub const fn origin(&self) -> Location {
        self.origin
    }

    /// Maximum results, never above [`MAX_LIMIT`].
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Optional area restriction.
    #[must_use]
    pub const fn area(&self) -> Option<AreaId> {
        self.area
    }
}

/// Validated input for area-scoped queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaRequest {
    /// Area to search.
    pub area: AreaId,
}

impl AreaRequest {
    /// Parse the required `area_id`.
    pub fn from_params(params: &QueryParams) -> Result<Self, QueryError> {
        let raw = params.required("area_id")?;
        Ok(Self {
            area: parse_area_id(raw)?,
        })
    }
}

/// Validated input for radius queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusRequest {
    origin: Location,
    radius_km: f64,
    area: Option<AreaId>,
}

impl RadiusRequest {
    /// Build a request; the origin must be a valid WGS84 position and the
    /// radius finite and positive.
    pub fn new(origin: Location, radius_km: f64, area: Option<AreaId>) -> Result<Self, QueryError> {
        if !radius_km.is_finite() {
            return Err(QueryError::Malformed {
                name: "km",
                expected: "a finite number",
                value: radius_km.to_string(),
            });
        }
        if radius_km <= 0.0 {
            return Err(QueryError::NonPositive {
                name: "km",
                value: radius_km.to_string(),
            });
        }
        Ok(Self {
            origin: checked_origin(origin)?,
            radius_km,
            area,
        })
    }

    /// Parse `lat`, `lng`, `km` and `area_id`.
    pub fn from_params(params: &QueryParams) -> Result<Self, QueryError> {
        let origin = params.origin()?;
        let radius_km = match params.get("km") {
            Some(raw) => parse_float("km", raw)?,
            None => DEFAULT_RADIUS_KM,
        };
        Self::new(origin, radius_km, params.area()?)
    }

    /// Circle centre.
    #[must_use]
    pub const fn origin(&self) -> Location {
        self.origin
    }

    /// Radius in kilometres, strictly positive.
    #[must_use]
    pub const fn radius_km(&self) -> f64 {
        self.radius_km
    }

    /// Optional area restriction.
    #[must_use]
    pub const fn area(&self) -> Option<AreaId> {
        self.area
    }

    /// Radius in metres.
    #[must_use]
    pub fn radius_metres(&self) -> f64 {
        self.radius_km * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().copied().collect()
    }

    #[rstest]
    fn nearest_defaults_limit_to_ten() {
        let request = NearestRequest::from_params(&params(&[("lat", "53.35"), ("lng", "-6.26")]))
            .expect("valid request");
        assert_eq!(request.limit(), DEFAULT_LIMIT);
        assert_eq!(request.origin(), Coord { x: -6.26, y: 53.35 });
        assert_eq!(request.area(), None);
    }

    #[rstest]
    #[case("1", 1)]
    #[case("100", 100)]
    #[case("101", 100)]
    #[case("99999999999999", 100)]
    fn nearest_clamps_limit(#[case] raw: &str, #[case] expected: usize) {
        let request =
            NearestRequest::from_params(&params(&[("lat", "0"), ("lng", "0"), ("limit", raw)]))
                .expect("valid request");
        assert_eq!(request.limit(), expected);
    }

    #[rstest]
    #[case("0")]
    #[case("-5")]
    #[case("abc")]
    #[case("2.5")]
    fn invalid_limits_mention_limit(#[case] raw: &str) {
        let err = NearestRequest::from_params(&params(&[("lat", "0"), ("lng", "0"), ("limit", raw)]))
            .expect_err("limit should be rejected");
        assert_eq!(err.kind(), QueryErrorKind::InvalidArgument);
        assert!(err.to_string().contains("limit"), "message was: {err}");
    }

    #[rstest]
    #[case(&[("lng", "0")], "lat")]
    #[case(&[("lat", "0")], "lng")]
    #[case(&[("lat", "north"), ("lng", "0")], "lat")]
    #[case(&[("lat", "NaN"), ("lng", "0")], "lat")]
    #[case(&[("lat", "0"), ("lng", "inf")], "lng")]
    #[case(&[("lat", "91"), ("lng", "0")], "lat")]
    #[case(&[("lat", "0"), ("lng", "-181")], "lng")]
    fn origin_errors_name_the_parameter(#[case] pairs: &[(&str, &str)], #[case] name: &str) {
        let err = NearestRequest::from_params(&params(pairs)).expect_err("origin should be rejected");
        assert_eq!(err.kind(), QueryErrorKind::InvalidArgument);
        assert!(err.to_string().contains(name), "message was: {err}");
    }

    #[rstest]
    fn blank_optional_area_is_ignored() {
        let request =
            NearestRequest::from_params(&params(&[("lat", "0"), ("lng", "0"), ("area_id", " ")]))
                .expect("valid request");
        assert_eq!(request.area(), None);
    }

    #[rstest]
    fn area_request_requires_area_id() {
        assert_eq!(
            AreaRequest::from_params(&params(&[("area_id", "")])),
            Err(QueryError::MissingParam { name: "area_id" })
        );
    }

    #[rstest]
    fn area_request_rejects_non_numeric_ids() {
        let err = AreaRequest::from_params(&params(&[("area_id", "docklands")]))
            .expect_err("non-numeric id");
        assert!(matches!(err, QueryError::Malformed { name: "area_id", .. }));
    }

    #[rstest]
    fn radius_defaults_to_one_kilometre() {
        let request = RadiusRequest::from_params(&params(&[("lat", "0"), ("lng", "0")]))
            .expect("valid request");
        assert_eq!(request.radius_km(), DEFAULT_RADIUS_KM);
        assert_eq!(request.radius_metres(), 1000.0);
    }

    #[rstest]
    #[case("0")]
    #[case("-1")]
    #[case("far")]
    #[case("inf")]
    fn radius_rejects_bad_km(#[case] raw: &str) {
        let err = RadiusRequest::from_params(&params(&[("lat", "53.35"), ("lng", "-6.26"), ("km", raw)]))
            .expect_err("km should be rejected");
        assert_eq!(err.kind(), QueryErrorKind::InvalidArgument);
        assert!(err.to_string().contains("km"), "message was: {err}");
    }

    #[rstest]
    fn typed_nearest_rejects_zero_limit() {
        let err = NearestRequest::new(Coord { x: -6.26, y: 53.35 }, 0, None)
            .expect_err("zero limit");
        assert!(matches!(err, QueryError::NonPositive { name: "limit", .. }));
    }

    #[rstest]
    fn typed_nearest_clamps_large_limits() {
        let request =
            NearestRequest::new(Coord { x: -6.26, y: 53.35 }, 500, None).expect("valid request");
        assert_eq!(request.limit(), MAX_LIMIT);
    }

    #[rstest]
    #[case(Coord { x: f64::NAN, y: 53.35 }, "lng")]
    #[case(Coord { x: -6.26, y: f64::INFINITY }, "lat")]
    #[case(Coord { x: -6.26, y: 95.0 }, "lat")]
    #[case(Coord { x: 200.0, y: 53.35 }, "lng")]
    fn typed_requests_reject_invalid_origins(#[case] origin: Location, #[case] name: &str) {
        let nearest = NearestRequest::new(origin, 3, None).expect_err("origin rejected");
        let radius = RadiusRequest::new(origin, 1.0, None).expect_err("origin rejected");
        for err in [nearest, radius] {
            assert_eq!(err.kind(), QueryErrorKind::InvalidArgument);
            assert!(err.to_string().contains(name), "message was: {err}");
        }
    }

    #[rstest]
    fn area_not_found_is_its_own_kind() {
        let err = QueryError::AreaNotFound { id: AreaId::new(9) };
        assert_eq!(err.kind(), QueryErrorKind::NotFound);
        assert_eq!(err.to_string(), "area not found: 9");
    }
}
