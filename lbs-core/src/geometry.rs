//! Geometry primitives over WGS84 longitude/latitude degrees.
//!
//! Locations use [`geo::Coord`] with `x = longitude` and `y = latitude`.
//! Distances are great-circle distances on a sphere; intersection tests treat
//! degrees as a flat local plane because they only answer yes/no questions.
//!
//! Boundary policy: a location lying exactly on a polygon edge or vertex is
//! inside the polygon, and a polyline touching a polygon edge intersects it.

use geo::{Coord, Rect};
use thiserror::Error;

/// A WGS84 position with `x = longitude` and `y = latitude`, in degrees.
pub type Location = Coord<f64>;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_METRES: f64 = 6_371_000.0;

/// Tolerance applied to orientation tests, in squared degrees.
const ORIENTATION_EPSILON: f64 = 1.0e-12;

/// Slack added to radius envelopes so rounding never drops a candidate.
const ENVELOPE_PADDING_DEGREES: f64 = 1.0e-7;

/// Minimum number of positions in a closed boundary ring.
pub const MIN_RING_POSITIONS: usize = 4;

/// Minimum number of positions in a polyline.
pub const MIN_POLYLINE_POSITIONS: usize = 2;

/// Errors raised when constructing geometries from raw positions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A position was not finite or fell outside the WGS84 ranges.
    #[error("position ({lon}, {lat}) is not a valid WGS84 longitude/latitude")]
    InvalidPosition {
        /// Offending longitude.
        lon: f64,
        /// Offending latitude.
        lat: f64,
    },
    /// A boundary ring had too few positions.
    #[error("boundary ring needs at least {MIN_RING_POSITIONS} positions, found {found}")]
    RingTooShort {
        /// Number of positions supplied.
        found: usize,
    },
    /// The first and last positions of a boundary ring differ.
    #[error("boundary ring is not closed: first and last positions differ")]
    RingNotClosed,
    /// A polyline had too few positions.
    #[error("polyline needs at least {MIN_POLYLINE_POSITIONS} positions, found {found}")]
    PolylineTooShort {
        /// Number of positions supplied.
        found: usize,
    },
}

/// Validate a longitude/latitude pair and build a [`Location`].
///
/// # Examples
/// ```
/// use lbs_core::geometry::validated_location;
///
/// let dublin = validated_location(-6.26, 53.35).expect("valid position");
/// assert_eq!(dublin.x, -6.26);
/// assert!(validated_location(181.0, 0.0).is_err());
/// ```
pub fn validated_location(lon: f64, lat: f64) -> Result<Location, GeometryError> {
    if lon.is_finite()
        && lat.is_finite()
        && (-180.0..=180.0).contains(&lon)
        && (-90.0..=90.0).contains(&lat)
    {
        Ok(Coord { x: lon, y: lat })
    } else {
        Err(GeometryError::InvalidPosition { lon, lat })
    }
}

fn validate_all(positions: &[Location]) -> Result<(), GeometryError> {
    positions
        .iter()
        .try_for_each(|p| validated_location(p.x, p.y).map(|_| ()))
}

/// A single closed polygon ring: the boundary of an area.
///
/// Holds at least four positions and the first equals the last. The ring is
/// assumed simple; self-intersection is not checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    ring: Vec<Location>,
}

impl Boundary {
    /// Validate and wrap a closed ring.
    pub fn new(ring: Vec<Location>) -> Result<Self, GeometryError> {
        if ring.len() < MIN_RING_POSITIONS {
            return Err(GeometryError::RingTooShort { found: ring.len() });
        }
        if ring.first() != ring.last() {
            return Err(GeometryError::RingNotClosed);
        }
        validate_all(&ring)?;
        Ok(Self { ring })
    }

    /// Build a ring from open vertices, repeating the first vertex at the end
    /// when the caller left it off.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use lbs_core::geometry::Boundary;
    ///
    /// let square = Boundary::closing(vec![
    ///     Coord { x: 0.0, y: 0.0 },
    ///     Coord { x: 1.0, y: 0.0 },
    ///     Coord { x: 1.0, y: 1.0 },
    ///     Coord { x: 0.0, y: 1.0 },
    /// ])
    /// .expect("valid ring");
    /// assert_eq!(square.positions().len(), 5);
    /// ```
    pub fn closing(mut vertices: Vec<Location>) -> Result<Self, GeometryError> {
        if let (Some(first), Some(last)) = (vertices.first().copied(), vertices.last().copied())
            && first != last
        {
            vertices.push(first);
        }
        Self::new(vertices)
    }

    /// Positions of the ring, closing position included.
    pub fn positions(&self) -> &[Location] {
        &self.ring
    }

    /// Consecutive edges of the ring, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (Location, Location)> + '_ {
        pairs(&self.ring)
    }
}

/// An ordered path of at least two positions: the geometry of a route.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    positions: Vec<Location>,
}

impl Polyline {
    /// Validate and wrap a path.
    pub fn new(positions: Vec<Location>) -> Result<Self, GeometryError> {
        if positions.len() < MIN_POLYLINE_POSITIONS {
            return Err(GeometryError::PolylineTooShort {
                found: positions.len(),
            });
        }
        validate_all(&positions)?;
        Ok(Self { positions })
    }

    /// Positions along the path.
    pub fn positions(&self) -> &[Location] {
        &self.positions
    }

    /// Consecutive segments along the path.
    pub fn segments(&self) -> impl Iterator<Item = (Location, Location)> + '_ {
        pairs(&self.positions)
    }
}

fn pairs(positions: &[Location]) -> impl Iterator<Item = (Location, Location)> + '_ {
    positions
        .iter()
        .copied()
        .zip(positions.iter().skip(1).copied())
}

/// Axis-aligned bounding boxes for index pre-filtering.
pub trait BoundingBox {
    /// Smallest lon/lat rectangle covering the geometry.
    fn bounding_box(&self) -> Rect<f64>;
}

impl BoundingBox for Location {
    fn bounding_box(&self) -> Rect<f64> {
        Rect::new(*self, *self)
    }
}

impl BoundingBox for Boundary {
    fn bounding_box(&self) -> Rect<f64> {
        envelope_of(&self.ring)
    }
}

impl BoundingBox for Polyline {
    fn bounding_box(&self) -> Rect<f64> {
        envelope_of(&self.positions)
    }
}

// Callers guarantee a non-empty slice; an empty one degenerates to the origin.
fn envelope_of(positions: &[Location]) -> Rect<f64> {
    let seed = positions.first().copied().unwrap_or(Coord { x: 0.0, y: 0.0 });
    let (min, max) = positions.iter().fold((seed, seed), |(min, max), p| {
        (
            Coord {
                x: min.x.min(p.x),
                y: min.y.min(p.y),
            },
            Coord {
                x: max.x.max(p.x),
                y: max.y.max(p.y),
            },
        )
    });
    Rect::new(min, max)
}

/// Great-circle (haversine) distance between two locations, in metres.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use lbs_core::geometry::distance;
///
/// let here = Coord { x: -6.26, y: 53.35 };
/// assert_eq!(distance(here, here), 0.0);
/// ```
pub fn distance(from: Location, to: Location) -> f64 {
    let from_lat = from.y.to_radians();
    let to_lat = to.y.to_radians();
    let delta_lat = (to.y - from.y).to_radians();
    let delta_lon = (to.x - from.x).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + from_lat.cos() * to_lat.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METRES * c
}

/// Rectangle covering every location within `metres` of `origin`.
///
/// The box over-approximates the spherical cap. When the cap reaches a pole
/// or crosses the antimeridian the box spans every longitude.
pub fn radius_envelope(origin: Location, metres: f64) -> Rect<f64> {
    let angular = (metres.max(0.0) / EARTH_RADIUS_METRES).min(std::f64::consts::PI);
    let delta_lat = angular.to_degrees() + ENVELOPE_PADDING_DEGREES;
    let min_lat = (origin.y - delta_lat).max(-90.0);
    let max_lat = (origin.y + delta_lat).min(90.0);

    let pole_gap = std::f64::consts::FRAC_PI_2 - origin.y.abs().to_radians();
    let (min_lon, max_lon) = if angular >= pole_gap {
        (-180.0, 180.0)
    } else {
        let delta_lon = (angular.sin() / origin.y.to_radians().cos())
            .min(1.0)
            .asin()
            .to_degrees()
            + ENVELOPE_PADDING_DEGREES;
        let west = origin.x - delta_lon;
        let east = origin.x + delta_lon;
        if west < -180.0 || east > 180.0 {
            (-180.0, 180.0)
        } else {
            (west, east)
        }
    };

    Rect::new(
        Coord {
            x: min_lon,
            y: min_lat,
        },
        Coord {
            x: max_lon,
            y: max_lat,
        },
    )
}

/// Whether `point` lies inside `boundary`; points on an edge count as inside.
///
/// Uses an even-odd ray cast after an explicit on-edge check.
pub fn point_in_polygon(point: Location, boundary: &Boundary) -> bool {
    if boundary
        .edges()
        .any(|(start, end)| point_on_segment(start, end, point))
    {
        return true;
    }

    let mut inside = false;
    for (start, end) in boundary.edges() {
        if (start.y > point.y) != (end.y > point.y) {
            let crossing_x = (end.x - start.x) * (point.y - start.y) / (end.y - start.y) + start.x;
            if point.x < crossing_x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Whether segments `a_start..a_end` and `b_start..b_end` share any point.
///
/// Touching endpoints and collinear overlaps count as intersections.
pub fn segments_intersect(
    a_start: Location,
    a_end: Location,
    b_start: Location,
    b_end: Location,
) -> bool {
    let o1 = orientation(a_start, a_end, b_start);
    let o2 = orientation(a_start, a_end, b_end);
    let o3 = orientation(b_start, b_end, a_start);
    let o4 = orientation(b_start, b_end, a_end);

    if o1 != o2 && o3 != o4 && o1 != 0 && o2 != 0 && o3 != 0 && o4 != 0 {
        return true;
    }

    (o1 == 0 && within_extent(a_start, a_end, b_start))
        || (o2 == 0 && within_extent(a_start, a_end, b_end))
        || (o3 == 0 && within_extent(b_start, b_end, a_start))
        || (o4 == 0 && within_extent(b_start, b_end, a_end))
}

/// Whether any part of `path` crosses, touches or lies inside `boundary`.
///
/// Short-circuits on the first crossing edge or contained vertex.
pub fn polyline_intersects_polygon(path: &Polyline, boundary: &Boundary) -> bool {
    path.segments().any(|(start, end)| {
        boundary
            .edges()
            .any(|(edge_start, edge_end)| segments_intersect(start, end, edge_start, edge_end))
    }) || path
        .positions()
        .iter()
        .any(|vertex| point_in_polygon(*vertex, boundary))
}

fn orientation(start: Location, end: Location, probe: Location) -> i8 {
    let cross = (end.x - start.x) * (probe.y - start.y) - (end.y - start.y) * (probe.x - start.x);
    if cross > ORIENTATION_EPSILON {
        1
    } else if cross < -ORIENTATION_EPSILON {
        -1
    } else {
        0
    }
}

fn within_extent(start: Location, end: Location, point: Location) -> bool {
    point.x >= start.x.min(end.x)
        && point.x <= start.x.max(end.x)
        && point.y >= start.y.min(end.y)
        && point.y <= start.y.max(end.y)
}

fn point_on_segment(start: Location, end: Location, point: Location) -> bool {
    orientation(start, end, point) == 0 && within_extent(start, end, point)
}
