//! Named polylines, upserted by name.

use geo::Rect;

use crate::entity::{Entity, EntityError, RouteId, validated_name};
use crate::geometry::{Boundary, BoundingBox, Polyline, polyline_intersects_polygon};

/// Maximum characters in a route name.
pub const ROUTE_NAME_MAX: usize = 100;

/// A named single-part path. Names are unique and act as the upsert key.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Store-assigned identifier.
    pub id: RouteId,
    /// Unique display name.
    pub name: String,
    /// Path geometry.
    pub path: Polyline,
}

impl Route {
    /// Validate the name and build a route.
    pub fn new(id: RouteId, name: &str, path: Polyline) -> Result<Self, EntityError> {
        Ok(Self {
            id,
            name: validated_route_name(name)?,
            path,
        })
    }

    /// Whether the path crosses, touches or lies inside `boundary`.
    #[must_use]
    pub fn intersects(&self, boundary: &Boundary) -> bool {
        polyline_intersects_polygon(&self.path, boundary)
    }
}

/// Normalise a route name the way stores key upserts.
pub fn validated_route_name(name: &str) -> Result<String, EntityError> {
    validated_name(Route::KIND, name, ROUTE_NAME_MAX)
}

impl Entity for Route {
    type Id = RouteId;

    const KIND: &'static str = "route";

    fn id(&self) -> RouteId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn bounding_box(&self) -> Rect<f64> {
        self.path.bounding_box()
    }
}
