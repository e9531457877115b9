//! Named polygon regions used as query filters.

use geo::Rect;

use crate::entity::{AreaId, Entity, EntityError, validated_name};
use crate::geometry::{Boundary, BoundingBox, Location, point_in_polygon};

/// Maximum characters in an area name.
pub const AREA_NAME_MAX: usize = 100;

/// A named region with a single closed boundary ring.
///
/// Areas are only used as query-time filters; nothing references them
/// structurally.
#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    /// Store-assigned identifier.
    pub id: AreaId,
    /// Unique display name.
    pub name: String,
    /// Outer ring.
    pub boundary: Boundary,
}

impl Area {
    /// Validate the name and build an area.
    pub fn new(id: AreaId, name: &str, boundary: Boundary) -> Result<Self, EntityError> {
        Ok(Self {
            id,
            name: validated_name(Self::KIND, name, AREA_NAME_MAX)?,
            boundary,
        })
    }

    /// Whether `location` lies inside the boundary, edges included.
    #[must_use]
    pub fn contains(&self, location: Location) -> bool {
        point_in_polygon(location, &self.boundary)
    }
}

impl Entity for Area {
    type Id = AreaId;

    const KIND: &'static str = "area";

    fn id(&self) -> AreaId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn bounding_box(&self) -> Rect<f64> {
        self.boundary.bounding_box()
    }
}
