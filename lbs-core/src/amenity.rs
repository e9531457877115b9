use std::fmt;
use std::str::FromStr;

use geo::Rect;
use thiserror::Error;

use crate::entity::{AmenityId, Entity, EntityError, validated_name};
use crate::geometry::{BoundingBox, Location, validated_location};

/// Maximum characters in an amenity name.
pub const AMENITY_NAME_MAX: usize = 120;

/// Closed set of amenity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Coffee shops and cafes.
    Cafe,
    /// Gyms and fitness studios.
    Gym,
    /// Cash machines.
    Atm,
    /// Parks and green spaces.
    Park,
    /// Retail shops.
    Shop,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 5] = [Self::Cafe, Self::Gym, Self::Atm, Self::Park, Self::Shop];

    /// Lowercase wire name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cafe => "cafe",
            Self::Gym => "gym",
            Self::Atm => "atm",
            Self::Park => "park",
            Self::Shop => "shop",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cafe => "Cafe",
            Self::Gym => "Gym",
            Self::Atm => "ATM",
            Self::Park => "Park",
            Self::Shop => "Shop",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown amenity category '{0}'; expected one of cafe, gym, atm, park, shop")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseCategoryError(s.to_owned()))
    }
}

/// Amenity fields before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct AmenityDraft {
    /// Display name, trimmed and non-empty.
    pub name: String,
    /// Amenity kind.
    pub category: Category,
    /// WGS84 position.
    pub location: Location,
    /// Free-form description; may be empty.
    pub description: String,
}

impl AmenityDraft {
    /// Validate the name and location of a new amenity.
    ///
    /// # Examples
    /// ```
    /// use lbs_core::{AmenityDraft, Category};
    ///
    /// let draft = AmenityDraft::new("Brew Lab", Category::Cafe, -6.26, 53.35)
    ///     .expect("valid amenity");
    /// assert!(draft.description.is_empty());
    /// ```
    pub fn new(
        name: &str,
        category: Category,
        lon: f64,
        lat: f64,
    ) -> Result<Self, EntityError> {
        Ok(Self {
            name: validated_name(Amenity::KIND, name, AMENITY_NAME_MAX)?,
            category,
            location: validated_location(lon, lat)?,
            description: String::new(),
        })
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Promote the draft to a stored amenity.
    #[must_use]
    pub fn into_amenity(self, id: AmenityId) -> Amenity {
        Amenity {
            id,
            name: self.name,
            category: self.category,
            location: self.location,
            description: self.description,
        }
    }
}

/// A categorised point of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct Amenity {
    /// Store-assigned identifier.
    pub id: AmenityId,
    /// Display name.
    pub name: String,
    /// Amenity kind.
    pub category: Category,
    /// WGS84 position.
    pub location: Location,
    /// Free-form description; may be empty.
    pub description: String,
}

impl Entity for Amenity {
    type Id = AmenityId;

    const KIND: &'static str = "amenity";

    fn id(&self) -> AmenityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn bounding_box(&self) -> Rect<f64> {
        self.location.bounding_box()
    }
}

/// Listing filter: optional category plus case-insensitive text search over
/// name, description and category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmenityFilter {
    /// Only amenities of this category.
    pub category: Option<Category>,
    /// Substring matched against name, description and category.
    pub search: Option<String>,
}

impl AmenityFilter {
    /// Whether `amenity` passes the filter.
    #[must_use]
    pub fn matches(&self, amenity: &Amenity) -> bool {
        if self.category.is_some_and(|category| category != amenity.category) {
            return false;
        }
        let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return true;
        };
        let needle = needle.to_lowercase();
        [
            amenity.name.as_str(),
            amenity.description.as_str(),
            amenity.category.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}
