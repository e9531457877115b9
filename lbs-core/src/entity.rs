//! Shared entity plumbing: typed identifiers, name validation and the
//! [`Entity`] trait consumed by the spatial index layers.

use std::fmt;
use std::hash::Hash;
use std::num::ParseIntError;
use std::str::FromStr;

use geo::Rect;
use thiserror::Error;

use crate::geometry::GeometryError;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw identifier.
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Raw numeric value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

entity_id!(
    /// Identifier of an [`Amenity`](crate::Amenity).
    AmenityId
);
entity_id!(
    /// Identifier of an [`Area`](crate::Area).
    AreaId
);
entity_id!(
    /// Identifier of a [`Route`](crate::Route).
    RouteId
);

/// Something stored in a spatial layer: identified, named and bounded.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Identifier type; ordering defines result order.
    type Id: Copy + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Human-readable kind used in log lines and errors.
    const KIND: &'static str;

    /// Identifier of this entity.
    fn id(&self) -> Self::Id;

    /// Display name.
    fn name(&self) -> &str;

    /// Bounding box fed to the spatial index.
    fn bounding_box(&self) -> Rect<f64>;
}

/// Errors raised when constructing entities.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntityError {
    /// The name was blank after trimming.
    #[error("{kind} name must not be empty")]
    EmptyName {
        /// Entity kind.
        kind: &'static str,
    },
    /// The name exceeded the permitted length.
    #[error("{kind} name exceeds {max} characters")]
    NameTooLong {
        /// Entity kind.
        kind: &'static str,
        /// Maximum permitted characters.
        max: usize,
    },
    /// Geometry failed validation.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Trim a name and check it against a character limit.
pub(crate) fn validated_name(
    kind: &'static str,
    name: &str,
    max: usize,
) -> Result<String, EntityError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(EntityError::EmptyName { kind });
    }
    if trimmed.chars().count() > max {
        return Err(EntityError::NameTooLong { kind, max });
    }
    Ok(trimmed.to_owned())
}
