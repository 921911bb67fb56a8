use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// The six persisted record types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    Amenity,
    City,
    Place,
    Review,
    State,
    User,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 6] = [
        ObjectKind::Amenity,
        ObjectKind::City,
        ObjectKind::Place,
        ObjectKind::Review,
        ObjectKind::State,
        ObjectKind::User,
    ];

    /// Class name used in object keys and the `__class__` tag.
    pub fn class_name(self) -> &'static str {
        match self {
            ObjectKind::Amenity => "Amenity",
            ObjectKind::City => "City",
            ObjectKind::Place => "Place",
            ObjectKind::Review => "Review",
            ObjectKind::State => "State",
            ObjectKind::User => "User",
        }
    }

    /// Plural resource name used by `/stats`.
    pub fn resource(self) -> &'static str {
        match self {
            ObjectKind::Amenity => "amenities",
            ObjectKind::City => "cities",
            ObjectKind::Place => "places",
            ObjectKind::Review => "reviews",
            ObjectKind::State => "states",
            ObjectKind::User => "users",
        }
    }

    /// Storage key for an object of this kind: `"<Class>.<id>"`.
    pub fn key(self, id: &str) -> String {
        format!("{}.{}", self.class_name(), id)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

impl FromStr for ObjectKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectKind::ALL
            .into_iter()
            .find(|k| k.class_name() == s)
            .ok_or_else(|| ModelError::UnknownKind(s.to_string()))
    }
}
