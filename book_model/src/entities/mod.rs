//! Entity definitions for a work: characters, factions, locations and relationships.

mod character;
mod faction;
mod location;
mod relationship;

pub use character::*;
pub use faction::*;
pub use location::*;
pub use relationship::*;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ::serde::Serialize, ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Stable key of a work in a library of works.
    WorkId
);

string_id!(
    /// Identifier of a character, unique within a work.
    CharacterId
);

string_id!(
    /// Identifier of a faction, unique within a work.
    FactionId
);

string_id!(
    /// Identifier of a location, unique within a work.
    LocationId
);

pub(crate) use string_id;
