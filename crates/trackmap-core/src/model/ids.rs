use serde::{Deserialize, Serialize};
use std::fmt;

/// Return the identifier part of a typed source URI.
///
/// Source systems embed the entity type and the identifier in one string
/// (`"spotify:track:abc123"`); the identifier is everything after the last
/// `:`. A string without a separator is returned unchanged.
pub fn canonical_id(uri: &str) -> &str {
    uri.rsplit(':').next().unwrap_or(uri)
}

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Build the canonical identifier from a typed source URI.
            #[must_use]
            pub fn from_uri(uri: &str) -> Self {
                Self(canonical_id(uri).to_string())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ArtistId, "Canonical identifier of an artist.");
