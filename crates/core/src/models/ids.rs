//! Typed identifiers
//!
//! Identifiers are opaque strings. Seeded fixture data uses readable ids
//! (`den-foxden`, `ch-general`) so that a persisted `activeDen` still resolves
//! after the fixtures are re-seeded on the next launch; everything created at
//! runtime gets a random UUID.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Fresh random identifier
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of a den (a "server")
    DenId
);
string_id!(
    /// Identifier of a text or voice channel
    ChannelId
);
string_id!(MessageId);
string_id!(
    /// Identifier of a user account; members reuse the user id
    UserId
);
string_id!(RoleId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(DenId::generate(), DenId::generate());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = ChannelId::new("ch-general");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ch-general\"");
        assert_eq!(id.to_string(), "ch-general");
    }
}
