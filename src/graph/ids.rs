//! Identifiers for diagram cells and semantic entities
//!
//! Cell ids (`NodeId`, `RelationshipId`) name a shape on the diagram; the
//! remaining ids name semantic entities and are usually IRIs. All of them
//! serialize as plain strings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an id from a string
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the inner string value
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Unique identifier of a node cell on the diagram
    NodeId
);
string_id!(
    /// Unique identifier of a relationship cell on the diagram
    RelationshipId
);
string_id!(
    /// Stable semantic identity of an entity (typically an IRI)
    Iri
);
string_id!(
    /// Identity of a relationship type
    RelationshipTypeId
);
string_id!(
    /// Identity of a node in the type hierarchy
    TypeNodeId
);
string_id!(
    /// Identity of an attribute type
    AttributeTypeId
);

impl NodeId {
    /// Create a new random NodeId (UUID-based)
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl RelationshipId {
    /// Create a new random RelationshipId (UUID-based)
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RelationshipId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = Iri::from("http://example.org/alice");
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"http://example.org/alice\""
        );
        let back: Iri = serde_json::from_str("\"http://example.org/alice\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn generated_cell_ids_are_unique() {
        assert_ne!(NodeId::new(), NodeId::new());
        assert_ne!(RelationshipId::new(), RelationshipId::new());
    }
}
