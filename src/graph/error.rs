//! Errors raised by the diagram model

use super::events::EntityKind;
use super::ids::{NodeId, RelationshipId, RelationshipTypeId, TypeNodeId};
use crate::history::HistoryError;
use crate::provider::ProviderError;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur in model operations
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("duplicate {kind} identity: {id}")]
    DuplicateIdentity { kind: EntityKind, id: String },

    #[error("unknown relationship type: {0}")]
    UnknownType(RelationshipTypeId),

    #[error("node not found: {0}")]
    UnknownNode(NodeId),

    #[error("relationship not found: {0}")]
    UnknownRelationship(RelationshipId),

    #[error("{kind} not found: {id}")]
    UnknownEntity { kind: EntityKind, id: String },

    #[error("relationship {id} payload must keep identity {expected}, got {found}")]
    IdentityMismatch {
        id: RelationshipId,
        expected: String,
        found: String,
    },

    #[error("relationship type {id} already has display index {index}")]
    IndexAlreadyAssigned { id: RelationshipTypeId, index: u32 },

    #[error("type {id} cannot derive from its own descendant {base}")]
    HierarchyCycle { id: TypeNodeId, base: TypeNodeId },

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("data provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("serialization error: {0}")]
    Serialization(Arc<serde_json::Error>),
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(Arc::new(err))
    }
}

impl ModelError {
    pub(crate) fn duplicate(kind: EntityKind, id: impl std::fmt::Display) -> Self {
        Self::DuplicateIdentity {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn unknown(kind: EntityKind, id: impl std::fmt::Display) -> Self {
        Self::UnknownEntity {
            kind,
            id: id.to_string(),
        }
    }
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;
