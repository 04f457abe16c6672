//! DiagramModel: the operations an application calls
//!
//! Owns the graph and the command history, drives lazy hydration through
//! the fetch coalescers, and moves diagrams in and out of the layout
//! exchange format.

mod diagram;
mod exchange;
mod layout;

#[cfg(test)]
mod tests;

pub use diagram::DiagramModel;
pub use layout::{CellRef, LayoutData, LayoutNode, LayoutRelationship, RelationshipTypeOptions};

use crate::graph::{GraphEvent, Iri, ModelError, RelationshipId, RelationshipTypeId};

/// An event fired by the model
///
/// Graph changes are forwarded unchanged; the loading events bracket an
/// import.
#[derive(Debug, Clone)]
pub enum ModelEvent {
    Graph(GraphEvent),
    LoadingStarted,
    LoadingSucceeded,
    LoadingFailed(ModelError),
}

impl ModelEvent {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Graph(event) => event.key(),
            Self::LoadingStarted => "loadingStarted",
            Self::LoadingSucceeded => "loadingSucceeded",
            Self::LoadingFailed(_) => "loadingFailed",
        }
    }
}

/// What `create_relationship` did with its candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationshipOutcome {
    /// A new relationship was added to the graph
    Created(RelationshipId),
    /// An equivalent relationship already existed
    Reused(RelationshipId),
    /// Nothing was added: an endpoint is missing or the type is hidden
    Suppressed,
}

impl RelationshipOutcome {
    pub fn relationship_id(&self) -> Option<&RelationshipId> {
        match self {
            Self::Created(id) | Self::Reused(id) => Some(id),
            Self::Suppressed => None,
        }
    }
}

/// Target of an outstanding provider request, used to drop stale results
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum RequestTarget {
    NodeData(Iri),
    RelationshipsOfType(RelationshipTypeId),
    Relationships,
}
