//! Core diagram data structures

mod container;
mod error;
mod events;
mod ids;
mod node;
mod relationship;
mod types;


pub use container::Graph;
pub use error::{ModelError, ModelResult};
pub use events::{CellsChange, EntityKind, EventEmitter, GraphEvent, SubscriptionId};
pub use ids::{AttributeTypeId, Iri, NodeId, RelationshipId, RelationshipTypeId, TypeNodeId};
pub use node::{Attributes, Label, LocalizedString, Node, NodeData, NodeEvent, Point, Size};
pub use relationship::{Relationship, RelationshipData, RelationshipEvent};
pub use types::{
    AttributeType, AttributeTypeEvent, RelationshipType, RelationshipTypeEvent, TypeHierarchyEvent,
    TypeHierarchyNode,
};
