//! semdiag: Semantic Diagram Model
//!
//! An in-memory model of a diagram over a semantic data source. Diagram
//! nodes show resources identified by IRIs, relationships connect them,
//! and everything the diagram knows about a resource is fetched lazily
//! from a pluggable data provider.
//!
//! # Core Concepts
//!
//! - **Graph**: Nodes, relationships and type descriptors with change events
//! - **History**: Invertible commands with undo, redo and batches
//! - **Fetch**: Coalescing of per-entity requests into batched provider calls
//! - **DiagramModel**: The orchestrator tying the three to a data provider
//!
//! # Example
//!
//! ```
//! use semdiag::{Dataset, DiagramModel, MemoryProvider};
//! use std::sync::Arc;
//!
//! let provider = Arc::new(MemoryProvider::new(Dataset::default()));
//! let model = DiagramModel::new(provider);
//! assert!(!model.can_undo());
//! ```

pub mod config;
pub mod fetch;
pub mod graph;
pub mod history;
pub mod model;
pub mod provider;

pub use config::{ConfigError, ModelConfig};
pub use graph::{
    AttributeTypeId, CellsChange, EntityKind, Graph, GraphEvent, Iri, ModelError, ModelResult, Node,
    NodeData, NodeId, Point, Relationship, RelationshipData, RelationshipId, RelationshipType,
    RelationshipTypeId, Size, TypeNodeId,
};
pub use history::{commands, Command, History, HistoryError, NoopHistory, UndoStack};
pub use model::{DiagramModel, LayoutData, ModelEvent, RelationshipOutcome, RelationshipTypeOptions};
pub use provider::{DataProvider, Dataset, MemoryProvider, ProviderError, ProviderResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
