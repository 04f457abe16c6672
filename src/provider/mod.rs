//! Data provider contract
//!
//! The model never talks to a transport directly. Everything it knows
//! about entities comes through a `DataProvider` supplied by the host.

mod memory;

pub use memory::{Dataset, MemoryProvider};

use crate::graph::{
    AttributeTypeId, Iri, Label, NodeData, RelationshipData, RelationshipTypeId, TypeNodeId,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors reported by a data provider
///
/// Cloneable so one failed batch can be reported to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("provider error: {0}")]
    Internal(String),
    #[error("request cancelled")]
    Cancelled,
}

/// Result type for provider calls
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Direction of a relationship relative to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

/// Which relationships to fetch
///
/// Only relationships with both endpoints in `node_ids` are returned. An
/// empty `type_ids` means every type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipQuery {
    pub node_ids: Vec<Iri>,
    #[serde(default)]
    pub type_ids: Vec<RelationshipTypeId>,
}

/// Relationship type usage around one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipTypeCount {
    pub type_id: RelationshipTypeId,
    pub in_count: usize,
    pub out_count: usize,
}

/// One node of the type hierarchy as delivered by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeHierarchyEntry {
    pub id: TypeNodeId,
    #[serde(default)]
    pub label: Label,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TypeHierarchyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipTypeInfo {
    pub id: RelationshipTypeId,
    #[serde(default)]
    pub label: Label,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeTypeInfo {
    pub id: AttributeTypeId,
    #[serde(default)]
    pub label: Label,
}

/// Search criteria for `DataProvider::filter`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Case-insensitive substring of a label or the identity
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub type_id: Option<TypeNodeId>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_type(mut self, type_id: impl Into<TypeNodeId>) -> Self {
        self.type_id = Some(type_id.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Parameters for `DataProvider::related_nodes`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedNodesQuery {
    pub node_id: Iri,
    #[serde(default)]
    pub relationship_type_id: Option<RelationshipTypeId>,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl RelatedNodesQuery {
    pub fn new(node_id: impl Into<Iri>) -> Self {
        Self {
            node_id: node_id.into(),
            relationship_type_id: None,
            direction: None,
            offset: 0,
            limit: None,
        }
    }

    pub fn with_type(mut self, type_id: impl Into<RelationshipTypeId>) -> Self {
        self.relationship_type_id = Some(type_id.into());
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }
}

/// Source of entity data for the diagram model
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Payloads for the given nodes; unknown ids are left out
    async fn node_info(&self, ids: &[Iri]) -> ProviderResult<HashMap<Iri, NodeData>>;

    async fn relationships_info(&self, query: &RelationshipQuery) -> ProviderResult<Vec<RelationshipData>>;

    async fn relationship_types_of(&self, node_id: &Iri) -> ProviderResult<Vec<RelationshipTypeCount>>;

    /// Roots of the type hierarchy
    async fn type_hierarchy(&self) -> ProviderResult<Vec<TypeHierarchyEntry>>;

    async fn relationship_types(&self) -> ProviderResult<Vec<RelationshipTypeInfo>>;

    async fn relationship_types_info(
        &self,
        ids: &[RelationshipTypeId],
    ) -> ProviderResult<HashMap<RelationshipTypeId, RelationshipTypeInfo>>;

    async fn attribute_info(
        &self,
        ids: &[AttributeTypeId],
    ) -> ProviderResult<HashMap<AttributeTypeId, AttributeTypeInfo>>;

    async fn filter(&self, criteria: &FilterCriteria) -> ProviderResult<HashMap<Iri, NodeData>>;

    async fn related_nodes(&self, query: &RelatedNodesQuery) -> ProviderResult<HashMap<Iri, NodeData>>;
}
