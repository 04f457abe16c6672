//! In-memory data provider over a static dataset

use super::{
    AttributeTypeInfo, DataProvider, Direction, FilterCriteria, ProviderResult, RelatedNodesQuery,
    RelationshipQuery, RelationshipTypeCount, RelationshipTypeInfo, TypeHierarchyEntry,
};
use crate::graph::{AttributeTypeId, Iri, NodeData, RelationshipData, RelationshipTypeId};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Everything a `MemoryProvider` can answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub nodes: Vec<NodeData>,
    #[serde(default)]
    pub relationships: Vec<RelationshipData>,
    #[serde(default)]
    pub relationship_types: Vec<RelationshipTypeInfo>,
    #[serde(default)]
    pub attribute_types: Vec<AttributeTypeInfo>,
    #[serde(default)]
    pub type_hierarchy: Vec<TypeHierarchyEntry>,
}

impl Dataset {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

/// A `DataProvider` answering from a `Dataset` held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    nodes: IndexMap<Iri, NodeData>,
    dataset: Dataset,
}

impl MemoryProvider {
    pub fn new(dataset: Dataset) -> Self {
        let nodes = dataset
            .nodes
            .iter()
            .map(|n| (n.id.clone(), n.clone()))
            .collect();
        Self { nodes, dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn node_or_placeholder(&self, id: &Iri) -> NodeData {
        self.nodes
            .get(id)
            .cloned()
            .unwrap_or_else(|| NodeData::placeholder(id.clone()))
    }
}

fn page<T>(items: Vec<T>, offset: usize, limit: Option<usize>) -> impl Iterator<Item = T> {
    items
        .into_iter()
        .skip(offset)
        .take(limit.unwrap_or(usize::MAX))
}

#[async_trait]
impl DataProvider for MemoryProvider {
    async fn node_info(&self, ids: &[Iri]) -> ProviderResult<HashMap<Iri, NodeData>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.nodes.get(id).map(|n| (id.clone(), n.clone())))
            .collect())
    }

    async fn relationships_info(&self, query: &RelationshipQuery) -> ProviderResult<Vec<RelationshipData>> {
        let nodes: HashSet<&Iri> = query.node_ids.iter().collect();
        Ok(self
            .dataset
            .relationships
            .iter()
            .filter(|r| nodes.contains(&r.source) && nodes.contains(&r.target))
            .filter(|r| query.type_ids.is_empty() || query.type_ids.contains(&r.type_id))
            .cloned()
            .collect())
    }

    async fn relationship_types_of(&self, node_id: &Iri) -> ProviderResult<Vec<RelationshipTypeCount>> {
        let mut counts: IndexMap<RelationshipTypeId, RelationshipTypeCount> = IndexMap::new();
        for r in &self.dataset.relationships {
            let is_out = &r.source == node_id;
            let is_in = &r.target == node_id;
            if !is_out && !is_in {
                continue;
            }
            let entry = counts
                .entry(r.type_id.clone())
                .or_insert_with(|| RelationshipTypeCount {
                    type_id: r.type_id.clone(),
                    in_count: 0,
                    out_count: 0,
                });
            if is_out {
                entry.out_count += 1;
            }
            if is_in {
                entry.in_count += 1;
            }
        }
        Ok(counts.into_values().collect())
    }

    async fn type_hierarchy(&self) -> ProviderResult<Vec<TypeHierarchyEntry>> {
        Ok(self.dataset.type_hierarchy.clone())
    }

    async fn relationship_types(&self) -> ProviderResult<Vec<RelationshipTypeInfo>> {
        Ok(self.dataset.relationship_types.clone())
    }

    async fn relationship_types_info(
        &self,
        ids: &[RelationshipTypeId],
    ) -> ProviderResult<HashMap<RelationshipTypeId, RelationshipTypeInfo>> {
        Ok(self
            .dataset
            .relationship_types
            .iter()
            .filter(|t| ids.contains(&t.id))
            .map(|t| (t.id.clone(), t.clone()))
            .collect())
    }

    async fn attribute_info(
        &self,
        ids: &[AttributeTypeId],
    ) -> ProviderResult<HashMap<AttributeTypeId, AttributeTypeInfo>> {
        Ok(self
            .dataset
            .attribute_types
            .iter()
            .filter(|a| ids.contains(&a.id))
            .map(|a| (a.id.clone(), a.clone()))
            .collect())
    }

    async fn filter(&self, criteria: &FilterCriteria) -> ProviderResult<HashMap<Iri, NodeData>> {
        let needle = criteria.text.as_ref().map(|t| t.to_lowercase());
        let matching: Vec<&NodeData> = self
            .nodes
            .values()
            .filter(|n| match &criteria.type_id {
                Some(type_id) => n.types.contains(type_id),
                None => true,
            })
            .filter(|n| match &needle {
                Some(needle) => {
                    n.id.as_str().to_lowercase().contains(needle)
                        || n.label.iter().any(|l| l.value.to_lowercase().contains(needle))
                }
                None => true,
            })
            .collect();
        Ok(page(matching, criteria.offset, criteria.limit)
            .map(|n| (n.id.clone(), n.clone()))
            .collect())
    }

    async fn related_nodes(&self, query: &RelatedNodesQuery) -> ProviderResult<HashMap<Iri, NodeData>> {
        let mut related: Vec<&Iri> = Vec::new();
        for r in &self.dataset.relationships {
            if let Some(type_id) = &query.relationship_type_id {
                if &r.type_id != type_id {
                    continue;
                }
            }
            let other = match query.direction {
                Some(Direction::Out) if r.source == query.node_id => &r.target,
                Some(Direction::In) if r.target == query.node_id => &r.source,
                None if r.source == query.node_id => &r.target,
                None if r.target == query.node_id => &r.source,
                _ => continue,
            };
            if !related.contains(&other) {
                related.push(other);
            }
        }
        Ok(page(related, query.offset, query.limit)
            .map(|id| (id.clone(), self.node_or_placeholder(id)))
            .collect())
    }
}
