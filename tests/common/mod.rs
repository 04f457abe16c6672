//! Common test utilities for the diagram model integration tests
//!
//! Provides a dataset fixture, a provider that records every call it
//! receives, and an event recorder for model subscriptions.

#![allow(dead_code)]

use async_trait::async_trait;
use semdiag::graph::{AttributeTypeId, GraphEvent, NodeId, RelationshipTypeId};
use semdiag::provider::{
    AttributeTypeInfo, FilterCriteria, RelatedNodesQuery, RelationshipQuery, RelationshipTypeCount,
    RelationshipTypeInfo, TypeHierarchyEntry,
};
use semdiag::{
    DataProvider, Dataset, DiagramModel, Iri, MemoryProvider, ModelEvent, NodeData, ProviderError,
    ProviderResult, RelationshipData,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const DATASET: &str = r#"
nodes:
  - id: "ex:alice"
    types: ["ex:Person"]
    label: [{ value: "Alice", lang: "en" }]
    attributes:
      "ex:email": [{ value: "alice@example.org" }]
  - id: "ex:bob"
    types: ["ex:Person"]
    label: [{ value: "Bob", lang: "en" }]
  - id: "ex:acme"
    types: ["ex:Company"]
    label: [{ value: "Acme" }]
relationships:
  - { type_id: "ex:knows", source: "ex:alice", target: "ex:bob" }
  - { type_id: "ex:worksAt", source: "ex:alice", target: "ex:acme" }
  - { type_id: "ex:worksAt", source: "ex:bob", target: "ex:acme" }
relationship_types:
  - { id: "ex:knows", label: [{ value: "knows" }] }
  - { id: "ex:worksAt", label: [{ value: "works at" }] }
attribute_types:
  - { id: "ex:email", label: [{ value: "email" }] }
type_hierarchy:
  - id: "ex:Agent"
    label: [{ value: "Agent" }]
    children:
      - { id: "ex:Person", label: [{ value: "Person" }], count: 2 }
      - { id: "ex:Company", label: [{ value: "Company" }], count: 1 }
"#;

pub fn dataset() -> Dataset {
    Dataset::from_yaml_str(DATASET).expect("fixture dataset parses")
}

/// A provider over the fixture dataset that records its calls
///
/// Each call is stored as its method name and the sorted keys it asked
/// for. `node_info` can be told to fail.
pub struct CountingProvider {
    inner: MemoryProvider,
    calls: Mutex<Vec<(&'static str, Vec<String>)>>,
    fail_node_info: AtomicBool,
}

impl Default for CountingProvider {
    fn default() -> Self {
        Self::new(dataset())
    }
}

impl CountingProvider {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            inner: MemoryProvider::new(dataset),
            calls: Mutex::new(Vec::new()),
            fail_node_info: AtomicBool::new(false),
        }
    }

    pub fn fail_node_info(&self, fail: bool) {
        self.fail_node_info.store(fail, Ordering::SeqCst);
    }

    /// Keys of every call made to `method`, in call order
    pub fn calls(&self, method: &str) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| *name == method)
            .map(|(_, keys)| keys.clone())
            .collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls(method).len()
    }

    fn record(&self, method: &'static str, keys: impl IntoIterator<Item = String>) {
        let mut keys: Vec<String> = keys.into_iter().collect();
        keys.sort();
        self.calls.lock().unwrap().push((method, keys));
    }
}

#[async_trait]
impl DataProvider for CountingProvider {
    async fn node_info(&self, ids: &[Iri]) -> ProviderResult<HashMap<Iri, NodeData>> {
        self.record("node_info", ids.iter().map(|id| id.to_string()));
        if self.fail_node_info.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("endpoint down".into()));
        }
        self.inner.node_info(ids).await
    }

    async fn relationships_info(&self, query: &RelationshipQuery) -> ProviderResult<Vec<RelationshipData>> {
        self.record(
            "relationships_info",
            query.type_ids.iter().map(|id| id.to_string()),
        );
        self.inner.relationships_info(query).await
    }

    async fn relationship_types_of(&self, node_id: &Iri) -> ProviderResult<Vec<RelationshipTypeCount>> {
        self.record("relationship_types_of", [node_id.to_string()]);
        self.inner.relationship_types_of(node_id).await
    }

    async fn type_hierarchy(&self) -> ProviderResult<Vec<TypeHierarchyEntry>> {
        self.record("type_hierarchy", Vec::new());
        self.inner.type_hierarchy().await
    }

    async fn relationship_types(&self) -> ProviderResult<Vec<RelationshipTypeInfo>> {
        self.record("relationship_types", Vec::new());
        self.inner.relationship_types().await
    }

    async fn relationship_types_info(
        &self,
        ids: &[RelationshipTypeId],
    ) -> ProviderResult<HashMap<RelationshipTypeId, RelationshipTypeInfo>> {
        self.record("relationship_types_info", ids.iter().map(|id| id.to_string()));
        self.inner.relationship_types_info(ids).await
    }

    async fn attribute_info(
        &self,
        ids: &[AttributeTypeId],
    ) -> ProviderResult<HashMap<AttributeTypeId, AttributeTypeInfo>> {
        self.record("attribute_info", ids.iter().map(|id| id.to_string()));
        self.inner.attribute_info(ids).await
    }

    async fn filter(&self, criteria: &FilterCriteria) -> ProviderResult<HashMap<Iri, NodeData>> {
        self.record("filter", criteria.text.clone());
        self.inner.filter(criteria).await
    }

    async fn related_nodes(&self, query: &RelatedNodesQuery) -> ProviderResult<HashMap<Iri, NodeData>> {
        self.record("related_nodes", [query.node_id.to_string()]);
        self.inner.related_nodes(query).await
    }
}

/// Model over a fresh `CountingProvider`
pub fn model() -> (DiagramModel, Arc<CountingProvider>) {
    let provider = Arc::new(CountingProvider::default());
    (DiagramModel::new(provider.clone()), provider)
}

/// Collects model events as they fire
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<ModelEvent>>>,
}

impl Recorder {
    pub fn attach(model: &DiagramModel) -> Self {
        let recorder = Self::default();
        let events = recorder.events.clone();
        model.subscribe(move |event| events.lock().unwrap().push(event.clone()));
        recorder
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.key()).collect()
    }

    pub fn count(&self, key: &str) -> usize {
        self.keys().into_iter().filter(|k| *k == key).count()
    }

    /// Node events with `key` fired for `node`
    pub fn node_events(&self, node: &NodeId, key: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| match event {
                ModelEvent::Graph(GraphEvent::Node { id, event }) => id == node && event.key() == key,
                _ => false,
            })
            .count()
    }

    pub fn failures(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                ModelEvent::LoadingFailed(err) => Some(err.to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}
