//! Request coalescing between the model and the data provider

mod coalescer;

pub use coalescer::{BatchFetch, FetchCoalescer, FetchHold};

use crate::graph::{AttributeTypeId, Iri, NodeData, RelationshipTypeId};
use crate::provider::{AttributeTypeInfo, DataProvider, RelationshipTypeInfo};
use futures::FutureExt;
use std::sync::Arc;

/// One independent coalescing queue per request kind
#[derive(Clone)]
pub struct DataFetcher {
    pub nodes: FetchCoalescer<Iri, NodeData>,
    pub relationship_types: FetchCoalescer<RelationshipTypeId, RelationshipTypeInfo>,
    pub attribute_types: FetchCoalescer<AttributeTypeId, AttributeTypeInfo>,
}

impl DataFetcher {
    pub fn new(provider: Arc<dyn DataProvider>) -> Self {
        let p = provider.clone();
        let nodes = FetchCoalescer::new(
            "nodes",
            Arc::new(move |ids: Vec<Iri>| {
                let p = p.clone();
                async move { p.node_info(&ids).await }.boxed()
            }),
        );

        let p = provider.clone();
        let relationship_types = FetchCoalescer::new(
            "relationship_types",
            Arc::new(move |ids: Vec<RelationshipTypeId>| {
                let p = p.clone();
                async move { p.relationship_types_info(&ids).await }.boxed()
            }),
        );

        let p = provider;
        let attribute_types = FetchCoalescer::new(
            "attribute_types",
            Arc::new(move |ids: Vec<AttributeTypeId>| {
                let p = p.clone();
                async move { p.attribute_info(&ids).await }.boxed()
            }),
        );

        Self {
            nodes,
            relationship_types,
            attribute_types,
        }
    }

    /// Hold every queue so pushes made until the hold drops share batches
    pub fn hold(&self) -> FetchHold {
        self.nodes
            .hold()
            .merge(self.relationship_types.hold())
            .merge(self.attribute_types.hold())
    }
}
