//! Moving diagrams in and out of the layout exchange format

use super::diagram::{place_relationship, DiagramModel};
use super::layout::{CellRef, LayoutData, LayoutNode, LayoutRelationship, RelationshipTypeOptions};
use super::ModelEvent;
use crate::graph::{Iri, ModelResult, Node, Relationship, RelationshipData};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

impl DiagramModel {
    /// Snapshot the diagram
    ///
    /// Only visibility settings that differ from the defaults are kept,
    /// including overrides for types that were never created.
    pub fn export_layout(&self) -> LayoutData {
        let graph = self.inner.graph.lock().unwrap();
        let nodes = graph
            .nodes()
            .map(|n| LayoutNode {
                id: n.id().clone(),
                identity: n.identity().clone(),
                position: n.position(),
                size: (!n.size().is_zero()).then(|| n.size()),
                expanded: n.expanded().then_some(true),
                group: n.group().map(String::from),
            })
            .collect();
        let relationships = graph
            .relationships()
            .map(|r| LayoutRelationship {
                id: r.id().clone(),
                type_id: r.type_id().clone(),
                source: CellRef {
                    id: r.source_id().clone(),
                },
                target: CellRef {
                    id: r.target_id().clone(),
                },
                vertices: r.vertices().to_vec(),
            })
            .collect();

        let mut relationship_type_options: Vec<RelationshipTypeOptions> = graph
            .relationship_types()
            .map(|t| RelationshipTypeOptions {
                type_id: t.id().clone(),
                visible: t.visible(),
                show_label: t.show_label(),
            })
            .chain(self.inner.type_options.iter().map(|entry| entry.value().clone()))
            .filter(|options| !options.is_default())
            .collect();
        relationship_type_options.sort_by(|a, b| a.type_id.cmp(&b.type_id));

        LayoutData {
            nodes,
            relationships,
            relationship_type_options,
        }
    }

    /// Replace the diagram with `layout`
    ///
    /// The history is reset and requests in flight are abandoned. Nodes
    /// arrive as placeholders and relationships as layout-only, then node
    /// data and relationships are fetched. Fires `LoadingStarted` followed
    /// by `LoadingSucceeded` or `LoadingFailed`.
    pub async fn import_layout(&self, layout: LayoutData) -> ModelResult<()> {
        info!(
            nodes = layout.nodes.len(),
            relationships = layout.relationships.len(),
            "importing layout"
        );
        self.emit(ModelEvent::LoadingStarted);
        match self.import(layout).await {
            Ok(()) => {
                info!("layout loaded");
                self.emit(ModelEvent::LoadingSucceeded);
                Ok(())
            }
            Err(err) => {
                self.report_failure(err.clone());
                Err(err)
            }
        }
    }

    async fn import(&self, layout: LayoutData) -> ModelResult<()> {
        let hydration = {
            let _hold = self.hold_requests();
            let identities = self.populate(layout)?;
            self.fetch_node_data(identities)
        };
        hydration.await?;
        self.request_relationships(None).await?;
        if self.inner.config.hide_unused_relationship_types {
            let hidden = self.hide_unused_relationship_types()?;
            debug!(hidden, "hid unused relationship types");
        }
        Ok(())
    }

    /// Rebuild the graph from `layout`, returning the identities to hydrate
    fn populate(&self, layout: LayoutData) -> ModelResult<Vec<Iri>> {
        self.inner.history.lock().unwrap().reset();
        self.supersede_requests();
        self.inner.type_options.clear();
        self.apply_relationship_type_options(layout.relationship_type_options)?;

        let type_ids: BTreeSet<_> = layout.relationships.iter().map(|r| r.type_id.clone()).collect();
        for type_id in &type_ids {
            self.create_relationship_type(type_id)?;
        }

        let default_size = self.inner.config.default_node_size;
        let mut graph = self.inner.graph.lock().unwrap();
        graph.clear();

        let mut seen = HashSet::new();
        let mut identities = Vec::new();
        for cell in layout.nodes {
            if seen.insert(cell.identity.clone()) {
                identities.push(cell.identity.clone());
            }
            let node = Node::placeholder(cell.id, cell.identity)
                .with_position(cell.position)
                .with_size(cell.size.unwrap_or(default_size))
                .with_expanded(cell.expanded.unwrap_or(false))
                .with_group(cell.group);
            graph.add_node(node)?;
        }

        for cell in layout.relationships {
            let endpoints = (
                graph.node(&cell.source.id).map(|n| n.identity().clone()),
                graph.node(&cell.target.id).map(|n| n.identity().clone()),
            );
            let (Some(source), Some(target)) = endpoints else {
                warn!(relationship = %cell.id, "skipping relationship with a missing endpoint");
                continue;
            };
            let relationship = Relationship::new(
                cell.id,
                cell.source.id,
                cell.target.id,
                RelationshipData::new(cell.type_id, source, target),
            )
            .with_vertices(cell.vertices)
            .with_layout_only(true);
            place_relationship(&mut graph, None, relationship)?;
        }
        Ok(identities)
    }
}
