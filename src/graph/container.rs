//! Graph: owner of every diagram entity and of node/relationship adjacency
//!
//! Entities live in insertion-ordered maps; cross-references are ids
//! resolved through the graph. Every mutation runs to completion and
//! dispatches its events before returning.

use super::error::{ModelError, ModelResult};
use super::events::{CellsChange, EntityKind, EventEmitter, GraphEvent, SubscriptionId};
use super::ids::{AttributeTypeId, Iri, NodeId, RelationshipId, RelationshipTypeId, TypeNodeId};
use super::node::{Node, NodeEvent};
use super::relationship::{Relationship, RelationshipData, RelationshipEvent};
use super::types::{
    AttributeType, AttributeTypeEvent, RelationshipType, RelationshipTypeEvent, TypeHierarchyEvent,
    TypeHierarchyNode,
};
use indexmap::IndexMap;

/// Container for the cells and type descriptors of one diagram
#[derive(Debug, Default)]
pub struct Graph {
    nodes: IndexMap<NodeId, Node>,
    relationships: IndexMap<RelationshipId, Relationship>,
    relationship_types: IndexMap<RelationshipTypeId, RelationshipType>,
    type_nodes: IndexMap<TypeNodeId, TypeHierarchyNode>,
    attribute_types: IndexMap<AttributeTypeId, AttributeType>,
    /// Next display index for relationship types, scoped to this graph
    next_type_index: u32,
    emitter: EventEmitter<GraphEvent>,
}

impl Graph {
    /// Create an empty graph with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every graph event
    pub fn subscribe(&mut self, listener: impl Fn(&GraphEvent) + Send + Sync + 'static) -> SubscriptionId {
        self.emitter.subscribe(listener)
    }

    /// Remove a listener; returns false if it was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.emitter.unsubscribe(id)
    }

    fn emit(&self, event: GraphEvent) {
        self.emitter.emit(&event);
    }

    // --- Nodes ---

    /// Insert a node; its adjacency list starts empty
    pub fn add_node(&mut self, mut node: Node) -> ModelResult<()> {
        if self.nodes.contains_key(node.id()) {
            return Err(ModelError::duplicate(EntityKind::Node, node.id()));
        }
        node.clear_relationships();
        let id = node.id().clone();
        self.nodes.insert(id.clone(), node);
        self.emit(GraphEvent::CellsChanged(CellsChange::NodeAdded(id)));
        Ok(())
    }

    /// Remove a node together with every incident relationship
    ///
    /// Fires a single `NodeRemoved` event carrying the cascaded
    /// relationships.
    pub fn remove_node(&mut self, id: &NodeId) -> ModelResult<(Node, Vec<Relationship>)> {
        let incident = self
            .nodes
            .get(id)
            .ok_or_else(|| ModelError::UnknownNode(id.clone()))?
            .relationships()
            .to_vec();

        let mut removed = Vec::with_capacity(incident.len());
        for relationship_id in &incident {
            removed.push(self.detach_relationship(relationship_id, true)?);
        }

        let node = self
            .nodes
            .shift_remove(id)
            .ok_or_else(|| ModelError::UnknownNode(id.clone()))?;
        self.emit(GraphEvent::CellsChanged(CellsChange::NodeRemoved {
            node: node.clone(),
            relationships: removed.clone(),
        }));
        Ok((node, removed))
    }

    /// Apply a setter to a node and dispatch the event it returns
    ///
    /// Returns whether anything changed.
    pub fn update_node<F>(&mut self, id: &NodeId, update: F) -> ModelResult<bool>
    where
        F: FnOnce(&mut Node) -> Option<NodeEvent>,
    {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| ModelError::UnknownNode(id.clone()))?;
        match update(node) {
            Some(event) => {
                self.emit(GraphEvent::Node {
                    id: id.clone(),
                    event,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Get a node by id
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Check whether a node with this id is present
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Iterate over nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes showing the given semantic identity
    pub fn nodes_by_identity<'a>(&'a self, identity: &'a Iri) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.values().filter(move |n| n.identity() == identity)
    }

    // --- Relationships ---

    /// Insert a relationship and attach it to both endpoints
    pub fn add_relationship(&mut self, relationship: Relationship) -> ModelResult<()> {
        if self.relationships.contains_key(relationship.id()) {
            return Err(ModelError::duplicate(EntityKind::Relationship, relationship.id()));
        }
        if !self.relationship_types.contains_key(relationship.type_id()) {
            return Err(ModelError::UnknownType(relationship.type_id().clone()));
        }
        for endpoint in [relationship.source_id(), relationship.target_id()] {
            if !self.nodes.contains_key(endpoint) {
                return Err(ModelError::UnknownNode(endpoint.clone()));
            }
        }

        let id = relationship.id().clone();
        let source = relationship.source_id().clone();
        let target = relationship.target_id().clone();
        self.attach(&id, &source, &target);
        self.relationships.insert(id.clone(), relationship);

        self.emit(GraphEvent::CellsChanged(CellsChange::RelationshipAdded(id)));
        self.emit_adjacency(&source, &target);
        Ok(())
    }

    /// Remove a relationship and detach it from both endpoints
    pub fn remove_relationship(&mut self, id: &RelationshipId) -> ModelResult<Relationship> {
        self.detach_relationship(id, false)
    }

    /// Remove a relationship without dispatching any event
    pub fn remove_relationship_silent(&mut self, id: &RelationshipId) -> ModelResult<Relationship> {
        self.detach_relationship(id, true)
    }

    fn detach_relationship(&mut self, id: &RelationshipId, silent: bool) -> ModelResult<Relationship> {
        let relationship = self
            .relationships
            .shift_remove(id)
            .ok_or_else(|| ModelError::UnknownRelationship(id.clone()))?;
        let source = relationship.source_id().clone();
        let target = relationship.target_id().clone();
        self.detach(id, &source, &target);

        if !silent {
            self.emit(GraphEvent::CellsChanged(CellsChange::RelationshipRemoved(
                relationship.clone(),
            )));
            self.emit_adjacency(&source, &target);
        }
        Ok(relationship)
    }

    /// Point a relationship at new endpoints with a new identity triple
    ///
    /// Returns the previous source, target and payload.
    pub fn retarget_relationship(
        &mut self,
        id: &RelationshipId,
        source_id: NodeId,
        target_id: NodeId,
        data: RelationshipData,
    ) -> ModelResult<(NodeId, NodeId, RelationshipData)> {
        if !self.relationships.contains_key(id) {
            return Err(ModelError::UnknownRelationship(id.clone()));
        }
        if !self.relationship_types.contains_key(&data.type_id) {
            return Err(ModelError::UnknownType(data.type_id.clone()));
        }
        for endpoint in [&source_id, &target_id] {
            if !self.nodes.contains_key(endpoint) {
                return Err(ModelError::UnknownNode(endpoint.clone()));
            }
        }

        let relationship = self
            .relationships
            .get_mut(id)
            .ok_or_else(|| ModelError::UnknownRelationship(id.clone()))?;
        let previous = relationship.retarget(source_id.clone(), target_id.clone(), data);
        self.detach(id, &previous.0, &previous.1);
        self.attach(id, &source_id, &target_id);

        self.emit(GraphEvent::Relationship {
            id: id.clone(),
            event: RelationshipEvent::DataChanged {
                previous: previous.2.clone(),
            },
        });
        self.emit_adjacency(&previous.0, &previous.1);
        if (&source_id, &target_id) != (&previous.0, &previous.1) {
            self.emit_adjacency(&source_id, &target_id);
        }
        Ok(previous)
    }

    /// Apply `update` to a relationship and dispatch the event it returns
    ///
    /// Returns whether anything changed.
    pub fn update_relationship<F>(&mut self, id: &RelationshipId, update: F) -> ModelResult<bool>
    where
        F: FnOnce(&mut Relationship) -> ModelResult<Option<RelationshipEvent>>,
    {
        let relationship = self
            .relationships
            .get_mut(id)
            .ok_or_else(|| ModelError::UnknownRelationship(id.clone()))?;
        match update(relationship)? {
            Some(event) => {
                self.emit(GraphEvent::Relationship {
                    id: id.clone(),
                    event,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Get a relationship by id
    pub fn relationship(&self, id: &RelationshipId) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    /// Iterate over relationships in insertion order
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    /// Number of relationships in the graph
    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Relationships incident to a node, in attachment order
    pub fn relationships_of<'a>(&'a self, node: &NodeId) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.nodes
            .get(node)
            .map(|n| n.relationships())
            .unwrap_or(&[])
            .iter()
            .filter_map(|id| self.relationships.get(id))
    }

    /// Relationships whose type is `type_id`
    pub fn relationships_of_type<'a>(
        &'a self,
        type_id: &'a RelationshipTypeId,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships.values().filter(move |r| r.type_id() == type_id)
    }

    /// Look up the relationship of `type_id` from `source` to `target`
    pub fn find_relationship(
        &self,
        type_id: &RelationshipTypeId,
        source: &NodeId,
        target: &NodeId,
    ) -> Option<&Relationship> {
        self.relationships_of(source)
            .find(|r| r.type_id() == type_id && r.source_id() == source && r.target_id() == target)
    }

    fn attach(&mut self, id: &RelationshipId, source: &NodeId, target: &NodeId) {
        if let Some(node) = self.nodes.get_mut(source) {
            node.attach_relationship(id.clone());
        }
        if target != source {
            if let Some(node) = self.nodes.get_mut(target) {
                node.attach_relationship(id.clone());
            }
        }
    }

    fn detach(&mut self, id: &RelationshipId, source: &NodeId, target: &NodeId) {
        for endpoint in [source, target] {
            if let Some(node) = self.nodes.get_mut(endpoint) {
                node.detach_relationship(id);
            }
        }
    }

    fn emit_adjacency(&self, source: &NodeId, target: &NodeId) {
        self.emit(GraphEvent::Node {
            id: source.clone(),
            event: NodeEvent::RelationshipsChanged,
        });
        if target != source {
            self.emit(GraphEvent::Node {
                id: target.clone(),
                event: NodeEvent::RelationshipsChanged,
            });
        }
    }

    /// Drop every node and relationship; type descriptors are kept
    pub fn clear(&mut self) {
        self.relationships.clear();
        self.nodes.clear();
        self.emit(GraphEvent::CellsChanged(CellsChange::Cleared));
    }

    // --- Relationship types ---

    /// Register a relationship type and assign its display index
    pub fn add_relationship_type(&mut self, mut relationship_type: RelationshipType) -> ModelResult<()> {
        if self.relationship_types.contains_key(relationship_type.id()) {
            return Err(ModelError::duplicate(
                EntityKind::RelationshipType,
                relationship_type.id(),
            ));
        }
        relationship_type.assign_index(self.next_type_index)?;
        self.next_type_index += 1;
        self.relationship_types
            .insert(relationship_type.id().clone(), relationship_type);
        Ok(())
    }

    /// Apply `update` to a relationship type and dispatch the event it returns
    pub fn update_relationship_type<F>(&mut self, id: &RelationshipTypeId, update: F) -> ModelResult<bool>
    where
        F: FnOnce(&mut RelationshipType) -> Option<RelationshipTypeEvent>,
    {
        let relationship_type = self
            .relationship_types
            .get_mut(id)
            .ok_or_else(|| ModelError::UnknownType(id.clone()))?;
        match update(relationship_type) {
            Some(event) => {
                self.emit(GraphEvent::RelationshipType {
                    id: id.clone(),
                    event,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Get a relationship type by id
    pub fn relationship_type(&self, id: &RelationshipTypeId) -> Option<&RelationshipType> {
        self.relationship_types.get(id)
    }

    /// Iterate over registered relationship types
    pub fn relationship_types(&self) -> impl Iterator<Item = &RelationshipType> {
        self.relationship_types.values()
    }

    // --- Type hierarchy ---

    /// Register a type hierarchy node; link it with `set_type_base`
    pub fn add_type_hierarchy_node(&mut self, node: TypeHierarchyNode) -> ModelResult<()> {
        if self.type_nodes.contains_key(node.id()) {
            return Err(ModelError::duplicate(EntityKind::TypeHierarchyNode, node.id()));
        }
        self.type_nodes.insert(node.id().clone(), node);
        Ok(())
    }

    /// Reparent a type node, updating both the old and new parent
    ///
    /// Returns `false` when the parent is unchanged.
    pub fn set_type_base(&mut self, id: &TypeNodeId, base: Option<TypeNodeId>) -> ModelResult<bool> {
        let current = self
            .type_nodes
            .get(id)
            .ok_or_else(|| ModelError::unknown(EntityKind::TypeHierarchyNode, id))?
            .base()
            .cloned();
        if current == base {
            return Ok(false);
        }

        if let Some(new_base) = &base {
            if !self.type_nodes.contains_key(new_base) {
                return Err(ModelError::unknown(EntityKind::TypeHierarchyNode, new_base));
            }
            let mut cursor = Some(new_base.clone());
            while let Some(ancestor) = cursor {
                if &ancestor == id {
                    return Err(ModelError::HierarchyCycle {
                        id: id.clone(),
                        base: new_base.clone(),
                    });
                }
                cursor = self.type_nodes.get(&ancestor).and_then(|n| n.base().cloned());
            }
        }

        if let Some(old_base) = &current {
            if let Some(parent) = self.type_nodes.get_mut(old_base) {
                parent.remove_derived(id);
            }
        }
        if let Some(new_base) = &base {
            if let Some(parent) = self.type_nodes.get_mut(new_base) {
                parent.insert_derived(id.clone());
            }
        }
        if let Some(node) = self.type_nodes.get_mut(id) {
            node.replace_base(base.clone());
        }

        for parent in [&current, &base].into_iter().flatten() {
            self.emit(GraphEvent::TypeHierarchy {
                id: parent.clone(),
                event: TypeHierarchyEvent::DerivedChanged,
            });
        }
        self.emit(GraphEvent::TypeHierarchy {
            id: id.clone(),
            event: TypeHierarchyEvent::BaseChanged { previous: current },
        });
        Ok(true)
    }

    /// Apply `update` to a type hierarchy node and dispatch the event it returns
    pub fn update_type_hierarchy_node<F>(&mut self, id: &TypeNodeId, update: F) -> ModelResult<bool>
    where
        F: FnOnce(&mut TypeHierarchyNode) -> Option<TypeHierarchyEvent>,
    {
        let node = self
            .type_nodes
            .get_mut(id)
            .ok_or_else(|| ModelError::unknown(EntityKind::TypeHierarchyNode, id))?;
        match update(node) {
            Some(event) => {
                self.emit(GraphEvent::TypeHierarchy {
                    id: id.clone(),
                    event,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Get a type hierarchy node by id
    pub fn type_hierarchy_node(&self, id: &TypeNodeId) -> Option<&TypeHierarchyNode> {
        self.type_nodes.get(id)
    }

    /// Iterate over type hierarchy nodes
    pub fn type_hierarchy_nodes(&self) -> impl Iterator<Item = &TypeHierarchyNode> {
        self.type_nodes.values()
    }

    // --- Attribute types ---

    /// Register an attribute type; fails if the id is taken
    pub fn add_attribute_type(&mut self, attribute_type: AttributeType) -> ModelResult<()> {
        if self.attribute_types.contains_key(attribute_type.id()) {
            return Err(ModelError::duplicate(EntityKind::AttributeType, attribute_type.id()));
        }
        self.attribute_types
            .insert(attribute_type.id().clone(), attribute_type);
        Ok(())
    }

    /// Apply `update` to an attribute type and dispatch the event it returns
    pub fn update_attribute_type<F>(&mut self, id: &AttributeTypeId, update: F) -> ModelResult<bool>
    where
        F: FnOnce(&mut AttributeType) -> Option<AttributeTypeEvent>,
    {
        let attribute_type = self
            .attribute_types
            .get_mut(id)
            .ok_or_else(|| ModelError::unknown(EntityKind::AttributeType, id))?;
        match update(attribute_type) {
            Some(event) => {
                self.emit(GraphEvent::AttributeType {
                    id: id.clone(),
                    event,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Get an attribute type by id
    pub fn attribute_type(&self, id: &AttributeTypeId) -> Option<&AttributeType> {
        self.attribute_types.get(id)
    }

    pub fn attribute_types(&self) -> impl Iterator<Item = &AttributeType> {
        self.attribute_types.values()
    }
}
