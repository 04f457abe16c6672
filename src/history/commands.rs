//! Primitive commands for every undoable graph edit

use super::command::Command;
use crate::graph::{
    Graph, ModelError, ModelResult, Node, NodeData, NodeId, Point, Relationship, RelationshipData,
    RelationshipId, RelationshipTypeId, Size,
};
use tracing::debug;

pub fn add_node(node: Node) -> Command {
    Command::primitive("Add node", move |graph| {
        graph.add_node(node.clone())?;
        Ok(remove_node(node.id().clone()))
    })
}

/// Remove a node; the inverse restores it with its cascaded relationships
pub fn remove_node(id: NodeId) -> Command {
    Command::primitive("Remove node", move |graph| {
        let (node, relationships) = graph.remove_node(&id)?;
        Ok(restore_node(node, relationships))
    })
}

/// Relationships of a type hidden since they were removed stay out
fn restore_node(node: Node, relationships: Vec<Relationship>) -> Command {
    Command::primitive("Restore node", move |graph| {
        graph.add_node(node.clone())?;
        for relationship in &relationships {
            if type_hidden(graph, relationship) {
                debug!(relationship = %relationship.id(), "not restoring relationship of hidden type");
                continue;
            }
            graph.add_relationship(relationship.clone())?;
        }
        Ok(remove_node(node.id().clone()))
    })
}

/// Add a relationship unless its type is hidden
///
/// A suppressed addition inverts to a command that changes nothing and
/// tries the addition again when reapplied.
pub fn add_relationship(relationship: Relationship) -> Command {
    Command::primitive("Add relationship", move |graph| {
        if type_hidden(graph, &relationship) {
            debug!(relationship = %relationship.id(), "relationship type hidden, addition suppressed");
            return Ok(suppressed_addition(relationship.clone()));
        }
        graph.add_relationship(relationship.clone())?;
        Ok(remove_relationship(relationship.id().clone()))
    })
}

fn suppressed_addition(relationship: Relationship) -> Command {
    Command::primitive("Remove relationship", move |_graph| {
        Ok(add_relationship(relationship.clone()))
    })
}

pub fn remove_relationship(id: RelationshipId) -> Command {
    Command::primitive("Remove relationship", move |graph| {
        let relationship = graph.remove_relationship(&id)?;
        Ok(add_relationship(relationship))
    })
}

fn type_hidden(graph: &Graph, relationship: &Relationship) -> bool {
    graph
        .relationship_type(relationship.type_id())
        .map_or(false, |t| !t.visible())
}

pub fn set_node_position(id: NodeId, position: Point) -> Command {
    Command::primitive("Move node", move |graph| {
        let previous = graph
            .node(&id)
            .ok_or_else(|| ModelError::UnknownNode(id.clone()))?
            .position();
        graph.update_node(&id, |n| n.set_position(position))?;
        Ok(set_node_position(id.clone(), previous))
    })
}

pub fn set_node_size(id: NodeId, size: Size) -> Command {
    Command::primitive("Resize node", move |graph| {
        let previous = graph
            .node(&id)
            .ok_or_else(|| ModelError::UnknownNode(id.clone()))?
            .size();
        graph.update_node(&id, |n| n.set_size(size))?;
        Ok(set_node_size(id.clone(), previous))
    })
}

pub fn set_node_expanded(id: NodeId, expanded: bool) -> Command {
    let description = if expanded { "Expand node" } else { "Collapse node" };
    Command::primitive(description, move |graph| {
        let previous = graph
            .node(&id)
            .ok_or_else(|| ModelError::UnknownNode(id.clone()))?
            .expanded();
        graph.update_node(&id, |n| n.set_expanded(expanded))?;
        Ok(set_node_expanded(id.clone(), previous))
    })
}

pub fn set_node_data(id: NodeId, data: NodeData) -> Command {
    Command::primitive("Change node data", move |graph| {
        let previous = graph
            .node(&id)
            .ok_or_else(|| ModelError::UnknownNode(id.clone()))?
            .data()
            .clone();
        graph.update_node(&id, |n| n.set_data(data.clone()))?;
        Ok(set_node_data(id.clone(), previous))
    })
}

pub fn set_relationship_vertices(id: RelationshipId, vertices: Vec<Point>) -> Command {
    Command::primitive("Change relationship vertices", move |graph| {
        let previous = graph
            .relationship(&id)
            .ok_or_else(|| ModelError::UnknownRelationship(id.clone()))?
            .vertices()
            .to_vec();
        graph.update_relationship(&id, |r| Ok(r.set_vertices(vertices.clone())))?;
        Ok(set_relationship_vertices(id.clone(), previous))
    })
}

/// Replace attribute values; the identity triple must stay the same
pub fn set_relationship_data(id: RelationshipId, data: RelationshipData) -> Command {
    Command::primitive("Change relationship data", move |graph| {
        let previous = graph
            .relationship(&id)
            .ok_or_else(|| ModelError::UnknownRelationship(id.clone()))?
            .data()
            .clone();
        graph.update_relationship(&id, |r| r.set_data(data.clone()))?;
        Ok(set_relationship_data(id.clone(), previous))
    })
}

/// Re-point a relationship to other endpoints and identity
pub fn retarget_relationship(
    id: RelationshipId,
    source_id: NodeId,
    target_id: NodeId,
    data: RelationshipData,
) -> Command {
    Command::primitive("Change relationship endpoints", move |graph| {
        let (source, target, previous) =
            graph.retarget_relationship(&id, source_id.clone(), target_id.clone(), data.clone())?;
        Ok(retarget_relationship(id.clone(), source, target, previous))
    })
}

/// Show or hide a relationship type
///
/// Hiding removes every relationship of the type; the inverse shows the
/// type again and puts those relationships back.
pub fn set_relationship_type_visibility(id: RelationshipTypeId, visible: bool, show_label: bool) -> Command {
    change_relationship_type_visibility(id, visible, show_label, Vec::new())
}

fn change_relationship_type_visibility(
    id: RelationshipTypeId,
    visible: bool,
    show_label: bool,
    restore: Vec<Relationship>,
) -> Command {
    let description = if visible {
        "Show relationship type"
    } else {
        "Hide relationship type"
    };
    Command::primitive(description, move |graph| {
        let relationship_type = graph
            .relationship_type(&id)
            .ok_or_else(|| ModelError::UnknownType(id.clone()))?;
        let previous = (relationship_type.visible(), relationship_type.show_label());
        graph.update_relationship_type(&id, |t| t.set_visibility(visible, show_label))?;

        let removed = if visible {
            restore_relationships(graph, &restore)?;
            Vec::new()
        } else {
            remove_relationships_of_type(graph, &id)?
        };
        Ok(change_relationship_type_visibility(
            id.clone(),
            previous.0,
            previous.1,
            removed,
        ))
    })
}

fn remove_relationships_of_type(graph: &mut Graph, id: &RelationshipTypeId) -> ModelResult<Vec<Relationship>> {
    let ids: Vec<RelationshipId> = graph.relationships_of_type(id).map(|r| r.id().clone()).collect();
    ids.iter().map(|r| graph.remove_relationship(r)).collect()
}

/// Skips relationships whose endpoints are gone or that reappeared meanwhile
fn restore_relationships(graph: &mut Graph, relationships: &[Relationship]) -> ModelResult<()> {
    for relationship in relationships {
        let endpoints_present =
            graph.contains_node(relationship.source_id()) && graph.contains_node(relationship.target_id());
        if !endpoints_present || graph.relationship(relationship.id()).is_some() {
            continue;
        }
        graph.add_relationship(relationship.clone())?;
    }
    Ok(())
}
