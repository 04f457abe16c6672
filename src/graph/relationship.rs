//! Relationship representation on the diagram

use super::error::{ModelError, ModelResult};
use super::ids::{Iri, NodeId, RelationshipId, RelationshipTypeId};
use super::node::{Attributes, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Semantic payload of a relationship
///
/// `type_id`, `source` and `target` form the identity of the underlying
/// fact and never change for a given relationship cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipData {
    pub type_id: RelationshipTypeId,
    pub source: Iri,
    pub target: Iri,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
}

impl RelationshipData {
    /// Payload for a `source` to `target` relationship of `type_id`
    pub fn new(type_id: impl Into<RelationshipTypeId>, source: impl Into<Iri>, target: impl Into<Iri>) -> Self {
        Self {
            type_id: type_id.into(),
            source: source.into(),
            target: target.into(),
            attributes: BTreeMap::new(),
        }
    }

    fn identity(&self) -> String {
        format!("({} {} {})", self.type_id, self.source, self.target)
    }

    fn same_identity(&self, other: &RelationshipData) -> bool {
        self.type_id == other.type_id && self.source == other.source && self.target == other.target
    }
}

/// Change notification emitted by a relationship setter
#[derive(Debug, Clone, PartialEq)]
pub enum RelationshipEvent {
    DataChanged { previous: RelationshipData },
    VerticesChanged { previous: Vec<Point> },
    LayoutOnlyChanged { previous: bool },
}

impl RelationshipEvent {
    pub fn key(&self) -> &'static str {
        match self {
            Self::DataChanged { .. } => "dataChanged",
            Self::VerticesChanged { .. } => "verticesChanged",
            Self::LayoutOnlyChanged { .. } => "layoutOnlyChanged",
        }
    }
}

/// A directed relationship between two nodes on the diagram
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    id: RelationshipId,
    source_id: NodeId,
    target_id: NodeId,
    data: RelationshipData,
    vertices: Vec<Point>,
    layout_only: bool,
}

impl Relationship {
    pub fn new(id: RelationshipId, source_id: NodeId, target_id: NodeId, data: RelationshipData) -> Self {
        Self {
            id,
            source_id,
            target_id,
            data,
            vertices: Vec::new(),
            layout_only: false,
        }
    }

    /// Set the initial route points
    pub fn with_vertices(mut self, vertices: Vec<Point>) -> Self {
        self.vertices = vertices;
        self
    }

    /// Mark as present for visual continuity only
    pub fn with_layout_only(mut self, layout_only: bool) -> Self {
        self.layout_only = layout_only;
        self
    }

    pub fn id(&self) -> &RelationshipId {
        &self.id
    }

    /// Relationship type from the payload
    pub fn type_id(&self) -> &RelationshipTypeId {
        &self.data.type_id
    }

    /// Local id of the source node
    pub fn source_id(&self) -> &NodeId {
        &self.source_id
    }

    /// Local id of the target node
    pub fn target_id(&self) -> &NodeId {
        &self.target_id
    }

    pub fn data(&self) -> &RelationshipData {
        &self.data
    }

    /// Routing hints between the endpoints
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// True while the relationship is known only from a saved layout
    pub fn layout_only(&self) -> bool {
        self.layout_only
    }

    /// True when source and target are the same node
    pub fn is_self_loop(&self) -> bool {
        self.source_id == self.target_id
    }

    /// Replace the payload
    ///
    /// Rejects a payload whose type, source or target differs from the
    /// current one; re-pointing goes through `Graph::retarget_relationship`.
    pub fn set_data(&mut self, data: RelationshipData) -> ModelResult<Option<RelationshipEvent>> {
        if !self.data.same_identity(&data) {
            return Err(ModelError::IdentityMismatch {
                id: self.id.clone(),
                expected: self.data.identity(),
                found: data.identity(),
            });
        }
        if self.data == data {
            return Ok(None);
        }
        let previous = std::mem::replace(&mut self.data, data);
        Ok(Some(RelationshipEvent::DataChanged { previous }))
    }

    /// Replace the route points, returning `VerticesChanged` if they differ
    pub fn set_vertices(&mut self, vertices: Vec<Point>) -> Option<RelationshipEvent> {
        if self.vertices == vertices {
            return None;
        }
        let previous = std::mem::replace(&mut self.vertices, vertices);
        Some(RelationshipEvent::VerticesChanged { previous })
    }

    /// Change the layout-only flag, returning `LayoutOnlyChanged` on change
    pub fn set_layout_only(&mut self, layout_only: bool) -> Option<RelationshipEvent> {
        if self.layout_only == layout_only {
            return None;
        }
        self.layout_only = layout_only;
        Some(RelationshipEvent::LayoutOnlyChanged {
            previous: !layout_only,
        })
    }

    /// Swap endpoints and payload together, returning the previous triple
    pub(crate) fn retarget(
        &mut self,
        source_id: NodeId,
        target_id: NodeId,
        data: RelationshipData,
    ) -> (NodeId, NodeId, RelationshipData) {
        (
            std::mem::replace(&mut self.source_id, source_id),
            std::mem::replace(&mut self.target_id, target_id),
            std::mem::replace(&mut self.data, data),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::LocalizedString;

    fn knows() -> Relationship {
        Relationship::new(
            RelationshipId::from("r1"),
            NodeId::from("n1"),
            NodeId::from("n2"),
            RelationshipData::new("ex:knows", "ex:alice", "ex:bob"),
        )
    }

    #[test]
    fn payload_with_other_target_is_rejected() {
        let mut r = knows();
        let err = r
            .set_data(RelationshipData::new("ex:knows", "ex:alice", "ex:carol"))
            .unwrap_err();
        assert!(matches!(err, ModelError::IdentityMismatch { .. }));
        assert_eq!(r.data().target, Iri::from("ex:bob"));
    }

    #[test]
    fn payload_with_same_identity_replaces_attributes() {
        let mut r = knows();
        let mut data = RelationshipData::new("ex:knows", "ex:alice", "ex:bob");
        data.attributes
            .insert("ex:since".into(), vec![LocalizedString::plain("2001")]);
        let event = r.set_data(data.clone()).unwrap();
        assert_eq!(event.map(|e| e.key()), Some("dataChanged"));
        assert!(r.set_data(data).unwrap().is_none());
    }

    #[test]
    fn vertices_compare_by_value() {
        let mut r = knows().with_vertices(vec![Point::new(1.0, 2.0)]);
        assert!(r.set_vertices(vec![Point::new(1.0, 2.0)]).is_none());
        assert!(r.set_vertices(Vec::new()).is_some());
    }

    #[test]
    fn layout_only_flag_toggles_once() {
        let mut r = knows().with_layout_only(true);
        assert_eq!(
            r.set_layout_only(false),
            Some(RelationshipEvent::LayoutOnlyChanged { previous: true })
        );
        assert!(r.set_layout_only(false).is_none());
    }
}
