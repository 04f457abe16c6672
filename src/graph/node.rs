//! Node representation on the diagram

use super::ids::{AttributeTypeId, Iri, NodeId, RelationshipId, TypeNodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A point on the diagram canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Rendered size of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when both dimensions are zero
    pub fn is_zero(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }
}

/// A string tagged with its language
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalizedString {
    pub value: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lang: String,
}

impl LocalizedString {
    pub fn new(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            lang: lang.into(),
        }
    }

    /// A string without a language tag
    pub fn plain(value: impl Into<String>) -> Self {
        Self::new(value, "")
    }
}

/// Localized label: one entry per language
pub type Label = Vec<LocalizedString>;

/// Attribute values keyed by attribute type
pub type Attributes = BTreeMap<AttributeTypeId, Vec<LocalizedString>>;

/// Semantic payload of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Semantic identity
    pub id: Iri,
    /// Types from the type hierarchy
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<TypeNodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label: Label,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
}

impl NodeData {
    /// Payload that carries only the identity
    pub fn placeholder(id: Iri) -> Self {
        Self {
            id,
            types: Vec::new(),
            label: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Add a type from the type hierarchy
    pub fn with_type(mut self, type_id: impl Into<TypeNodeId>) -> Self {
        self.types.push(type_id.into());
        self
    }

    /// Add a label in one language
    pub fn with_label(mut self, label: LocalizedString) -> Self {
        self.label.push(label);
        self
    }

    /// Append a value to an attribute
    pub fn with_attribute(mut self, attribute: impl Into<AttributeTypeId>, value: LocalizedString) -> Self {
        self.attributes.entry(attribute.into()).or_default().push(value);
        self
    }

    /// True when nothing beyond the identity is known
    pub fn is_placeholder(&self) -> bool {
        self.types.is_empty() && self.label.is_empty() && self.attributes.is_empty()
    }
}

/// Change notification emitted by a node setter
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    DataChanged { previous: NodeData },
    PositionChanged { previous: Point },
    SizeChanged { previous: Size },
    ExpandedChanged { previous: bool },
    GroupChanged { previous: Option<String> },
    /// A relationship was attached to or detached from this node
    RelationshipsChanged,
}

impl NodeEvent {
    /// Event name as seen by listeners
    pub fn key(&self) -> &'static str {
        match self {
            Self::DataChanged { .. } => "dataChanged",
            Self::PositionChanged { .. } => "positionChanged",
            Self::SizeChanged { .. } => "sizeChanged",
            Self::ExpandedChanged { .. } => "expandedChanged",
            Self::GroupChanged { .. } => "groupChanged",
            Self::RelationshipsChanged => "relationshipsChanged",
        }
    }
}

/// A node on the diagram
///
/// Setters return the event to dispatch, or `None` when the write is a
/// no-op. The incident relationship list is maintained by the `Graph`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    data: NodeData,
    position: Point,
    size: Size,
    expanded: bool,
    group: Option<String>,
    relationships: Vec<RelationshipId>,
}

impl Node {
    /// Create a node at the origin with zero size
    pub fn new(id: NodeId, data: NodeData) -> Self {
        Self {
            id,
            data,
            position: Point::default(),
            size: Size::default(),
            expanded: false,
            group: None,
            relationships: Vec::new(),
        }
    }

    /// A node whose payload is not loaded yet
    pub fn placeholder(id: NodeId, identity: Iri) -> Self {
        Self::new(id, NodeData::placeholder(identity))
    }

    /// Set the initial position
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    /// Set the initial size
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn with_expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    /// Place the node in a group
    pub fn with_group(mut self, group: Option<String>) -> Self {
        self.group = group;
        self
    }

    /// Local diagram id, distinct from the semantic identity
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Semantic identity carried by the payload
    pub fn identity(&self) -> &Iri {
        &self.data.id
    }

    /// Current payload; a placeholder until hydrated
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Top-left corner in diagram coordinates
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn expanded(&self) -> bool {
        self.expanded
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Incident relationships in attachment order
    pub fn relationships(&self) -> &[RelationshipId] {
        &self.relationships
    }

    /// Replace the payload, returning `DataChanged` if it differs
    pub fn set_data(&mut self, data: NodeData) -> Option<NodeEvent> {
        if self.data == data {
            return None;
        }
        let previous = std::mem::replace(&mut self.data, data);
        Some(NodeEvent::DataChanged { previous })
    }

    /// Move the node, returning `PositionChanged` if it moved
    pub fn set_position(&mut self, position: Point) -> Option<NodeEvent> {
        if self.position == position {
            return None;
        }
        let previous = std::mem::replace(&mut self.position, position);
        Some(NodeEvent::PositionChanged { previous })
    }

    /// Resize the node, returning `SizeChanged` if the size differs
    pub fn set_size(&mut self, size: Size) -> Option<NodeEvent> {
        if self.size == size {
            return None;
        }
        let previous = std::mem::replace(&mut self.size, size);
        Some(NodeEvent::SizeChanged { previous })
    }

    /// Expand or collapse, returning `ExpandedChanged` on change
    pub fn set_expanded(&mut self, expanded: bool) -> Option<NodeEvent> {
        if self.expanded == expanded {
            return None;
        }
        self.expanded = expanded;
        Some(NodeEvent::ExpandedChanged { previous: !expanded })
    }

    pub fn set_group(&mut self, group: Option<String>) -> Option<NodeEvent> {
        if self.group == group {
            return None;
        }
        let previous = std::mem::replace(&mut self.group, group);
        Some(NodeEvent::GroupChanged { previous })
    }

    pub(crate) fn attach_relationship(&mut self, id: RelationshipId) {
        if !self.relationships.contains(&id) {
            self.relationships.push(id);
        }
    }

    pub(crate) fn detach_relationship(&mut self, id: &RelationshipId) {
        self.relationships.retain(|r| r != id);
    }

    pub(crate) fn clear_relationships(&mut self) {
        self.relationships.clear();
    }
}
