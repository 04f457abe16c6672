//! Descriptors shared by many cells: relationship types, the type
//! hierarchy and attribute types
//!
//! These are created on first reference and cached for the lifetime of
//! the diagram session.

use super::error::{ModelError, ModelResult};
use super::ids::{AttributeTypeId, RelationshipTypeId, TypeNodeId};
use super::node::Label;
use std::collections::BTreeSet;

/// Change notification emitted by a relationship type setter
#[derive(Debug, Clone, PartialEq)]
pub enum RelationshipTypeEvent {
    LabelChanged { previous: Label },
    VisibilityChanged { previous_visible: bool, previous_show_label: bool },
    IsNewChanged { previous: bool },
}

impl RelationshipTypeEvent {
    pub fn key(&self) -> &'static str {
        match self {
            Self::LabelChanged { .. } => "labelChanged",
            Self::VisibilityChanged { .. } => "visibilityChanged",
            Self::IsNewChanged { .. } => "isNewChanged",
        }
    }
}

/// A classification of relationships that can be shown or hidden globally
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipType {
    id: RelationshipTypeId,
    index: Option<u32>,
    label: Label,
    visible: bool,
    show_label: bool,
    is_new: bool,
}

impl RelationshipType {
    /// A visible, labelled type with no display index yet
    pub fn new(id: RelationshipTypeId) -> Self {
        Self {
            id,
            index: None,
            label: Vec::new(),
            visible: true,
            show_label: true,
            is_new: false,
        }
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.label = label;
        self
    }

    /// Start with the given visibility and label display
    pub fn with_visibility(mut self, visible: bool, show_label: bool) -> Self {
        self.visible = visible;
        self.show_label = show_label;
        self
    }

    pub fn id(&self) -> &RelationshipTypeId {
        &self.id
    }

    /// Display index, assigned by the graph on registration
    pub fn index(&self) -> Option<u32> {
        self.index
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Hidden types keep their relationships out of the graph
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Whether relationship labels of this type are drawn
    pub fn show_label(&self) -> bool {
        self.show_label
    }

    /// Marks a type the user has not seen before
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Assign the display index; a second assignment fails
    pub fn assign_index(&mut self, index: u32) -> ModelResult<()> {
        if let Some(existing) = self.index {
            return Err(ModelError::IndexAlreadyAssigned {
                id: self.id.clone(),
                index: existing,
            });
        }
        self.index = Some(index);
        Ok(())
    }

    /// Replace the label, returning `LabelChanged` if it differs
    pub fn set_label(&mut self, label: Label) -> Option<RelationshipTypeEvent> {
        if self.label == label {
            return None;
        }
        let previous = std::mem::replace(&mut self.label, label);
        Some(RelationshipTypeEvent::LabelChanged { previous })
    }

    /// Change visibility and label display together
    pub fn set_visibility(&mut self, visible: bool, show_label: bool) -> Option<RelationshipTypeEvent> {
        if self.visible == visible && self.show_label == show_label {
            return None;
        }
        let event = RelationshipTypeEvent::VisibilityChanged {
            previous_visible: self.visible,
            previous_show_label: self.show_label,
        };
        self.visible = visible;
        self.show_label = show_label;
        Some(event)
    }

    /// Mark the type as new or acknowledged
    pub fn set_is_new(&mut self, is_new: bool) -> Option<RelationshipTypeEvent> {
        if self.is_new == is_new {
            return None;
        }
        self.is_new = is_new;
        Some(RelationshipTypeEvent::IsNewChanged { previous: !is_new })
    }
}

/// Change notification emitted for a type hierarchy node
#[derive(Debug, Clone, PartialEq)]
pub enum TypeHierarchyEvent {
    LabelChanged { previous: Label },
    CountChanged { previous: Option<u32> },
    BaseChanged { previous: Option<TypeNodeId> },
    DerivedChanged,
}

impl TypeHierarchyEvent {
    pub fn key(&self) -> &'static str {
        match self {
            Self::LabelChanged { .. } => "labelChanged",
            Self::CountChanged { .. } => "countChanged",
            Self::BaseChanged { .. } => "baseChanged",
            Self::DerivedChanged => "derivedChanged",
        }
    }
}

/// A node of the type hierarchy tree
///
/// `base` and `derived` are kept consistent by `Graph::set_type_base`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeHierarchyNode {
    id: TypeNodeId,
    label: Label,
    count: Option<u32>,
    base: Option<TypeNodeId>,
    derived: BTreeSet<TypeNodeId>,
}

impl TypeHierarchyNode {
    /// A root node with no label or instance count
    pub fn new(id: TypeNodeId) -> Self {
        Self {
            id,
            label: Vec::new(),
            count: None,
            base: None,
            derived: BTreeSet::new(),
        }
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.label = label;
        self
    }

    /// Set the initial instance count
    pub fn with_count(mut self, count: Option<u32>) -> Self {
        self.count = count;
        self
    }

    pub fn id(&self) -> &TypeNodeId {
        &self.id
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Number of instances, when known
    pub fn count(&self) -> Option<u32> {
        self.count
    }

    /// The type this one derives from, if any
    pub fn base(&self) -> Option<&TypeNodeId> {
        self.base.as_ref()
    }

    /// Types deriving directly from this one
    pub fn derived(&self) -> &BTreeSet<TypeNodeId> {
        &self.derived
    }

    /// Replace the label, returning `LabelChanged` if it differs
    pub fn set_label(&mut self, label: Label) -> Option<TypeHierarchyEvent> {
        if self.label == label {
            return None;
        }
        let previous = std::mem::replace(&mut self.label, label);
        Some(TypeHierarchyEvent::LabelChanged { previous })
    }

    /// Replace the instance count, returning `CountChanged` if it differs
    pub fn set_count(&mut self, count: Option<u32>) -> Option<TypeHierarchyEvent> {
        if self.count == count {
            return None;
        }
        let previous = std::mem::replace(&mut self.count, count);
        Some(TypeHierarchyEvent::CountChanged { previous })
    }

    pub(crate) fn replace_base(&mut self, base: Option<TypeNodeId>) -> Option<TypeNodeId> {
        std::mem::replace(&mut self.base, base)
    }

    pub(crate) fn insert_derived(&mut self, id: TypeNodeId) -> bool {
        self.derived.insert(id)
    }

    pub(crate) fn remove_derived(&mut self, id: &TypeNodeId) -> bool {
        self.derived.remove(id)
    }
}

/// Change notification emitted for an attribute type
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeTypeEvent {
    LabelChanged { previous: Label },
}

impl AttributeTypeEvent {
    pub fn key(&self) -> &'static str {
        match self {
            Self::LabelChanged { .. } => "labelChanged",
        }
    }
}

/// Descriptor of an attribute that nodes and relationships carry
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeType {
    id: AttributeTypeId,
    label: Label,
}

impl AttributeType {
    pub fn new(id: AttributeTypeId) -> Self {
        Self {
            id,
            label: Vec::new(),
        }
    }

    pub fn id(&self) -> &AttributeTypeId {
        &self.id
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Replace the label, returning `LabelChanged` if it differs
    pub fn set_label(&mut self, label: Label) -> Option<AttributeTypeEvent> {
        if self.label == label {
            return None;
        }
        let previous = std::mem::replace(&mut self.label, label);
        Some(AttributeTypeEvent::LabelChanged { previous })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::LocalizedString;

    #[test]
    fn index_can_be_assigned_once() {
        let mut t = RelationshipType::new("ex:knows".into());
        t.assign_index(3).unwrap();
        let err = t.assign_index(4).unwrap_err();
        assert!(matches!(err, ModelError::IndexAlreadyAssigned { index: 3, .. }));
        assert_eq!(t.index(), Some(3));
    }

    #[test]
    fn visibility_reports_both_previous_flags() {
        let mut t = RelationshipType::new("ex:knows".into());
        assert!(t.set_visibility(true, true).is_none());
        assert_eq!(
            t.set_visibility(false, true),
            Some(RelationshipTypeEvent::VisibilityChanged {
                previous_visible: true,
                previous_show_label: true
            })
        );
        assert!(!t.visible());
    }

    #[test]
    fn labels_compare_by_value() {
        let mut a = AttributeType::new("ex:name".into());
        let label = vec![LocalizedString::new("name", "en")];
        assert!(a.set_label(label.clone()).is_some());
        assert!(a.set_label(label).is_none());

        let mut c = TypeHierarchyNode::new("ex:Person".into());
        assert!(c.set_count(None).is_none());
        assert_eq!(c.set_count(Some(5)).map(|e| e.key()), Some("countChanged"));
    }
}
