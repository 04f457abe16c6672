//! Serialized diagram layout
//!
//! The exchange format for a diagram: node cells, relationship cells and
//! the relationship type visibility overrides that differ from the
//! defaults.

use crate::graph::{Iri, NodeId, Point, RelationshipId, RelationshipTypeId, Size};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNode {
    pub id: NodeId,
    pub identity: Iri,
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// Reference to a node cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRef {
    pub id: NodeId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRelationship {
    pub id: RelationshipId,
    #[serde(rename = "type")]
    pub type_id: RelationshipTypeId,
    pub source: CellRef,
    pub target: CellRef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vertices: Vec<Point>,
}

/// Non-default visibility of a relationship type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipTypeOptions {
    #[serde(rename = "type")]
    pub type_id: RelationshipTypeId,
    pub visible: bool,
    #[serde(default = "default_show_label")]
    pub show_label: bool,
}

fn default_show_label() -> bool {
    true
}

impl RelationshipTypeOptions {
    pub fn is_default(&self) -> bool {
        self.visible && self.show_label
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutData {
    #[serde(default)]
    pub nodes: Vec<LayoutNode>,
    #[serde(default)]
    pub relationships: Vec<LayoutRelationship>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationship_type_options: Vec<RelationshipTypeOptions>,
}

impl LayoutData {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> serde_json::Value {
        json!({
            "nodes": [
                {
                    "id": "n1",
                    "identity": "http://example.org/alice",
                    "position": { "x": 10.0, "y": 20.0 },
                    "size": { "width": 100.0, "height": 40.0 },
                    "expanded": true
                },
                {
                    "id": "n2",
                    "identity": "http://example.org/bob",
                    "position": { "x": 200.0, "y": 20.0 }
                }
            ],
            "relationships": [
                {
                    "id": "r1",
                    "type": "http://example.org/knows",
                    "source": { "id": "n1" },
                    "target": { "id": "n2" },
                    "vertices": [{ "x": 100.0, "y": 0.0 }]
                }
            ],
            "relationshipTypeOptions": [
                { "type": "http://example.org/worksAt", "visible": false }
            ]
        })
    }

    #[test]
    fn parses_layout_fixture() {
        let layout: LayoutData = serde_json::from_value(fixture()).unwrap();
        assert_eq!(layout.nodes.len(), 2);
        assert_eq!(layout.nodes[0].expanded, Some(true));
        assert_eq!(layout.nodes[1].size, None);
        assert_eq!(layout.relationships[0].source.id, NodeId::from("n1"));
        assert_eq!(layout.relationships[0].vertices, vec![Point::new(100.0, 0.0)]);

        let options = &layout.relationship_type_options[0];
        assert!(!options.visible);
        assert!(options.show_label);
    }

    #[test]
    fn optional_fields_are_omitted() {
        let layout: LayoutData = serde_json::from_value(fixture()).unwrap();
        let value = serde_json::to_value(&layout.nodes[1]).unwrap();
        assert!(value.get("size").is_none());
        assert!(value.get("expanded").is_none());
        assert!(value.get("group").is_none());

        let empty = serde_json::to_value(LayoutData::default()).unwrap();
        assert!(empty.get("relationshipTypeOptions").is_none());
    }

    #[test]
    fn relationship_type_key_is_renamed() {
        let layout: LayoutData = serde_json::from_value(fixture()).unwrap();
        let value = serde_json::to_value(&layout.relationships[0]).unwrap();
        assert_eq!(value["type"], "http://example.org/knows");
        assert!(value.get("type_id").is_none());
    }
}
