use super::diagram::place_relationship;
use super::*;
use crate::graph::{
    Graph, Node, NodeId, Point, Relationship, RelationshipData, RelationshipType,
};
use crate::history::{History, UndoStack};
use crate::provider::{Dataset, MemoryProvider};
use std::sync::Arc;

fn model() -> DiagramModel {
    DiagramModel::new(Arc::new(MemoryProvider::new(Dataset::default())))
}

fn graph_with_pair() -> Graph {
    let mut graph = Graph::new();
    graph
        .add_node(Node::placeholder(NodeId::from("a"), Iri::from("ex:a")))
        .unwrap();
    graph
        .add_node(Node::placeholder(NodeId::from("b"), Iri::from("ex:b")))
        .unwrap();
    graph.add_relationship_type(RelationshipType::new("T".into())).unwrap();
    graph
}

fn candidate(id: &str) -> Relationship {
    Relationship::new(
        RelationshipId::from(id),
        NodeId::from("a"),
        NodeId::from("b"),
        RelationshipData::new("T", "ex:a", "ex:b"),
    )
}

mod placement {
    use super::*;

    #[test]
    fn records_for_undo_when_history_given() {
        let mut graph = graph_with_pair();
        let mut history = UndoStack::new();
        let outcome = place_relationship(&mut graph, Some(&mut history), candidate("r")).unwrap();
        assert_eq!(outcome, RelationshipOutcome::Created(RelationshipId::from("r")));
        assert!(history.can_undo());

        history.undo(&mut graph).unwrap();
        assert_eq!(graph.relationship_count(), 0);
    }

    #[test]
    fn layout_only_duplicate_keeps_flag() {
        let mut graph = graph_with_pair();
        place_relationship(&mut graph, None, candidate("r").with_layout_only(true)).unwrap();

        let outcome = place_relationship(&mut graph, None, candidate("s").with_layout_only(true)).unwrap();
        assert_eq!(outcome, RelationshipOutcome::Reused(RelationshipId::from("r")));
        assert!(graph.relationship(&RelationshipId::from("r")).unwrap().layout_only());

        place_relationship(&mut graph, None, candidate("t")).unwrap();
        assert!(!graph.relationship(&RelationshipId::from("r")).unwrap().layout_only());
        assert_eq!(graph.relationship_count(), 1);
    }

    #[test]
    fn unknown_type_is_an_error() {
        let mut graph = graph_with_pair();
        let relationship = Relationship::new(
            RelationshipId::from("r"),
            NodeId::from("a"),
            NodeId::from("b"),
            RelationshipData::new("U", "ex:a", "ex:b"),
        );
        let err = place_relationship(&mut graph, None, relationship).unwrap_err();
        assert!(matches!(err, ModelError::UnknownType(_)));
    }
}

mod generations {
    use super::*;

    #[test]
    fn later_request_supersedes_earlier() {
        let model = model();
        let target = RequestTarget::NodeData(Iri::from("ex:a"));
        let first = model.begin_request(target.clone());
        let second = model.begin_request(target.clone());
        assert!(!model.is_current(&target, first));
        assert!(model.is_current(&target, second));
    }

    #[test]
    fn targets_are_independent() {
        let model = model();
        let nodes = RequestTarget::NodeData(Iri::from("ex:a"));
        let typed = RequestTarget::RelationshipsOfType("T".into());
        let generation = model.begin_request(nodes.clone());
        model.begin_request(typed);
        assert!(model.is_current(&nodes, generation));

        model.supersede_requests();
        assert!(!model.is_current(&nodes, generation));
    }
}

#[test]
fn creation_without_runtime_leaves_placeholder() {
    let model = model();
    let id = model.create_node("ex:a", Point::new(1.0, 2.0)).unwrap();
    let node = model.node(&id).unwrap();
    assert!(node.data().is_placeholder());
    assert_eq!(node.position(), Point::new(1.0, 2.0));
}

#[test]
fn export_keeps_overrides_for_absent_types() {
    let model = model();
    model
        .apply_relationship_type_options(vec![
            RelationshipTypeOptions {
                type_id: "ex:hidden".into(),
                visible: false,
                show_label: true,
            },
            RelationshipTypeOptions {
                type_id: "ex:plain".into(),
                visible: true,
                show_label: true,
            },
        ])
        .unwrap();

    let layout = model.export_layout();
    assert!(layout.is_empty());
    assert_eq!(layout.relationship_type_options.len(), 1);
    assert_eq!(layout.relationship_type_options[0].type_id, RelationshipTypeId::from("ex:hidden"));
}

#[test]
fn graph_events_are_forwarded() {
    let model = model();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = seen.clone();
    let subscription = model.subscribe(move |event| sink.lock().unwrap().push(event.key()));

    model
        .create_node_with_data(crate::graph::NodeData::placeholder("ex:a".into()), Point::default())
        .unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["cellsChanged"]);

    assert!(model.unsubscribe(subscription));
    model.undo().unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn outcome_exposes_relationship_id() {
    let id = RelationshipId::from("r");
    assert_eq!(RelationshipOutcome::Created(id.clone()).relationship_id(), Some(&id));
    assert_eq!(RelationshipOutcome::Reused(id.clone()).relationship_id(), Some(&id));
    assert_eq!(RelationshipOutcome::Suppressed.relationship_id(), None);
}

#[test]
fn loading_event_keys() {
    assert_eq!(ModelEvent::LoadingStarted.key(), "loadingStarted");
    assert_eq!(ModelEvent::LoadingSucceeded.key(), "loadingSucceeded");
    let failed = ModelEvent::LoadingFailed(ModelError::UnknownNode(NodeId::from("a")));
    assert_eq!(failed.key(), "loadingFailed");
}

#[test]
fn node_data_request_runs_without_a_runtime() {
    let dataset = Dataset::from_yaml_str(
        r#"
nodes:
  - id: "ex:a"
    label: [{ value: "A" }]
"#,
    )
    .unwrap();
    let model = DiagramModel::new(Arc::new(MemoryProvider::new(dataset)));
    let id = model
        .create_node_with_data(crate::graph::NodeData::placeholder("ex:a".into()), Point::default())
        .unwrap();

    futures::executor::block_on(model.request_node_data(vec![Iri::from("ex:a")])).unwrap();
    assert_eq!(model.node(&id).unwrap().data().label[0].value, "A");
}
