//! Relationship creation and relationship type visibility
//!
//! Run with: `cargo test --test relationships`

mod common;

use semdiag::{
    DiagramModel, ModelError, NodeData, NodeId, Point, RelationshipData, RelationshipOutcome,
    RelationshipTypeId, RelationshipTypeOptions,
};

fn works_at() -> RelationshipTypeId {
    RelationshipTypeId::from("ex:worksAt")
}

fn knows() -> RelationshipTypeId {
    RelationshipTypeId::from("ex:knows")
}

fn place(model: &DiagramModel, identity: &str, x: f64) -> NodeId {
    model
        .create_node_with_data(NodeData::placeholder(identity.into()), Point::new(x, 0.0))
        .unwrap()
}

fn count_of_type(model: &DiagramModel, type_id: &RelationshipTypeId) -> usize {
    model.with_graph(|g| g.relationships_of_type(type_id).count())
}

/// Alice, Bob and Acme on the diagram with every relationship fetched
async fn populated() -> (DiagramModel, std::sync::Arc<common::CountingProvider>) {
    let (model, provider) = common::model();
    place(&model, "ex:alice", 0.0);
    place(&model, "ex:bob", 200.0);
    place(&model, "ex:acme", 400.0);
    let created = model.request_relationships(None).await.unwrap();
    assert_eq!(created, 3);
    (model, provider)
}

#[tokio::test]
async fn create_then_reuse() {
    let (model, _provider) = common::model();
    let alice = place(&model, "ex:alice", 0.0);
    let bob = place(&model, "ex:bob", 200.0);
    let data = RelationshipData::new("ex:knows", "ex:alice", "ex:bob");

    let id = match model.create_relationship(&alice, &bob, data.clone()).unwrap() {
        RelationshipOutcome::Created(id) => id,
        other => panic!("expected a new relationship, got {:?}", other),
    };
    assert_eq!(
        model.create_relationship(&alice, &bob, data).unwrap(),
        RelationshipOutcome::Reused(id.clone())
    );

    assert!(model.relationship_type(&knows()).is_some());
    let node = model.node(&alice).unwrap();
    assert_eq!(node.relationships(), &[id]);
}

#[tokio::test]
async fn missing_endpoint_is_suppressed() {
    let (model, _provider) = common::model();
    let alice = place(&model, "ex:alice", 0.0);
    let outcome = model
        .create_relationship(
            &alice,
            &NodeId::from("ghost"),
            RelationshipData::new("ex:knows", "ex:alice", "ex:bob"),
        )
        .unwrap();
    assert_eq!(outcome, RelationshipOutcome::Suppressed);
    assert_eq!(model.with_graph(|g| g.relationship_count()), 0);
}

#[tokio::test]
async fn payload_must_match_endpoints() {
    let (model, _provider) = common::model();
    let alice = place(&model, "ex:alice", 0.0);
    let bob = place(&model, "ex:bob", 200.0);
    let err = model
        .create_relationship(&alice, &bob, RelationshipData::new("ex:knows", "ex:bob", "ex:alice"))
        .unwrap_err();
    assert!(matches!(err, ModelError::IdentityMismatch { .. }));
}

#[tokio::test]
async fn hidden_type_suppresses_creation() {
    let (model, _provider) = common::model();
    let alice = place(&model, "ex:alice", 0.0);
    let acme = place(&model, "ex:acme", 400.0);
    model
        .set_relationship_type_visibility(&works_at(), false, true, true)
        .unwrap();

    let outcome = model
        .create_relationship(&alice, &acme, RelationshipData::new("ex:worksAt", "ex:alice", "ex:acme"))
        .unwrap();
    assert_eq!(outcome, RelationshipOutcome::Suppressed);
}

#[tokio::test]
async fn fetched_relationships_are_not_undoable() {
    let (model, _provider) = populated().await;
    assert!(model.can_undo());
    // only the three node placements are on the stack
    for _ in 0..3 {
        model.undo().unwrap();
    }
    assert!(!model.can_undo());
    assert_eq!(model.with_graph(|g| g.relationship_count()), 0);
}

#[tokio::test]
async fn refetch_confirms_existing_relationships() {
    let (model, _provider) = populated().await;
    assert_eq!(model.request_relationships(None).await.unwrap(), 0);
    assert_eq!(model.with_graph(|g| g.relationship_count()), 3);
}

#[tokio::test]
async fn hiding_removes_and_showing_refetches_once() {
    let (model, provider) = populated().await;
    assert_eq!(count_of_type(&model, &works_at()), 2);

    model
        .set_relationship_type_visibility(&works_at(), false, true, false)
        .unwrap();
    assert_eq!(count_of_type(&model, &works_at()), 0);
    assert_eq!(count_of_type(&model, &knows()), 1);

    let before = provider.count("relationships_info");
    model
        .set_relationship_type_visibility(&works_at(), true, true, false)
        .unwrap();
    model.wait_for_loading().await;

    assert_eq!(provider.count("relationships_info"), before + 1);
    assert_eq!(
        provider.calls("relationships_info").last(),
        Some(&vec!["ex:worksAt".to_string()])
    );
    assert_eq!(count_of_type(&model, &works_at()), 2);
}

#[tokio::test]
async fn prevent_loading_skips_refetch() {
    let (model, provider) = populated().await;
    model
        .set_relationship_type_visibility(&works_at(), false, true, false)
        .unwrap();
    let before = provider.count("relationships_info");

    model
        .set_relationship_type_visibility(&works_at(), true, true, true)
        .unwrap();
    model.wait_for_loading().await;

    assert_eq!(provider.count("relationships_info"), before);
    assert_eq!(count_of_type(&model, &works_at()), 0);
    assert!(model.relationship_type(&works_at()).unwrap().visible());
}

#[tokio::test]
async fn label_toggle_on_visible_type_does_not_fetch() {
    let (model, provider) = populated().await;
    let before = provider.count("relationships_info");
    model
        .set_relationship_type_visibility(&knows(), true, false, false)
        .unwrap();
    model.wait_for_loading().await;

    assert_eq!(provider.count("relationships_info"), before);
    assert!(!model.relationship_type(&knows()).unwrap().show_label());
    assert_eq!(count_of_type(&model, &knows()), 1);
}

#[tokio::test]
async fn hiding_again_abandons_refetch() {
    let (model, _provider) = populated().await;
    model
        .set_relationship_type_visibility(&works_at(), false, true, false)
        .unwrap();
    model
        .set_relationship_type_visibility(&works_at(), true, true, false)
        .unwrap();
    model
        .set_relationship_type_visibility(&works_at(), false, true, false)
        .unwrap();
    model.wait_for_loading().await;

    assert_eq!(count_of_type(&model, &works_at()), 0);
}

#[tokio::test]
async fn pending_override_applies_on_creation() {
    let (model, provider) = common::model();
    model
        .apply_relationship_type_options(vec![RelationshipTypeOptions {
            type_id: works_at(),
            visible: false,
            show_label: true,
        }])
        .unwrap();

    model.create_relationship_type(&works_at()).unwrap();
    model.wait_for_loading().await;

    assert!(!model.relationship_type(&works_at()).unwrap().visible());
    assert_eq!(provider.count("relationships_info"), 0);
}

#[tokio::test]
async fn unused_types_can_be_hidden() {
    let (model, _provider) = common::model();
    let alice = place(&model, "ex:alice", 0.0);
    let bob = place(&model, "ex:bob", 200.0);
    model
        .create_relationship(&alice, &bob, RelationshipData::new("ex:knows", "ex:alice", "ex:bob"))
        .unwrap();
    model.create_relationship_type(&works_at()).unwrap();

    assert_eq!(model.hide_unused_relationship_types().unwrap(), 1);
    assert!(!model.relationship_type(&works_at()).unwrap().visible());
    assert!(model.relationship_type(&knows()).unwrap().visible());
}
