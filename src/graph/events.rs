//! Graph events and the synchronous emitter that dispatches them
//!
//! Entity setters produce typed events; the graph wraps them in a
//! `GraphEvent` envelope tagged with the originating entity so a single
//! subscriber sees every change.

use super::ids::{AttributeTypeId, NodeId, RelationshipId, RelationshipTypeId, TypeNodeId};
use super::node::{Node, NodeEvent};
use super::relationship::{Relationship, RelationshipEvent};
use super::types::{AttributeTypeEvent, RelationshipTypeEvent, TypeHierarchyEvent};

/// The kind of entity an event or error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Node,
    Relationship,
    RelationshipType,
    TypeHierarchyNode,
    AttributeType,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Node => "node",
            Self::Relationship => "relationship",
            Self::RelationshipType => "relationship type",
            Self::TypeHierarchyNode => "type hierarchy node",
            Self::AttributeType => "attribute type",
        };
        f.write_str(name)
    }
}

/// Structural change to the set of cells
#[derive(Debug, Clone, PartialEq)]
pub enum CellsChange {
    NodeAdded(NodeId),
    /// A node and the relationships removed along with it
    NodeRemoved {
        node: Node,
        relationships: Vec<Relationship>,
    },
    RelationshipAdded(RelationshipId),
    RelationshipRemoved(Relationship),
    /// All nodes and relationships were dropped
    Cleared,
}

/// An event fired by the graph
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    CellsChanged(CellsChange),
    Node {
        id: NodeId,
        event: NodeEvent,
    },
    Relationship {
        id: RelationshipId,
        event: RelationshipEvent,
    },
    RelationshipType {
        id: RelationshipTypeId,
        event: RelationshipTypeEvent,
    },
    TypeHierarchy {
        id: TypeNodeId,
        event: TypeHierarchyEvent,
    },
    AttributeType {
        id: AttributeTypeId,
        event: AttributeTypeEvent,
    },
}

impl GraphEvent {
    /// Event name within its entity kind (e.g. "positionChanged")
    pub fn key(&self) -> &'static str {
        match self {
            Self::CellsChanged(_) => "cellsChanged",
            Self::Node { event, .. } => event.key(),
            Self::Relationship { event, .. } => event.key(),
            Self::RelationshipType { event, .. } => event.key(),
            Self::TypeHierarchy { event, .. } => event.key(),
            Self::AttributeType { event, .. } => event.key(),
        }
    }

    /// Entity kind the event originates from; `None` for structural changes
    pub fn kind(&self) -> Option<EntityKind> {
        match self {
            Self::CellsChanged(_) => None,
            Self::Node { .. } => Some(EntityKind::Node),
            Self::Relationship { .. } => Some(EntityKind::Relationship),
            Self::RelationshipType { .. } => Some(EntityKind::RelationshipType),
            Self::TypeHierarchy { .. } => Some(EntityKind::TypeHierarchyNode),
            Self::AttributeType { .. } => Some(EntityKind::AttributeType),
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<E> = Box<dyn Fn(&E) + Send + Sync>;

/// Ordered list of listeners invoked synchronously on `emit`
///
/// Listeners must not call back into the object that owns the emitter.
pub struct EventEmitter<E> {
    listeners: Vec<(SubscriptionId, Listener<E>)>,
    next_id: u64,
}

impl<E> EventEmitter<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn subscribe(&mut self, listener: impl Fn(&E) + Send + Sync + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn emit(&self, event: &E) {
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn listeners_run_in_subscription_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut emitter = EventEmitter::<u32>::new();
        let a = seen.clone();
        emitter.subscribe(move |e| a.lock().unwrap().push(("a", *e)));
        let b = seen.clone();
        emitter.subscribe(move |e| b.lock().unwrap().push(("b", *e)));

        emitter.emit(&7);
        assert_eq!(*seen.lock().unwrap(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let seen = Arc::new(Mutex::new(0));
        let mut emitter = EventEmitter::<()>::new();
        let counter = seen.clone();
        let id = emitter.subscribe(move |_| *counter.lock().unwrap() += 1);
        assert!(emitter.unsubscribe(id));
        assert!(!emitter.unsubscribe(id));
        emitter.emit(&());
        assert_eq!(*seen.lock().unwrap(), 0);
    }

    #[test]
    fn envelope_exposes_key_and_kind() {
        let event = GraphEvent::Node {
            id: NodeId::from("n1"),
            event: NodeEvent::ExpandedChanged { previous: false },
        };
        assert_eq!(event.key(), "expandedChanged");
        assert_eq!(event.kind(), Some(EntityKind::Node));

        let cells = GraphEvent::CellsChanged(CellsChange::Cleared);
        assert_eq!(cells.key(), "cellsChanged");
        assert_eq!(cells.kind(), None);
    }
}
