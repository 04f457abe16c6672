//! Self-inverting commands
//!
//! Applying a command performs its effect and returns the command that
//! undoes it. Applying leaves the command intact, so a history can keep
//! a step whose application failed. Batches invert by replaying child
//! inverses in reverse order; effects are their own inverse.

use crate::graph::{Graph, ModelResult};
use std::sync::Arc;
use tracing::warn;

type ApplyFn = Arc<dyn Fn(&mut Graph) -> ModelResult<Command> + Send + Sync>;
type EffectFn = Arc<dyn Fn(&mut Graph) + Send + Sync>;

/// A reversible edit of the graph
pub enum Command {
    /// A single edit that returns its inverse when applied
    Primitive { description: String, apply: ApplyFn },
    /// Ordered group of commands undone and redone as one unit
    Batch {
        description: String,
        commands: Vec<Command>,
    },
    /// Re-runnable side effect without a meaningful inverse
    Effect { description: String, effect: EffectFn },
}

impl Command {
    pub fn primitive<F>(description: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&mut Graph) -> ModelResult<Command> + Send + Sync + 'static,
    {
        Self::Primitive {
            description: description.into(),
            apply: Arc::new(apply),
        }
    }

    pub fn batch(description: impl Into<String>, commands: Vec<Command>) -> Self {
        Self::Batch {
            description: description.into(),
            commands,
        }
    }

    pub fn effect<F>(description: impl Into<String>, effect: F) -> Self
    where
        F: Fn(&mut Graph) + Send + Sync + 'static,
    {
        Self::Effect {
            description: description.into(),
            effect: Arc::new(effect),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Primitive { description, .. }
            | Self::Batch { description, .. }
            | Self::Effect { description, .. } => description,
        }
    }

    /// Perform the edit and return its inverse
    ///
    /// A batch whose child fails rolls back the children already applied
    /// before returning the error.
    pub fn apply(&self, graph: &mut Graph) -> ModelResult<Command> {
        match self {
            Self::Primitive { apply, .. } => apply(graph),
            Self::Batch {
                description,
                commands,
            } => {
                let mut inverses = Vec::with_capacity(commands.len());
                for command in commands {
                    match command.apply(graph) {
                        Ok(inverse) => inverses.push(inverse),
                        Err(err) => {
                            for inverse in inverses.into_iter().rev() {
                                let label = inverse.description().to_string();
                                if let Err(rollback) = inverse.apply(graph) {
                                    warn!(command = %label, error = %rollback, "batch rollback step failed");
                                }
                            }
                            return Err(err);
                        }
                    }
                }
                inverses.reverse();
                Ok(Self::Batch {
                    description: description.clone(),
                    commands: inverses,
                })
            }
            Self::Effect {
                description,
                effect,
            } => {
                effect(graph);
                Ok(Self::Effect {
                    description: description.clone(),
                    effect: effect.clone(),
                })
            }
        }
    }

    /// True for a batch without children
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Batch { commands, .. } if commands.is_empty())
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primitive { description, .. } => {
                f.debug_tuple("Primitive").field(description).finish()
            }
            Self::Batch {
                description,
                commands,
            } => f
                .debug_struct("Batch")
                .field("description", description)
                .field("commands", commands)
                .finish(),
            Self::Effect { description, .. } => f.debug_tuple("Effect").field(description).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Iri, ModelError, Node, NodeId, Point};
    use crate::history::commands;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn graph_with(ids: &[&str]) -> Graph {
        let mut graph = Graph::new();
        for id in ids {
            graph
                .add_node(Node::placeholder(NodeId::from(*id), Iri::from(*id)))
                .unwrap();
        }
        graph
    }

    fn position(graph: &Graph, id: &str) -> Point {
        graph.node(&NodeId::from(id)).unwrap().position()
    }

    #[test]
    fn batch_inverse_restores_in_reverse_order() {
        let mut graph = graph_with(&["a"]);
        let batch = Command::batch(
            "Drag",
            vec![
                commands::set_node_position("a".into(), Point::new(1.0, 1.0)),
                commands::set_node_position("a".into(), Point::new(2.0, 2.0)),
            ],
        );
        let inverse = batch.apply(&mut graph).unwrap();
        assert_eq!(position(&graph, "a"), Point::new(2.0, 2.0));

        let redo = inverse.apply(&mut graph).unwrap();
        assert_eq!(position(&graph, "a"), Point::default());

        redo.apply(&mut graph).unwrap();
        assert_eq!(position(&graph, "a"), Point::new(2.0, 2.0));
    }

    #[test]
    fn failing_child_rolls_back_applied_children() {
        let mut graph = graph_with(&["a"]);
        let batch = Command::batch(
            "Broken",
            vec![
                commands::set_node_position("a".into(), Point::new(3.0, 3.0)),
                commands::set_node_position("missing".into(), Point::new(1.0, 1.0)),
            ],
        );
        let err = batch.apply(&mut graph).unwrap_err();
        assert!(matches!(err, ModelError::UnknownNode(_)));
        assert_eq!(position(&graph, "a"), Point::default());
    }

    #[test]
    fn effect_is_its_own_inverse() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let effect = Command::effect("Reload data", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let mut graph = Graph::new();
        let inverse = effect.apply(&mut graph).unwrap();
        assert_eq!(inverse.description(), "Reload data");
        inverse.apply(&mut graph).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
