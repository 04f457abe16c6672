//! Undo/redo history over self-inverting commands

mod command;
pub mod commands;
mod noop;
mod stack;

pub use command::Command;
pub use noop::NoopHistory;
pub use stack::UndoStack;

use crate::graph::{Graph, ModelResult};
use thiserror::Error;

/// Errors raised by history bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("undo is not supported by this history")]
    UndoUnsupported,
    #[error("redo is not supported by this history")]
    RedoUnsupported,
    #[error("no batch is open")]
    NoOpenBatch,
    #[error("cannot undo or redo while a batch is open")]
    BatchOpen,
}

/// The contract every history variant implements
///
/// `execute` applies a command to the graph and records its inverse.
/// Batches group every command executed between `start_batch` and
/// `store_batch` into one undo step.
pub trait History: Send {
    fn execute(&mut self, graph: &mut Graph, command: Command) -> ModelResult<()>;

    /// Record an already-computed inverse without applying anything
    fn register_to_undo(&mut self, command: Command);

    fn undo(&mut self, graph: &mut Graph) -> ModelResult<()>;

    fn redo(&mut self, graph: &mut Graph) -> ModelResult<()>;

    fn start_batch(&mut self, description: &str);

    /// Close the innermost batch and record its combined inverse
    fn store_batch(&mut self) -> ModelResult<()>;

    /// Close the innermost batch and roll back everything it executed
    fn discard_batch(&mut self, graph: &mut Graph) -> ModelResult<()>;

    fn can_undo(&self) -> bool;

    fn can_redo(&self) -> bool;

    fn undo_description(&self) -> Option<&str>;

    fn redo_description(&self) -> Option<&str>;

    /// Forget all recorded commands and open batches
    fn reset(&mut self);
}
