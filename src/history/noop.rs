//! History that applies commands and keeps nothing

use super::command::Command;
use super::{History, HistoryError};
use crate::graph::{Graph, ModelResult};

/// History for contexts where undo is disabled
///
/// Commands run immediately and their inverses are dropped. Asking it to
/// undo or redo is a usage error.
#[derive(Debug, Default)]
pub struct NoopHistory;

impl NoopHistory {
    pub fn new() -> Self {
        Self
    }
}

impl History for NoopHistory {
    fn execute(&mut self, graph: &mut Graph, command: Command) -> ModelResult<()> {
        command.apply(graph)?;
        Ok(())
    }

    fn register_to_undo(&mut self, _command: Command) {}

    fn undo(&mut self, _graph: &mut Graph) -> ModelResult<()> {
        Err(HistoryError::UndoUnsupported.into())
    }

    fn redo(&mut self, _graph: &mut Graph) -> ModelResult<()> {
        Err(HistoryError::RedoUnsupported.into())
    }

    fn start_batch(&mut self, _description: &str) {}

    fn store_batch(&mut self) -> ModelResult<()> {
        Ok(())
    }

    /// Nothing was recorded, so nothing is rolled back
    fn discard_batch(&mut self, _graph: &mut Graph) -> ModelResult<()> {
        Ok(())
    }

    fn can_undo(&self) -> bool {
        false
    }

    fn can_redo(&self) -> bool {
        false
    }

    fn undo_description(&self) -> Option<&str> {
        None
    }

    fn redo_description(&self) -> Option<&str> {
        None
    }

    fn reset(&mut self) {}
}
