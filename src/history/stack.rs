//! Two-stack undo/redo history with nestable batches

use super::command::Command;
use super::{History, HistoryError};
use crate::graph::{Graph, ModelResult};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Commands recorded since `start_batch`
#[derive(Debug)]
struct OpenBatch {
    description: String,
    inverses: Vec<Command>,
}

/// One user-visible step: the action's name and the command reverting it
#[derive(Debug)]
struct Step {
    description: String,
    command: Command,
}

/// The standard history: an undo stack and a redo stack
#[derive(Debug, Default)]
pub struct UndoStack {
    undo: VecDeque<Step>,
    redo: Vec<Step>,
    batches: Vec<OpenBatch>,
    max_depth: Option<usize>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `max_depth` undo steps, dropping the oldest
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn has_open_batch(&self) -> bool {
        !self.batches.is_empty()
    }

    /// Record an inverse into the open batch or onto the undo stack
    fn record(&mut self, description: String, inverse: Command) {
        if let Some(batch) = self.batches.last_mut() {
            batch.inverses.push(inverse);
            return;
        }
        self.undo.push_back(Step {
            description,
            command: inverse,
        });
        if let Some(max) = self.max_depth {
            while self.undo.len() > max {
                self.undo.pop_front();
            }
        }
    }
}

impl History for UndoStack {
    fn execute(&mut self, graph: &mut Graph, command: Command) -> ModelResult<()> {
        let description = command.description().to_string();
        let inverse = command.apply(graph)?;
        self.record(description, inverse);
        self.redo.clear();
        Ok(())
    }

    fn register_to_undo(&mut self, command: Command) {
        self.record(command.description().to_string(), command);
        self.redo.clear();
    }

    fn undo(&mut self, graph: &mut Graph) -> ModelResult<()> {
        if self.has_open_batch() {
            return Err(HistoryError::BatchOpen.into());
        }
        let Some(step) = self.undo.pop_back() else {
            return Ok(());
        };
        debug!(command = %step.description, "undo");
        match step.command.apply(graph) {
            Ok(redo) => {
                self.redo.push(Step {
                    description: step.description,
                    command: redo,
                });
                Ok(())
            }
            Err(err) => {
                warn!(command = %step.description, error = %err, "undo failed, step kept");
                self.undo.push_back(step);
                Err(err)
            }
        }
    }

    fn redo(&mut self, graph: &mut Graph) -> ModelResult<()> {
        if self.has_open_batch() {
            return Err(HistoryError::BatchOpen.into());
        }
        let Some(step) = self.redo.pop() else {
            return Ok(());
        };
        debug!(command = %step.description, "redo");
        match step.command.apply(graph) {
            Ok(inverse) => {
                self.undo.push_back(Step {
                    description: step.description,
                    command: inverse,
                });
                Ok(())
            }
            Err(err) => {
                warn!(command = %step.description, error = %err, "redo failed, step kept");
                self.redo.push(step);
                Err(err)
            }
        }
    }

    fn start_batch(&mut self, description: &str) {
        self.batches.push(OpenBatch {
            description: description.to_string(),
            inverses: Vec::new(),
        });
    }

    fn store_batch(&mut self) -> ModelResult<()> {
        let batch = self.batches.pop().ok_or(HistoryError::NoOpenBatch)?;
        if batch.inverses.is_empty() {
            return Ok(());
        }
        let mut inverses = batch.inverses;
        inverses.reverse();
        let command = Command::batch(batch.description.clone(), inverses);
        self.record(batch.description, command);
        Ok(())
    }

    fn discard_batch(&mut self, graph: &mut Graph) -> ModelResult<()> {
        let batch = self.batches.pop().ok_or(HistoryError::NoOpenBatch)?;
        let mut first_error = None;
        for inverse in batch.inverses.into_iter().rev() {
            let label = inverse.description().to_string();
            if let Err(err) = inverse.apply(graph) {
                warn!(command = %label, error = %err, "failed to roll back discarded batch step");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    fn undo_description(&self) -> Option<&str> {
        self.undo.back().map(|step| step.description.as_str())
    }

    fn redo_description(&self) -> Option<&str> {
        self.redo.last().map(|step| step.description.as_str())
    }

    fn reset(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.batches.clear();
    }
}
