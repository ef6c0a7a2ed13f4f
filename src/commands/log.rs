// Command log - undo/redo stacks over executed edit commands

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commands::types::EditCommand;
use crate::entity::Document;
use crate::errors::WorkflowError;

/// History settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of undoable commands. Oldest entries are dropped first.
    /// `None` keeps everything.
    #[serde(default)]
    pub max_depth: Option<usize>,
}

/// Result of an undo or redo request on the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryStep {
    /// A command was inverted or re-applied; carries its description
    Applied(String),
    NothingToUndo,
    NothingToRedo,
}

impl HistoryStep {
    pub fn is_applied(&self) -> bool {
        matches!(self, HistoryStep::Applied(_))
    }

    pub fn description(&self) -> &str {
        match self {
            HistoryStep::Applied(description) => description,
            HistoryStep::NothingToUndo => "Nothing to undo",
            HistoryStep::NothingToRedo => "Nothing to redo",
        }
    }
}

/// Two stacks: `done` (applied, newest last) and `undone` (available for redo).
/// Executing a new command discards the redo stack.
#[derive(Debug, Default)]
pub struct CommandLog {
    done: Vec<EditCommand>,
    undone: Vec<EditCommand>,
    config: HistoryConfig,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn execute(
        &mut self,
        mut command: EditCommand,
        document: &mut Document,
    ) -> Result<String, WorkflowError> {
        let description = command.execute(document)?;

        let discarded = self.undone.len();
        self.done.push(command);
        self.undone.clear();
        self.enforce_depth();

        debug!(
            entity_id = %document.id(),
            undo_depth = self.done.len(),
            discarded_redo = discarded,
            "Command executed"
        );
        Ok(description)
    }

    pub fn undo(&mut self, document: &mut Document) -> Result<HistoryStep, WorkflowError> {
        let Some(mut command) = self.done.pop() else {
            return Ok(HistoryStep::NothingToUndo);
        };

        match command.undo(document) {
            Ok(description) => {
                self.undone.push(command);
                Ok(HistoryStep::Applied(description))
            }
            Err(err) => {
                self.done.push(command);
                Err(err)
            }
        }
    }

    pub fn redo(&mut self, document: &mut Document) -> Result<HistoryStep, WorkflowError> {
        let Some(mut command) = self.undone.pop() else {
            return Ok(HistoryStep::NothingToRedo);
        };

        match command.execute(document) {
            Ok(description) => {
                self.done.push(command);
                Ok(HistoryStep::Applied(description))
            }
            Err(err) => {
                self.undone.push(command);
                Err(err)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.done.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.undone.len()
    }

    /// Summaries of undoable commands, most recent first
    pub fn undo_descriptions(&self) -> Vec<String> {
        self.done.iter().rev().map(EditCommand::summary).collect()
    }

    /// Summaries of redoable commands, next redo first
    pub fn redo_descriptions(&self) -> Vec<String> {
        self.undone.iter().rev().map(EditCommand::summary).collect()
    }

    fn enforce_depth(&mut self) {
        if let Some(max_depth) = self.config.max_depth {
            if self.done.len() > max_depth {
                let excess = self.done.len() - max_depth;
                self.done.drain(..excess);
                debug!(dropped = excess, max_depth, "Trimmed command history");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_log_boundaries() {
        let mut doc = Document::new("doc");
        let mut log = CommandLog::new();

        assert_eq!(log.undo(&mut doc).unwrap(), HistoryStep::NothingToUndo);
        assert_eq!(log.redo(&mut doc).unwrap(), HistoryStep::NothingToRedo);
        assert_eq!(HistoryStep::NothingToUndo.description(), "Nothing to undo");
        assert_eq!(doc.content(), "");
    }

    #[test]
    fn test_execute_undo_undo_redo_matches_first_command() {
        let mut doc = Document::new("doc");
        let mut log = CommandLog::new();

        log.execute(EditCommand::insert(0, "Hello"), &mut doc).unwrap();
        let after_a = doc.content().to_string();
        log.execute(EditCommand::insert(5, " World"), &mut doc).unwrap();

        assert!(log.undo(&mut doc).unwrap().is_applied());
        assert!(log.undo(&mut doc).unwrap().is_applied());
        assert_eq!(doc.content(), "");

        assert!(log.redo(&mut doc).unwrap().is_applied());
        assert_eq!(doc.content(), after_a);
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut doc = Document::new("doc");
        let mut log = CommandLog::new();

        log.execute(EditCommand::insert(0, "Hello"), &mut doc).unwrap();
        log.execute(EditCommand::insert(5, " World"), &mut doc).unwrap();
        log.undo(&mut doc).unwrap();
        assert!(log.can_redo());

        log.execute(EditCommand::insert(5, " Python"), &mut doc).unwrap();
        assert!(!log.can_redo());
        assert_eq!(log.redo(&mut doc).unwrap(), HistoryStep::NothingToRedo);
        assert_eq!(doc.content(), "Hello Python");
    }

    #[test]
    fn test_failed_execute_leaves_stacks_alone() {
        let mut doc = Document::new("doc");
        let mut log = CommandLog::new();

        log.execute(EditCommand::insert(0, "abc"), &mut doc).unwrap();
        log.undo(&mut doc).unwrap();
        log.execute(EditCommand::insert(0, "xyz"), &mut doc).unwrap();
        log.undo(&mut doc).unwrap();

        let err = log.execute(EditCommand::delete(0, 10), &mut doc).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidCommand { .. }));
        assert_eq!(log.undo_depth(), 0);
        assert_eq!(log.redo_depth(), 1);
    }

    #[test]
    fn test_max_depth_drops_oldest() {
        let mut doc = Document::new("doc");
        let mut log = CommandLog::with_config(HistoryConfig { max_depth: Some(2) });

        log.execute(EditCommand::insert(0, "a"), &mut doc).unwrap();
        log.execute(EditCommand::insert(1, "b"), &mut doc).unwrap();
        log.execute(EditCommand::insert(2, "c"), &mut doc).unwrap();
        assert_eq!(log.undo_depth(), 2);

        log.undo(&mut doc).unwrap();
        log.undo(&mut doc).unwrap();
        assert_eq!(log.undo(&mut doc).unwrap(), HistoryStep::NothingToUndo);
        assert_eq!(doc.content(), "a");
    }

    #[test]
    fn test_descriptions_are_most_recent_first() {
        let mut doc = Document::new("doc");
        let mut log = CommandLog::new();

        log.execute(EditCommand::insert(0, "Hello"), &mut doc).unwrap();
        log.execute(EditCommand::delete(0, 1), &mut doc).unwrap();

        assert_eq!(
            log.undo_descriptions(),
            vec!["delete 0..1".to_string(), "insert 'Hello' at 0".to_string()]
        );
        log.undo(&mut doc).unwrap();
        assert_eq!(log.redo_descriptions(), vec!["delete 0..1".to_string()]);
    }
}
