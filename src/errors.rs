use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::workflows::{WorkflowAction, WorkflowState};

/// Errors surfaced by workflow operations.
///
/// Empty undo/redo stacks are not errors; see
/// [`HistoryOutcome`](crate::HistoryOutcome). Listener failures are collected
/// on the operation receipt instead of failing the operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Invalid command: {detail}")]
    InvalidCommand { detail: String },

    #[error("Illegal transition: cannot {action} a document in state {from}")]
    IllegalTransition {
        from: WorkflowState,
        action: WorkflowAction,
    },

    #[error("Content is locked while the document is {state}")]
    ContentLocked { state: WorkflowState },
}

/// Machine-readable error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidCommand,
    IllegalTransition,
    ContentLocked,
}

impl WorkflowError {
    pub fn invalid_command(detail: impl Into<String>) -> Self {
        WorkflowError::InvalidCommand {
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::InvalidCommand { .. } => ErrorKind::InvalidCommand,
            WorkflowError::IllegalTransition { .. } => ErrorKind::IllegalTransition,
            WorkflowError::ContentLocked { .. } => ErrorKind::ContentLocked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            WorkflowError::invalid_command("bad range").kind(),
            ErrorKind::InvalidCommand
        );
        let illegal = WorkflowError::IllegalTransition {
            from: WorkflowState::Draft,
            action: WorkflowAction::Approve,
        };
        assert_eq!(illegal.kind(), ErrorKind::IllegalTransition);
        assert_eq!(
            illegal.to_string(),
            "Illegal transition: cannot approve a document in state draft"
        );
    }
}
