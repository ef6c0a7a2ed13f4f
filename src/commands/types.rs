// Reversible edit commands

use serde::{Deserialize, Serialize};

use crate::entity::Document;
use crate::errors::WorkflowError;

/// A reversible content mutation.
///
/// Each variant carries what it needs to invert itself. `Delete` and
/// `Replace` cache the text they overwrite on execution; that cache is the
/// only state that changes after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditCommand {
    /// Insert `text` at byte offset `position`
    Insert { position: usize, text: String },
    /// Remove the byte range `start..end`
    Delete {
        start: usize,
        end: usize,
        #[serde(skip)]
        removed: Option<String>,
    },
    /// Overwrite the byte range `start..end` with `text`
    Replace {
        start: usize,
        end: usize,
        text: String,
        #[serde(skip)]
        replaced: Option<String>,
    },
}

impl EditCommand {
    pub fn insert(position: usize, text: impl Into<String>) -> Self {
        EditCommand::Insert {
            position,
            text: text.into(),
        }
    }

    pub fn delete(start: usize, end: usize) -> Self {
        EditCommand::Delete {
            start,
            end,
            removed: None,
        }
    }

    pub fn replace(start: usize, end: usize, text: impl Into<String>) -> Self {
        EditCommand::Replace {
            start,
            end,
            text: text.into(),
            replaced: None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EditCommand::Insert { .. } => "insert",
            EditCommand::Delete { .. } => "delete",
            EditCommand::Replace { .. } => "replace",
        }
    }

    /// Short label used in history listings
    pub fn summary(&self) -> String {
        match self {
            EditCommand::Insert { position, text } => {
                format!("insert '{}' at {}", text, position)
            }
            EditCommand::Delete { start, end, .. } => format!("delete {}..{}", start, end),
            EditCommand::Replace {
                start, end, text, ..
            } => format!("replace {}..{} with '{}'", start, end, text),
        }
    }

    /// Apply the command. On error the document is left untouched.
    pub fn execute(&mut self, document: &mut Document) -> Result<String, WorkflowError> {
        match self {
            EditCommand::Insert { position, text } => {
                document.insert_at(*position, text)?;
                Ok(format!("Inserted '{}' at position {}", text, position))
            }
            EditCommand::Delete {
                start,
                end,
                removed,
            } => {
                let deleted = document.remove_range(*start, *end)?;
                let description = format!("Deleted '{}'", deleted);
                *removed = Some(deleted);
                Ok(description)
            }
            EditCommand::Replace {
                start,
                end,
                text,
                replaced,
            } => {
                let previous = document.replace_range(*start, *end, text)?;
                let description = format!("Replaced '{}' with '{}'", previous, text);
                *replaced = Some(previous);
                Ok(description)
            }
        }
    }

    /// Invert a previous `execute`, assuming the document is exactly as
    /// that execution left it.
    pub fn undo(&mut self, document: &mut Document) -> Result<String, WorkflowError> {
        match self {
            EditCommand::Insert { position, text } => {
                document.remove_range(*position, *position + text.len())?;
                Ok(format!("Undid insert of '{}'", text))
            }
            EditCommand::Delete { start, removed, .. } => {
                let restored = removed
                    .as_deref()
                    .ok_or_else(|| WorkflowError::invalid_command("delete was never executed"))?;
                document.insert_at(*start, restored)?;
                Ok(format!("Undid delete, restored '{}'", restored))
            }
            EditCommand::Replace {
                start,
                text,
                replaced,
                ..
            } => {
                let restored = replaced
                    .as_deref()
                    .ok_or_else(|| WorkflowError::invalid_command("replace was never executed"))?;
                document.replace_range(*start, *start + text.len(), restored)?;
                Ok(format!("Undid replace, restored '{}'", restored))
            }
        }
    }
}
