// Entity - the editable document owned by a workflow controller

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::WorkflowError;
use crate::workflows::WorkflowState;

/// Identifier of a workflow entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier for documents that have no external id yet
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for EntityId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The mutable subject of a workflow.
///
/// Content offsets are byte offsets into the UTF-8 buffer. Mutators are
/// crate-private: outside the crate a document is only changed through a
/// [`WorkflowController`](crate::WorkflowController).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    id: EntityId,
    content: String,
    state: WorkflowState,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Document {
    /// Empty draft at version 0
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self::with_content(id, String::new())
    }

    pub fn with_content(id: impl Into<EntityId>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            content: content.into(),
            state: WorkflowState::Draft,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a document handed over by an external entity store
    pub fn restore(
        id: impl Into<EntityId>,
        content: impl Into<String>,
        state: WorkflowState,
        version: u64,
    ) -> Self {
        let mut document = Self::with_content(id, content);
        document.state = state;
        document.version = version;
        document
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub(crate) fn insert_at(&mut self, position: usize, text: &str) -> Result<(), WorkflowError> {
        self.check_offset(position)?;
        self.content.insert_str(position, text);
        Ok(())
    }

    pub(crate) fn remove_range(&mut self, start: usize, end: usize) -> Result<String, WorkflowError> {
        self.check_range(start, end)?;
        Ok(self.content.drain(start..end).collect())
    }

    /// Overwrite `start..end` with `text`, returning what was there before
    pub(crate) fn replace_range(
        &mut self,
        start: usize,
        end: usize,
        text: &str,
    ) -> Result<String, WorkflowError> {
        self.check_range(start, end)?;
        let previous = self.content[start..end].to_string();
        self.content.replace_range(start..end, text);
        Ok(previous)
    }

    pub(crate) fn set_state(&mut self, state: WorkflowState) {
        self.state = state;
    }

    /// Bump the version for an accepted mutation and return the new value
    pub(crate) fn record_mutation(&mut self) -> u64 {
        self.version += 1;
        self.updated_at = Utc::now();
        self.version
    }

    fn check_range(&self, start: usize, end: usize) -> Result<(), WorkflowError> {
        if start > end {
            return Err(WorkflowError::invalid_command(format!(
                "range start {} is after range end {}",
                start, end
            )));
        }
        self.check_offset(start)?;
        self.check_offset(end)
    }

    fn check_offset(&self, offset: usize) -> Result<(), WorkflowError> {
        if offset > self.content.len() {
            return Err(WorkflowError::invalid_command(format!(
                "position {} is out of range for content of length {}",
                offset,
                self.content.len()
            )));
        }
        if !self.content.is_char_boundary(offset) {
            return Err(WorkflowError::invalid_command(format!(
                "position {} is not on a character boundary",
                offset
            )));
        }
        Ok(())
    }
}
