// Entity change events delivered through the notification bus

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::EntityId;
use crate::workflows::{WorkflowAction, WorkflowState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Content changed through the command log
    Mutated,
    /// Lifecycle state changed
    Transitioned,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::Mutated, EventKind::Transitioned];
}

/// Which command-log operation produced a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryDirection {
    Execute,
    Undo,
    Redo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    Mutation {
        description: String,
        direction: HistoryDirection,
    },
    Transition {
        from: WorkflowState,
        to: WorkflowState,
        action: WorkflowAction,
    },
}

/// Immutable notification about an accepted entity mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityEvent {
    id: Uuid,
    kind: EventKind,
    entity_id: EntityId,
    version: u64,
    payload: Option<EventPayload>,
    occurred_at: DateTime<Utc>,
}

impl EntityEvent {
    pub fn new(
        kind: EventKind,
        entity_id: EntityId,
        version: u64,
        payload: Option<EventPayload>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            entity_id,
            version,
            payload,
            occurred_at: Utc::now(),
        }
    }

    pub fn mutated(
        entity_id: EntityId,
        version: u64,
        description: impl Into<String>,
        direction: HistoryDirection,
    ) -> Self {
        Self::new(
            EventKind::Mutated,
            entity_id,
            version,
            Some(EventPayload::Mutation {
                description: description.into(),
                direction,
            }),
        )
    }

    pub fn transitioned(
        entity_id: EntityId,
        version: u64,
        from: WorkflowState,
        to: WorkflowState,
        action: WorkflowAction,
    ) -> Self {
        Self::new(
            EventKind::Transitioned,
            entity_id,
            version,
            Some(EventPayload::Transition { from, to, action }),
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn payload(&self) -> Option<&EventPayload> {
        self.payload.as_ref()
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
