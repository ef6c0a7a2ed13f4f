// Workflow controller - sole owner of a document, its command log and its
// lifecycle state. Every accepted mutation bumps the document version and is
// published on the notification bus after the fact.

use chrono::Utc;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::bus::{Listener, ListenerFailure, NotificationBus, SubscriptionId};
use crate::commands::{CommandLog, EditCommand, HistoryStep};
use crate::config::{DocflowConfig, WorkflowConfig};
use crate::entity::{Document, EntityId};
use crate::errors::WorkflowError;
use crate::events::{EntityEvent, EventKind, HistoryDirection};
use crate::observability::{OperationTimer, WorkflowMetrics, WorkflowStats};
use crate::telemetry::{create_entity_span, generate_correlation_id};
use crate::workflows::{apply_action, TransitionRecord, WorkflowAction, WorkflowState};

/// Returned for every accepted mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationReceipt {
    /// Human-readable effect of the operation
    pub description: String,
    /// Document version after the mutation
    pub version: u64,
    /// The event that was published
    pub event: EntityEvent,
    /// Listener errors reported by the bus for `event`
    pub listener_failures: Vec<ListenerFailure>,
}

/// Result of `undo` / `redo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOutcome {
    Applied(OperationReceipt),
    NothingToUndo,
    NothingToRedo,
}

impl HistoryOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, HistoryOutcome::Applied(_))
    }

    pub fn receipt(&self) -> Option<&OperationReceipt> {
        match self {
            HistoryOutcome::Applied(receipt) => Some(receipt),
            _ => None,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            HistoryOutcome::Applied(receipt) => &receipt.description,
            HistoryOutcome::NothingToUndo => "Nothing to undo",
            HistoryOutcome::NothingToRedo => "Nothing to redo",
        }
    }
}

/// Serializable snapshot of a controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub entity_id: EntityId,
    pub state: WorkflowState,
    pub version: u64,
    pub content_length: usize,
    pub undo_depth: usize,
    pub redo_depth: usize,
    pub allowed_actions: Vec<WorkflowAction>,
    pub transitions_count: usize,
    pub subscriber_count: usize,
    pub stats: WorkflowStats,
}

pub struct WorkflowController {
    document: Document,
    log: CommandLog,
    bus: Arc<NotificationBus>,
    policy: WorkflowConfig,
    transitions: Vec<TransitionRecord>,
    metrics: WorkflowMetrics,
    correlation_id: String,
}

impl std::fmt::Debug for WorkflowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowController")
            .field("document", &self.document)
            .field("undo_depth", &self.log.undo_depth())
            .field("redo_depth", &self.log.redo_depth())
            .field("policy", &self.policy)
            .field("transitions", &self.transitions.len())
            .field("subscribers", &self.bus.subscriber_count())
            .field("correlation_id", &self.correlation_id)
            .finish()
    }
}

impl WorkflowController {
    /// Controller over a new empty draft
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self::with_document(Document::new(id))
    }

    /// Controller over a document supplied by the caller's entity store
    pub fn with_document(document: Document) -> Self {
        Self {
            document,
            log: CommandLog::new(),
            bus: Arc::new(NotificationBus::new()),
            policy: WorkflowConfig::default(),
            transitions: Vec::new(),
            metrics: WorkflowMetrics::new(),
            correlation_id: generate_correlation_id(),
        }
    }

    /// Apply history and workflow settings. Resets the command log, so call
    /// it while building the controller.
    pub fn with_config(mut self, config: &DocflowConfig) -> Self {
        self.log = CommandLog::with_config(config.history.clone());
        self.policy = config.workflow.clone();
        self
    }

    /// Publish on a bus shared with other controllers
    pub fn with_bus(mut self, bus: Arc<NotificationBus>) -> Self {
        self.bus = bus;
        self
    }

    /// Execute `command` against the document and record it for undo
    pub fn apply_command(&mut self, command: EditCommand) -> Result<OperationReceipt, WorkflowError> {
        let _span = create_entity_span(
            "apply_command",
            self.document.id(),
            Some(self.correlation_id.as_str()),
        )
        .entered();
        let timer = OperationTimer::new("apply_command");
        let kind = command.kind();

        self.ensure_editable("apply_command")?;
        let description = self
            .log
            .execute(command, &mut self.document)
            .map_err(|err| self.rejected("apply_command", err))?;

        self.metrics.record_command();
        let receipt = self.commit_mutation(description, HistoryDirection::Execute);
        info!(
            entity_id = %self.document.id(),
            command = kind,
            version = receipt.version,
            "Command applied"
        );
        timer.finish();
        Ok(receipt)
    }

    pub fn undo(&mut self) -> Result<HistoryOutcome, WorkflowError> {
        let _span =
            create_entity_span("undo", self.document.id(), Some(self.correlation_id.as_str())).entered();

        self.ensure_editable("undo")?;
        let step = self
            .log
            .undo(&mut self.document)
            .map_err(|err| self.rejected("undo", err))?;

        Ok(self.settle_history_step(step, HistoryDirection::Undo))
    }

    pub fn redo(&mut self) -> Result<HistoryOutcome, WorkflowError> {
        let _span =
            create_entity_span("redo", self.document.id(), Some(self.correlation_id.as_str())).entered();

        self.ensure_editable("redo")?;
        let step = self
            .log
            .redo(&mut self.document)
            .map_err(|err| self.rejected("redo", err))?;

        Ok(self.settle_history_step(step, HistoryDirection::Redo))
    }

    /// Advance the lifecycle. Transitions are not part of the undo history.
    pub fn transition(&mut self, action: WorkflowAction) -> Result<OperationReceipt, WorkflowError> {
        let _span =
            create_entity_span("transition", self.document.id(), Some(self.correlation_id.as_str()))
                .entered();

        let from = self.document.state();
        let to = apply_action(from, action).map_err(|err| self.rejected("transition", err))?;

        self.document.set_state(to);
        let version = self.document.record_mutation();
        self.transitions.push(TransitionRecord {
            from_state: from,
            to_state: to,
            action,
            version,
            timestamp: Utc::now(),
        });
        self.metrics.record_transition();

        info!(
            entity_id = %self.document.id(),
            from_state = %from,
            to_state = %to,
            action = %action,
            version,
            "Workflow transition"
        );

        let event = EntityEvent::transitioned(self.document.id().clone(), version, from, to, action);
        Ok(self.dispatch(format!("{}: {} -> {}", action, from, to), event))
    }

    pub fn subscribe(
        &self,
        listener: Arc<dyn Listener>,
        kinds: impl IntoIterator<Item = EventKind>,
    ) -> SubscriptionId {
        self.bus.subscribe(listener, kinds)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Hand the document back to the caller's entity store
    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn content(&self) -> &str {
        self.document.content()
    }

    pub fn state(&self) -> WorkflowState {
        self.document.state()
    }

    pub fn version(&self) -> u64 {
        self.document.version()
    }

    pub fn can_undo(&self) -> bool {
        self.log.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log.can_redo()
    }

    pub fn command_log(&self) -> &CommandLog {
        &self.log
    }

    pub fn transition_history(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    pub fn bus(&self) -> Arc<NotificationBus> {
        Arc::clone(&self.bus)
    }

    pub fn metrics(&self) -> &WorkflowMetrics {
        &self.metrics
    }

    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            entity_id: self.document.id().clone(),
            state: self.document.state(),
            version: self.document.version(),
            content_length: self.document.len(),
            undo_depth: self.log.undo_depth(),
            redo_depth: self.log.redo_depth(),
            allowed_actions: self.document.state().allowed_actions(),
            transitions_count: self.transitions.len(),
            subscriber_count: self.bus.subscriber_count(),
            stats: self.metrics.get_stats(),
        }
    }

    fn ensure_editable(&self, operation: &'static str) -> Result<(), WorkflowError> {
        let state = self.document.state();
        if self.policy.lock_content_in_review && state == WorkflowState::InReview {
            return Err(self.rejected(operation, WorkflowError::ContentLocked { state }));
        }
        Ok(())
    }

    fn settle_history_step(&mut self, step: HistoryStep, direction: HistoryDirection) -> HistoryOutcome {
        match step {
            HistoryStep::Applied(description) => {
                match direction {
                    HistoryDirection::Redo => self.metrics.record_redo(),
                    _ => self.metrics.record_undo(),
                }
                let receipt = self.commit_mutation(description, direction);
                info!(
                    entity_id = %self.document.id(),
                    direction = ?direction,
                    version = receipt.version,
                    "History step applied"
                );
                HistoryOutcome::Applied(receipt)
            }
            HistoryStep::NothingToUndo => {
                debug!(entity_id = %self.document.id(), "Nothing to undo");
                HistoryOutcome::NothingToUndo
            }
            HistoryStep::NothingToRedo => {
                debug!(entity_id = %self.document.id(), "Nothing to redo");
                HistoryOutcome::NothingToRedo
            }
        }
    }

    fn commit_mutation(&mut self, description: String, direction: HistoryDirection) -> OperationReceipt {
        let version = self.document.record_mutation();
        let event = EntityEvent::mutated(
            self.document.id().clone(),
            version,
            description.clone(),
            direction,
        );
        self.dispatch(description, event)
    }

    fn dispatch(&self, description: String, event: EntityEvent) -> OperationReceipt {
        let listener_failures = self.bus.publish(&event);
        if !listener_failures.is_empty() {
            self.metrics.record_listener_failures(listener_failures.len());
        }
        OperationReceipt {
            description,
            version: event.version(),
            event,
            listener_failures,
        }
    }

    fn rejected(&self, operation: &'static str, err: WorkflowError) -> WorkflowError {
        self.metrics.record_rejection();
        warn!(
            entity_id = %self.document.id(),
            operation,
            state = %self.document.state(),
            version = self.document.version(),
            kind = ?err.kind(),
            error = %err,
            "Operation rejected"
        );
        err
    }
}

/// Thread-safe handle to one controller.
///
/// A single mutex serializes `apply_command`, `undo`, `redo` and
/// `transition` for the entity. Listeners run while that lock is held, so a
/// listener must not call back into the same `SharedController`; doing so
/// deadlocks. Listeners may still subscribe or unsubscribe on the bus.
#[derive(Debug, Clone)]
pub struct SharedController {
    inner: Arc<Mutex<WorkflowController>>,
    bus: Arc<NotificationBus>,
}

impl SharedController {
    pub fn new(controller: WorkflowController) -> Self {
        let bus = controller.bus();
        Self {
            inner: Arc::new(Mutex::new(controller)),
            bus,
        }
    }

    pub fn apply_command(&self, command: EditCommand) -> Result<OperationReceipt, WorkflowError> {
        self.lock().apply_command(command)
    }

    pub fn undo(&self) -> Result<HistoryOutcome, WorkflowError> {
        self.lock().undo()
    }

    pub fn redo(&self) -> Result<HistoryOutcome, WorkflowError> {
        self.lock().redo()
    }

    pub fn transition(&self, action: WorkflowAction) -> Result<OperationReceipt, WorkflowError> {
        self.lock().transition(action)
    }

    // Subscriptions go straight to the bus so they never wait on the entity lock.
    pub fn subscribe(
        &self,
        listener: Arc<dyn Listener>,
        kinds: impl IntoIterator<Item = EventKind>,
    ) -> SubscriptionId {
        self.bus.subscribe(listener, kinds)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Run `f` with read access to the controller
    pub fn read<R>(&self, f: impl FnOnce(&WorkflowController) -> R) -> R {
        f(&self.lock())
    }

    pub fn status_report(&self) -> StatusReport {
        self.lock().status_report()
    }

    fn lock(&self) -> MutexGuard<'_, WorkflowController> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
