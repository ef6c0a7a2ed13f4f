// docflow - editable-entity workflow engine
// Reversible command log, document approval state machine and a synchronous
// notification bus, composed by a per-entity workflow controller.

pub mod bus;
pub mod commands;
pub mod config;
pub mod controller;
pub mod entity;
pub mod errors;
pub mod events;
pub mod observability;
pub mod script;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use crate::bus::{Listener, ListenerFailure, NamedListener, NotificationBus, Subscription, SubscriptionId};
pub use crate::commands::{CommandLog, EditCommand, HistoryConfig, HistoryStep};
pub use crate::config::{config, init_config, DocflowConfig, ObservabilityConfig, WorkflowConfig};
pub use crate::controller::{HistoryOutcome, OperationReceipt, SharedController, StatusReport, WorkflowController};
pub use crate::entity::{Document, EntityId};
pub use crate::errors::{ErrorKind, WorkflowError};
pub use crate::events::{EntityEvent, EventKind, EventPayload, HistoryDirection};
pub use crate::observability::{OperationTimer, WorkflowMetrics, WorkflowStats};
pub use crate::telemetry::{create_entity_span, generate_correlation_id, init_telemetry, shutdown_telemetry};
pub use crate::workflows::{apply_action, TransitionRecord, WorkflowAction, WorkflowState};
