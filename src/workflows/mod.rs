// Workflow lifecycle modules

pub mod state_machine;

pub use state_machine::{apply_action, TransitionRecord, WorkflowAction, WorkflowState};
