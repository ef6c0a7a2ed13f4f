// Document approval lifecycle - closed state set with a fixed transition table
//
//   Draft --submit--> InReview --approve--> Published
//     ^                  |                      |
//     +------reject------+                      |
//     +-----------------revise------------------+

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::WorkflowError;

/// Lifecycle states of a workflow entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// Editable working copy
    #[default]
    Draft,
    /// Submitted and waiting for a reviewer decision
    InReview,
    /// Approved and publicly visible
    Published,
}

/// Named workflow actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Submit,
    Approve,
    Reject,
    Revise,
}

impl WorkflowState {
    pub const ALL: [WorkflowState; 3] = [
        WorkflowState::Draft,
        WorkflowState::InReview,
        WorkflowState::Published,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Draft => "draft",
            WorkflowState::InReview => "in_review",
            WorkflowState::Published => "published",
        }
    }

    /// Actions the transition table accepts from this state
    pub fn allowed_actions(self) -> Vec<WorkflowAction> {
        WorkflowAction::ALL
            .into_iter()
            .filter(|action| next_state(self, *action).is_some())
            .collect()
    }

    pub fn can(self, action: WorkflowAction) -> bool {
        next_state(self, action).is_some()
    }
}

impl WorkflowAction {
    pub const ALL: [WorkflowAction; 4] = [
        WorkflowAction::Submit,
        WorkflowAction::Approve,
        WorkflowAction::Reject,
        WorkflowAction::Revise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowAction::Submit => "submit",
            WorkflowAction::Approve => "approve",
            WorkflowAction::Reject => "reject",
            WorkflowAction::Revise => "revise",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn next_state(state: WorkflowState, action: WorkflowAction) -> Option<WorkflowState> {
    use WorkflowAction::*;
    use WorkflowState::*;

    match (state, action) {
        (Draft, Submit) => Some(InReview),
        (InReview, Approve) => Some(Published),
        (InReview, Reject) => Some(Draft),
        (Published, Revise) => Some(Draft),
        _ => None,
    }
}

/// Resolve `action` against the transition table.
///
/// Pure: the caller owns the entity and decides whether to store the result.
pub fn apply_action(
    state: WorkflowState,
    action: WorkflowAction,
) -> Result<WorkflowState, WorkflowError> {
    next_state(state, action).ok_or(WorkflowError::IllegalTransition {
        from: state,
        action,
    })
}

/// Audit entry for an accepted lifecycle transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from_state: WorkflowState,
    pub to_state: WorkflowState,
    pub action: WorkflowAction,
    /// Entity version after the transition
    pub version: u64,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_lifecycle() {
        let review = apply_action(WorkflowState::Draft, WorkflowAction::Submit).unwrap();
        assert_eq!(review, WorkflowState::InReview);

        let published = apply_action(review, WorkflowAction::Approve).unwrap();
        assert_eq!(published, WorkflowState::Published);

        let draft = apply_action(published, WorkflowAction::Revise).unwrap();
        assert_eq!(draft, WorkflowState::Draft);
    }

    #[test]
    fn test_reject_returns_to_draft() {
        assert_eq!(
            apply_action(WorkflowState::InReview, WorkflowAction::Reject).unwrap(),
            WorkflowState::Draft
        );
    }

    #[test]
    fn test_only_four_pairs_are_legal() {
        let legal: Vec<_> = WorkflowState::ALL
            .into_iter()
            .flat_map(|state| WorkflowAction::ALL.into_iter().map(move |action| (state, action)))
            .filter(|(state, action)| apply_action(*state, *action).is_ok())
            .collect();

        assert_eq!(
            legal,
            vec![
                (WorkflowState::Draft, WorkflowAction::Submit),
                (WorkflowState::InReview, WorkflowAction::Approve),
                (WorkflowState::InReview, WorkflowAction::Reject),
                (WorkflowState::Published, WorkflowAction::Revise),
            ]
        );
    }

    #[test]
    fn test_illegal_transition_reports_state_and_action() {
        let err = apply_action(WorkflowState::Published, WorkflowAction::Approve).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::IllegalTransition {
                from: WorkflowState::Published,
                action: WorkflowAction::Approve,
            }
        );
    }

    #[test]
    fn test_allowed_actions() {
        assert_eq!(
            WorkflowState::Draft.allowed_actions(),
            vec![WorkflowAction::Submit]
        );
        assert_eq!(
            WorkflowState::InReview.allowed_actions(),
            vec![WorkflowAction::Approve, WorkflowAction::Reject]
        );
        assert!(WorkflowState::Published.can(WorkflowAction::Revise));
        assert!(!WorkflowState::Published.can(WorkflowAction::Submit));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&WorkflowState::InReview).unwrap(),
            "\"in_review\""
        );
        let action: WorkflowAction = serde_json::from_str("\"approve\"").unwrap();
        assert_eq!(action, WorkflowAction::Approve);
    }
}
