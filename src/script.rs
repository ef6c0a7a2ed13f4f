// Scripted sessions - replay a list of operations against a controller

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::commands::EditCommand;
use crate::controller::{HistoryOutcome, WorkflowController};
use crate::errors::ErrorKind;
use crate::workflows::WorkflowAction;

/// One operation of a replay script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    Insert { position: usize, text: String },
    Delete { start: usize, end: usize },
    Replace { start: usize, end: usize, text: String },
    Undo,
    Redo,
    Transition { action: WorkflowAction },
}

/// What happened to a single step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Applied { description: String, version: u64, listener_failures: usize },
    NoOp { description: String },
    Rejected { kind: ErrorKind, detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub step: ScriptStep,
    pub outcome: StepOutcome,
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse script {}", path.display()))
}

/// Run every step in order. Rejected steps are reported and do not stop the
/// script.
pub fn run_script(controller: &mut WorkflowController, steps: &[ScriptStep]) -> Vec<StepReport> {
    steps
        .iter()
        .enumerate()
        .map(|(index, step)| StepReport {
            index,
            step: step.clone(),
            outcome: run_step(controller, step),
        })
        .collect()
}

fn run_step(controller: &mut WorkflowController, step: &ScriptStep) -> StepOutcome {
    let result = match step {
        ScriptStep::Insert { position, text } => controller
            .apply_command(EditCommand::insert(*position, text.clone()))
            .map(HistoryOutcome::Applied),
        ScriptStep::Delete { start, end } => controller
            .apply_command(EditCommand::delete(*start, *end))
            .map(HistoryOutcome::Applied),
        ScriptStep::Replace { start, end, text } => controller
            .apply_command(EditCommand::replace(*start, *end, text.clone()))
            .map(HistoryOutcome::Applied),
        ScriptStep::Undo => controller.undo(),
        ScriptStep::Redo => controller.redo(),
        ScriptStep::Transition { action } => controller
            .transition(*action)
            .map(HistoryOutcome::Applied),
    };

    match result {
        Ok(HistoryOutcome::Applied(receipt)) => StepOutcome::Applied {
            description: receipt.description,
            version: receipt.version,
            listener_failures: receipt.listener_failures.len(),
        },
        Ok(outcome) => StepOutcome::NoOp {
            description: outcome.description().to_string(),
        },
        Err(err) => StepOutcome::Rejected {
            kind: err.kind(),
            detail: err.to_string(),
        },
    }
}

/// The command/state walk-through used by `docflow demo`
pub fn demo_script() -> Vec<ScriptStep> {
    vec![
        ScriptStep::Insert { position: 0, text: "Hello".to_string() },
        ScriptStep::Insert { position: 5, text: " World".to_string() },
        ScriptStep::Insert { position: 11, text: "!".to_string() },
        ScriptStep::Undo,
        ScriptStep::Undo,
        ScriptStep::Redo,
        ScriptStep::Insert { position: 5, text: " Python".to_string() },
        ScriptStep::Redo,
        ScriptStep::Transition { action: WorkflowAction::Submit },
        ScriptStep::Transition { action: WorkflowAction::Submit },
        ScriptStep::Transition { action: WorkflowAction::Reject },
        ScriptStep::Transition { action: WorkflowAction::Submit },
        ScriptStep::Transition { action: WorkflowAction::Approve },
        ScriptStep::Replace { start: 0, end: 5, text: "Goodbye".to_string() },
        ScriptStep::Transition { action: WorkflowAction::Revise },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let steps: Vec<ScriptStep> = serde_json::from_str(
            r#"[
                {"op": "insert", "position": 0, "text": "Hi"},
                {"op": "undo"},
                {"op": "transition", "action": "submit"}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            steps,
            vec![
                ScriptStep::Insert { position: 0, text: "Hi".to_string() },
                ScriptStep::Undo,
                ScriptStep::Transition { action: WorkflowAction::Submit },
            ]
        );
    }

    #[test]
    fn test_demo_script_outcomes() {
        let mut controller = WorkflowController::new("demo");
        let reports = run_script(&mut controller, &demo_script());

        assert_eq!(controller.content(), "Goodbye Python World");
        assert!(matches!(reports[7].outcome, StepOutcome::NoOp { .. }));
        assert!(matches!(
            reports[9].outcome,
            StepOutcome::Rejected { kind: ErrorKind::IllegalTransition, .. }
        ));

        let rejected = reports
            .iter()
            .filter(|report| matches!(report.outcome, StepOutcome::Rejected { .. }))
            .count();
        assert_eq!(rejected, 1);
        // 15 steps, one no-op redo and one illegal submit
        assert_eq!(controller.version(), 13);
    }
}
