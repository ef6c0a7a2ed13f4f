use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Per-controller operation counters
#[derive(Debug, Default)]
pub struct WorkflowMetrics {
    pub commands_executed: AtomicU64,
    pub undos: AtomicU64,
    pub redos: AtomicU64,
    pub transitions: AtomicU64,
    pub rejected_operations: AtomicU64,
    pub listener_failures: AtomicU64,
}

impl WorkflowMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_command(&self) {
        self.commands_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_undo(&self) {
        self.undos.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_redo(&self) {
        self.redos.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transition(&self) {
        self.transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.rejected_operations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_listener_failures(&self, count: usize) {
        self.listener_failures
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> WorkflowStats {
        WorkflowStats {
            commands_executed: self.commands_executed.load(Ordering::Relaxed),
            undos: self.undos.load(Ordering::Relaxed),
            redos: self.redos.load(Ordering::Relaxed),
            transitions: self.transitions.load(Ordering::Relaxed),
            rejected_operations: self.rejected_operations.load(Ordering::Relaxed),
            listener_failures: self.listener_failures.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Workflow metrics: commands={}, undos={}, redos={}, transitions={}, rejected={}, listener_failures={}",
            stats.commands_executed,
            stats.undos,
            stats.redos,
            stats.transitions,
            stats.rejected_operations,
            stats.listener_failures
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowStats {
    pub commands_executed: u64,
    pub undos: u64,
    pub redos: u64,
    pub transitions: u64,
    pub rejected_operations: u64,
    pub listener_failures: u64,
}

/// Time an operation and log its duration
pub struct OperationTimer {
    operation: &'static str,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
    }
}
