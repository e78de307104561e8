use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Board command and reconciliation counters
#[derive(Debug, Default)]
pub struct BoardMetrics {
    pub commands_sent: AtomicU64,
    pub commands_rejected: AtomicU64,
    pub network_failures: AtomicU64,
    pub cancellations: AtomicU64,
    pub reconciliations: AtomicU64,
    pub failed_reconciliations: AtomicU64,
    pub forced_transitions: AtomicU64,
}

impl BoardMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_command(&self) {
        self.commands_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.commands_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_network_failure(&self) {
        self.network_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancellation(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reconciliation(&self, succeeded: bool) {
        self.reconciliations.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.failed_reconciliations.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_forced_transition(&self) {
        self.forced_transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> BoardStats {
        BoardStats {
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
            commands_rejected: self.commands_rejected.load(Ordering::Relaxed),
            network_failures: self.network_failures.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            reconciliations: self.reconciliations.load(Ordering::Relaxed),
            failed_reconciliations: self.failed_reconciliations.load(Ordering::Relaxed),
            forced_transitions: self.forced_transitions.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            commands = stats.commands_sent,
            rejected = stats.commands_rejected,
            network_failures = stats.network_failures,
            cancellations = stats.cancellations,
            reconciliations = stats.reconciliations,
            failed_reconciliations = stats.failed_reconciliations,
            forced_transitions = stats.forced_transitions,
            "Board session metrics"
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardStats {
    pub commands_sent: u64,
    pub commands_rejected: u64,
    pub network_failures: u64,
    pub cancellations: u64,
    pub reconciliations: u64,
    pub failed_reconciliations: u64,
    pub forced_transitions: u64,
}

/// Time an operation and log its duration on finish
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis() as u64,
            "Operation completed"
        );
    }
}
