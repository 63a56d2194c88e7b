//! Dispatch metrics for observability

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single dispatcher
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Items durably committed
    committed_count: AtomicU64,
    /// Enqueue calls that returned a collaborator error
    failure_count: AtomicU64,
    /// Enqueue calls rejected for a missing item
    invalid_count: AtomicU64,
    /// Transactions handed out by the factory
    opened_count: AtomicU64,
    /// Transactions released by the dispatcher
    released_count: AtomicU64,
    /// Queue resolution attempts
    resolution_attempts: AtomicU64,
    /// Queue resolution failures
    resolution_failures: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed_count(&self) -> u64 {
        self.committed_count.load(Ordering::Relaxed)
    }

    pub fn inc_committed_count(&self) {
        self.committed_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn invalid_count(&self) -> u64 {
        self.invalid_count.load(Ordering::Relaxed)
    }

    pub fn inc_invalid_count(&self) {
        self.invalid_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn opened_count(&self) -> u64 {
        self.opened_count.load(Ordering::Relaxed)
    }

    pub fn inc_opened_count(&self) {
        self.opened_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn released_count(&self) -> u64 {
        self.released_count.load(Ordering::Relaxed)
    }

    pub fn inc_released_count(&self) {
        self.released_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn resolution_attempts(&self) -> u64 {
        self.resolution_attempts.load(Ordering::Relaxed)
    }

    pub fn inc_resolution_attempts(&self) {
        self.resolution_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn resolution_failures(&self) -> u64 {
        self.resolution_failures.load(Ordering::Relaxed)
    }

    pub fn inc_resolution_failures(&self) {
        self.resolution_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Transactions opened but not yet released
    pub fn in_flight(&self) -> u64 {
        self.opened_count().saturating_sub(self.released_count())
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            committed_count: self.committed_count(),
            failure_count: self.failure_count(),
            invalid_count: self.invalid_count(),
            opened_count: self.opened_count(),
            released_count: self.released_count(),
            resolution_attempts: self.resolution_attempts(),
            resolution_failures: self.resolution_failures(),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub committed_count: u64,
    pub failure_count: u64,
    pub invalid_count: u64,
    pub opened_count: u64,
    pub released_count: u64,
    pub resolution_attempts: u64,
    pub resolution_failures: u64,
}
