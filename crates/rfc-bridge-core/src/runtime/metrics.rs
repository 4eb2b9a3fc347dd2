// crates/rfc-bridge-core/src/runtime/metrics.rs
// ============================================================================
// Module: Call Metrics
// Description: In-memory call counters and latency totals.
// Purpose: Record outcomes per operation name for the lifetime of the process.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`CallMetrics`] is created once at startup and shared by every call site.
//! Each [`CallMetrics::record`] is atomic on its own; snapshots are copies and
//! never alias internal state. Nothing is persisted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Mutable counters behind the metrics lock.
#[derive(Debug, Default)]
struct MetricsState {
    /// Calls recorded.
    total: u64,
    /// Calls that succeeded.
    success: u64,
    /// Calls that failed.
    failure: u64,
    /// Cumulative call duration.
    total_duration: Duration,
    /// Calls per operation name.
    per_operation: BTreeMap<String, u64>,
}

/// Point-in-time copy of the call counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Calls recorded.
    pub total: u64,
    /// Calls that succeeded.
    pub success: u64,
    /// Calls that failed.
    pub failure: u64,
    /// Cumulative call duration in milliseconds.
    pub total_duration_ms: u64,
    /// Mean call duration in milliseconds (zero when nothing was recorded).
    pub avg_duration_ms: f64,
    /// Calls per operation name.
    pub per_operation: BTreeMap<String, u64>,
}

/// Concurrency-safe call counters.
#[derive(Debug, Default)]
pub struct CallMetrics {
    /// Counters guarded for each update.
    state: Mutex<MetricsState>,
}

// ============================================================================
// SECTION: Recording
// ============================================================================

impl CallMetrics {
    /// Creates empty counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one call outcome. Never fails.
    pub fn record<T, E>(&self, operation: &str, duration: Duration, outcome: &Result<T, E>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.total = state.total.saturating_add(1);
        state.total_duration = state.total_duration.saturating_add(duration);
        if outcome.is_ok() {
            state.success = state.success.saturating_add(1);
        } else {
            state.failure = state.failure.saturating_add(1);
        }
        let count = state.per_operation.entry(operation.to_string()).or_default();
        *count = count.saturating_add(1);
    }

    /// Returns a copy of the current counters.
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "Averages are reported as approximate floats.")]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let total_ms = state.total_duration.as_secs_f64() * 1000.0;
        let avg_duration_ms = if state.total == 0 { 0.0 } else { total_ms / state.total as f64 };
        MetricsSnapshot {
            total: state.total,
            success: state.success,
            failure: state.failure,
            total_duration_ms: u64::try_from(state.total_duration.as_millis()).unwrap_or(u64::MAX),
            avg_duration_ms,
            per_operation: state.per_operation.clone(),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
