//! Per-service failure streak tracking.
//!
//! # State Transitions
//! ```text
//! Healthy → Failing(t0): first failed update at t0
//! Failing(t0) → Failing(t0): further failures keep t0
//! Failing(t0) → Healthy: successful update
//! ```
//!
//! # Design Decisions
//! - Only the start of the streak is kept; its length is derived from "now"
//! - Eviction is strictly after the grace window, never at its boundary

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use dashmap::DashMap;

/// Remembers, per service id, when the current failure streak began.
#[derive(Debug, Clone, Default)]
pub struct ServiceHealthTracker {
    first_failures: Arc<DashMap<String, SystemTime>>,
}

impl ServiceHealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the failure streak of a service. Returns when it had started.
    pub fn record_success(&self, service_id: &str) -> Option<SystemTime> {
        let cleared = self.first_failures.remove(service_id).map(|(_, since)| since);
        if let Some(since) = cleared {
            tracing::info!(service = %service_id, failing_since = ?since, "Service recovered");
        }
        cleared
    }

    /// Record a failed update at `now` and return the start of the streak.
    pub fn record_failure(&self, service_id: &str, now: SystemTime) -> SystemTime {
        *self
            .first_failures
            .entry(service_id.to_string())
            .or_insert(now)
    }

    pub fn first_failure(&self, service_id: &str) -> Option<SystemTime> {
        self.first_failures.get(service_id).map(|entry| *entry)
    }

    /// Forget every service for which `keep` returns false.
    pub fn retain(&self, mut keep: impl FnMut(&str) -> bool) {
        self.first_failures.retain(|service_id, _| keep(service_id));
    }

    /// Whether a streak that began at `first_failure` has outlasted `grace`.
    pub fn should_evict(first_failure: SystemTime, now: SystemTime, grace: Duration) -> bool {
        match Self::eviction_deadline(first_failure, grace) {
            Some(deadline) => now > deadline,
            None => false,
        }
    }

    /// The last instant at which the routes of a failing service are kept.
    pub fn eviction_deadline(first_failure: SystemTime, grace: Duration) -> Option<SystemTime> {
        first_failure.checked_add(grace)
    }
}
