//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Record the outcome and duration of every definition update
//! - Report how many routes each service currently contributes
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `openapi_route_locator_definition_updates_total` (counter): updates by
//!   service and outcome
//! - `openapi_route_locator_definition_updates_seconds` (histogram): update
//!   duration by service and outcome
//! - `openapi_route_locator_routes_count` (gauge): stored operations per service
//! - `openapi_route_locator_evictions_total` (counter): route removals after
//!   the failure grace window
//!
//! # Design Decisions
//! - Recording goes through [`MetricsSink`] so the update loop does not depend
//!   on a global recorder
//! - Outcome labels are fixed strings, the service id is the only free label

use std::net::SocketAddr;
use std::time::Duration;

use metrics::Label;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const UPDATES_TOTAL: &str = "openapi_route_locator_definition_updates_total";
pub const UPDATE_DURATION: &str = "openapi_route_locator_definition_updates_seconds";
pub const ROUTES_COUNT: &str = "openapi_route_locator_routes_count";
pub const EVICTIONS_TOTAL: &str = "openapi_route_locator_evictions_total";

const SERVICE_LABEL: &str = "upstream_service";
const RESULT_LABEL: &str = "update_result";
const DETAILED_RESULT_LABEL: &str = "update_result_detailed";

/// Classification of one service update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    SuccessWithoutRouteChanges,
    SuccessWithRouteChanges,
    FailureRetrieval,
    FailurePublication,
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            UpdateOutcome::SuccessWithoutRouteChanges | UpdateOutcome::SuccessWithRouteChanges
        )
    }

    /// Coarse `success` / `failure` label.
    pub fn result(&self) -> &'static str {
        if self.is_success() {
            "success"
        } else {
            "failure"
        }
    }

    pub fn detailed(&self) -> &'static str {
        match self {
            UpdateOutcome::SuccessWithoutRouteChanges => "success_without_route_changes",
            UpdateOutcome::SuccessWithRouteChanges => "success_with_route_changes",
            UpdateOutcome::FailureRetrieval => "failure_retrieval",
            UpdateOutcome::FailurePublication => "failure_publication",
        }
    }
}

/// Destination of update loop measurements.
pub trait MetricsSink: Send + Sync {
    fn record_update(&self, service_id: &str, outcome: UpdateOutcome, elapsed: Duration);

    fn record_operations_count(&self, service_id: &str, count: usize);

    fn record_eviction(&self, service_id: &str);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record_update(&self, _service_id: &str, _outcome: UpdateOutcome, _elapsed: Duration) {}

    fn record_operations_count(&self, _service_id: &str, _count: usize) {}

    fn record_eviction(&self, _service_id: &str) {}
}

/// Records into the globally installed `metrics` recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusMetrics;

impl MetricsSink for PrometheusMetrics {
    fn record_update(&self, service_id: &str, outcome: UpdateOutcome, elapsed: Duration) {
        let labels = vec![
            Label::new(SERVICE_LABEL, service_id.to_string()),
            Label::new(RESULT_LABEL, outcome.result()),
            Label::new(DETAILED_RESULT_LABEL, outcome.detailed()),
        ];

        metrics::counter!(UPDATES_TOTAL, labels.clone()).increment(1);
        metrics::histogram!(UPDATE_DURATION, labels).record(elapsed.as_secs_f64());
    }

    fn record_operations_count(&self, service_id: &str, count: usize) {
        metrics::gauge!(ROUTES_COUNT, SERVICE_LABEL => service_id.to_string()).set(count as f64);
    }

    fn record_eviction(&self, service_id: &str) {
        metrics::counter!(EVICTIONS_TOTAL, SERVICE_LABEL => service_id.to_string()).increment(1);
    }
}

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    describe_metrics();

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

fn describe_metrics() {
    metrics::describe_counter!(UPDATES_TOTAL, "Definition updates by upstream service and outcome");
    metrics::describe_histogram!(
        UPDATE_DURATION,
        metrics::Unit::Seconds,
        "Duration of definition updates by upstream service and outcome"
    );
    metrics::describe_gauge!(ROUTES_COUNT, "Operations currently registered per upstream service");
    metrics::describe_counter!(EVICTIONS_TOTAL, "Route removals after the failure grace window elapsed");
}
