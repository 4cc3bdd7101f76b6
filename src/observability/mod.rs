//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Update loop produces:
//!     → logging.rs (structured log events)
//!     → metrics.rs (update outcomes, route counts, evictions)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Every update log line carries the service id
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

pub use metrics::{MetricsSink, NoopMetrics, PrometheusMetrics, UpdateOutcome};
