//! Service health subsystem.
//!
//! # Data Flow
//! ```text
//! Update attempt for a service
//!     → success: tracker.rs clears the failure streak
//!     → failure: tracker.rs records (or keeps) the streak start
//!         → should_evict(start, clock.now(), grace)
//!             → false: keep last known routes
//!             → true: repository removes the service's routes
//! ```
//!
//! # Design Decisions
//! - Time comes from an injectable clock.rs so grace windows are testable
//! - Health state is per-service, keyed by service id

pub mod clock;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use tracker::ServiceHealthTracker;
