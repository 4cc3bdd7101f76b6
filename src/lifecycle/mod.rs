//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_shutdown_signal resolves
//!
//! Shutdown (shutdown.rs):
//!     trigger → scheduler, config reload and admin server stop
//! ```
//!
//! # Design Decisions
//! - A tick in progress is not cancelled; the scheduler stops between ticks
//! - Shutdown is a level-triggered watch flag, late subscribers still stop

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownListener};
pub use signals::wait_for_shutdown_signal;
