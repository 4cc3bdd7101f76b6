//! Update scheduling.
//!
//! # Data Flow
//! ```text
//! UpdateScheduler::run
//!     → DefinitionRepository::refresh_all
//!     → wait: fixed delay | RefreshTrigger (admin API) | shutdown
//!     → repeat
//! ```
//!
//! # Design Decisions
//! - Fixed delay between the end of one round and the start of the next,
//!   so rounds never overlap
//! - Shutdown is observed between rounds only

pub mod update;

pub use update::{RefreshTrigger, UpdateScheduler};
