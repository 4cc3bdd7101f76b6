//! Definition repository subsystem.
//!
//! # Data Flow
//! ```text
//! scheduler tick / admin refresh
//!     → definitions.rs (fetch, parse, extract, compare)
//!     → store.rs (swap per-service snapshot)
//!     → PublishGateway (routing::table)
//! ```
//!
//! # Design Decisions
//! - Single writer: only the update loop mutates the store
//! - Store entries are keyed by service id

pub mod definitions;
pub mod store;

pub use definitions::DefinitionRepository;
pub use store::{OperationStore, ServiceOperations};
