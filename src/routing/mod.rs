//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! OperationStore + LocatorConfig
//!     → assembler.rs (one RouteRule per operation, settings layered)
//!     → customizer.rs hooks (per rule, registration order)
//!     → table.rs (validate, swap in as the published table)
//! ```
//!
//! # Design Decisions
//! - Routes are assembled on demand, never cached between publishes
//! - Deterministic layering: same store and config give the same rules
//!   (apart from generated ids)
//! - A rejected rule set leaves the previous table in place

pub mod assembler;
pub mod customizer;
pub mod rule;
pub mod table;

pub use assembler::RouteAssembler;
pub use customizer::RouteCustomizer;
pub use rule::RouteRule;
pub use table::{PublishGateway, RouteTable};
