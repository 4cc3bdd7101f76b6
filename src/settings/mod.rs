//! Gateway route settings subsystem.
//!
//! # Data Flow
//! ```text
//! document extensions ──┐
//!                        ├─▶ gateway.rs (pick `x-gateway-route-settings`)
//! operation extensions ─┘        │
//!                                ▼
//!                       merge.rs (deep merge, operation wins)
//!                                │
//!                                ▼
//!                  descriptor.rs (filters / predicates)
//!                                │
//!                                ▼
//!                    GatewaySettings (typed view)
//! ```
//!
//! # Design Decisions
//! - Free-form settings are plain `serde_json` maps; only the four known keys
//!   are interpreted
//! - Malformed entries are dropped and logged, never fatal
//! - Merging follows JSON merge-patch except that lists concatenate

pub mod descriptor;
pub mod gateway;
pub mod merge;

pub use descriptor::{DescriptorError, FilterDescriptor, PredicateDescriptor, RouteDescriptor};
pub use gateway::{route_settings, GatewaySettings, X_GATEWAY_ROUTE_SETTINGS};
pub use merge::{merge, merge_all};

/// Free-form nested key/value structure used for extension maps and metadata.
pub type SettingsMap = serde_json::Map<String, serde_json::Value>;
