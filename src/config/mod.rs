//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → LocatorConfig (validated, immutable)
//!     → shared via Arc<ArcSwap<_>> to repository, assembler and admin
//!
//! On reload:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → DefinitionRepository::apply_config swaps it in
//!     → next assembly / tick observes new config
//! ```
//!
//! # Design Decisions
//! - A loaded config is never mutated; changes replace it whole
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

use std::sync::Arc;

use arc_swap::ArcSwap;

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{LocatorConfig, RouteSettings, Service, UpdateSchedulerConfig};
pub use validation::{validate_config, ValidationError};
pub use watcher::{ConfigWatcher, ServiceChanges};

/// Hot-swappable configuration shared between subsystems.
pub type SharedConfig = Arc<ArcSwap<LocatorConfig>>;

pub fn shared(config: LocatorConfig) -> SharedConfig {
    Arc::new(ArcSwap::from_pointee(config))
}
