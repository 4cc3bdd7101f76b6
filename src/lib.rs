//! OpenAPI route locator.
//!
//! Keeps a gateway route table in sync with the REST surface of upstream
//! services, discovered from their OpenAPI definitions.

pub mod admin;
pub mod config;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod openapi;
pub mod operations;
pub mod repository;
pub mod routing;
pub mod scheduler;
pub mod settings;

pub use config::LocatorConfig;
pub use lifecycle::Shutdown;
pub use repository::DefinitionRepository;
pub use routing::{RouteAssembler, RouteRule, RouteTable};
