//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the locator.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::settings::{FilterDescriptor, PredicateDescriptor, SettingsMap};

/// Root configuration of the route locator.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Upstream services whose definitions are tracked, in assembly order.
    pub services: Vec<Service>,

    /// Route settings applied to every route of every service.
    pub default_route_settings: RouteSettings,

    /// Update loop timing.
    pub update_scheduler: UpdateSchedulerConfig,

    /// Definition location used by services that do not declare their own.
    pub openapi_definition_uri: String,

    /// Definition fetching.
    pub fetcher: FetcherConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub admin: AdminConfig,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            services: Vec::new(),
            default_route_settings: RouteSettings::default(),
            update_scheduler: UpdateSchedulerConfig::default(),
            openapi_definition_uri: DEFAULT_OPENAPI_DEFINITION_URI.to_string(),
            fetcher: FetcherConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

impl LocatorConfig {
    pub fn service(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|service| service.id == id)
    }
}

/// Default location of a service's OpenAPI definition, relative to its base URI.
pub const DEFAULT_OPENAPI_DEFINITION_URI: &str = "/internal/openapi-definition";

/// An upstream service.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Service {
    /// Unique identifier, also used as the metrics label.
    pub id: String,

    /// Base URI every route of this service forwards to.
    pub uri: Url,

    /// Definition location overriding the global default.
    #[serde(default)]
    pub openapi_definition_uri: Option<String>,

    /// Route settings applied to every route of this service.
    #[serde(default)]
    pub default_route_settings: RouteSettings,
}

impl Service {
    pub fn new(id: impl Into<String>, uri: Url) -> Self {
        Self {
            id: id.into(),
            uri,
            openapi_definition_uri: None,
            default_route_settings: RouteSettings::default(),
        }
    }

    pub fn with_openapi_definition_uri(mut self, uri: impl Into<String>) -> Self {
        self.openapi_definition_uri = Some(uri.into());
        self
    }

    pub fn with_route_settings(mut self, settings: RouteSettings) -> Self {
        self.default_route_settings = settings;
        self
    }

    /// Resolve the definition location against the service base URI.
    ///
    /// A path replaces the base path, an absolute URI is used as is.
    pub fn definition_uri(&self, default: &str) -> Result<Url, url::ParseError> {
        let reference = self.openapi_definition_uri.as_deref().unwrap_or(default);
        self.uri.join(reference)
    }
}

/// Route settings configured globally or per service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouteSettings {
    pub predicates: Vec<PredicateDescriptor>,
    pub filters: Vec<FilterDescriptor>,
    pub metadata: SettingsMap,
    pub order: Option<i32>,
}

/// Update loop timing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UpdateSchedulerConfig {
    /// Delay between the end of one refresh and the start of the next.
    pub fixed_delay_secs: u64,

    /// How long a service may keep failing before its routes are removed.
    pub remove_routes_on_update_failures_after_secs: u64,
}

impl Default for UpdateSchedulerConfig {
    fn default() -> Self {
        Self {
            fixed_delay_secs: 300,
            remove_routes_on_update_failures_after_secs: 900,
        }
    }
}

impl UpdateSchedulerConfig {
    pub fn fixed_delay(&self) -> Duration {
        Duration::from_secs(self.fixed_delay_secs)
    }

    pub fn remove_routes_after(&self) -> Duration {
        Duration::from_secs(self.remove_routes_on_update_failures_after_secs)
    }
}

/// Definition fetching.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Request timeout for a single definition download.
    pub timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
