//! The `x-gateway-route-settings` extension.

use serde_json::Value;

use crate::settings::{RouteDescriptor, SettingsMap};

/// Extension key carrying routing metadata in an OpenAPI document.
pub const X_GATEWAY_ROUTE_SETTINGS: &str = "x-gateway-route-settings";

const FILTERS: &str = "filters";
const PREDICATES: &str = "predicates";
const METADATA: &str = "metadata";
const ORDER: &str = "order";

/// Return the gateway route settings held in an extension map, if they are a map.
pub fn route_settings(extensions: &SettingsMap) -> Option<&SettingsMap> {
    match extensions.get(X_GATEWAY_ROUTE_SETTINGS) {
        Some(Value::Object(settings)) => Some(settings),
        _ => None,
    }
}

/// Typed view of (already merged) gateway route settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GatewaySettings {
    pub filters: Vec<RouteDescriptor>,
    pub predicates: Vec<RouteDescriptor>,
    pub metadata: Option<SettingsMap>,
    pub order: Option<i32>,
}

impl GatewaySettings {
    /// Interpret a settings map. Unknown keys are ignored, known keys with the
    /// wrong type are treated as absent.
    pub fn from_map(settings: Option<&SettingsMap>) -> Self {
        let Some(settings) = settings else {
            return Self::default();
        };

        let metadata = match settings.get(METADATA) {
            Some(Value::Object(metadata)) => Some(metadata.clone()),
            _ => None,
        };

        let order = settings
            .get(ORDER)
            .and_then(Value::as_i64)
            .and_then(|order| i32::try_from(order).ok());

        Self {
            filters: descriptors_at(settings, FILTERS),
            predicates: descriptors_at(settings, PREDICATES),
            metadata,
            order,
        }
    }
}

fn descriptors_at(settings: &SettingsMap, key: &str) -> Vec<RouteDescriptor> {
    match settings.get(key) {
        Some(Value::Array(entries)) => entries.iter().filter_map(RouteDescriptor::from_value).collect(),
        _ => Vec::new(),
    }
}
