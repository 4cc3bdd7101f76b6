use serde::Serialize;
use url::Url;

use crate::settings::{FilterDescriptor, PredicateDescriptor, SettingsMap};

/// A gateway route: requests matching all predicates are sent to `uri`
/// after the filters are applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRule {
    pub id: String,
    pub uri: Url,
    pub predicates: Vec<PredicateDescriptor>,
    pub filters: Vec<FilterDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    pub metadata: Option<SettingsMap>,
}
