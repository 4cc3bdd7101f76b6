use url::Url;

use crate::openapi::HttpMethod;
use crate::settings::{FilterDescriptor, PredicateDescriptor, SettingsMap};

/// One HTTP operation of a service, with its effective gateway settings.
///
/// Two operations are equal when every field is equal; an unchanged
/// definition therefore yields an equal operation list.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Base URI of the owning service.
    pub base_uri: Url,
    pub path: String,
    pub method: HttpMethod,
    pub filters: Vec<FilterDescriptor>,
    pub predicates: Vec<PredicateDescriptor>,
    pub metadata: Option<SettingsMap>,
    pub order: Option<i32>,
    /// Raw document-level extensions, empty when the document has none.
    pub document_extensions: SettingsMap,
    /// Raw operation-level extensions, empty when the operation has none.
    pub operation_extensions: SettingsMap,
}
