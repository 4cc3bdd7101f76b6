//! Structured view of an OpenAPI document.
//!
//! Only what route discovery needs is modelled: the paths, the HTTP methods
//! under each path, and the `x-*` extension maps at document and operation
//! level.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::settings::SettingsMap;

/// HTTP methods an OpenAPI path item can declare.
///
/// The declaration order is the order operations are enumerated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Map a path item key (`get`, `post`, ...) to a method.
    pub fn from_path_item_key(key: &str) -> Option<Self> {
        match key {
            "get" => Some(HttpMethod::Get),
            "put" => Some(HttpMethod::Put),
            "post" => Some(HttpMethod::Post),
            "delete" => Some(HttpMethod::Delete),
            "options" => Some(HttpMethod::Options),
            "head" => Some(HttpMethod::Head),
            "patch" => Some(HttpMethod::Patch),
            "trace" => Some(HttpMethod::Trace),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operation object of a path item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationObject {
    pub operation_id: Option<String>,
    pub extensions: SettingsMap,
}

/// The operations declared under one path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathItem {
    pub operations: BTreeMap<HttpMethod, OperationObject>,
}

/// A parsed OpenAPI document.
///
/// Paths keep the order they are declared in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub extensions: SettingsMap,
    pub paths: IndexMap<String, PathItem>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a document-level extension.
    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    /// Declare an operation with the given operation-level extensions.
    pub fn with_operation(mut self, path: impl Into<String>, method: HttpMethod, extensions: SettingsMap) -> Self {
        self.paths
            .entry(path.into())
            .or_default()
            .operations
            .insert(method, OperationObject { operation_id: None, extensions });
        self
    }

    pub fn operation_count(&self) -> usize {
        self.paths.values().map(|item| item.operations.len()).sum()
    }
}

/// Keep only the `x-` prefixed entries of an OpenAPI object.
pub fn extensions_of(object: &SettingsMap) -> SettingsMap {
    object
        .iter()
        .filter(|(key, _)| key.starts_with("x-"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
