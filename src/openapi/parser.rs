//! OpenAPI document parsing.
//!
//! # Responsibilities
//! - Accept YAML or JSON text (JSON is read through the YAML parser)
//! - Reject documents that are not OpenAPI/Swagger or have no `paths`
//! - Collect non-fatal problems as warnings for the caller to log

use serde_json::{Map, Number, Value};

use crate::error::ParseError;
use crate::openapi::document::{extensions_of, Document, HttpMethod, OperationObject, PathItem};

/// A document together with the non-fatal problems found while reading it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDocument {
    pub document: Document,
    pub warnings: Vec<String>,
}

/// Turns raw definition text into a [`Document`].
pub trait DocumentParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<ParsedDocument, ParseError>;
}

/// Default parser for OpenAPI 3.x and Swagger 2.0 documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenApiParser;

impl OpenApiParser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for OpenApiParser {
    fn parse(&self, text: &str) -> Result<ParsedDocument, ParseError> {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|e| ParseError::Syntax(e.to_string()))?;

        let Value::Object(root) = yaml_to_json(yaml) else {
            return Err(ParseError::NotAMapping);
        };

        if !root.contains_key("openapi") && !root.contains_key("swagger") {
            return Err(ParseError::MissingVersion);
        }

        let Some(Value::Object(raw_paths)) = root.get("paths") else {
            return Err(ParseError::MissingPaths);
        };

        let mut warnings = Vec::new();
        let mut document = Document {
            extensions: extensions_of(&root),
            ..Document::default()
        };

        for (path, raw_item) in raw_paths {
            let Value::Object(raw_item) = raw_item else {
                warnings.push(format!("paths.'{path}' is not a mapping, ignoring it"));
                continue;
            };
            if !path.starts_with('/') {
                warnings.push(format!("paths.'{path}' does not begin with '/'"));
            }

            let mut item = PathItem::default();
            for (key, raw_operation) in raw_item {
                let Some(method) = HttpMethod::from_path_item_key(key) else {
                    continue;
                };
                let Value::Object(raw_operation) = raw_operation else {
                    warnings.push(format!("paths.'{path}'.{key} is not a mapping, ignoring it"));
                    continue;
                };

                item.operations.insert(
                    method,
                    OperationObject {
                        operation_id: raw_operation
                            .get("operationId")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                        extensions: extensions_of(raw_operation),
                    },
                );
            }

            document.paths.insert(path.clone(), item);
        }

        Ok(ParsedDocument { document, warnings })
    }
}

/// Convert a YAML value into a JSON value. Non-string mapping keys (such as
/// unquoted response codes) are stringified.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                n.as_f64().and_then(Number::from_f64).map_or(Value::Null, Value::Number)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::new();
            for (key, value) in mapping {
                map.insert(yaml_key(key), yaml_to_json(value));
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}
