//! Filter and predicate descriptors.
//!
//! A descriptor is written either in the compact form `"Name=arg1,arg2"` or in
//! the expanded form `{ name: Name, args: { key: value } }`. Both forms are
//! kept as written; [`RouteDescriptor::expand`] turns a compact descriptor into
//! its name and generated argument keys when a consumer needs them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix of the argument keys generated when expanding the compact form.
pub const GENERATED_KEY_PREFIX: &str = "_genkey_";

/// A filter or predicate attached to a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RouteDescriptor {
    /// Compact `Name=arg1,arg2` form.
    Shorthand(String),
    /// Expanded form with explicitly named arguments.
    Named {
        name: String,
        #[serde(default)]
        args: BTreeMap<String, String>,
    },
}

/// Descriptor of a filter applied to matched requests.
pub type FilterDescriptor = RouteDescriptor;

/// Descriptor of a condition a request must satisfy.
pub type PredicateDescriptor = RouteDescriptor;

/// Error returned when a descriptor cannot be expanded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("unable to parse descriptor text '{0}', must be of the form name=value")]
    MissingSeparator(String),
    #[error("descriptor name must not be blank")]
    BlankName,
}

impl RouteDescriptor {
    pub fn shorthand(text: impl Into<String>) -> Self {
        RouteDescriptor::Shorthand(text.into())
    }

    pub fn named<K, V>(name: impl Into<String>, args: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        RouteDescriptor::Named {
            name: name.into(),
            args: args.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Convert a free-form settings entry into a descriptor.
    ///
    /// Strings become [`RouteDescriptor::Shorthand`], maps with a string `name`
    /// become [`RouteDescriptor::Named`] (argument values are stringified).
    /// Anything else is logged and dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(RouteDescriptor::Shorthand(text.clone())),
            Value::Object(map) => {
                let Some(Value::String(name)) = map.get("name") else {
                    tracing::error!(entry = %value, "Route descriptor has no string 'name', skipping it");
                    return None;
                };

                let args = match map.get("args") {
                    None | Some(Value::Null) => BTreeMap::new(),
                    Some(Value::Object(args)) => args
                        .iter()
                        .map(|(key, arg)| (key.clone(), stringify(arg)))
                        .collect(),
                    Some(_) => {
                        tracing::error!(entry = %value, "Route descriptor 'args' is not a map, skipping it");
                        return None;
                    }
                };

                Some(RouteDescriptor::Named { name: name.clone(), args })
            }
            _ => {
                tracing::error!(entry = %value, "Error while parsing route descriptor, skipping it");
                None
            }
        }
    }

    /// Split the descriptor into its name and arguments.
    ///
    /// Compact arguments are split on `,`, trimmed, empty tokens dropped, and
    /// keyed `_genkey_0`, `_genkey_1`, ... in order.
    pub fn expand(&self) -> Result<(String, BTreeMap<String, String>), DescriptorError> {
        match self {
            RouteDescriptor::Shorthand(text) => {
                let (name, raw_args) = text
                    .split_once('=')
                    .ok_or_else(|| DescriptorError::MissingSeparator(text.clone()))?;
                if name.trim().is_empty() {
                    return Err(DescriptorError::BlankName);
                }

                let args = raw_args
                    .split(',')
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .enumerate()
                    .map(|(i, token)| (format!("{GENERATED_KEY_PREFIX}{i}"), token.to_string()))
                    .collect();

                Ok((name.to_string(), args))
            }
            RouteDescriptor::Named { name, args } => {
                if name.trim().is_empty() {
                    return Err(DescriptorError::BlankName);
                }
                Ok((name.clone(), args.clone()))
            }
        }
    }
}

impl fmt::Display for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteDescriptor::Shorthand(text) => f.write_str(text),
            RouteDescriptor::Named { name, args } => {
                write!(f, "{name}(")?;
                for (i, (key, value)) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                write!(f, ")")
            }
        }
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
