//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Service ids are present and unique
//! - Service base URIs carry no path, query or fragment
//! - Definition URIs are absolute or absolute paths
//! - Durations are positive
//! - Configured filter and predicate descriptors can be expanded
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LocatorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::BTreeSet;

use thiserror::Error;
use url::Url;

use crate::config::schema::{LocatorConfig, RouteSettings};
use crate::settings::DescriptorError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("services[{index}].id must not be blank")]
    BlankServiceId { index: usize },

    #[error("Contains duplicate service ids: {}", .0.join(","))]
    DuplicateServiceIds(Vec<String>),

    #[error("service '{service}' uri '{uri}' must not contain a path, query or fragment")]
    InvalidServiceUri { service: String, uri: String },

    #[error("{field} '{uri}' must be an absolute URI or start with '/'")]
    InvalidDefinitionUri { field: String, uri: String },

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("{field}: {error}")]
    InvalidDescriptor { field: String, error: DescriptorError },
}

pub fn validate_config(config: &LocatorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for (index, service) in config.services.iter().enumerate() {
        if service.id.trim().is_empty() {
            errors.push(ValidationError::BlankServiceId { index });
        } else if !seen.insert(service.id.as_str()) {
            duplicates.insert(service.id.clone());
        }

        let uri = &service.uri;
        let path_ok = uri.path().is_empty() || uri.path() == "/";
        if !path_ok || uri.query().is_some() || uri.fragment().is_some() {
            errors.push(ValidationError::InvalidServiceUri {
                service: service.id.clone(),
                uri: uri.to_string(),
            });
        }

        validate_descriptors(
            &format!("services[{index}].default_route_settings"),
            &service.default_route_settings,
            &mut errors,
        );

        if let Some(definition) = &service.openapi_definition_uri {
            if !is_valid_definition_uri(definition) {
                errors.push(ValidationError::InvalidDefinitionUri {
                    field: format!("services[{index}].openapi_definition_uri"),
                    uri: definition.clone(),
                });
            }
        }
    }

    if !duplicates.is_empty() {
        errors.push(ValidationError::DuplicateServiceIds(duplicates.into_iter().collect()));
    }

    if !is_valid_definition_uri(&config.openapi_definition_uri) {
        errors.push(ValidationError::InvalidDefinitionUri {
            field: "openapi_definition_uri".to_string(),
            uri: config.openapi_definition_uri.clone(),
        });
    }

    validate_descriptors("default_route_settings", &config.default_route_settings, &mut errors);

    if config.update_scheduler.fixed_delay_secs == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "update_scheduler.fixed_delay_secs",
        });
    }
    if config.update_scheduler.remove_routes_on_update_failures_after_secs == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "update_scheduler.remove_routes_on_update_failures_after_secs",
        });
    }
    if config.fetcher.timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration { field: "fetcher.timeout_secs" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A descriptor that cannot be expanded would make every assembled route set
/// unpublishable.
fn validate_descriptors(prefix: &str, settings: &RouteSettings, errors: &mut Vec<ValidationError>) {
    for (kind, descriptors) in [("predicates", &settings.predicates), ("filters", &settings.filters)] {
        for (index, descriptor) in descriptors.iter().enumerate() {
            if let Err(error) = descriptor.expand() {
                errors.push(ValidationError::InvalidDescriptor {
                    field: format!("{prefix}.{kind}[{index}]"),
                    error,
                });
            }
        }
    }
}

fn is_valid_definition_uri(uri: &str) -> bool {
    uri.starts_with('/') || Url::parse(uri).is_ok()
}
