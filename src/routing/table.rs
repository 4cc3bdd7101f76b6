//! Published route table.
//!
//! # Responsibilities
//! - Accept publish requests from the update loop
//! - Reject rule sets containing descriptors the gateway cannot interpret
//! - Hold the last accepted rule set for readers
//!
//! # Design Decisions
//! - All-or-nothing: one bad rule rejects the whole set
//! - Readers get an `Arc` snapshot; a publish never blocks them

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::PublishError;
use crate::routing::{RouteAssembler, RouteRule};
use crate::settings::RouteDescriptor;

/// Downstream consumer of route changes.
///
/// Called after the stored operations changed; the consumer pulls the new
/// route set itself. An error means the change was not accepted.
pub trait PublishGateway: Send + Sync {
    fn request_publish(&self) -> Result<(), PublishError>;
}

pub struct RouteTable {
    assembler: RouteAssembler,
    published: ArcSwap<Vec<RouteRule>>,
}

impl RouteTable {
    pub fn new(assembler: RouteAssembler) -> Self {
        Self {
            assembler,
            published: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// The last accepted rule set.
    pub fn routes(&self) -> Arc<Vec<RouteRule>> {
        self.published.load_full()
    }

    pub fn assembler(&self) -> &RouteAssembler {
        &self.assembler
    }
}

impl PublishGateway for RouteTable {
    fn request_publish(&self) -> Result<(), PublishError> {
        let rules = self.assembler.assemble();

        let problems: Vec<String> = rules.iter().filter_map(|rule| validate(rule).err()).collect();
        if !problems.is_empty() {
            tracing::warn!(routes = rules.len(), problems = problems.len(), "Route table rejected");
            return Err(PublishError::Rejected(problems.join("; ")));
        }

        tracing::info!(routes = rules.len(), "Route table published");
        self.published.store(Arc::new(rules));
        Ok(())
    }
}

fn validate(rule: &RouteRule) -> Result<(), String> {
    for descriptor in rule.predicates.iter().chain(&rule.filters) {
        descriptor
            .expand()
            .map_err(|e| format!("route to {} {}: {}", rule.uri, path_of(rule), e))?;
    }
    Ok(())
}

/// The `Path=` predicate of an assembled rule, to identify it in messages.
fn path_of(rule: &RouteRule) -> String {
    rule.predicates
        .iter()
        .find_map(|predicate| match predicate {
            RouteDescriptor::Shorthand(text) if text.starts_with("Path=") => Some(text.clone()),
            _ => None,
        })
        .unwrap_or_else(|| rule.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{shared, LocatorConfig, Service};
    use crate::openapi::HttpMethod;
    use crate::operations::Operation;
    use crate::repository::OperationStore;
    use crate::settings::SettingsMap;
    use url::Url;

    fn fixture() -> (OperationStore, Service, RouteTable) {
        let users = Service::new("users", Url::parse("http://users:8080").unwrap());
        let config = LocatorConfig {
            services: vec![users.clone()],
            ..LocatorConfig::default()
        };
        let store = OperationStore::new();
        let table = RouteTable::new(RouteAssembler::new(shared(config), store.clone()));
        (store, users, table)
    }

    fn operation(path: &str, filters: Vec<RouteDescriptor>) -> Operation {
        Operation {
            base_uri: Url::parse("http://users:8080").unwrap(),
            path: path.to_string(),
            method: HttpMethod::Get,
            filters,
            predicates: Vec::new(),
            metadata: None,
            order: None,
            document_extensions: SettingsMap::new(),
            operation_extensions: SettingsMap::new(),
        }
    }

    #[test]
    fn test_publish_swaps_table() {
        let (store, users, table) = fixture();
        assert!(table.routes().is_empty());

        store.insert(users, vec![operation("/users", vec![RouteDescriptor::shorthand("StripPrefix=1")])]);
        table.request_publish().unwrap();
        assert_eq!(table.routes().len(), 1);
    }

    #[test]
    fn test_invalid_descriptor_rejects_whole_set() {
        let (store, users, table) = fixture();
        store.insert(users.clone(), vec![operation("/users", vec![])]);
        table.request_publish().unwrap();
        let accepted = table.routes();

        store.insert(
            users,
            vec![
                operation("/users", vec![]),
                operation("/broken", vec![RouteDescriptor::shorthand("StripPrefix")]),
            ],
        );
        let err = table.request_publish().unwrap_err();
        assert!(matches!(err, PublishError::Rejected(ref msg) if msg.contains("Path=/broken")));
        assert_eq!(table.routes(), accepted);
    }

    #[test]
    fn test_blank_named_descriptor_is_rejected() {
        let (store, users, table) = fixture();
        store.insert(
            users,
            vec![operation("/users", vec![RouteDescriptor::named(" ", [("a", "b")])])],
        );
        assert!(table.request_publish().is_err());
        assert!(table.routes().is_empty());
    }
}
