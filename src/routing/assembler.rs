//! Route assembly.
//!
//! # Responsibilities
//! - Turn every stored operation into a [`RouteRule`]
//! - Layer global, service and operation settings onto each rule
//! - Run registered customizers
//!
//! # Design Decisions
//! - Pull model: nothing is cached, each call reads the current store and
//!   configuration
//! - Predicates and filters accumulate (global, then service, then
//!   operation); order is taken from the most specific layer that has one
//! - Metadata is deep-merged across the three layers

use std::sync::Arc;

use uuid::Uuid;

use crate::config::{RouteSettings, Service, SharedConfig};
use crate::openapi::HttpMethod;
use crate::operations::Operation;
use crate::repository::OperationStore;
use crate::routing::{RouteCustomizer, RouteRule};
use crate::settings::{merge_all, RouteDescriptor};

#[derive(Clone)]
pub struct RouteAssembler {
    config: SharedConfig,
    store: OperationStore,
    customizers: Vec<Arc<dyn RouteCustomizer>>,
}

impl RouteAssembler {
    pub fn new(config: SharedConfig, store: OperationStore) -> Self {
        Self {
            config,
            store,
            customizers: Vec::new(),
        }
    }

    /// Register a customizer. Customizers run in registration order.
    pub fn with_customizer(mut self, customizer: impl RouteCustomizer + 'static) -> Self {
        self.customizers.push(Arc::new(customizer));
        self
    }

    /// Assemble the routes of all configured services, in configuration order.
    pub fn assemble(&self) -> Vec<RouteRule> {
        let config = self.config.load();

        let mut rules = Vec::new();
        for configured in &config.services {
            let Some(entry) = self.store.get(&configured.id) else {
                continue;
            };
            rules.extend(
                entry
                    .operations
                    .iter()
                    .map(|operation| self.assemble_rule(&config.default_route_settings, &entry.service, operation)),
            );
        }
        rules
    }

    fn assemble_rule(&self, global: &RouteSettings, service: &Service, operation: &Operation) -> RouteRule {
        let local = &service.default_route_settings;

        let mut predicates = vec![method_predicate(operation.method), path_predicate(&operation.path)];
        predicates.extend(global.predicates.iter().cloned());
        predicates.extend(local.predicates.iter().cloned());
        predicates.extend(operation.predicates.iter().cloned());

        let filters = global
            .filters
            .iter()
            .chain(&local.filters)
            .chain(&operation.filters)
            .cloned()
            .collect();

        let mut rule = RouteRule {
            id: Uuid::new_v4().to_string(),
            uri: operation.base_uri.clone(),
            predicates,
            filters,
            order: operation.order.or(local.order).or(global.order),
            metadata: merge_all(
                Some(&global.metadata),
                &[Some(&local.metadata), operation.metadata.as_ref()],
            ),
        };

        for customizer in &self.customizers {
            customizer.customize(
                &mut rule,
                service,
                &operation.document_extensions,
                &operation.operation_extensions,
            );
        }
        rule
    }
}

fn method_predicate(method: HttpMethod) -> RouteDescriptor {
    RouteDescriptor::shorthand(format!("Method={method}"))
}

fn path_predicate(path: &str) -> RouteDescriptor {
    RouteDescriptor::shorthand(format!("Path={path}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{shared, LocatorConfig};
    use crate::settings::SettingsMap;
    use serde_json::{json, Value};
    use url::Url;

    fn map(value: Value) -> SettingsMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("not a map"),
        }
    }

    fn service(id: &str, settings: RouteSettings) -> Service {
        Service::new(id, Url::parse(&format!("http://{id}:8080")).unwrap()).with_route_settings(settings)
    }

    fn operation(service: &Service, path: &str, method: HttpMethod) -> Operation {
        Operation {
            base_uri: service.uri.clone(),
            path: path.to_string(),
            method,
            filters: Vec::new(),
            predicates: Vec::new(),
            metadata: None,
            order: None,
            document_extensions: SettingsMap::new(),
            operation_extensions: SettingsMap::new(),
        }
    }

    fn assembler(global: RouteSettings, services: Vec<Service>, store: &OperationStore) -> RouteAssembler {
        let config = LocatorConfig {
            services,
            default_route_settings: global,
            ..LocatorConfig::default()
        };
        RouteAssembler::new(shared(config), store.clone())
    }

    #[test]
    fn test_layers_settings() {
        let global = RouteSettings {
            predicates: vec![RouteDescriptor::shorthand("Host=**.example.com")],
            filters: vec![RouteDescriptor::shorthand("AddRequestHeader=X-Gw,1")],
            metadata: map(json!({"team": "core", "tags": ["a"]})),
            order: Some(10),
        };
        let users = service(
            "users",
            RouteSettings {
                filters: vec![RouteDescriptor::shorthand("StripPrefix=1")],
                metadata: map(json!({"tags": ["b"]})),
                ..RouteSettings::default()
            },
        );

        let mut op = operation(&users, "/users/{id}", HttpMethod::Delete);
        op.predicates = vec![RouteDescriptor::shorthand("Header=X-Admin")];
        op.filters = vec![RouteDescriptor::shorthand("SetStatus=204")];
        op.metadata = Some(map(json!({"team": "identity"})));

        let store = OperationStore::new();
        store.insert(users.clone(), vec![op]);

        let rules = assembler(global, vec![users.clone()], &store).assemble();
        assert_eq!(rules.len(), 1);

        let rule = &rules[0];
        assert_eq!(rule.uri, users.uri);
        assert_eq!(
            rule.predicates,
            vec![
                RouteDescriptor::shorthand("Method=DELETE"),
                RouteDescriptor::shorthand("Path=/users/{id}"),
                RouteDescriptor::shorthand("Host=**.example.com"),
                RouteDescriptor::shorthand("Header=X-Admin"),
            ]
        );
        assert_eq!(
            rule.filters,
            vec![
                RouteDescriptor::shorthand("AddRequestHeader=X-Gw,1"),
                RouteDescriptor::shorthand("StripPrefix=1"),
                RouteDescriptor::shorthand("SetStatus=204"),
            ]
        );
        assert_eq!(rule.order, Some(10));
        assert_eq!(rule.metadata, Some(map(json!({"team": "identity", "tags": ["a", "b"]}))));
        assert!(Uuid::parse_str(&rule.id).is_ok());
    }

    #[test]
    fn test_order_precedence() {
        let users = service(
            "users",
            RouteSettings {
                order: Some(5),
                ..RouteSettings::default()
            },
        );
        let mut with_order = operation(&users, "/a", HttpMethod::Get);
        with_order.order = Some(9);
        let without_order = operation(&users, "/b", HttpMethod::Get);

        let store = OperationStore::new();
        store.insert(users.clone(), vec![with_order, without_order]);

        let global = RouteSettings {
            order: Some(1),
            ..RouteSettings::default()
        };
        let rules = assembler(global, vec![users], &store).assemble();
        assert_eq!(rules[0].order, Some(9));
        assert_eq!(rules[1].order, Some(5));
    }

    #[test]
    fn test_services_in_configured_order() {
        let users = service("users", RouteSettings::default());
        let orders = service("orders", RouteSettings::default());
        let absent = service("absent", RouteSettings::default());

        let store = OperationStore::new();
        store.insert(users.clone(), vec![operation(&users, "/users", HttpMethod::Get)]);
        store.insert(orders.clone(), vec![operation(&orders, "/orders", HttpMethod::Get)]);

        let rules = assembler(RouteSettings::default(), vec![orders.clone(), absent, users.clone()], &store).assemble();
        let uris: Vec<_> = rules.iter().map(|rule| rule.uri.clone()).collect();
        assert_eq!(uris, vec![orders.uri, users.uri]);
        assert_ne!(rules[0].id, rules[1].id);
        assert_eq!(rules[0].metadata, Some(SettingsMap::new()));
    }

    #[test]
    fn test_customizers_run_in_order() {
        let users = service("users", RouteSettings::default());
        let mut op = operation(&users, "/users", HttpMethod::Get);
        op.operation_extensions = map(json!({"x-rate-limit": 10}));

        let store = OperationStore::new();
        store.insert(users.clone(), vec![op]);

        let rules = assembler(RouteSettings::default(), vec![users], &store)
            .with_customizer(|rule: &mut RouteRule, _: &Service, _: &SettingsMap, op_ext: &SettingsMap| {
                if let Some(limit) = op_ext.get("x-rate-limit") {
                    rule.filters.push(RouteDescriptor::shorthand(format!("RateLimit={limit}")));
                }
            })
            .with_customizer(|rule: &mut RouteRule, service: &Service, _: &SettingsMap, _: &SettingsMap| {
                rule.order = Some(rule.filters.len() as i32);
                rule.metadata
                    .get_or_insert_with(SettingsMap::new)
                    .insert("service".to_string(), json!(service.id));
            })
            .assemble();

        assert_eq!(rules[0].filters, vec![RouteDescriptor::shorthand("RateLimit=10")]);
        assert_eq!(rules[0].order, Some(1));
        assert_eq!(rules[0].metadata.as_ref().unwrap()["service"], "users");
    }
}
