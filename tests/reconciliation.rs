//! End-to-end reconciliation: definitions served over HTTP, real loader and
//! parser, route table as the publish target, manual clock.

use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use url::Url;

use openapi_route_locator::config::{shared, LocatorConfig, RouteSettings, Service};
use openapi_route_locator::health::{Clock, ManualClock};
use openapi_route_locator::observability::UpdateOutcome;
use openapi_route_locator::repository::{DefinitionRepository, OperationStore};
use openapi_route_locator::routing::{RouteAssembler, RouteRule, RouteTable};
use openapi_route_locator::settings::RouteDescriptor;

mod common;

use common::{definition, local_loader, CountingGateway, StubFetcher, SwitchableDocument};

fn paths_of(rules: &[RouteRule]) -> Vec<String> {
    rules
        .iter()
        .filter_map(|rule| match &rule.predicates[1] {
            RouteDescriptor::Shorthand(text) => text.strip_prefix("Path=").map(str::to_string),
            RouteDescriptor::Named { .. } => None,
        })
        .collect()
}

#[tokio::test]
async fn test_two_services_over_simulated_ticks() {
    let users_doc = SwitchableDocument::default();
    let orders_doc = SwitchableDocument::default();
    users_doc.set(definition(
        Some(r#"{filters: ["AddResponseHeader=X-Service,users"]}"#),
        &[("/users", None), ("/users/{id}", Some("{order: 9}"))],
    ));
    orders_doc.set(definition(None, &[("/orders", Some(r#"{metadata: {owner: checkout}}"#))]));

    let users_addr = users_doc.serve().await;
    let orders_addr = orders_doc.serve().await;

    let users = Service::new("users", Url::parse(&format!("http://{users_addr}")).unwrap())
        .with_openapi_definition_uri("/v3/api-docs")
        .with_route_settings(RouteSettings {
            order: Some(5),
            ..RouteSettings::default()
        });
    let orders = Service::new("orders", Url::parse(&format!("http://{orders_addr}/")).unwrap());

    let config = LocatorConfig {
        services: vec![users.clone(), orders.clone()],
        default_route_settings: RouteSettings {
            predicates: vec![RouteDescriptor::shorthand("Host=api.example.com")],
            ..RouteSettings::default()
        },
        ..LocatorConfig::default()
    };

    let shared = shared(config);
    let store = OperationStore::new();
    let table = Arc::new(RouteTable::new(RouteAssembler::new(shared.clone(), store.clone())));
    let clock = Arc::new(ManualClock::new(UNIX_EPOCH + Duration::from_secs(1_700_000_000)));
    let repository = DefinitionRepository::new(shared, store, Arc::new(local_loader()), table.clone())
        .with_clock(clock.clone());

    // Tick 1: both services discovered.
    let outcomes = repository.refresh_all().await.unwrap();
    assert_eq!(
        outcomes,
        vec![
            ("users".to_string(), UpdateOutcome::SuccessWithRouteChanges),
            ("orders".to_string(), UpdateOutcome::SuccessWithRouteChanges),
        ]
    );

    let routes = table.routes();
    assert_eq!(paths_of(&routes), vec!["/users", "/users/{id}", "/orders"]);
    assert_eq!(routes[0].uri, users.uri);
    assert_eq!(routes[0].order, Some(5));
    assert_eq!(routes[1].order, Some(9));
    assert_eq!(routes[2].order, None);
    assert_eq!(
        routes[0].predicates,
        vec![
            RouteDescriptor::shorthand("Method=GET"),
            RouteDescriptor::shorthand("Path=/users"),
            RouteDescriptor::shorthand("Host=api.example.com"),
        ]
    );
    assert_eq!(
        routes[1].filters,
        vec![RouteDescriptor::shorthand("AddResponseHeader=X-Service,users")]
    );
    assert_eq!(routes[2].metadata.as_ref().unwrap()["owner"], "checkout");

    // Tick 2: nothing changed.
    let published = table.routes();
    let outcomes = repository.refresh_all().await.unwrap();
    assert!(outcomes
        .iter()
        .all(|(_, outcome)| *outcome == UpdateOutcome::SuccessWithoutRouteChanges));
    assert!(Arc::ptr_eq(&published, &table.routes()));

    // Users goes down: routes survive the grace window.
    users_doc.fail();
    let t0 = clock.now();
    let outcomes = repository.refresh_all().await.unwrap();
    assert_eq!(outcomes[0], ("users".to_string(), UpdateOutcome::FailureRetrieval));
    assert_eq!(outcomes[1], ("orders".to_string(), UpdateOutcome::SuccessWithoutRouteChanges));

    clock.set(t0 + Duration::from_secs(15 * 60 - 1));
    repository.refresh_all().await.unwrap();
    assert_eq!(paths_of(&table.routes()), vec!["/users", "/users/{id}", "/orders"]);

    // ... and are removed once it has passed.
    clock.set(t0 + Duration::from_secs(15 * 60 + 1));
    repository.refresh_all().await.unwrap();
    assert_eq!(paths_of(&table.routes()), vec!["/orders"]);
    assert!(repository.store().get("users").is_none());

    // Users recovers with a smaller API.
    users_doc.set(definition(None, &[("/users", None)]));
    clock.advance(Duration::from_secs(60));
    let outcomes = repository.refresh_all().await.unwrap();
    assert_eq!(outcomes[0], ("users".to_string(), UpdateOutcome::SuccessWithRouteChanges));
    assert_eq!(paths_of(&table.routes()), vec!["/users", "/orders"]);
    assert_eq!(repository.health().first_failure("users"), None);
}

#[tokio::test]
async fn test_growing_service_publishes_once_and_failing_service_is_evicted() {
    let inventory_doc = SwitchableDocument::default();
    let billing_doc = SwitchableDocument::default();
    inventory_doc.set(definition(None, &[("/items", None), ("/items/{id}", None), ("/stock", None)]));
    billing_doc.set(definition(None, &[("/invoices", None), ("/invoices/{id}", None)]));

    let inventory_addr = inventory_doc.serve().await;
    let billing_addr = billing_doc.serve().await;

    let config = LocatorConfig {
        services: vec![
            Service::new("inventory", Url::parse(&format!("http://{inventory_addr}")).unwrap()),
            Service::new("billing", Url::parse(&format!("http://{billing_addr}")).unwrap()),
        ],
        ..LocatorConfig::default()
    };

    let shared = shared(config);
    let store = OperationStore::new();
    let table = Arc::new(RouteTable::new(RouteAssembler::new(shared.clone(), store.clone())));
    let gateway = Arc::new(CountingGateway::new(table.clone(), store.clone()));
    let clock = Arc::new(ManualClock::new(UNIX_EPOCH + Duration::from_secs(1_700_000_000)));
    let repository = DefinitionRepository::new(shared, store, Arc::new(local_loader()), gateway.clone())
        .with_clock(clock.clone());

    repository.refresh_all().await.unwrap();
    assert_eq!(gateway.publish_count(), 2);
    assert_eq!(gateway.last_published_count("inventory"), Some(3));
    assert_eq!(gateway.last_published_count("billing"), Some(2));

    // Billing goes down for good.
    billing_doc.fail();
    let t0 = clock.now();
    let outcomes = repository.refresh_all().await.unwrap();
    assert_eq!(
        outcomes,
        vec![
            ("inventory".to_string(), UpdateOutcome::SuccessWithoutRouteChanges),
            ("billing".to_string(), UpdateOutcome::FailureRetrieval),
        ]
    );
    assert_eq!(gateway.publish_count(), 2);

    // Inventory grows from 3 to 4 operations: exactly one publish.
    inventory_doc.set(definition(
        None,
        &[("/items", None), ("/items/{id}", None), ("/stock", None), ("/stock/{sku}", None)],
    ));
    clock.set(t0 + Duration::from_secs(10 * 60));
    let outcomes = repository.refresh_all().await.unwrap();
    assert_eq!(outcomes[0], ("inventory".to_string(), UpdateOutcome::SuccessWithRouteChanges));
    assert_eq!(gateway.publish_count(), 3);
    assert_eq!(repository.store().operations_count("inventory"), 4);
    assert_eq!(gateway.last_published_count("inventory"), Some(4));
    assert_eq!(gateway.last_published_count("billing"), Some(2));

    clock.set(t0 + Duration::from_secs(15 * 60));
    repository.refresh_all().await.unwrap();
    assert_eq!(gateway.publish_count(), 3);
    assert_eq!(repository.store().operations_count("billing"), 2);

    // Past the grace window billing is removed with a single publish.
    clock.set(t0 + Duration::from_secs(15 * 60 + 1));
    let outcomes = repository.refresh_all().await.unwrap();
    assert_eq!(outcomes[1], ("billing".to_string(), UpdateOutcome::FailureRetrieval));
    assert_eq!(gateway.publish_count(), 4);
    assert_eq!(gateway.last_published_count("billing"), Some(0));
    assert_eq!(gateway.last_published_count("inventory"), Some(4));
    assert!(repository.store().get("billing").is_none());
    assert_eq!(
        paths_of(&table.routes()),
        vec!["/items", "/items/{id}", "/stock", "/stock/{sku}"]
    );

    // Nothing left to remove on later failures.
    clock.set(t0 + Duration::from_secs(60 * 60));
    repository.refresh_all().await.unwrap();
    assert_eq!(gateway.publish_count(), 4);
}

#[tokio::test]
async fn test_rejected_route_set_is_rolled_back() {
    let users = Service::new("users", Url::parse("http://users:8080").unwrap());
    let uri = "http://users:8080/internal/openapi-definition";

    let shared = shared(LocatorConfig {
        services: vec![users],
        ..LocatorConfig::default()
    });
    let store = OperationStore::new();
    let table = Arc::new(RouteTable::new(RouteAssembler::new(shared.clone(), store.clone())));
    let fetcher = Arc::new(StubFetcher::default());
    let repository = DefinitionRepository::new(shared, store, fetcher.clone(), table.clone());

    fetcher.serve(uri, definition(None, &[("/users", Some(r#"{filters: ["StripPrefix=1"]}"#))]));
    repository.refresh_all().await.unwrap();
    let accepted = table.routes();
    let stored = repository.store().get("users").unwrap();

    // A filter without '=' cannot be expanded, the gateway refuses the set.
    fetcher.serve(
        uri,
        definition(
            None,
            &[("/users", Some(r#"{filters: ["StripPrefix=1"]}"#)), ("/admin", Some(r#"{filters: ["StripPrefix"]}"#))],
        ),
    );
    let outcomes = repository.refresh_all().await.unwrap();
    assert_eq!(outcomes, vec![("users".to_string(), UpdateOutcome::FailurePublication)]);

    assert_eq!(repository.store().get("users").unwrap(), stored);
    assert_eq!(paths_of(&table.routes()), paths_of(&accepted));
    assert!(repository.health().first_failure("users").is_some());

    // The broken filter is fixed upstream: the change goes through.
    fetcher.serve(
        uri,
        definition(
            None,
            &[("/users", Some(r#"{filters: ["StripPrefix=1"]}"#)), ("/admin", Some(r#"{filters: ["StripPrefix=2"]}"#))],
        ),
    );
    let outcomes = repository.refresh_all().await.unwrap();
    assert_eq!(outcomes, vec![("users".to_string(), UpdateOutcome::SuccessWithRouteChanges)]);
    assert_eq!(paths_of(&table.routes()), vec!["/users", "/admin"]);
    assert_eq!(repository.health().first_failure("users"), None);
}
