//! Definition update loop.
//!
//! # Responsibilities
//! - Retrieve, parse and extract the definition of every configured service
//! - Store changed operation lists and request a publish
//! - Roll back a change the gateway refuses to publish
//! - Keep the last known routes of a failing service for a grace window,
//!   then remove them
//!
//! # Data Flow
//! ```text
//! refresh_all (one tick)
//!     for each configured service, in order:
//!         retrieve_operations (fetch → parse → extract)
//!             → unchanged: success_without_route_changes
//!             → changed: store, publish
//!                 → ok: success_with_route_changes
//!                 → refused: restore previous, publish again, failure_publication
//!         → retrieval error: failure_retrieval
//!         on any failure: handle_failure (grace window / eviction)
//! ```
//!
//! # Design Decisions
//! - Services are updated sequentially and independently; one failing or
//!   panicking service never stops the tick
//! - A single tick runs at a time; overlapping requests are skipped
//! - No error leaves a tick, everything is logged and measured

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use futures_util::FutureExt;
use tokio::sync::Mutex;

use crate::config::{LocatorConfig, Service, SharedConfig};
use crate::error::{PublishError, RetrievalError, UpdateError};
use crate::health::{Clock, ServiceHealthTracker, SystemClock};
use crate::observability::{MetricsSink, NoopMetrics, UpdateOutcome};
use crate::openapi::{DocumentParser, OpenApiParser, ResourceFetcher};
use crate::operations::{extract_operations, Operation};
use crate::repository::store::{OperationStore, ServiceOperations};
use crate::routing::PublishGateway;

pub struct DefinitionRepository {
    config: SharedConfig,
    store: OperationStore,
    health: ServiceHealthTracker,
    fetcher: Arc<dyn ResourceFetcher>,
    parser: Arc<dyn DocumentParser>,
    publisher: Arc<dyn PublishGateway>,
    metrics: Arc<dyn MetricsSink>,
    clock: Arc<dyn Clock>,
    tick: Mutex<()>,
}

impl DefinitionRepository {
    pub fn new(
        config: SharedConfig,
        store: OperationStore,
        fetcher: Arc<dyn ResourceFetcher>,
        publisher: Arc<dyn PublishGateway>,
    ) -> Self {
        Self {
            config,
            store,
            health: ServiceHealthTracker::new(),
            fetcher,
            parser: Arc::new(OpenApiParser::new()),
            publisher,
            metrics: Arc::new(NoopMetrics),
            clock: Arc::new(SystemClock),
            tick: Mutex::new(()),
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> Arc<LocatorConfig> {
        self.config.load_full()
    }

    pub fn store(&self) -> &OperationStore {
        &self.store
    }

    pub fn health(&self) -> &ServiceHealthTracker {
        &self.health
    }

    /// Run one update round over all configured services.
    ///
    /// Returns `None` when another round is still running.
    pub async fn refresh_all(&self) -> Option<Vec<(String, UpdateOutcome)>> {
        let Ok(_guard) = self.tick.try_lock() else {
            tracing::info!("Definition refresh already in progress, skipping");
            return None;
        };

        let config = self.config.load_full();
        tracing::debug!(services = config.services.len(), "Refreshing route definitions");

        let mut outcomes = Vec::with_capacity(config.services.len());
        for service in &config.services {
            let update = AssertUnwindSafe(self.update_service(&config, service)).catch_unwind();
            match update.await {
                Ok(outcome) => outcomes.push((service.id.clone(), outcome)),
                Err(_) => tracing::error!(
                    service = %service.id,
                    "Panic while updating route definitions, continuing with next service"
                ),
            }
        }

        Some(outcomes)
    }

    async fn update_service(&self, config: &LocatorConfig, service: &Service) -> UpdateOutcome {
        let started = Instant::now();

        let outcome = match self.try_update(config, service).await {
            Ok(changed) => {
                self.health.record_success(&service.id);
                if changed {
                    UpdateOutcome::SuccessWithRouteChanges
                } else {
                    UpdateOutcome::SuccessWithoutRouteChanges
                }
            }
            Err(error) => {
                let outcome = if error.is_publish() {
                    UpdateOutcome::FailurePublication
                } else {
                    UpdateOutcome::FailureRetrieval
                };
                self.handle_failure(config, service, &error);
                outcome
            }
        };

        self.metrics.record_update(&service.id, outcome, started.elapsed());
        self.metrics
            .record_operations_count(&service.id, self.store.operations_count(&service.id));
        outcome
    }

    /// Returns whether the stored operations changed.
    async fn try_update(&self, config: &LocatorConfig, service: &Service) -> Result<bool, UpdateError> {
        let operations = self.retrieve_operations(config, service).await?;

        let unchanged = match self.store.get(&service.id) {
            Some(current) => current.operations == operations,
            None => operations.is_empty(),
        };
        if unchanged {
            tracing::debug!(service = %service.id, "Route definitions unchanged");
            return Ok(false);
        }

        let count = operations.len();
        let previous = self.store.insert(service.clone(), operations);
        self.publish_or_rollback(service, previous)?;

        tracing::info!(service = %service.id, operations = count, "Route definitions updated");
        Ok(true)
    }

    async fn retrieve_operations(
        &self,
        config: &LocatorConfig,
        service: &Service,
    ) -> Result<Vec<Operation>, RetrievalError> {
        let uri = service
            .definition_uri(&config.openapi_definition_uri)
            .map_err(|source| RetrievalError::InvalidUri {
                uri: service
                    .openapi_definition_uri
                    .clone()
                    .unwrap_or_else(|| config.openapi_definition_uri.clone()),
                source,
            })?;

        let text = self
            .fetcher
            .fetch(&uri)
            .await
            .map_err(|source| RetrievalError::Fetch {
                uri: uri.to_string(),
                source,
            })?;

        let parsed = self.parser.parse(&text).map_err(|source| RetrievalError::Parse {
            uri: uri.to_string(),
            source,
        })?;
        for warning in &parsed.warnings {
            tracing::warn!(service = %service.id, uri = %uri, warning = %warning, "OpenAPI definition problem");
        }

        Ok(extract_operations(service, &parsed.document))
    }

    fn publish_or_rollback(
        &self,
        service: &Service,
        previous: Option<Arc<ServiceOperations>>,
    ) -> Result<(), UpdateError> {
        let Err(source) = self.publisher.request_publish() else {
            return Ok(());
        };

        self.store.restore(&service.id, previous);
        if let Err(error) = self.publisher.request_publish() {
            tracing::error!(
                service = %service.id,
                error = %error,
                "Error while publishing rolled back route definitions"
            );
        }

        Err(UpdateError::Publish {
            service: service.id.clone(),
            source,
        })
    }

    fn handle_failure(&self, config: &LocatorConfig, service: &Service, error: &UpdateError) {
        let now = self.clock.now();
        let first_failure = self.health.record_failure(&service.id, now);
        let failing_for = now.duration_since(first_failure).unwrap_or_default();

        let has_routes = self
            .store
            .get(&service.id)
            .is_some_and(|entry| !entry.operations.is_empty());
        if !has_routes {
            tracing::error!(
                service = %service.id,
                error = %error,
                failing_for_secs = failing_for.as_secs(),
                "Error while updating route definitions, no routes registered"
            );
            return;
        }

        let grace = config.update_scheduler.remove_routes_after();
        if ServiceHealthTracker::should_evict(first_failure, now, grace) {
            self.store.remove(&service.id);
            self.metrics.record_eviction(&service.id);
            tracing::error!(
                service = %service.id,
                error = %error,
                failing_since = unix_secs(first_failure),
                failing_for_secs = failing_for.as_secs(),
                "Updates failing for longer than {}s, removing routes",
                grace.as_secs()
            );

            if let Err(error) = self.publisher.request_publish() {
                tracing::error!(service = %service.id, error = %error, "Error while publishing route removal");
            }
        } else {
            let remaining = ServiceHealthTracker::eviction_deadline(first_failure, grace)
                .and_then(|deadline| deadline.duration_since(now).ok())
                .unwrap_or_default();
            tracing::warn!(
                service = %service.id,
                error = %error,
                failing_since = unix_secs(first_failure),
                failing_for_secs = failing_for.as_secs(),
                routes_removed_in_secs = remaining.as_secs(),
                "Error while updating route definitions, keeping last known routes"
            );
        }
    }

    /// Swap in a reloaded configuration.
    ///
    /// Services that are no longer configured lose their routes and failure
    /// state; the rest keep their operations until the next round.
    pub async fn apply_config(&self, config: LocatorConfig) {
        let _guard = self.tick.lock().await;

        self.config.store(Arc::new(config));
        let config = self.config.load_full();

        let removed = self.store.retain(|id| config.service(id).is_some());
        self.health.retain(|id| config.service(id).is_some());
        for service in &config.services {
            self.store.refresh_service(service);
        }
        for id in &removed {
            self.metrics.record_operations_count(id, 0);
        }

        tracing::info!(services = config.services.len(), removed = ?removed, "Configuration applied");

        if let Err(error) = self.publisher.request_publish() {
            tracing::error!(error = %error, "Error while publishing routes after configuration change");
        }
    }

    /// Ask the gateway to pick up the current state, outside of a tick.
    pub fn publish(&self) -> Result<(), PublishError> {
        self.publisher.request_publish()
    }
}

fn unix_secs(instant: SystemTime) -> u64 {
    instant
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
