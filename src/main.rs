//! OpenAPI route locator daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                      OPENAPI ROUTE LOCATOR                       │
//!   │                                                                  │
//!   │  ┌───────────┐   ┌──────────────────────┐   ┌────────────────┐   │
//!   │  │ scheduler │──▶│ DefinitionRepository │──▶│ OperationStore │   │
//!   │  └───────────┘   │ fetch → parse →      │   └───────┬────────┘   │
//!   │        ▲         │ extract → compare    │           │            │
//!   │        │         └──────────┬───────────┘           ▼            │
//!   │  ┌───────────┐              │ request_publish ┌───────────────┐  │
//!   │  │ admin API │              └────────────────▶│  RouteTable   │  │
//!   │  └───────────┘                                │ (assemble +   │  │
//!   │                                               │  validate)    │  │
//!   │                                               └───────────────┘  │
//!   │  ┌────────────────────────────────────────────────────────────┐  │
//!   │  │ config (+ watcher) · observability · lifecycle             │  │
//!   │  └────────────────────────────────────────────────────────────┘  │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use openapi_route_locator::admin::{self, AdminState};
use openapi_route_locator::config::{load_config, shared, ConfigWatcher};
use openapi_route_locator::lifecycle::{wait_for_shutdown_signal, Shutdown};
use openapi_route_locator::observability::logging::init_logging;
use openapi_route_locator::observability::metrics::init_metrics;
use openapi_route_locator::observability::{MetricsSink, NoopMetrics, PrometheusMetrics};
use openapi_route_locator::openapi::ResourceLoader;
use openapi_route_locator::repository::{DefinitionRepository, OperationStore};
use openapi_route_locator::routing::{RouteAssembler, RouteTable};
use openapi_route_locator::scheduler::UpdateScheduler;

#[derive(Parser)]
#[command(name = "openapi-route-locator", version)]
#[command(about = "Keeps gateway routes in sync with upstream OpenAPI definitions", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Reload the configuration when the file changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args.config)?;
    init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        services = config.services.len(),
        fixed_delay_secs = config.update_scheduler.fixed_delay_secs,
        "openapi-route-locator starting"
    );

    let metrics: Arc<dyn MetricsSink> = if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => match init_metrics(addr) {
                Ok(()) => Arc::new(PrometheusMetrics),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install metrics exporter");
                    Arc::new(NoopMetrics)
                }
            },
            Err(_) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
                Arc::new(NoopMetrics)
            }
        }
    } else {
        Arc::new(NoopMetrics)
    };

    let admin_config = config.admin.clone();
    let fetcher = Arc::new(ResourceLoader::new(config.fetcher.timeout())?);
    let shared_config = shared(config);
    let store = OperationStore::new();

    let table = Arc::new(RouteTable::new(RouteAssembler::new(shared_config.clone(), store.clone())));
    let repository = Arc::new(
        DefinitionRepository::new(shared_config, store, fetcher, table.clone()).with_metrics(metrics),
    );

    let shutdown = Shutdown::new();
    let scheduler = UpdateScheduler::new(repository.clone());
    let trigger = scheduler.trigger();
    let scheduler_task = tokio::spawn(scheduler.run(shutdown.subscribe()));

    let admin_task = if admin_config.enabled {
        let listener = TcpListener::bind(&admin_config.bind_address).await?;
        let state = AdminState {
            repository: repository.clone(),
            table: table.clone(),
            trigger,
        };
        Some(tokio::spawn(admin::serve(listener, state, shutdown.subscribe())))
    } else {
        None
    };

    // The watcher stops delivering events once dropped.
    let _watcher = if args.watch {
        let (watcher, mut updates) = ConfigWatcher::new(&args.config, (*repository.config()).clone());
        let watcher = watcher.run()?;

        let repository = repository.clone();
        let mut stop = shutdown.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(new_config) = updates.recv() => repository.apply_config(new_config).await,
                    _ = stop.recv() => break,
                    else => break,
                }
            }
        });
        Some(watcher)
    } else {
        None
    };

    wait_for_shutdown_signal().await;
    tracing::info!("Shutting down");
    shutdown.trigger();

    if let Err(e) = scheduler_task.await {
        tracing::error!(error = %e, "Update scheduler task failed");
    }
    if let Some(task) = admin_task {
        match task.await {
            Ok(Err(e)) => tracing::error!(error = %e, "Admin API failed"),
            Err(e) => tracing::error!(error = %e, "Admin API task failed"),
            Ok(Ok(())) => {}
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
