//! Admin API.
//!
//! # Endpoints
//! - `GET /admin/status`: version and counters
//! - `GET /admin/routes`: routes assembled from the current store
//! - `GET /admin/routes/published`: the last accepted route table
//! - `GET /admin/services`: per service operation count and failure streak
//! - `POST /admin/refresh`: wake the update scheduler
//!
//! Every endpoint requires the configured bearer key.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::lifecycle::ShutdownListener;
use crate::repository::DefinitionRepository;
use crate::routing::RouteTable;
use crate::scheduler::RefreshTrigger;

#[derive(Clone)]
pub struct AdminState {
    pub repository: Arc<DefinitionRepository>,
    pub table: Arc<RouteTable>,
    pub trigger: RefreshTrigger,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(get_routes))
        .route("/admin/routes/published", get(get_published_routes))
        .route("/admin/services", get(get_services))
        .route("/admin/refresh", post(post_refresh))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the admin API until shutdown is signalled.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: ShutdownListener,
) -> std::io::Result<()> {
    tracing::info!(address = ?listener.local_addr().ok(), "Admin API listening");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            shutdown.recv().await;
        })
        .await
}
