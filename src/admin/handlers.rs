use std::time::UNIX_EPOCH;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use url::Url;

use crate::admin::AdminState;
use crate::routing::RouteRule;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub services: usize,
    pub published_routes: usize,
}

#[derive(Serialize)]
pub struct ServiceStatus {
    pub id: String,
    pub uri: Url,
    pub operations: usize,
    /// Start of the current failure streak, in seconds since the Unix epoch.
    pub failing_since: Option<u64>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        services: state.repository.config().services.len(),
        published_routes: state.table.routes().len(),
    })
}

/// Routes as they would be assembled right now.
pub async fn get_routes(State(state): State<AdminState>) -> Json<Vec<RouteRule>> {
    Json(state.table.assembler().assemble())
}

/// Routes last accepted by the route table.
pub async fn get_published_routes(State(state): State<AdminState>) -> Json<Vec<RouteRule>> {
    Json(state.table.routes().as_ref().clone())
}

pub async fn get_services(State(state): State<AdminState>) -> Json<Vec<ServiceStatus>> {
    let config = state.repository.config();
    let store = state.repository.store();
    let health = state.repository.health();

    let statuses = config
        .services
        .iter()
        .map(|service| ServiceStatus {
            id: service.id.clone(),
            uri: service.uri.clone(),
            operations: store.operations_count(&service.id),
            failing_since: health
                .first_failure(&service.id)
                .and_then(|since| since.duration_since(UNIX_EPOCH).ok())
                .map(|since| since.as_secs()),
        })
        .collect();

    Json(statuses)
}

pub async fn post_refresh(State(state): State<AdminState>) -> (StatusCode, Json<serde_json::Value>) {
    state.trigger.request();
    tracing::info!("Definition refresh requested through admin API");
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "refresh requested" })),
    )
}
