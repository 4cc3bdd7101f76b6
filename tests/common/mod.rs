//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use tokio::net::TcpListener;
use url::Url;

use openapi_route_locator::error::{FetchError, PublishError};
use openapi_route_locator::openapi::{ResourceFetcher, ResourceLoader};
use openapi_route_locator::repository::OperationStore;
use openapi_route_locator::routing::{PublishGateway, RouteTable};

/// Start a programmable definition server on an ephemeral port.
///
/// Every request, whatever its path, is answered with the status and body
/// returned by `f`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = axum::Router::new().fallback(move || {
        let f = f.clone();
        async move {
            let (status, body) = f().await;
            (StatusCode::from_u16(status).unwrap(), body)
        }
    });
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}

/// A definition document whose body can be swapped, or removed to answer 503.
#[derive(Clone, Default)]
pub struct SwitchableDocument {
    body: Arc<Mutex<Option<String>>>,
}

impl SwitchableDocument {
    pub fn set(&self, body: impl Into<String>) {
        *self.body.lock().unwrap() = Some(body.into());
    }

    pub fn fail(&self) {
        *self.body.lock().unwrap() = None;
    }

    /// Serve this document over HTTP.
    pub async fn serve(&self) -> SocketAddr {
        let body = self.body.clone();
        start_programmable_backend(move || {
            let body = body.clone();
            async move {
                let current = body.lock().unwrap().clone();
                match current {
                    Some(text) => (200, text),
                    None => (503, "Service Unavailable".to_string()),
                }
            }
        })
        .await
    }
}

/// Real loader that ignores proxy environment variables.
pub fn local_loader() -> ResourceLoader {
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    ResourceLoader::with_client(client)
}

pub fn local_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// In-memory fetcher keyed by the full definition URI.
#[derive(Default)]
pub struct StubFetcher {
    documents: Mutex<HashMap<String, String>>,
}

impl StubFetcher {
    pub fn serve(&self, uri: &str, text: impl Into<String>) {
        self.documents.lock().unwrap().insert(uri.to_string(), text.into());
    }

    pub fn fail(&self, uri: &str) {
        self.documents.lock().unwrap().remove(uri);
    }
}

#[async_trait]
impl ResourceFetcher for StubFetcher {
    async fn fetch(&self, uri: &Url) -> Result<String, FetchError> {
        self.documents
            .lock()
            .unwrap()
            .get(uri.as_str())
            .cloned()
            .ok_or(FetchError::Status(503))
    }
}

/// Route table that remembers, for every publish request, how many
/// operations each stored service had.
pub struct CountingGateway {
    table: Arc<RouteTable>,
    store: OperationStore,
    publishes: Mutex<Vec<BTreeMap<String, usize>>>,
}

impl CountingGateway {
    pub fn new(table: Arc<RouteTable>, store: OperationStore) -> Self {
        Self {
            table,
            store,
            publishes: Mutex::new(Vec::new()),
        }
    }

    pub fn publish_count(&self) -> usize {
        self.publishes.lock().unwrap().len()
    }

    /// Operations `service_id` had at the most recent publish request, zero
    /// when it had no stored entry.
    pub fn last_published_count(&self, service_id: &str) -> Option<usize> {
        self.publishes
            .lock()
            .unwrap()
            .last()
            .map(|counts| counts.get(service_id).copied().unwrap_or(0))
    }
}

impl PublishGateway for CountingGateway {
    fn request_publish(&self) -> Result<(), PublishError> {
        let counts = self
            .store
            .service_ids()
            .into_iter()
            .map(|id| {
                let count = self.store.operations_count(&id);
                (id, count)
            })
            .collect();
        self.publishes.lock().unwrap().push(counts);
        self.table.request_publish()
    }
}

/// Build an OpenAPI document with a `get` operation per path.
///
/// `document_settings` and each path's settings are inserted verbatim as
/// `x-gateway-route-settings` YAML flow mappings.
pub fn definition(document_settings: Option<&str>, paths: &[(&str, Option<&str>)]) -> String {
    let mut text = String::from("openapi: 3.0.1\ninfo:\n  title: test\n  version: \"1\"\n");
    if let Some(settings) = document_settings {
        text.push_str(&format!("x-gateway-route-settings: {settings}\n"));
    }
    if paths.is_empty() {
        text.push_str("paths: {}\n");
        return text;
    }
    text.push_str("paths:\n");
    for (path, settings) in paths {
        text.push_str(&format!("  {path}:\n    get:\n      responses: {{}}\n"));
        if let Some(settings) = settings {
            text.push_str(&format!("      x-gateway-route-settings: {settings}\n"));
        }
    }
    text
}
