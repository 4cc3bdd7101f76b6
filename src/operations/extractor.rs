//! Turning a parsed document into [`Operation`]s.
//!
//! For each declared operation the document-level gateway settings are merged
//! with the operation-level ones (operation wins, lists concatenate) and
//! interpreted as a [`GatewaySettings`].

use crate::config::Service;
use crate::openapi::Document;
use crate::operations::Operation;
use crate::settings::{merge, route_settings, GatewaySettings};

/// Extract every operation of `document`, in declared path order and, within
/// a path, in method order.
pub fn extract_operations(service: &Service, document: &Document) -> Vec<Operation> {
    let document_settings = route_settings(&document.extensions);

    let mut operations = Vec::with_capacity(document.operation_count());
    for (path, item) in &document.paths {
        for (method, object) in &item.operations {
            let merged = merge(document_settings, route_settings(&object.extensions));
            let settings = GatewaySettings::from_map(merged.as_ref());

            operations.push(Operation {
                base_uri: service.uri.clone(),
                path: path.clone(),
                method: *method,
                filters: settings.filters,
                predicates: settings.predicates,
                metadata: settings.metadata,
                order: settings.order,
                document_extensions: document.extensions.clone(),
                operation_extensions: object.extensions.clone(),
            });
        }
    }

    tracing::debug!(service = %service.id, count = operations.len(), "Extracted operations");
    operations
}
