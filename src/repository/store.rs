//! Snapshot store of discovered operations.
//!
//! # Design Decisions
//! - One entry per service id, replaced whole; readers see a complete
//!   operation list or none
//! - Entries are `Arc`ed so a reader never holds a map shard lock while
//!   assembling routes

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::Service;
use crate::operations::Operation;

/// The operations last accepted for a service, with the service they belong to.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceOperations {
    pub service: Service,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, Default)]
pub struct OperationStore {
    entries: Arc<DashMap<String, Arc<ServiceOperations>>>,
}

impl OperationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, service_id: &str) -> Option<Arc<ServiceOperations>> {
        self.entries.get(service_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Replace the operations of a service. Returns the previous entry.
    pub fn insert(&self, service: Service, operations: Vec<Operation>) -> Option<Arc<ServiceOperations>> {
        let id = service.id.clone();
        self.entries
            .insert(id, Arc::new(ServiceOperations { service, operations }))
    }

    /// Put back an entry returned by [`insert`](Self::insert); `None` removes
    /// the service.
    pub fn restore(&self, service_id: &str, previous: Option<Arc<ServiceOperations>>) {
        match previous {
            Some(entry) => {
                self.entries.insert(service_id.to_string(), entry);
            }
            None => {
                self.entries.remove(service_id);
            }
        }
    }

    pub fn remove(&self, service_id: &str) -> Option<Arc<ServiceOperations>> {
        self.entries.remove(service_id).map(|(_, entry)| entry)
    }

    /// Swap the service snapshot of an entry, keeping its operations.
    pub fn refresh_service(&self, service: &Service) {
        if let Some(mut entry) = self.entries.get_mut(&service.id) {
            if entry.service != *service {
                *entry = Arc::new(ServiceOperations {
                    service: service.clone(),
                    operations: entry.operations.clone(),
                });
            }
        }
    }

    pub fn operations_count(&self, service_id: &str) -> usize {
        self.entries
            .get(service_id)
            .map_or(0, |entry| entry.operations.len())
    }

    /// Drop every service for which `keep` returns false.
    pub fn retain(&self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        let mut removed = Vec::new();
        self.entries.retain(|service_id, _| {
            let kept = keep(service_id);
            if !kept {
                removed.push(service_id.clone());
            }
            kept
        });
        removed
    }

    pub fn service_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
