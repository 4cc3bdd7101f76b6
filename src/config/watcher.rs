//! Configuration file watcher for hot reload.
//!
//! Editors tend to write a file in several steps, so change events are
//! debounced: the file is read once the events have been quiet for
//! [`DEFAULT_DEBOUNCE`]. A reload is forwarded only when it validates and
//! differs from the configuration last forwarded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time;

use crate::config::loader::load_config;
use crate::config::schema::LocatorConfig;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Service ids that differ between two configurations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
}

impl ServiceChanges {
    pub fn between(old: &LocatorConfig, new: &LocatorConfig) -> Self {
        let mut changes = Self::default();

        for service in &new.services {
            match old.service(&service.id) {
                None => changes.added.push(service.id.clone()),
                Some(previous) if previous != service => changes.modified.push(service.id.clone()),
                Some(_) => {}
            }
        }
        changes.removed = old
            .services
            .iter()
            .filter(|service| new.service(&service.id).is_none())
            .map(|service| service.id.clone())
            .collect();

        changes
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    current: LocatorConfig,
    debounce: Duration,
    update_tx: mpsc::UnboundedSender<LocatorConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for configuration updates.
    ///
    /// `current` is the configuration already running; reloads are compared
    /// against it.
    pub fn new(path: &Path, current: LocatorConfig) -> (Self, mpsc::UnboundedReceiver<LocatorConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                current,
                debounce: DEFAULT_DEBOUNCE,
                update_tx,
            },
            update_rx,
        )
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Start watching the file.
    ///
    /// File events arrive on a notify thread and are handed to a tokio task,
    /// so this must be called from within a runtime. The returned watcher
    /// must be kept alive for events to be delivered; dropping it also ends
    /// the reload task.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    let _ = event_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, debounce_ms = self.debounce.as_millis() as u64, "Config watcher started");
        tokio::spawn(self.reload_loop(event_rx));

        Ok(watcher)
    }

    async fn reload_loop(mut self, mut events: mpsc::UnboundedReceiver<()>) {
        while events.recv().await.is_some() {
            time::sleep(self.debounce).await;
            while events.try_recv().is_ok() {}

            let Some(new_config) = reload(&self.path, &self.current) else {
                continue;
            };
            if self.update_tx.send(new_config.clone()).is_err() {
                break;
            }
            self.current = new_config;
        }
        tracing::debug!(path = ?self.path, "Config reload task stopped");
    }
}

/// Read the file again. Returns the new configuration when it validates and
/// differs from `current`.
fn reload(path: &Path, current: &LocatorConfig) -> Option<LocatorConfig> {
    let new_config = match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
            return None;
        }
    };

    if new_config == *current {
        tracing::debug!(path = ?path, "Config file touched without changes");
        return None;
    }

    let changes = ServiceChanges::between(current, &new_config);
    tracing::info!(
        added = ?changes.added,
        removed = ?changes.removed,
        modified = ?changes.modified,
        "Config file change detected, reloading"
    );
    Some(new_config)
}
