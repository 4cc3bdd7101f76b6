//! Fixed-delay update loop.

use std::sync::Arc;

use tokio::sync::Notify;
use tokio::time;

use crate::lifecycle::ShutdownListener;
use crate::repository::DefinitionRepository;

/// Handle used to request an immediate refresh.
///
/// A request made while a refresh is running starts another one right after.
#[derive(Debug, Clone, Default)]
pub struct RefreshTrigger {
    notify: Arc<Notify>,
}

impl RefreshTrigger {
    pub fn request(&self) {
        self.notify.notify_one();
    }
}

pub struct UpdateScheduler {
    repository: Arc<DefinitionRepository>,
    trigger: RefreshTrigger,
}

impl UpdateScheduler {
    pub fn new(repository: Arc<DefinitionRepository>) -> Self {
        Self {
            repository,
            trigger: RefreshTrigger::default(),
        }
    }

    pub fn trigger(&self) -> RefreshTrigger {
        self.trigger.clone()
    }

    /// Refresh, wait, repeat until shutdown. The delay is re-read from the
    /// current configuration after every round.
    pub async fn run(self, mut shutdown: ShutdownListener) {
        tracing::info!("Update scheduler starting");

        loop {
            if let Some(outcomes) = self.repository.refresh_all().await {
                let failed = outcomes.iter().filter(|(_, outcome)| !outcome.is_success()).count();
                tracing::debug!(services = outcomes.len(), failed, "Definition refresh finished");
            }

            let delay = self.repository.config().update_scheduler.fixed_delay();
            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = self.trigger.notify.notified() => {
                    tracing::info!("Manual definition refresh requested");
                }
                _ = shutdown.recv() => {
                    tracing::info!("Update scheduler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
