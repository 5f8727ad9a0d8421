//! Event loop dispatching committed document changes to the role triggers.

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use store_lib::DocumentEvent;

use crate::role_sync::{RoleSync, Trigger};

/// Whether the worker is between events or handling one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Processing,
}

/// Consumes store events and runs every trigger that fires on them.
///
/// Failed invocations are logged and dropped; there is no retry.
pub struct TriggerWorker {
    sync: RoleSync,
    triggers: Vec<Trigger>,
    events: broadcast::Receiver<DocumentEvent>,
    state: watch::Sender<WorkerState>,
}

impl TriggerWorker {
    pub fn new(
        sync: RoleSync,
        triggers: Vec<Trigger>,
        events: broadcast::Receiver<DocumentEvent>,
    ) -> Self {
        let (state, _) = watch::channel(WorkerState::Idle);
        Self {
            sync,
            triggers,
            events,
            state,
        }
    }

    pub fn state(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    /// Run until cancelled or until the store drops its event channel
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(triggers = self.triggers.len(), "Trigger worker started");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Trigger worker cancelled");
                    break;
                }
                received = self.events.recv() => match received {
                    Ok(event) => self.dispatch(&event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Trigger worker lagged behind store events");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Store event channel closed");
                        break;
                    }
                },
            }
        }
        info!("Trigger worker stopped");
    }

    /// Handle every event already queued, then return
    pub async fn drain(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.dispatch(&event).await;
                    handled += 1;
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Trigger worker lagged behind store events");
                }
                Err(_) => break,
            }
        }
        handled
    }

    async fn dispatch(&self, event: &DocumentEvent) {
        self.state.send_replace(WorkerState::Processing);
        for trigger in self.triggers.iter().filter(|t| t.fires_on(event)) {
            match self.sync.handle(trigger, event).await {
                Ok(outcome) => {
                    info!(trigger = trigger.name, doc_id = %event.id, ?outcome, "Trigger completed");
                }
                Err(e) => {
                    error!(trigger = trigger.name, doc_id = %event.id, error = %e, "Trigger failed");
                }
            }
        }
        self.state.send_replace(WorkerState::Idle);
    }
}
