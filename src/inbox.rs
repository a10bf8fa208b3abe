// Event-driven front door to the request store: background pushes and narrow sync merges

use crate::error::{StoreError, SyncError};
use crate::filter::{FilterSpec, SortKey};
use crate::models::{NewRequest, Request, RequestChanges};
use crate::remote::RemoteSync;
use crate::store::RequestStore;
use crate::triage::Triage;
use eyre::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Result of one push, delivered after the task finishes
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub id: String,
    /// Push attempt this outcome belongs to; only the newest per id is applied
    pub attempt: u64,
    pub result: Result<(), SyncError>,
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct Inbox {
    store: RequestStore,
    remote: Option<Arc<dyn RemoteSync>>,
    outcomes_tx: mpsc::UnboundedSender<SyncOutcome>,
    outcomes_rx: mpsc::UnboundedReceiver<SyncOutcome>,
    in_flight: usize,
    next_attempt: u64,
    latest_attempt: HashMap<String, u64>,
}

impl Inbox {
    pub fn new(store: RequestStore, remote: Option<Arc<dyn RemoteSync>>) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let store = store.with_remote(remote.is_some());
        Self {
            store,
            remote,
            outcomes_tx,
            outcomes_rx,
            in_flight: 0,
            next_attempt: 0,
            latest_attempt: HashMap::new(),
        }
    }

    pub fn store(&self) -> &RequestStore {
        &self.store
    }

    pub fn sync_enabled(&self) -> bool {
        self.remote.is_some()
    }

    /// Pushes started but not yet applied
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Create a request and start a best-effort push
    pub fn create(&mut self, input: NewRequest) -> Result<Request, StoreError> {
        let request = self.store.create(input)?;
        self.spawn_push(request.clone());
        Ok(request)
    }

    pub fn update(&mut self, id: &str, changes: RequestChanges) -> Result<Request, StoreError> {
        self.store.update(id, changes)
    }

    pub fn query(&self, filter: &FilterSpec, sort: SortKey) -> Vec<Request> {
        self.store.query(filter, sort)
    }

    pub fn triage(&self) -> Triage {
        self.store.triage()
    }

    /// Start a fresh push for one request
    pub fn retry(&mut self, id: &str) -> Result<(), StoreError> {
        let request = self
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        info!(id, "Retrying push");
        self.spawn_push(request);
        Ok(())
    }

    /// Replace the local collection with the remote one
    ///
    /// Returns `Ok(None)` when no remote is configured. On failure the local
    /// collection is left untouched.
    pub async fn refresh(&mut self) -> Result<Option<usize>, SyncError> {
        let Some(remote) = self.remote.clone() else {
            debug!("Refresh skipped, no remote configured");
            return Ok(None);
        };

        match remote.pull().await {
            Ok(requests) => {
                let count = requests.len();
                self.store.replace_all(requests);
                Ok(Some(count))
            }
            Err(e) => {
                warn!(error = %e, "Refresh failed, keeping local requests");
                Err(e)
            }
        }
    }

    /// Apply every outcome that has already arrived
    pub fn apply_ready(&mut self) -> Vec<SyncOutcome> {
        let mut applied = Vec::new();
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            self.apply(&outcome);
            applied.push(outcome);
        }
        applied
    }

    /// Wait for all in-flight pushes and apply their outcomes
    pub async fn settle(&mut self) -> Vec<SyncOutcome> {
        let mut applied = self.apply_ready();
        while self.in_flight > 0 {
            match self.outcomes_rx.recv().await {
                Some(outcome) => {
                    self.apply(&outcome);
                    applied.push(outcome);
                }
                None => break,
            }
        }
        applied
    }

    /// Flush the store; pushes still in flight are dropped
    pub fn close(self) -> Result<()> {
        if self.in_flight > 0 {
            debug!(in_flight = self.in_flight, "Closing with pushes in flight");
        }
        self.store.close()
    }

    fn apply(&mut self, outcome: &SyncOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.latest_attempt.get(&outcome.id) != Some(&outcome.attempt) {
            debug!(id = %outcome.id, attempt = outcome.attempt, "Ignoring outcome of a superseded push");
            return;
        }
        self.latest_attempt.remove(&outcome.id);

        if let Err(e) = &outcome.result {
            warn!(id = %outcome.id, error = %e, "Push failed, request left unsynced");
        }
        self.store.mark_synced(&outcome.id, outcome.is_success());
    }

    fn spawn_push(&mut self, request: Request) {
        let Some(remote) = self.remote.clone() else {
            return;
        };

        self.next_attempt += 1;
        let attempt = self.next_attempt;
        let tx = self.outcomes_tx.clone();
        let id = request.id.clone();
        let task = async move {
            let result = remote.push(&request).await;
            // Receiver only disappears when the inbox is gone
            let _ = tx.send(SyncOutcome {
                id: request.id,
                attempt,
                result,
            });
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
                self.in_flight += 1;
                self.latest_attempt.insert(id.clone(), attempt);
                debug!(%id, attempt, "Push started");
            }
            Err(e) => {
                warn!(%id, error = %e, "No async runtime, push not started");
                self.store.mark_synced(&id, false);
            }
        }
    }
}
