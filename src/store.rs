// Request store: the owned collection plus persistence gating

use crate::error::{PersistenceParseError, StoreError};
use crate::filter::{self, FilterSpec, SortKey};
use crate::models::{NewRequest, Request, RequestChanges};
use crate::storage::Storage;
use crate::triage::{self, Triage};
use chrono::Utc;
use eyre::{Context, Result};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Slot holding the JSON array of every request
pub const STORAGE_KEY: &str = "print-inbox-requests";

/// Owned request collection with explicit hydration
///
/// Nothing is written to storage until `hydrate()` has loaded the persisted
/// collection, so an empty startup state can never overwrite saved requests.
pub struct RequestStore {
    requests: Vec<Request>,
    storage: Box<dyn Storage>,
    hydrated: bool,
    dirty: bool,
    remote_enabled: bool,
}

impl RequestStore {
    /// Create an unhydrated store over `storage`
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self {
            requests: Vec::new(),
            storage,
            hydrated: false,
            dirty: false,
            remote_enabled: false,
        }
    }

    /// Create a store and load its persisted state
    pub fn open(storage: Box<dyn Storage>) -> Self {
        let mut store = Self::new(storage);
        store.hydrate();
        store
    }

    /// Whether new requests start unsynced and wait for a push
    pub fn with_remote(mut self, enabled: bool) -> Self {
        self.remote_enabled = enabled;
        self
    }

    pub fn remote_enabled(&self) -> bool {
        self.remote_enabled
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Load persisted requests once and allow saves from then on
    ///
    /// A stored value that does not decode is logged and replaced by an empty
    /// collection. If storage cannot be read at all the store stays
    /// unhydrated, saves stay disabled, and `hydrate` may be called again.
    /// Requests created before hydration stay ahead of the loaded ones.
    pub fn hydrate(&mut self) {
        if self.hydrated {
            debug!("Store already hydrated");
            return;
        }

        let loaded = match self.storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => match decode(&raw) {
                Ok(requests) => requests,
                Err(e) => {
                    warn!(key = STORAGE_KEY, error = %e, "Discarding unreadable persisted requests");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = STORAGE_KEY, error = ?e, "Failed to read persisted requests, saves disabled");
                return;
            }
        };

        info!(count = loaded.len(), "Loaded persisted requests");
        self.requests.extend(loaded);
        self.hydrated = true;

        if self.dirty {
            self.persist();
        }
    }

    /// Add a new request at the front of the collection
    pub fn create(&mut self, input: NewRequest) -> Result<Request, StoreError> {
        let (name, description) = input.validate()?;

        let request = Request {
            id: Uuid::now_v7().to_string(),
            created_at: Utc::now(),
            name,
            description,
            due_date: input.due_date,
            priority: input.priority,
            status: Default::default(),
            dev_notes: String::new(),
            pinned: false,
            synced: !self.remote_enabled,
        };

        debug!(id = %request.id, "Created request");
        self.requests.insert(0, request.clone());
        self.mark_dirty();
        Ok(request)
    }

    /// Merge `changes` into an existing request
    pub fn update(&mut self, id: &str, changes: RequestChanges) -> Result<Request, StoreError> {
        let request = self
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        changes.apply_to(request);
        let updated = request.clone();

        debug!(id, ?changes, "Updated request");
        self.mark_dirty();
        Ok(updated)
    }

    /// Record a sync result, touching only `synced`
    ///
    /// Returns false when the request no longer exists.
    pub fn mark_synced(&mut self, id: &str, synced: bool) -> bool {
        let Some(request) = self.requests.iter_mut().find(|r| r.id == id) else {
            debug!(id, "Dropping sync result for missing request");
            return false;
        };
        if request.synced != synced {
            request.synced = synced;
            self.mark_dirty();
        }
        true
    }

    /// Overwrite the whole collection with `requests` (remote refresh)
    ///
    /// Rows repeating an id collapse into one: the later row wins and keeps
    /// the position of the first.
    pub fn replace_all(&mut self, requests: Vec<Request>) {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut unique: Vec<Request> = Vec::with_capacity(requests.len());
        let mut duplicates = 0;

        for mut request in requests {
            request.synced = true;
            match positions.get(&request.id) {
                Some(&index) => {
                    unique[index] = request;
                    duplicates += 1;
                }
                None => {
                    positions.insert(request.id.clone(), unique.len());
                    unique.push(request);
                }
            }
        }

        if duplicates > 0 {
            warn!(duplicates, "Collapsed pulled rows with repeated ids");
        }
        self.requests = unique;
        info!(count = self.requests.len(), "Replaced request collection");
        self.mark_dirty();
    }

    pub fn get(&self, id: &str) -> Option<&Request> {
        self.requests.iter().find(|r| r.id == id)
    }

    /// Requests in storage order (newest first)
    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Ids of requests whose last push failed
    pub fn unsynced(&self) -> Vec<String> {
        self.requests.iter().filter(|r| !r.synced).map(|r| r.id.clone()).collect()
    }

    pub fn query(&self, filter: &FilterSpec, sort: SortKey) -> Vec<Request> {
        filter::query(&self.requests, filter, sort)
    }

    pub fn triage(&self) -> Triage {
        triage::triage(&self.requests)
    }

    /// Final flush of any unsaved mutation
    pub fn close(mut self) -> Result<()> {
        if self.dirty && self.hydrated {
            self.save()?;
        }
        Ok(())
    }

    // ========================================================================
    // Persistence helpers
    // ========================================================================

    fn mark_dirty(&mut self) {
        self.dirty = true;
        if self.hydrated {
            self.persist();
        }
    }

    /// Save, keeping the store dirty on failure so a later save retries
    fn persist(&mut self) {
        if let Err(e) = self.save() {
            warn!(error = ?e, "Failed to persist requests");
        }
    }

    fn save(&mut self) -> Result<()> {
        debug_assert!(self.hydrated, "save before hydrate");
        let json = serde_json::to_string(&self.requests).context("Failed to serialize requests")?;
        self.storage.set(STORAGE_KEY, &json)?;
        self.dirty = false;
        debug!(count = self.requests.len(), "Persisted requests");
        Ok(())
    }
}

fn decode(raw: &str) -> Result<Vec<Request>, PersistenceParseError> {
    Ok(serde_json::from_str(raw)?)
}
