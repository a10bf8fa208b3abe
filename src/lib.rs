// Print Inbox - print job request tracking with triage, CSV export and optional remote sync

pub mod clipboard;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod inbox;
pub mod models;
pub mod remote;
pub mod storage;
pub mod store;
pub mod triage;

// Re-export main types for convenience
pub use config::Config;
pub use error::{CopyError, PersistenceParseError, StoreError, SyncError, ValidationError};
pub use filter::{FilterSpec, SortKey, query};
pub use inbox::{Inbox, SyncOutcome};
pub use models::{NewRequest, Priority, Request, RequestChanges, Status};
pub use remote::{HttpRemote, RemoteSync};
pub use storage::{FileStorage, MemoryStorage, SqliteStorage, Storage, StorageKind};
pub use store::{RequestStore, STORAGE_KEY};
pub use triage::{Triage, triage};
