// Error taxonomy for the inbox

use thiserror::Error;

/// Rejected input on create
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name is required")]
    EmptyName,
    #[error("description is required")]
    EmptyDescription,
}

/// Errors returned by store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no request with id {0}")]
    NotFound(String),
}

/// Persisted state could not be decoded; the store falls back to empty
#[derive(Debug, Error)]
#[error("stored requests are unreadable: {0}")]
pub struct PersistenceParseError(#[from] pub serde_json::Error);

/// Remote sync failures. Never fatal and never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("failed to push request {id}: {reason}")]
    Push { id: String, reason: String },
    #[error("failed to refresh from remote: {0}")]
    Pull(String),
}

/// Writing a summary to the clipboard failed
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("no clipboard command configured")]
    NotConfigured,
    #[error("failed to run clipboard command `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("clipboard command `{program}` exited with {status}")]
    Failed { program: String, status: std::process::ExitStatus },
}
