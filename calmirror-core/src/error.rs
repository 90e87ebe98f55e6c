//! Error types for the calmirror ecosystem.

use thiserror::Error;

/// Errors that can occur while reconciling calendars.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The store could not be reached or refused the request (transport,
    /// auth, discovery). Aborts the current pass.
    #[error("Calendar store unavailable: {0}")]
    StoreUnavailable(String),

    /// A single create or delete failed. Callers log this and continue
    /// with the remaining instances.
    #[error("Calendar store write failed: {0}")]
    StoreWrite(String),

    /// A record's payload could not be parsed into an event instance.
    /// Such records are skipped during grouping.
    #[error("Malformed calendar record: {0}")]
    MalformedRecord(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for calmirror operations.
pub type SyncResult<T> = Result<T, SyncError>;
