//! The store collaborator contract.

use crate::error::SyncResult;
use crate::instance::RawRecord;
use crate::window::SyncWindow;

/// One remote event collection, as the reconciler sees it.
///
/// Implementations own transport, credentials, and payload encoding; the
/// reconciler only ever fetches a window, persists a serialized event
/// verbatim, or deletes a record by handle.
///
/// Error contract: `fetch_in_window` failures are
/// [`SyncError::StoreUnavailable`](crate::SyncError::StoreUnavailable) and
/// abort the pass; `persist` and `delete` failures are
/// [`SyncError::StoreWrite`](crate::SyncError::StoreWrite) and are handled
/// per-instance by the caller.
pub trait CalendarStore {
    /// Collection label used in log output.
    fn name(&self) -> &str;

    /// All records overlapping the half-open window. May be empty.
    fn fetch_in_window(
        &self,
        window: &SyncWindow,
    ) -> impl std::future::Future<Output = SyncResult<Vec<RawRecord>>> + Send;

    /// Create a new record from a verbatim serialized single-event payload.
    fn persist(&self, ics: &str) -> impl std::future::Future<Output = SyncResult<RawRecord>> + Send;

    /// Remove a record by handle.
    fn delete(&self, record: &RawRecord) -> impl std::future::Future<Output = SyncResult<()>> + Send;
}
