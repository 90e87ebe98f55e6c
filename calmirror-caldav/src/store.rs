//! CalDAV-backed implementation of the store contract.

use calmirror_core::{CalendarStore, RawRecord, SyncResult, SyncWindow};
use serde::Deserialize;
use tracing::info;
use url::Url;

use crate::client::CalDavClient;

/// Connection settings for one CalDAV endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CalDavEndpoint {
    /// Server base URL; calendar discovery starts here.
    pub url: String,
    pub username: String,
    pub password: String,
    /// Display name of the calendar to operate on.
    pub calendar: String,
}

/// One remote calendar collection, bound to its resolved URL.
pub struct CalDavStore {
    label: String,
    client: CalDavClient,
    calendar_url: Url,
}

impl CalDavStore {
    /// Connect to the endpoint and resolve its calendar by display name.
    pub async fn connect(label: &str, endpoint: &CalDavEndpoint) -> SyncResult<Self> {
        let client = CalDavClient::new(&endpoint.url, &endpoint.username, &endpoint.password)?;
        let calendar_url = client.find_calendar(&endpoint.calendar).await?;
        info!(
            "Connected '{label}' to calendar '{}' at {calendar_url}",
            endpoint.calendar
        );
        Ok(CalDavStore {
            label: label.to_string(),
            client,
            calendar_url,
        })
    }
}

impl CalendarStore for CalDavStore {
    fn name(&self) -> &str {
        &self.label
    }

    async fn fetch_in_window(&self, window: &SyncWindow) -> SyncResult<Vec<RawRecord>> {
        self.client.fetch_events(&self.calendar_url, window).await
    }

    async fn persist(&self, ics: &str) -> SyncResult<RawRecord> {
        self.client.put_event(&self.calendar_url, ics).await
    }

    async fn delete(&self, record: &RawRecord) -> SyncResult<()> {
        self.client.delete(&record.href).await
    }
}
