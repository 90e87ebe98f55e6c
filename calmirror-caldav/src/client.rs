//! CalDAV client built on reqwest.
//!
//! Speaks just enough WebDAV to drive a sync pass: PROPFIND discovery of a
//! calendar by display name, a time-range calendar-query REPORT, PUT of a
//! new event resource, and DELETE by href.

use calmirror_core::{RawRecord, SyncError, SyncResult, SyncWindow};
use chrono::{DateTime, Utc};
use reqwest::header::{CONTENT_TYPE, ETAG};
use reqwest::{Method, StatusCode};
use tracing::debug;
use url::Url;
use uuid::Uuid;

const PRINCIPAL_PROPFIND: &str = r#"<d:propfind xmlns:d="DAV:"><d:prop><d:current-user-principal/></d:prop></d:propfind>"#;

const HOME_SET_PROPFIND: &str = r#"<d:propfind xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav"><d:prop><c:calendar-home-set/></d:prop></d:propfind>"#;

const CALENDAR_LIST_PROPFIND: &str = r#"<d:propfind xmlns:d="DAV:"><d:prop><d:displayname/><d:resourcetype/></d:prop></d:propfind>"#;

/// Minimal CalDAV client bound to one server and one set of credentials.
pub struct CalDavClient {
    http: reqwest::Client,
    base: Url,
    username: String,
    password: String,
}

impl CalDavClient {
    pub fn new(base_url: &str, username: &str, password: &str) -> SyncResult<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| SyncError::Config(format!("Invalid base URL '{base_url}': {e}")))?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(CalDavClient {
            http,
            base,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Resolve the URL of the calendar collection with the given display
    /// name: current-user-principal, then calendar-home-set, then the first
    /// child collection whose displayname matches case-insensitively.
    pub async fn find_calendar(&self, display_name: &str) -> SyncResult<Url> {
        let response = self
            .dav_request(dav_method("PROPFIND")?, self.base.clone(), "0", PRINCIPAL_PROPFIND.into())
            .await?;
        let principal_href = parse_prop_href(&response, "current-user-principal")?;
        let principal_url = self.resolve_unavailable(&principal_href)?;
        debug!("Resolved principal: {principal_url}");

        let response = self
            .dav_request(dav_method("PROPFIND")?, principal_url, "0", HOME_SET_PROPFIND.into())
            .await?;
        let home_href = parse_prop_href(&response, "calendar-home-set")?;
        let home_url = self.resolve_unavailable(&home_href)?;
        debug!("Resolved calendar home: {home_url}");

        let response = self
            .dav_request(dav_method("PROPFIND")?, home_url, "1", CALENDAR_LIST_PROPFIND.into())
            .await?;
        let wanted = display_name.to_lowercase();
        for collection in parse_calendar_collections(&response)? {
            let Some(name) = collection.display_name else {
                continue;
            };
            if name.to_lowercase() == wanted {
                let mut url = self.resolve_unavailable(&collection.href)?;
                // Collection URLs must end with a slash so event hrefs
                // join underneath them.
                if !url.path().ends_with('/') {
                    url.set_path(&format!("{}/", url.path()));
                }
                return Ok(url);
            }
        }

        Err(SyncError::Config(format!(
            "Calendar '{display_name}' not found on {}",
            self.base
        )))
    }

    /// Fetch all event records overlapping the window, via a calendar-query
    /// REPORT with a server-side time-range filter.
    pub async fn fetch_events(&self, calendar: &Url, window: &SyncWindow) -> SyncResult<Vec<RawRecord>> {
        let body = format!(
            r#"<C:calendar-query xmlns="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
    <prop>
        <getetag/>
        <C:calendar-data/>
    </prop>
    <C:filter>
        <C:comp-filter name="VCALENDAR">
            <C:comp-filter name="VEVENT">
                <C:time-range start="{}" end="{}"/>
            </C:comp-filter>
        </C:comp-filter>
    </C:filter>
</C:calendar-query>"#,
            caldav_datetime(&window.start),
            caldav_datetime(&window.end),
        );

        let response = self
            .dav_request(dav_method("REPORT")?, calendar.clone(), "1", body)
            .await?;
        parse_calendar_data(&response)
    }

    /// Create a new event resource under the calendar collection. The
    /// payload is stored verbatim; the resource name is a fresh UUID so
    /// source UIDs never have to be URL-safe.
    pub async fn put_event(&self, calendar: &Url, ics: &str) -> SyncResult<RawRecord> {
        let resource = calendar
            .join(&format!("{}.ics", Uuid::new_v4()))
            .map_err(|e| SyncError::StoreWrite(format!("Bad event URL under {calendar}: {e}")))?;

        let response = self
            .http
            .put(resource.clone())
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, "text/calendar; charset=utf-8")
            .header("If-None-Match", "*")
            .body(ics.to_string())
            .send()
            .await
            .map_err(|e| SyncError::StoreWrite(format!("{resource}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::StoreWrite(format!(
                "{resource}: unexpected status {status}"
            )));
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        Ok(RawRecord::new(resource.path(), etag, ics))
    }

    /// Delete an event resource by href. A 404 counts as already gone.
    pub async fn delete(&self, href: &str) -> SyncResult<()> {
        let url = self
            .base
            .join(href)
            .map_err(|e| SyncError::StoreWrite(format!("Bad href '{href}': {e}")))?;

        let response = self
            .http
            .delete(url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| SyncError::StoreWrite(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(SyncError::StoreWrite(format!(
                "{url}: unexpected status {status}"
            )));
        }
        Ok(())
    }

    async fn dav_request(
        &self,
        method: Method,
        url: Url,
        depth: &str,
        body: String,
    ) -> SyncResult<String> {
        let response = self
            .http
            .request(method, url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, "application/xml; charset=utf-8")
            .header("Depth", depth)
            .body(body)
            .send()
            .await
            .map_err(|e| SyncError::StoreUnavailable(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::StoreUnavailable(format!(
                "{url}: unexpected status {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SyncError::StoreUnavailable(format!("{url}: {e}")))?;
        // Responses are normalized to text here; downstream code only ever
        // sees string payloads.
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn resolve_unavailable(&self, href: &str) -> SyncResult<Url> {
        self.base
            .join(href)
            .map_err(|e| SyncError::StoreUnavailable(format!("Bad href '{href}': {e}")))
    }
}

fn dav_method(name: &str) -> SyncResult<Method> {
    Method::from_bytes(name.as_bytes())
        .map_err(|e| SyncError::StoreUnavailable(format!("Invalid method {name}: {e}")))
}

/// Format a UTC timestamp for CalDAV time-range queries (YYYYMMDDTHHMMSSZ).
fn caldav_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// One collection found under the calendar home.
struct CalendarCollection {
    href: String,
    display_name: Option<String>,
}

/// Extract the href of a single property (e.g. current-user-principal)
/// from a PROPFIND response.
fn parse_prop_href(xml: &str, prop_name: &str) -> SyncResult<String> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| SyncError::StoreUnavailable(format!("Bad PROPFIND response: {e}")))?;

    doc.root_element()
        .descendants()
        .find(|n| n.tag_name().name() == prop_name)
        .and_then(|n| n.descendants().find(|h| h.tag_name().name() == "href"))
        .and_then(|h| h.text())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SyncError::StoreUnavailable(format!("No {prop_name} href in response")))
}

/// List the calendar collections in a Depth:1 PROPFIND response, skipping
/// resources whose resourcetype is not a calendar.
fn parse_calendar_collections(xml: &str) -> SyncResult<Vec<CalendarCollection>> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| SyncError::StoreUnavailable(format!("Bad PROPFIND response: {e}")))?;

    let mut collections = Vec::new();
    for response in doc
        .root_element()
        .descendants()
        .filter(|n| n.tag_name().name() == "response")
    {
        let href = response
            .descendants()
            .find(|n| n.tag_name().name() == "href")
            .and_then(|n| n.text())
            .map(|s| s.trim().to_string());
        let Some(href) = href else { continue };

        let is_calendar = response
            .descendants()
            .find(|n| n.tag_name().name() == "resourcetype")
            .map(|rt| rt.children().any(|c| c.tag_name().name() == "calendar"))
            .unwrap_or(false);
        if !is_calendar {
            continue;
        }

        let display_name = response
            .descendants()
            .find(|n| n.tag_name().name() == "displayname")
            .and_then(|n| n.text())
            .map(|s| s.to_string());

        collections.push(CalendarCollection { href, display_name });
    }

    Ok(collections)
}

/// Parse event records out of a calendar-query multistatus response. Only
/// responses carrying calendar-data are included.
fn parse_calendar_data(xml: &str) -> SyncResult<Vec<RawRecord>> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| SyncError::StoreUnavailable(format!("Bad REPORT response: {e}")))?;

    let mut records = Vec::new();
    for response in doc
        .root_element()
        .descendants()
        .filter(|n| n.tag_name().name() == "response")
    {
        let href = response
            .descendants()
            .find(|n| n.tag_name().name() == "href")
            .and_then(|n| n.text())
            .map(|s| s.trim().to_string());
        let Some(href) = href else { continue };

        let etag = response
            .descendants()
            .find(|n| n.tag_name().name() == "getetag")
            .and_then(|n| n.text())
            .map(|s| s.to_string());

        let data = response
            .descendants()
            .find(|n| n.tag_name().name() == "calendar-data")
            .and_then(|n| n.text())
            .map(|s| s.to_string());

        if let Some(data) = data {
            records.push(RawRecord::new(href, etag, data));
        }
    }

    Ok(records)
}
