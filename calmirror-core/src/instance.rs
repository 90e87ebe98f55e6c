//! Store-neutral event instance types.
//!
//! An instance is one concrete occurrence of an event, materialized as a
//! standalone record: a singleton event, or one occurrence of a recurring
//! series that the store has already expanded. calmirror never evaluates
//! recurrence rules itself.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// An opaque serialized calendar object as stored by the remote collection.
///
/// The payload is read-only to the reconciler: it parses a handful of fields
/// out of `data` but re-persists the text verbatim, so the record keeps its
/// original UID across stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Store handle for this record (e.g. a CalDAV resource path).
    pub href: String,
    pub etag: Option<String>,
    /// Serialized ICS payload, normalized to text by the store.
    pub data: String,
}

impl RawRecord {
    pub fn new(href: impl Into<String>, etag: Option<String>, data: impl Into<String>) -> Self {
        RawRecord {
            href: href.into(),
            etag,
            data: data.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.data
    }
}

/// Parsed view of one RawRecord's event component.
///
/// Ephemeral: built fresh from records at the start of each pass and
/// discarded at the end. Nothing is cached across passes.
#[derive(Debug, Clone)]
pub struct EventInstance {
    /// Stable identity shared by all instances of a series or singleton.
    pub uid: String,
    /// Which occurrence of a series this instance represents; absent for
    /// non-recurring events.
    pub recurrence_id: Option<InstanceTime>,
    pub start: InstanceTime,
    /// May be empty.
    pub summary: String,
    /// Revision counter, 0 when absent or unparseable.
    pub sequence: u32,
    /// The originating record, kept so the instance can be deleted or
    /// re-persisted verbatim.
    pub raw: RawRecord,
}

impl EventInstance {
    pub fn trimmed_summary(&self) -> &str {
        self.summary.trim()
    }
}

/// A point in time as it appears in a calendar record.
///
/// Equality is exact: a floating time never equals a UTC time at the same
/// wall-clock instant, matching how the values round-trip through the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InstanceTime {
    Utc(DateTime<Utc>),
    Floating(NaiveDateTime),
    Zoned { datetime: NaiveDateTime, tzid: String },
    Date(NaiveDate),
}

impl fmt::Display for InstanceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceTime::Utc(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            InstanceTime::Floating(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            InstanceTime::Zoned { datetime, tzid } => {
                write!(f, "{} {}", datetime.format("%Y-%m-%dT%H:%M:%S"), tzid)
            }
            InstanceTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}
