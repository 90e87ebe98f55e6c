//! ICS record parsing using the icalendar crate's parser.
//!
//! Only the fields the reconciler matches on are parsed out; the payload
//! itself is re-persisted verbatim and never rewritten.

use icalendar::{
    DatePerhapsTime,
    parser::{read_calendar, unfold},
};

use crate::error::{SyncError, SyncResult};
use crate::instance::{EventInstance, InstanceTime, RawRecord};

/// Parse a record's first (and in this domain only) VEVENT into an
/// [`EventInstance`]. The record is consumed and carried inside the
/// returned instance.
pub fn parse_instance(record: RawRecord) -> SyncResult<EventInstance> {
    let unfolded = unfold(record.text());
    let calendar = read_calendar(&unfolded)
        .map_err(|e| SyncError::MalformedRecord(format!("{}: {}", record.href, e)))?;

    let vevent = calendar
        .components
        .iter()
        .find(|c| c.name == "VEVENT")
        .ok_or_else(|| malformed(&record, "no VEVENT component"))?;

    let uid = vevent
        .find_prop("UID")
        .map(|p| p.val.to_string())
        .unwrap_or_default();
    if uid.trim().is_empty() {
        return Err(malformed(&record, "missing UID"));
    }

    let start_prop = vevent
        .find_prop("DTSTART")
        .ok_or_else(|| malformed(&record, "missing DTSTART"))?;
    let start = DatePerhapsTime::try_from(start_prop)
        .ok()
        .map(to_instance_time)
        .ok_or_else(|| malformed(&record, "unparseable DTSTART"))?;

    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_default();

    // An unreadable RECURRENCE-ID demotes the instance to plain matching
    // rather than failing the whole record.
    let recurrence_id = vevent
        .find_prop("RECURRENCE-ID")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_instance_time);

    let sequence = vevent
        .find_prop("SEQUENCE")
        .and_then(|p| p.val.as_ref().parse().ok())
        .unwrap_or(0);

    Ok(EventInstance {
        uid,
        recurrence_id,
        start,
        summary,
        sequence,
        raw: record,
    })
}

fn malformed(record: &RawRecord, reason: &str) -> SyncError {
    SyncError::MalformedRecord(format!("{}: {}", record.href, reason))
}

/// Convert icalendar's DatePerhapsTime to our InstanceTime, preserving
/// timezone info.
fn to_instance_time(dpt: DatePerhapsTime) -> InstanceTime {
    match dpt {
        DatePerhapsTime::Date(d) => InstanceTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            icalendar::CalendarDateTime::Utc(dt) => InstanceTime::Utc(dt),
            icalendar::CalendarDateTime::Floating(naive) => InstanceTime::Floating(naive),
            icalendar::CalendarDateTime::WithTimezone { date_time, tzid } => InstanceTime::Zoned {
                datetime: date_time,
                tzid,
            },
        },
    }
}
