//! Grouping records by UID.

use std::collections::HashMap;

use tracing::debug;

use crate::instance::{EventInstance, RawRecord};
use crate::parse::parse_instance;

/// Instances of one collection snapshot, keyed by UID. Rebuilt from scratch
/// every pass; the live collections are the only source of truth.
pub type InstanceGroups = HashMap<String, Vec<EventInstance>>;

/// Parse each record and group the resulting instances by UID.
///
/// Records that fail to parse (malformed payload, missing UID or DTSTART)
/// are dropped without failing the pass.
pub fn group_by_uid(records: Vec<RawRecord>) -> InstanceGroups {
    let mut grouped: InstanceGroups = HashMap::new();
    for record in records {
        match parse_instance(record) {
            Ok(instance) => grouped.entry(instance.uid.clone()).or_default().push(instance),
            Err(e) => debug!("Skipping record: {}", e),
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(href: &str, data: &str) -> RawRecord {
        RawRecord::new(href, None, data)
    }

    fn vevent(uid: &str, summary: &str, dtstart: &str) -> String {
        format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\nBEGIN:VEVENT\r\n\
             UID:{uid}\r\nSUMMARY:{summary}\r\nDTSTART:{dtstart}\r\n\
             END:VEVENT\r\nEND:VCALENDAR"
        )
    }

    #[test]
    fn groups_series_instances_under_one_uid() {
        let records = vec![
            record("/cal/a1.ics", &vevent("series", "Weekly", "20240601T100000Z")),
            record("/cal/a2.ics", &vevent("series", "Weekly", "20240608T100000Z")),
            record("/cal/b.ics", &vevent("single", "One-off", "20240603T120000Z")),
        ];

        let groups = group_by_uid(records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["series"].len(), 2);
        assert_eq!(groups["single"].len(), 1);
    }

    #[test]
    fn unparseable_records_are_dropped_silently() {
        let records = vec![
            record("/cal/ok.ics", &vevent("keep", "Kept", "20240601T100000Z")),
            record("/cal/garbage.ics", "definitely not ics"),
            record(
                "/cal/no-uid.ics",
                "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\nBEGIN:VEVENT\r\n\
                 SUMMARY:Anonymous\r\nDTSTART:20240601T100000Z\r\n\
                 END:VEVENT\r\nEND:VCALENDAR",
            ),
        ];

        let groups = group_by_uid(records);
        assert_eq!(groups.len(), 1);
        assert!(groups.contains_key("keep"));
    }
}
