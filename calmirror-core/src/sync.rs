//! One-directional instance reconciliation.
//!
//! A pass is a single linear pipeline: clean up duplicates in the target,
//! fetch both collections for the active window, group each by UID, create
//! the source instances missing from the target, then delete every target
//! UID group that no longer exists in the source. There are no retries and
//! no intermediate state; a failed create or delete is logged and the pass
//! carries on. Only a failed fetch aborts.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{debug, error, info};

use crate::error::SyncResult;
use crate::group::group_by_uid;
use crate::instance::{EventInstance, InstanceTime};
use crate::store::CalendarStore;
use crate::window::SyncWindow;

/// Counters from one reconciliation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    /// Duplicate instances removed from the target during cleanup.
    pub duplicates_removed: usize,
    /// Source instances created in the target.
    pub created: usize,
    /// Source instances already present in the target.
    pub skipped: usize,
    /// Orphaned target instances deleted from the target.
    pub deleted: usize,
    /// Creates or deletes that failed and were skipped over.
    pub write_failures: usize,
}

impl SyncStats {
    pub fn has_changes(&self) -> bool {
        self.duplicates_removed > 0 || self.created > 0 || self.deleted > 0
    }
}

/// Reconciles the target collection into agreement with the source.
///
/// Matched target instances are never rewritten, even when the source
/// carries a newer SEQUENCE. The pass is additive plus whole-UID deletion,
/// not a field-level merge.
pub struct InstanceSync<S, T> {
    source: S,
    target: T,
}

impl<S: CalendarStore, T: CalendarStore> InstanceSync<S, T> {
    pub fn new(source: S, target: T) -> Self {
        InstanceSync { source, target }
    }

    /// Run one pass over the given window.
    pub async fn run(&self, window: &SyncWindow) -> SyncResult<SyncStats> {
        let mut stats = SyncStats::default();

        stats.duplicates_removed = self.cleanup_duplicates(window).await?;

        let source_records = self.source.fetch_in_window(window).await?;
        let target_records = self.target.fetch_in_window(window).await?;

        let source_by_uid = group_by_uid(source_records);
        let target_by_uid = group_by_uid(target_records);

        for (uid, source_instances) in &source_by_uid {
            let target_instances = target_by_uid.get(uid).map(Vec::as_slice).unwrap_or_default();
            self.reconcile_group(source_instances, target_instances, &mut stats)
                .await;
        }

        for (uid, target_instances) in &target_by_uid {
            if !source_by_uid.contains_key(uid) {
                self.delete_orphans(target_instances, &mut stats).await;
            }
        }

        Ok(stats)
    }

    /// Remove duplicate instances from the target collection.
    ///
    /// Within each UID group, instances are partitioned by trimmed summary
    /// plus start time. The key ignores RECURRENCE-ID, so two distinct
    /// occurrences sharing a summary and instant collapse into one. Exactly
    /// one instance per key survives: the lowest SEQUENCE, first-seen on a
    /// tie.
    async fn cleanup_duplicates(&self, window: &SyncWindow) -> SyncResult<usize> {
        info!("Cleaning up duplicates in '{}'", self.target.name());

        let records = self.target.fetch_in_window(window).await?;
        let groups = group_by_uid(records);

        let mut removed = 0;
        for instances in groups.into_values() {
            let mut survivors: HashMap<(String, InstanceTime), EventInstance> = HashMap::new();
            let mut duplicates = Vec::new();

            for instance in instances {
                let key = (instance.trimmed_summary().to_string(), instance.start.clone());
                match survivors.entry(key) {
                    Entry::Occupied(mut entry) => {
                        if instance.sequence < entry.get().sequence {
                            duplicates.push(entry.insert(instance));
                        } else {
                            duplicates.push(instance);
                        }
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(instance);
                    }
                }
            }

            for duplicate in duplicates {
                info!("Removing duplicate: {} on {}", duplicate.summary, duplicate.start);
                match self.target.delete(&duplicate.raw).await {
                    Ok(()) => removed += 1,
                    Err(e) => error!("Error deleting duplicate {}: {}", duplicate.summary, e),
                }
            }
        }

        Ok(removed)
    }

    /// Create every source instance not already present in the target group.
    /// The source record's payload is persisted verbatim, UID included.
    async fn reconcile_group(
        &self,
        source_instances: &[EventInstance],
        target_instances: &[EventInstance],
        stats: &mut SyncStats,
    ) {
        for candidate in source_instances {
            if instance_exists(candidate, target_instances) {
                debug!("Instance exists: {}", candidate.summary);
                stats.skipped += 1;
                continue;
            }

            info!(
                "Creating instance in '{}': {}",
                self.target.name(),
                candidate.summary
            );
            match self.target.persist(candidate.raw.text()).await {
                Ok(_) => stats.created += 1,
                Err(e) => {
                    error!("Error creating event {}: {}", candidate.summary, e);
                    stats.write_failures += 1;
                }
            }
        }
    }

    /// Delete every instance of a target UID group that the source no
    /// longer contains. Deletion is scoped to whole missing UID groups,
    /// never to individual instances under a UID still present in source.
    async fn delete_orphans(&self, target_instances: &[EventInstance], stats: &mut SyncStats) {
        for instance in target_instances {
            info!("Deleting event no longer in source: {}", instance.summary);
            match self.target.delete(&instance.raw).await {
                Ok(()) => stats.deleted += 1,
                Err(e) => {
                    error!("Error deleting event {}: {}", instance.summary, e);
                    stats.write_failures += 1;
                }
            }
        }
    }
}

/// Whether the candidate already exists among the target instances that
/// share its UID.
///
/// Per target instance: when both sides carry a RECURRENCE-ID, they match
/// iff the identifiers render to the same timestamp string; otherwise they
/// match iff the start times are exactly equal and the trimmed summaries
/// are equal. Two instances with differing RECURRENCE-IDs never fall back
/// to the summary comparison.
fn instance_exists(candidate: &EventInstance, target_instances: &[EventInstance]) -> bool {
    for target in target_instances {
        match (&candidate.recurrence_id, &target.recurrence_id) {
            (Some(candidate_rid), Some(target_rid)) => {
                if candidate_rid.to_string() == target_rid.to_string() {
                    return true;
                }
            }
            _ => {
                if candidate.start == target.start
                    && candidate.trimmed_summary() == target.trimmed_summary()
                {
                    return true;
                }
            }
        }
    }
    false
}
