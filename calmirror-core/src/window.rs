//! Time window for fetching events.

use chrono::{DateTime, Duration, Utc};

/// Days of history included in every pass.
pub const WINDOW_PAST_DAYS: i64 = 30;
/// Days of future events included in every pass.
pub const WINDOW_FUTURE_DAYS: i64 = 90;

/// Half-open UTC window `[start, end)` that both collections are fetched
/// over. Computed once per pass.
#[derive(Debug, Clone)]
pub struct SyncWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SyncWindow {
    /// The standard window: 30 days back, 90 days forward.
    pub fn around_now() -> Self {
        Self::around(Utc::now())
    }

    pub fn around(now: DateTime<Utc>) -> Self {
        SyncWindow {
            start: now - Duration::days(WINDOW_PAST_DAYS),
            end: now + Duration::days(WINDOW_FUTURE_DAYS),
        }
    }
}

impl Default for SyncWindow {
    fn default() -> Self {
        Self::around_now()
    }
}
