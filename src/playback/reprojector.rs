use crate::playback::PlaybackConfig;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// Longest wait a single record can be scheduled for (about 30 years)
const MAX_WAIT: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Maps recorded timestamps onto emission instants for one stream
///
/// Waits are always measured from the `now` handed in at the moment a record
/// is scheduled. Time lost while blocked elsewhere is never paid back, so a
/// slow pass does not accumulate drift.
#[derive(Debug, Clone)]
pub struct TimeReprojector {
    speedup: f64,
    rebase_to_now: bool,
    /// Seconds added to every recorded timestamp in the current pass
    offset_secs: i64,
    last_original: Option<i64>,
}

impl TimeReprojector {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            speedup: config.speedup,
            rebase_to_now: config.rebase_to_now,
            offset_secs: 0,
            last_original: None,
        }
    }

    pub fn offset_secs(&self) -> i64 {
        self.offset_secs
    }

    /// Start a pass at its first record
    ///
    /// `wall_now` is the current Unix time in seconds, used only when rebasing.
    /// The first record is due `grace` after `now`.
    pub fn begin_pass(&mut self, first_ts: i64, wall_now: i64, now: Instant, grace: Duration) -> Instant {
        self.offset_secs = if self.rebase_to_now {
            wall_now.saturating_sub(first_ts)
        } else {
            0
        };
        self.last_original = Some(first_ts);
        now + grace
    }

    /// Schedule the record following the previous one
    ///
    /// Records that go back in time or repeat a timestamp are due at once.
    pub fn next_due(&mut self, ts: i64, now: Instant) -> Instant {
        let delta = self
            .last_original
            .map_or(0, |last| ts.saturating_sub(last))
            .max(0);
        self.last_original = Some(ts);
        let wait = self.scaled(delta);
        now.checked_add(wait).unwrap_or_else(|| now + MAX_WAIT)
    }

    /// Wall-clock time a record is reported with
    pub fn emission_time(&self, ts: i64) -> Option<DateTime<Utc>> {
        let secs = ts.checked_add(self.offset_secs)?;
        DateTime::from_timestamp(secs, 0)
    }

    /// Gap scaled by speedup, capped at [`MAX_WAIT`]
    fn scaled(&self, delta_secs: i64) -> Duration {
        Duration::try_from_secs_f64(delta_secs as f64 / self.speedup)
            .map_or(MAX_WAIT, |wait| wait.min(MAX_WAIT))
    }
}
