use serde::{Deserialize, Serialize};

/// Persisted counter for one identity, stored as `{"count":n,"firstTs":ms}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub count: u32,
    /// Start of the current window, epoch ms.
    pub first_ts: i64,
}

impl AttemptRecord {
    pub fn fresh(now_ms: i64) -> Self {
        Self {
            count: 0,
            first_ts: now_ms,
        }
    }

    /// The record as seen at `now_ms`. An expired window reads as fresh;
    /// nothing is written until the next attempt.
    pub fn current(self, now_ms: i64, window_ms: i64) -> Self {
        if now_ms.saturating_sub(self.first_ts) > window_ms {
            Self::fresh(now_ms)
        } else {
            self
        }
    }

    pub fn window_reset_at(&self, window_ms: i64) -> i64 {
        self.first_ts.saturating_add(window_ms)
    }

    /// A window that starts after `now_ms` cannot have been written by us.
    pub fn is_plausible(&self, now_ms: i64) -> bool {
        (0..=now_ms).contains(&self.first_ts)
    }

    pub fn remaining(&self, max_attempts: u32) -> u32 {
        max_attempts.saturating_sub(self.count)
    }

    pub fn is_blocked(&self, max_attempts: u32) -> bool {
        self.count >= max_attempts
    }
}
