use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;
pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 10_000;

/// Attempt policy. Every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LimiterConfig {
    pub max_attempts: u32,
    pub window_ms: i64,
    pub remote_timeout_ms: u64,
    /// Fall back to the local counter when the remote one cannot be reached.
    /// Off by default: an unreachable counter denies the attempt.
    pub fail_open_to_local: bool,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            window_ms: DEFAULT_WINDOW_MS,
            remote_timeout_ms: DEFAULT_REMOTE_TIMEOUT_MS,
            fail_open_to_local: false,
        }
    }
}
