use serde::{Deserialize, Serialize};

/// Result of consulting a limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttemptStatus {
    pub allowed: bool,
    /// Attempts left in the window; `None` when the identity is unlimited or
    /// the counter did not say.
    pub remaining: Option<u32>,
    /// End of the current window, epoch ms. `None` before the first attempt.
    pub window_reset_at: Option<i64>,
    pub unlimited: bool,
}

impl AttemptStatus {
    pub fn unlimited() -> Self {
        Self {
            allowed: true,
            remaining: None,
            window_reset_at: None,
            unlimited: true,
        }
    }
}

/// Remote counter action, sent as `?action=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptAction {
    /// Report the count without changing it.
    Check,
    /// Check and consume one attempt atomically.
    Try,
    /// Zero the count after a successful decrypt.
    Reset,
}

impl AttemptAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptAction::Check => "check",
            AttemptAction::Try => "try",
            AttemptAction::Reset => "reset",
        }
    }
}
