use async_trait::async_trait;

use crate::error::LimiterError;
use crate::identity::Identity;
use crate::types::AttemptStatus;

/// Gate in front of every decrypt attempt.
///
/// `check_or_increment` either consumes one attempt or fails with
/// [`LimiterError::AttemptsExhausted`]; `check_only` never changes state;
/// `reset` zeroes the count and keeps the window start.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait AttemptLimiter: Send + Sync {
    async fn check_only(&self, identity: &Identity) -> Result<AttemptStatus, LimiterError>;

    async fn check_or_increment(&self, identity: &Identity) -> Result<AttemptStatus, LimiterError>;

    async fn reset(&self, identity: &Identity) -> Result<(), LimiterError>;
}
