//! Chooses the counter for an identity: signed-in users go to the remote
//! counter when one is configured, everyone else to the local store.

use async_trait::async_trait;
use tracing::warn;

use crate::error::LimiterError;
use crate::identity::Identity;
use crate::limiter::AttemptLimiter;
use crate::local::LocalAttemptLimiter;
use crate::remote::RemoteAttemptLimiter;
use crate::types::AttemptStatus;

pub struct AttemptGate {
    local: LocalAttemptLimiter,
    remote: Option<RemoteAttemptLimiter>,
    fail_open_to_local: bool,
}

impl AttemptGate {
    pub fn local_only(local: LocalAttemptLimiter) -> Self {
        let fail_open_to_local = local.config().fail_open_to_local;
        Self {
            local,
            remote: None,
            fail_open_to_local,
        }
    }

    pub fn with_remote(local: LocalAttemptLimiter, remote: RemoteAttemptLimiter) -> Self {
        let fail_open_to_local = local.config().fail_open_to_local;
        Self {
            local,
            remote: Some(remote),
            fail_open_to_local,
        }
    }

    pub fn local(&self) -> &LocalAttemptLimiter {
        &self.local
    }

    fn remote_for(&self, identity: &Identity) -> Option<&RemoteAttemptLimiter> {
        if identity.is_authenticated() {
            self.remote.as_ref()
        } else {
            None
        }
    }

    /// Whether a remote failure may be answered by the local counter instead.
    fn falls_back(&self, err: &LimiterError) -> bool {
        self.fail_open_to_local && matches!(err, LimiterError::Unavailable(_))
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl AttemptLimiter for AttemptGate {
    async fn check_only(&self, identity: &Identity) -> Result<AttemptStatus, LimiterError> {
        let Some(remote) = self.remote_for(identity) else {
            return self.local.check_only(identity).await;
        };
        match remote.check_only(identity).await {
            Err(e) if self.falls_back(&e) => {
                warn!(error = %e, "remote counter unavailable, using local counter");
                self.local.check_only(identity).await
            }
            other => other,
        }
    }

    async fn check_or_increment(&self, identity: &Identity) -> Result<AttemptStatus, LimiterError> {
        let Some(remote) = self.remote_for(identity) else {
            return self.local.check_or_increment(identity).await;
        };
        match remote.check_or_increment(identity).await {
            Err(e) if self.falls_back(&e) => {
                warn!(error = %e, "remote counter unavailable, using local counter");
                self.local.check_or_increment(identity).await
            }
            other => other,
        }
    }

    async fn reset(&self, identity: &Identity) -> Result<(), LimiterError> {
        let Some(remote) = self.remote_for(identity) else {
            return self.local.reset(identity).await;
        };
        match remote.reset(identity).await {
            Err(e) if self.falls_back(&e) => {
                warn!(error = %e, "remote counter unavailable, resetting local counter");
                self.local.reset(identity).await
            }
            Ok(()) if self.fail_open_to_local => {
                // Attempts taken while the remote counter was down live locally.
                if let Err(e) = self.local.reset(identity).await {
                    warn!(error = %e, "could not reset local fallback counter");
                }
                Ok(())
            }
            other => other,
        }
    }
}
