//! Client for the remote transactional attempt counter.
//!
//! Wire contract: `POST /checkAttempt?action={check|try|reset}` with the
//! identity's bearer token, answering `{ok, allowed, remaining, windowResetAt}`
//! plus `unlimited` for identities granted unlimited attempts. The HTTP layer
//! itself lives behind [`AttemptTransport`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::LimiterConfig;
use crate::error::LimiterError;
use crate::identity::Identity;
use crate::limiter::AttemptLimiter;
use crate::types::{AttemptAction, AttemptStatus};

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteAttemptResponse {
    pub ok: bool,
    pub allowed: bool,
    pub remaining: Option<u32>,
    pub window_reset_at: Option<i64>,
    pub unlimited: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Network failure or non-2xx response.
    Network,
    /// The token was rejected.
    Auth,
    /// The call did not finish within the configured timeout.
    Timeout,
    /// The response could not be understood.
    Protocol,
}

#[derive(Debug, Clone)]
pub struct TransportError {
    pub message: String,
    pub kind: TransportErrorKind,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: TransportErrorKind::Network,
        }
    }

    pub fn with_kind(message: impl Into<String>, kind: TransportErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for LimiterError {
    fn from(e: TransportError) -> Self {
        match e.kind {
            TransportErrorKind::Auth => LimiterError::NotAuthenticated(e.message),
            _ => LimiterError::Unavailable(e.message),
        }
    }
}

// ============================================================================
// AttemptTransport: user-provided network layer
// ============================================================================

/// Performs one counter call. `timeout_ms` is advisory for transports that
/// can abort their own requests; native builds also enforce it here.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait AttemptTransport: Send + Sync {
    async fn call(
        &self,
        action: AttemptAction,
        token: &str,
        timeout_ms: u64,
    ) -> Result<RemoteAttemptResponse, TransportError>;
}

// ============================================================================
// RemoteAttemptLimiter
// ============================================================================

pub struct RemoteAttemptLimiter {
    transport: Arc<dyn AttemptTransport>,
    clock: Arc<dyn Clock>,
    config: LimiterConfig,
}

impl RemoteAttemptLimiter {
    pub fn new(transport: Arc<dyn AttemptTransport>, config: LimiterConfig) -> Self {
        Self::with_clock(transport, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        transport: Arc<dyn AttemptTransport>,
        config: LimiterConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            clock,
            config,
        }
    }

    async fn call(
        &self,
        action: AttemptAction,
        identity: &Identity,
    ) -> Result<RemoteAttemptResponse, LimiterError> {
        let token = identity.token().ok_or_else(|| {
            LimiterError::NotAuthenticated("remote attempt counter needs a bearer token".into())
        })?;
        let timeout_ms = self.config.remote_timeout_ms;
        let response = with_timeout(timeout_ms, self.transport.call(action, token, timeout_ms)).await?;

        if !response.ok {
            let message = response
                .error
                .unwrap_or_else(|| format!("counter rejected action {}", action.as_str()));
            warn!(action = action.as_str(), error = %message, "remote attempt counter error");
            return Err(LimiterError::Unavailable(message));
        }
        Ok(response)
    }

    fn status(&self, response: &RemoteAttemptResponse) -> AttemptStatus {
        if response.unlimited {
            return AttemptStatus::unlimited();
        }
        AttemptStatus {
            allowed: response.allowed,
            remaining: response.remaining,
            window_reset_at: response.window_reset_at,
            unlimited: false,
        }
    }
}

fn timed_out(timeout_ms: u64) -> LimiterError {
    warn!(timeout_ms, "remote attempt counter timed out");
    LimiterError::Unavailable(format!("no answer within {timeout_ms} ms"))
}

#[cfg(not(target_arch = "wasm32"))]
async fn with_timeout<F>(timeout_ms: u64, fut: F) -> Result<RemoteAttemptResponse, LimiterError>
where
    F: std::future::Future<Output = Result<RemoteAttemptResponse, TransportError>>,
{
    match tokio::time::timeout(std::time::Duration::from_millis(timeout_ms), fut).await {
        Ok(result) => result.map_err(LimiterError::from),
        Err(_) => Err(timed_out(timeout_ms)),
    }
}

#[cfg(target_arch = "wasm32")]
async fn with_timeout<F>(timeout_ms: u64, fut: F) -> Result<RemoteAttemptResponse, LimiterError>
where
    F: std::future::Future<Output = Result<RemoteAttemptResponse, TransportError>>,
{
    use futures::future::{select, Either};

    let timer = sleep_ms(timeout_ms);
    futures::pin_mut!(fut, timer);
    match select(fut, timer).await {
        Either::Left((result, _)) => result.map_err(LimiterError::from),
        Either::Right(((), _)) => Err(timed_out(timeout_ms)),
    }
}

/// Async sleep using `setTimeout`, which also exists in workers (no `window`).
/// Never resolves if `setTimeout` is unavailable, leaving the call untimed.
#[cfg(target_arch = "wasm32")]
async fn sleep_ms(ms: u64) {
    use wasm_bindgen::{JsCast, JsValue};

    let delay = i32::try_from(ms).unwrap_or(i32::MAX);
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        let global = js_sys::global();
        if let Ok(set_timeout) = js_sys::Reflect::get(&global, &JsValue::from_str("setTimeout")) {
            if let Ok(f) = set_timeout.dyn_into::<js_sys::Function>() {
                let _ = f.call2(&JsValue::NULL, &resolve, &JsValue::from(delay));
            }
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl AttemptLimiter for RemoteAttemptLimiter {
    async fn check_only(&self, identity: &Identity) -> Result<AttemptStatus, LimiterError> {
        let response = self.call(AttemptAction::Check, identity).await?;
        Ok(self.status(&response))
    }

    async fn check_or_increment(&self, identity: &Identity) -> Result<AttemptStatus, LimiterError> {
        let response = self.call(AttemptAction::Try, identity).await?;
        let status = self.status(&response);
        if !status.allowed {
            let retry_after = response
                .window_reset_at
                .unwrap_or_else(|| self.clock.now_ms() + self.config.window_ms);
            warn!(key = %identity.storage_key(), retry_after, "decrypt attempt denied by remote counter");
            return Err(LimiterError::AttemptsExhausted { retry_after });
        }
        debug!(key = %identity.storage_key(), remaining = ?status.remaining, "remote attempt consumed");
        Ok(status)
    }

    async fn reset(&self, identity: &Identity) -> Result<(), LimiterError> {
        self.call(AttemptAction::Reset, identity).await?;
        debug!(key = %identity.storage_key(), "remote attempt count reset");
        Ok(())
    }
}
