//! In-process implementation of the remote attempt counter.
//!
//! Every action runs its read-check-write under one lock, so concurrent
//! `try` calls for the same identity can never exceed the limit. Used as the
//! authoritative counter in single-process deployments and as the transport
//! behind [`RemoteAttemptLimiter`](crate::remote::RemoteAttemptLimiter) in tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::LimiterConfig;
use crate::record::AttemptRecord;
use crate::remote::{AttemptTransport, RemoteAttemptResponse, TransportError, TransportErrorKind};
use crate::types::AttemptAction;

#[derive(Default)]
struct CounterState {
    /// bearer token → uid
    tokens: HashMap<String, String>,
    /// uid → record
    records: HashMap<String, AttemptRecord>,
    unlimited: HashSet<String>,
}

pub struct TransactionalCounter {
    state: Mutex<CounterState>,
    clock: Arc<dyn Clock>,
    config: LimiterConfig,
}

impl TransactionalCounter {
    pub fn new(config: LimiterConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: LimiterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CounterState::default()),
            clock,
            config,
        }
    }

    pub fn register_token(&self, token: impl Into<String>, uid: impl Into<String>) {
        self.state.lock().tokens.insert(token.into(), uid.into());
    }

    pub fn revoke_token(&self, token: &str) {
        self.state.lock().tokens.remove(token);
    }

    /// Exempt `uid` from the limit (an approved request or a completed checkout).
    pub fn grant_unlimited(&self, uid: impl Into<String>) {
        let uid = uid.into();
        info!(uid = %uid, "unlimited attempts granted");
        self.state.lock().unlimited.insert(uid);
    }

    pub fn revoke_unlimited(&self, uid: &str) {
        self.state.lock().unlimited.remove(uid);
    }

    pub fn record(&self, uid: &str) -> Option<AttemptRecord> {
        self.state.lock().records.get(uid).copied()
    }

    /// Run one action atomically.
    pub fn handle(
        &self,
        action: AttemptAction,
        token: &str,
    ) -> Result<RemoteAttemptResponse, TransportError> {
        let mut state = self.state.lock();
        let uid = state
            .tokens
            .get(token)
            .cloned()
            .ok_or_else(|| TransportError::with_kind("invalid bearer token", TransportErrorKind::Auth))?;

        if state.unlimited.contains(&uid) {
            return Ok(RemoteAttemptResponse {
                ok: true,
                allowed: true,
                unlimited: true,
                ..Default::default()
            });
        }

        let max = self.config.max_attempts;
        let window = self.config.window_ms;
        let now = self.clock.now_ms();
        let stored = state.records.get(&uid).map(|r| r.current(now, window));

        let response = |record: Option<AttemptRecord>, allowed: bool| RemoteAttemptResponse {
            ok: true,
            allowed,
            remaining: Some(record.map_or(max, |r| r.remaining(max))),
            window_reset_at: record.map(|r| r.window_reset_at(window)),
            unlimited: false,
            error: None,
        };

        match action {
            AttemptAction::Check => {
                let allowed = stored.map_or(max > 0, |r| !r.is_blocked(max));
                Ok(response(stored, allowed))
            }
            AttemptAction::Try => {
                let mut record = stored.unwrap_or_else(|| AttemptRecord::fresh(now));
                if record.is_blocked(max) {
                    return Ok(response(Some(record), false));
                }
                record.count += 1;
                state.records.insert(uid.clone(), record);
                debug!(uid = %uid, count = record.count, "attempt counted");
                Ok(response(Some(record), true))
            }
            AttemptAction::Reset => {
                let record = stored.map(|mut r| {
                    r.count = 0;
                    r
                });
                if let Some(record) = record {
                    state.records.insert(uid, record);
                }
                Ok(response(record, true))
            }
        }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl AttemptTransport for TransactionalCounter {
    async fn call(
        &self,
        action: AttemptAction,
        token: &str,
        _timeout_ms: u64,
    ) -> Result<RemoteAttemptResponse, TransportError> {
        self.handle(action, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn counter() -> (TransactionalCounter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let counter = TransactionalCounter::with_clock(LimiterConfig::default(), clock.clone());
        counter.register_token("tok", "u1");
        (counter, clock)
    }

    #[test]
    fn unknown_token_is_auth_error() {
        let (counter, _) = counter();
        let err = counter.handle(AttemptAction::Try, "nope").unwrap_err();
        assert_eq!(err.kind, TransportErrorKind::Auth);
    }

    #[test]
    fn try_counts_up_to_limit() {
        let (counter, _) = counter();
        for expected in (0..5).rev() {
            let r = counter.handle(AttemptAction::Try, "tok").unwrap();
            assert!(r.allowed);
            assert_eq!(r.remaining, Some(expected));
        }
        let r = counter.handle(AttemptAction::Try, "tok").unwrap();
        assert!(r.ok);
        assert!(!r.allowed);
        assert_eq!(r.window_reset_at, Some(86_400_000));
        assert_eq!(counter.record("u1").unwrap().count, 5);
    }

    #[test]
    fn check_does_not_count() {
        let (counter, _) = counter();
        let r = counter.handle(AttemptAction::Check, "tok").unwrap();
        assert_eq!(r.remaining, Some(5));
        assert_eq!(r.window_reset_at, None);
        assert!(counter.record("u1").is_none());
    }

    #[test]
    fn reset_keeps_window_start() {
        let (counter, clock) = counter();
        counter.handle(AttemptAction::Try, "tok").unwrap();
        clock.advance(10);
        counter.handle(AttemptAction::Reset, "tok").unwrap();
        assert_eq!(
            counter.record("u1"),
            Some(AttemptRecord {
                count: 0,
                first_ts: 0
            })
        );
    }

    #[test]
    fn unlimited_identity_is_not_counted() {
        let (counter, _) = counter();
        counter.grant_unlimited("u1");
        for _ in 0..10 {
            let r = counter.handle(AttemptAction::Try, "tok").unwrap();
            assert!(r.allowed && r.unlimited);
        }
        assert!(counter.record("u1").is_none());
        counter.revoke_unlimited("u1");
        assert!(!counter.handle(AttemptAction::Try, "tok").unwrap().unlimited);
    }

    #[test]
    fn expired_window_starts_over() {
        let (counter, clock) = counter();
        for _ in 0..5 {
            counter.handle(AttemptAction::Try, "tok").unwrap();
        }
        clock.advance(86_400_001);
        let r = counter.handle(AttemptAction::Try, "tok").unwrap();
        assert!(r.allowed);
        assert_eq!(r.remaining, Some(4));
    }
}
