//! Attempt counter persisted in a local key-value store.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::LimiterConfig;
use crate::error::LimiterError;
use crate::identity::Identity;
use crate::limiter::AttemptLimiter;
use crate::record::AttemptRecord;
use crate::store::KeyValueStore;
use crate::types::AttemptStatus;

pub struct LocalAttemptLimiter {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: LimiterConfig,
    /// Serializes read-check-write on the store.
    guard: Mutex<()>,
}

impl LocalAttemptLimiter {
    pub fn new(store: Arc<dyn KeyValueStore>, config: LimiterConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn KeyValueStore>, config: LimiterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            config,
            guard: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    /// Stored record, or `None` when nothing has been written for this key.
    /// An unreadable record, or one whose window starts in the future, is
    /// discarded.
    fn stored(&self, key: &str, now: i64) -> Result<Option<AttemptRecord>, LimiterError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str::<AttemptRecord>(&raw) {
            Ok(record) if record.is_plausible(now) => Ok(Some(record)),
            Ok(record) => {
                warn!(key, first_ts = record.first_ts, "discarding attempt record with impossible window start");
                Ok(None)
            }
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable attempt record");
                Ok(None)
            }
        }
    }

    fn save(&self, key: &str, record: &AttemptRecord) -> Result<(), LimiterError> {
        self.store.set(key, &serde_json::to_string(record)?)
    }

    fn status(&self, record: Option<AttemptRecord>) -> AttemptStatus {
        let max = self.config.max_attempts;
        match record {
            Some(record) => AttemptStatus {
                allowed: !record.is_blocked(max),
                remaining: Some(record.remaining(max)),
                window_reset_at: Some(record.window_reset_at(self.config.window_ms)),
                unlimited: false,
            },
            None => AttemptStatus {
                allowed: max > 0,
                remaining: Some(max),
                window_reset_at: None,
                unlimited: false,
            },
        }
    }

    pub fn peek(&self, identity: &Identity) -> Result<AttemptStatus, LimiterError> {
        let now = self.clock.now_ms();
        let record = self
            .stored(&identity.storage_key(), now)?
            .map(|r| r.current(now, self.config.window_ms));
        Ok(self.status(record))
    }

    pub fn consume(&self, identity: &Identity) -> Result<AttemptStatus, LimiterError> {
        let key = identity.storage_key();
        let _guard = self.guard.lock();
        let now = self.clock.now_ms();
        let mut record = self
            .stored(&key, now)?
            .unwrap_or_else(|| AttemptRecord::fresh(now))
            .current(now, self.config.window_ms);

        if record.is_blocked(self.config.max_attempts) {
            let retry_after = record.window_reset_at(self.config.window_ms);
            warn!(key = %key, retry_after, "decrypt attempt denied");
            return Err(LimiterError::AttemptsExhausted { retry_after });
        }

        record.count += 1;
        self.save(&key, &record)?;
        debug!(key = %key, count = record.count, "decrypt attempt consumed");
        Ok(self.status(Some(record)))
    }

    pub fn clear(&self, identity: &Identity) -> Result<(), LimiterError> {
        let key = identity.storage_key();
        let _guard = self.guard.lock();
        if let Some(mut record) = self.stored(&key, self.clock.now_ms())? {
            record.count = 0;
            self.save(&key, &record)?;
            debug!(key = %key, "attempt count reset");
        }
        Ok(())
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl AttemptLimiter for LocalAttemptLimiter {
    async fn check_only(&self, identity: &Identity) -> Result<AttemptStatus, LimiterError> {
        self.peek(identity)
    }

    async fn check_or_increment(&self, identity: &Identity) -> Result<AttemptStatus, LimiterError> {
        self.consume(identity)
    }

    async fn reset(&self, identity: &Identity) -> Result<(), LimiterError> {
        self.clear(identity)
    }
}
