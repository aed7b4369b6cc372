use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cryptolab_limiter::{
    AttemptAction, AttemptGate, AttemptLimiter, AttemptTransport, Identity, KeyValueStore,
    LimiterConfig, LimiterError, LocalAttemptLimiter, ManualClock, MemoryStore,
    RemoteAttemptLimiter, RemoteAttemptResponse, TransactionalCounter, TransportError,
};

const T0: i64 = 1_700_000_000_000;

fn setup(config: LimiterConfig) -> (Arc<TransactionalCounter>, Arc<MemoryStore>, AttemptGate) {
    let clock = Arc::new(ManualClock::new(T0));
    let counter = Arc::new(TransactionalCounter::with_clock(config.clone(), clock.clone()));
    counter.register_token("token-a", "alice");
    counter.register_token("token-b", "bob");
    let store = Arc::new(MemoryStore::new());
    let local = LocalAttemptLimiter::with_clock(store.clone(), config.clone(), clock.clone());
    let remote = RemoteAttemptLimiter::with_clock(counter.clone(), config, clock);
    (counter, store, AttemptGate::with_remote(local, remote))
}

struct SlowTransport {
    calls: AtomicUsize,
}

#[async_trait]
impl AttemptTransport for SlowTransport {
    async fn call(
        &self,
        _action: AttemptAction,
        _token: &str,
        _timeout_ms: u64,
    ) -> Result<RemoteAttemptResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(RemoteAttemptResponse {
            ok: true,
            allowed: true,
            ..Default::default()
        })
    }
}

struct DownTransport;

#[async_trait]
impl AttemptTransport for DownTransport {
    async fn call(
        &self,
        _action: AttemptAction,
        _token: &str,
        _timeout_ms: u64,
    ) -> Result<RemoteAttemptResponse, TransportError> {
        Err(TransportError::new("connection refused"))
    }
}

#[tokio::test]
async fn authenticated_users_are_counted_remotely_only() {
    let (counter, store, gate) = setup(LimiterConfig::default());
    let alice = Identity::user("alice", "token-a");

    let status = gate.check_or_increment(&alice).await.unwrap();
    assert_eq!(status.remaining, Some(4));
    assert_eq!(counter.record("alice").unwrap().count, 1);
    assert!(store.is_empty(), "remote identities must not touch the local store");
}

#[tokio::test]
async fn anonymous_users_are_counted_locally() {
    let (counter, store, gate) = setup(LimiterConfig::default());
    gate.check_or_increment(&Identity::Anonymous).await.unwrap();
    assert!(store.get("attempts_anonymous").unwrap().is_some());
    assert!(counter.record("alice").is_none());
}

#[tokio::test]
async fn five_failures_block_only_that_identity() {
    let (_, _, gate) = setup(LimiterConfig::default());
    let alice = Identity::user("alice", "token-a");
    let bob = Identity::user("bob", "token-b");

    for _ in 0..5 {
        gate.check_or_increment(&alice).await.unwrap();
    }
    match gate.check_or_increment(&alice).await {
        Err(LimiterError::AttemptsExhausted { retry_after }) => {
            assert_eq!(retry_after, T0 + 86_400_000)
        }
        other => panic!("expected AttemptsExhausted, got {other:?}"),
    }
    assert!(gate.check_or_increment(&bob).await.unwrap().allowed);
    assert!(gate.check_or_increment(&Identity::Anonymous).await.unwrap().allowed);
}

#[tokio::test]
async fn success_reset_reopens_the_window() {
    let (counter, _, gate) = setup(LimiterConfig::default());
    let alice = Identity::user("alice", "token-a");
    for _ in 0..4 {
        gate.check_or_increment(&alice).await.unwrap();
    }
    gate.reset(&alice).await.unwrap();
    assert_eq!(counter.record("alice").unwrap().count, 0);
    assert_eq!(gate.check_only(&alice).await.unwrap().remaining, Some(5));
}

#[tokio::test]
async fn check_only_is_side_effect_free() {
    let (counter, _, gate) = setup(LimiterConfig::default());
    let alice = Identity::user("alice", "token-a");
    gate.check_or_increment(&alice).await.unwrap();
    for _ in 0..10 {
        assert_eq!(gate.check_only(&alice).await.unwrap().remaining, Some(4));
    }
    assert_eq!(counter.record("alice").unwrap().count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tries_never_exceed_the_limit() {
    let (counter, _, gate) = setup(LimiterConfig::default());
    let gate = Arc::new(gate);

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let gate = gate.clone();
            tokio::spawn(async move {
                let alice = Identity::user("alice", "token-a");
                gate.check_or_increment(&alice).await.is_ok()
            })
        })
        .collect();

    let mut allowed = 0;
    for handle in handles {
        if handle.await.unwrap() {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 5);
    assert_eq!(counter.record("alice").unwrap().count, 5);
}

#[tokio::test]
async fn unlimited_identity_bypasses_limit() {
    let (counter, _, gate) = setup(LimiterConfig::default());
    counter.grant_unlimited("alice");
    let alice = Identity::user("alice", "token-a");
    for _ in 0..8 {
        let status = gate.check_or_increment(&alice).await.unwrap();
        assert!(status.unlimited);
        assert_eq!(status.remaining, None);
    }
}

#[tokio::test]
async fn rejected_token_is_not_authenticated() {
    let (_, _, gate) = setup(LimiterConfig::default());
    let mallory = Identity::user("mallory", "forged");
    assert!(matches!(
        gate.check_or_increment(&mallory).await,
        Err(LimiterError::NotAuthenticated(_))
    ));
    let no_token = Identity::user("alice", "");
    assert!(matches!(
        gate.check_or_increment(&no_token).await,
        Err(LimiterError::NotAuthenticated(_))
    ));
}

#[tokio::test]
async fn timeout_fails_closed() {
    let config = LimiterConfig {
        remote_timeout_ms: 20,
        ..LimiterConfig::default()
    };
    let transport = Arc::new(SlowTransport {
        calls: AtomicUsize::new(0),
    });
    let remote = RemoteAttemptLimiter::new(transport.clone(), config);
    let alice = Identity::user("alice", "token-a");

    let err = remote.check_or_increment(&alice).await.unwrap_err();
    assert!(matches!(err, LimiterError::Unavailable(_)));
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_counter_fails_closed_by_default() {
    let store = Arc::new(MemoryStore::new());
    let local = LocalAttemptLimiter::new(store.clone(), LimiterConfig::default());
    let remote = RemoteAttemptLimiter::new(Arc::new(DownTransport), LimiterConfig::default());
    let gate = AttemptGate::with_remote(local, remote);

    let alice = Identity::user("alice", "token-a");
    assert!(matches!(
        gate.check_or_increment(&alice).await,
        Err(LimiterError::Unavailable(_))
    ));
    assert!(store.is_empty());
}

#[tokio::test]
async fn fail_open_falls_back_to_local_counter() {
    let config = LimiterConfig {
        fail_open_to_local: true,
        ..LimiterConfig::default()
    };
    let store = Arc::new(MemoryStore::new());
    let local = LocalAttemptLimiter::new(store.clone(), config.clone());
    let remote = RemoteAttemptLimiter::new(Arc::new(DownTransport), config);
    let gate = AttemptGate::with_remote(local, remote);

    let alice = Identity::user("alice", "token-a");
    for _ in 0..5 {
        gate.check_or_increment(&alice).await.unwrap();
    }
    assert!(matches!(
        gate.check_or_increment(&alice).await,
        Err(LimiterError::AttemptsExhausted { .. })
    ));
    assert!(store.get("attempts_alice").unwrap().is_some());
}

/// Delegates to a counter unless switched off.
struct FlakyCounter {
    counter: Arc<TransactionalCounter>,
    down: AtomicBool,
}

#[async_trait]
impl AttemptTransport for FlakyCounter {
    async fn call(
        &self,
        action: AttemptAction,
        token: &str,
        _timeout_ms: u64,
    ) -> Result<RemoteAttemptResponse, TransportError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(TransportError::new("connection refused"));
        }
        self.counter.handle(action, token)
    }
}

#[tokio::test]
async fn remote_reset_also_clears_fallback_attempts() {
    let config = LimiterConfig {
        fail_open_to_local: true,
        ..LimiterConfig::default()
    };
    let counter = Arc::new(TransactionalCounter::new(config.clone()));
    counter.register_token("token-a", "alice");
    let flaky = Arc::new(FlakyCounter {
        counter: counter.clone(),
        down: AtomicBool::new(true),
    });
    let store = Arc::new(MemoryStore::new());
    let local = LocalAttemptLimiter::new(store.clone(), config.clone());
    let gate = AttemptGate::with_remote(local, RemoteAttemptLimiter::new(flaky.clone(), config));
    let alice = Identity::user("alice", "token-a");

    gate.check_or_increment(&alice).await.unwrap();
    gate.check_or_increment(&alice).await.unwrap();
    assert_eq!(gate.local().peek(&alice).unwrap().remaining, Some(3));

    flaky.down.store(false, Ordering::SeqCst);
    gate.reset(&alice).await.unwrap();
    assert_eq!(gate.local().peek(&alice).unwrap().remaining, Some(5));
    assert!(store.get("attempts_alice").unwrap().is_some());
}

#[tokio::test]
async fn local_only_gate_counts_users_by_uid() {
    let store = Arc::new(MemoryStore::new());
    let gate = AttemptGate::local_only(LocalAttemptLimiter::new(store.clone(), LimiterConfig::default()));
    gate.check_or_increment(&Identity::user("carol", "")).await.unwrap();
    assert!(store.get("attempts_carol").unwrap().is_some());
    assert!(store.get("attempts_anonymous").unwrap().is_none());
}
