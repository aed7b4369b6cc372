//! WASM bindings for the attempt limiter.
//!
//! `JsAttemptTransport` forwards counter calls to a JS object (usually a
//! `fetch` wrapper around `/checkAttempt`), and `BrowserStorage` keeps
//! anonymous attempt records in `localStorage`.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use cryptolab_limiter::{KeyValueStore, LimiterError, TransportError, TransportErrorKind};

// ============================================================================
// JS extern transport type
// ============================================================================

#[wasm_bindgen]
extern "C" {
    /// JavaScript attempt counter client. `call` resolves to the counter's
    /// JSON answer and rejects on network or HTTP failure; a rejection
    /// carrying `status` 401/403 is treated as an authentication failure.
    pub type AttemptCounterClient;

    #[wasm_bindgen(method, catch)]
    async fn call(
        this: &AttemptCounterClient,
        action: &str,
        token: &str,
        timeout_ms: f64,
    ) -> Result<JsValue, JsValue>;
}

// ============================================================================
// JsAttemptTransport wrapper
// ============================================================================

/// Wraps a JS counter client and implements `AttemptTransport`.
#[allow(dead_code)]
pub struct JsAttemptTransport {
    inner: AttemptCounterClient,
}

// SAFETY: WASM is single-threaded.
unsafe impl Send for JsAttemptTransport {}
unsafe impl Sync for JsAttemptTransport {}

impl JsAttemptTransport {
    pub fn new(client: AttemptCounterClient) -> Self {
        Self { inner: client }
    }
}

fn error_message(e: &JsValue) -> String {
    if let Some(s) = e.as_string() {
        s
    } else if let Some(err) = e.dyn_ref::<js_sys::Error>() {
        String::from(err.message())
    } else {
        format!("{e:?}")
    }
}

#[allow(dead_code)]
fn transport_err(e: JsValue) -> TransportError {
    let status = js_sys::Reflect::get(&e, &JsValue::from_str("status"))
        .ok()
        .and_then(|v| v.as_f64());
    let name = e
        .dyn_ref::<js_sys::Error>()
        .map(|err| String::from(err.name()))
        .unwrap_or_default();
    let kind = match (status, name.as_str()) {
        (Some(s), _) if s == 401.0 || s == 403.0 => TransportErrorKind::Auth,
        (_, "AbortError" | "TimeoutError") => TransportErrorKind::Timeout,
        _ => TransportErrorKind::Network,
    };
    TransportError::with_kind(error_message(&e), kind)
}

#[cfg(target_arch = "wasm32")]
#[async_trait::async_trait(?Send)]
impl cryptolab_limiter::AttemptTransport for JsAttemptTransport {
    async fn call(
        &self,
        action: cryptolab_limiter::AttemptAction,
        token: &str,
        timeout_ms: u64,
    ) -> Result<cryptolab_limiter::RemoteAttemptResponse, TransportError> {
        let result = self
            .inner
            .call(action.as_str(), token, timeout_ms as f64)
            .await
            .map_err(transport_err)?;
        serde_wasm_bindgen::from_value(result).map_err(|e| {
            TransportError::with_kind(
                format!("Failed to parse counter response: {e}"),
                TransportErrorKind::Protocol,
            )
        })
    }
}

// ============================================================================
// localStorage-backed store
// ============================================================================

pub struct BrowserStorage {
    storage: web_sys::Storage,
}

// SAFETY: WASM is single-threaded.
unsafe impl Send for BrowserStorage {}
unsafe impl Sync for BrowserStorage {}

impl BrowserStorage {
    /// The window's `localStorage`, if the page may use it.
    pub fn local() -> Result<Self, LimiterError> {
        let window =
            web_sys::window().ok_or_else(|| LimiterError::Storage("no window object".into()))?;
        let storage = window
            .local_storage()
            .map_err(storage_err)?
            .ok_or_else(|| LimiterError::Storage("localStorage is not available".into()))?;
        Ok(Self { storage })
    }
}

fn storage_err(e: JsValue) -> LimiterError {
    LimiterError::Storage(error_message(&e))
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, LimiterError> {
        self.storage.get_item(key).map_err(storage_err)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LimiterError> {
        self.storage.set_item(key, value).map_err(storage_err)
    }

    fn remove(&self, key: &str) -> Result<(), LimiterError> {
        self.storage.remove_item(key).map_err(storage_err)
    }
}
