//! `ImageCryptoLab`: the session-level API the page drives.
//!
//! One instance per tab. Decryption is async because the attempt limiter may
//! call the remote counter; everything else is synchronous.

use std::rc::Rc;
use std::sync::Arc;

use js_sys::{Object, Promise, Reflect, Uint8Array};
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use zeroize::Zeroize;

use cryptolab_core::{CryptoLab, DecryptionOutcome, LabConfig};
use cryptolab_crypto::{CipherParameters, CiphertextEncoding, EnvelopeFormat};
use cryptolab_limiter::{AttemptGate, Identity, KeyValueStore, LocalAttemptLimiter, MemoryStore};

use crate::error::{from_js_or_default, to_js_error, to_js_value};
use crate::limiter::{AttemptCounterClient, BrowserStorage};

#[wasm_bindgen]
pub struct ImageCryptoLab {
    inner: Rc<CryptoLab<AttemptGate>>,
}

fn optional_encoding(value: JsValue) -> Result<Option<CiphertextEncoding>, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    serde_wasm_bindgen::from_value(value).map(Some).map_err(to_js_error)
}

/// Outcome as a plain object, with the plaintext as a `Uint8Array`.
fn outcome_to_js(mut outcome: DecryptionOutcome) -> Result<JsValue, JsValue> {
    let plaintext = outcome.plaintext.take();
    let obj = to_js_value(&outcome)?;
    if let Some(mut bytes) = plaintext {
        Reflect::set(&obj, &JsValue::from_str("plaintext"), &Uint8Array::from(&bytes[..]))?;
        bytes.zeroize();
    }
    Ok(obj)
}

#[wasm_bindgen]
impl ImageCryptoLab {
    /// `config` is a `LabConfig` object (or undefined for defaults).
    /// Without a `counter` every identity is limited through localStorage.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config: JsValue,
        counter: Option<AttemptCounterClient>,
    ) -> Result<ImageCryptoLab, JsValue> {
        let config: LabConfig = from_js_or_default(config)?;
        let store: Arc<dyn KeyValueStore> = match BrowserStorage::local() {
            Ok(storage) => Arc::new(storage),
            Err(e) => {
                warn!(error = %e, "localStorage unavailable, attempts kept in memory");
                Arc::new(MemoryStore::new())
            }
        };
        let local = LocalAttemptLimiter::new(store, config.limiter.clone());
        let gate = match counter {
            #[cfg(target_arch = "wasm32")]
            Some(client) => {
                let transport = Arc::new(crate::limiter::JsAttemptTransport::new(client));
                let remote =
                    cryptolab_limiter::RemoteAttemptLimiter::new(transport, config.limiter.clone());
                AttemptGate::with_remote(local, remote)
            }
            _ => AttemptGate::local_only(local),
        };
        Ok(Self {
            inner: Rc::new(CryptoLab::new(gate, config)),
        })
    }

    #[wasm_bindgen(js_name = "isBusy")]
    pub fn is_busy(&self) -> bool {
        self.inner.is_busy()
    }

    // --- Session ---

    #[wasm_bindgen(js_name = "loadImage")]
    pub fn load_image(&self, name: &str, bytes: Vec<u8>) -> Result<JsValue, JsValue> {
        let info = self.inner.load_image(name, bytes).map_err(to_js_error)?;
        to_js_value(&info)
    }

    #[wasm_bindgen(js_name = "currentImage")]
    pub fn current_image(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.inner.current_image().map(|image| image.info()))
    }

    /// `{ bytes, mime, fileName }` of the last successful decryption, or null.
    #[wasm_bindgen(js_name = "decryptedImage")]
    pub fn decrypted_image(&self) -> Result<JsValue, JsValue> {
        let Some(mut image) = self.inner.decrypted_image() else {
            return Ok(JsValue::NULL);
        };
        let out = Object::new();
        Reflect::set(&out, &"bytes".into(), &Uint8Array::from(&image.bytes[..]))?;
        Reflect::set(&out, &"mime".into(), &JsValue::from_str(&image.mime))?;
        Reflect::set(&out, &"fileName".into(), &JsValue::from_str(&image.file_name()))?;
        image.bytes.zeroize();
        Ok(out.into())
    }

    #[wasm_bindgen(js_name = "promoteDecrypted")]
    pub fn promote_decrypted(&self) -> Result<JsValue, JsValue> {
        let info = self.inner.promote_decrypted().map_err(to_js_error)?;
        to_js_value(&info)
    }

    pub fn clear(&self) {
        self.inner.clear();
    }

    // --- Encryption ---

    /// Encrypt arbitrary bytes. `format` is `"hex"`, `"base64"` or `"openssl"`.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        passphrase: &str,
        params: JsValue,
        format: JsValue,
    ) -> Result<JsValue, JsValue> {
        let params: CipherParameters = from_js_or_default(params)?;
        let format: EnvelopeFormat = from_js_or_default(format)?;
        let encrypted = self
            .inner
            .encrypt_image(plaintext, passphrase, &params, format)
            .map_err(to_js_error)?;
        to_js_value(&encrypted)
    }

    #[wasm_bindgen(js_name = "encryptCurrent")]
    pub fn encrypt_current(
        &self,
        passphrase: &str,
        params: JsValue,
        format: JsValue,
    ) -> Result<JsValue, JsValue> {
        let params: CipherParameters = from_js_or_default(params)?;
        let format: EnvelopeFormat = from_js_or_default(format)?;
        let encrypted = self
            .inner
            .encrypt_current(passphrase, &params, format)
            .map_err(to_js_error)?;
        to_js_value(&encrypted)
    }

    // --- Decryption ---

    /// Resolves to a `DecryptionOutcome` object; never rejects for
    /// decryption failures, which are reported in the outcome.
    pub fn decrypt(
        &self,
        envelope: String,
        passphrase: String,
        params: JsValue,
        identity: JsValue,
        encoding: JsValue,
    ) -> Result<Promise, JsValue> {
        let params: CipherParameters = from_js_or_default(params)?;
        let identity: Identity = from_js_or_default(identity)?;
        let encoding = optional_encoding(encoding)?;
        let lab = Rc::clone(&self.inner);
        Ok(future_to_promise(async move {
            let outcome = lab
                .decrypt_and_store(&envelope, &passphrase, &params, &identity, encoding)
                .await;
            outcome_to_js(outcome)
        }))
    }

    /// Resolves to `{ allowed, remaining, windowResetAt, unlimited }`.
    #[wasm_bindgen(js_name = "remainingAttempts")]
    pub fn remaining_attempts(&self, identity: JsValue) -> Result<Promise, JsValue> {
        let identity: Identity = from_js_or_default(identity)?;
        let lab = Rc::clone(&self.inner);
        Ok(future_to_promise(async move {
            let status = lab
                .remaining_attempts(&identity)
                .await
                .map_err(to_js_error)?;
            to_js_value(&status)
        }))
    }
}
