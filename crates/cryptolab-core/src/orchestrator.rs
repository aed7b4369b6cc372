//! Encrypt/decrypt entry points. Every decryption is gated by the attempt
//! limiter before any key derivation happens, and every failure is reported
//! as a [`DecryptionOutcome`] value.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use cryptolab_crypto::{
    self as crypto, CipherParameters, CiphertextEncoding, EnvelopeFormat, ParsedEnvelope,
    LEGACY_SALT_SIZE,
};
use cryptolab_limiter::{AttemptLimiter, AttemptStatus, Clock, Identity, SystemClock};

use crate::config::LabConfig;
use crate::error::LabError;
use crate::metadata::EncryptionMetadata;
use crate::mime::detect_mime;
use crate::outcome::{DecryptionOutcome, EncryptedImage};
use crate::session::{DecryptedImage, ImageInfo, LoadedImage, Session};

/// Held for the duration of one encrypt or decrypt.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, LabError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self { flag })
            .map_err(|_| LabError::OperationInProgress)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

fn normalize_passphrase(passphrase: &str) -> Result<&str, LabError> {
    match passphrase.trim() {
        "" => Err(LabError::MissingPassphrase),
        trimmed => Ok(trimmed),
    }
}

/// The salted-token format derives one block of IV, or none for ECB.
fn legacy_iv_len(params: &CipherParameters) -> usize {
    if params.mode.uses_iv() {
        params.algorithm.block_size()
    } else {
        0
    }
}

fn envelope_format(token: &str, parsed: &ParsedEnvelope, hint: Option<CiphertextEncoding>) -> EnvelopeFormat {
    match parsed {
        ParsedEnvelope::Salted(_) => EnvelopeFormat::OpenSsl,
        ParsedEnvelope::Explicit(_) => {
            let body = token.trim().rsplit(':').next().unwrap_or_default();
            let encoding = hint.unwrap_or(if crypto::looks_like_hex(body) {
                CiphertextEncoding::Hex
            } else {
                CiphertextEncoding::Base64
            });
            match encoding {
                CiphertextEncoding::Hex => EnvelopeFormat::Hex,
                CiphertextEncoding::Base64 => EnvelopeFormat::Base64,
            }
        }
    }
}

pub struct CryptoLab<L: AttemptLimiter> {
    limiter: L,
    config: LabConfig,
    clock: Arc<dyn Clock>,
    busy: AtomicBool,
    session: Mutex<Session>,
}

impl<L: AttemptLimiter> CryptoLab<L> {
    pub fn new(limiter: L, config: LabConfig) -> Self {
        Self::with_clock(limiter, config, Arc::new(SystemClock))
    }

    pub fn with_clock(limiter: L, config: LabConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            limiter,
            config,
            clock,
            busy: AtomicBool::new(false),
            session: Mutex::new(Session::new()),
        }
    }

    pub fn limiter(&self) -> &L {
        &self.limiter
    }

    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    // ------------------------------------------------------------------------
    // Encryption
    // ------------------------------------------------------------------------

    /// Encrypt `plaintext` under a fresh random salt and IV.
    pub fn encrypt_image(
        &self,
        plaintext: &[u8],
        passphrase: &str,
        params: &CipherParameters,
        format: EnvelopeFormat,
    ) -> Result<EncryptedImage, LabError> {
        let _busy = BusyGuard::acquire(&self.busy)?;
        self.encrypt_unguarded(plaintext, passphrase, params, format)
    }

    fn encrypt_unguarded(
        &self,
        plaintext: &[u8],
        passphrase: &str,
        params: &CipherParameters,
        format: EnvelopeFormat,
    ) -> Result<EncryptedImage, LabError> {
        let passphrase = normalize_passphrase(passphrase)?;
        params.validate()?;
        if plaintext.is_empty() {
            return Err(LabError::InvalidParameter("image is empty".into()));
        }
        self.config.check_size(plaintext.len())?;

        let (envelope, salt, shown_iv) = match format {
            EnvelopeFormat::OpenSsl => {
                let mut salt = [0u8; LEGACY_SALT_SIZE];
                salt.copy_from_slice(&crypto::random_bytes(LEGACY_SALT_SIZE)?);
                let derived = crypto::derive_legacy_key_and_iv(
                    passphrase,
                    &salt,
                    params.key_size_bytes(),
                    legacy_iv_len(params),
                );
                let ciphertext = crypto::encrypt(plaintext, derived.key(), derived.iv(), params)?;
                // The IV is derived from the passphrase here, so it is not shown.
                (crypto::serialize_salted(&salt, &ciphertext), salt.to_vec(), Vec::new())
            }
            EnvelopeFormat::Hex | EnvelopeFormat::Base64 => {
                let salt = crypto::random_bytes(params.salt_size_bytes)?;
                let iv = crypto::random_bytes(params.effective_iv_size())?;
                let derived = crypto::derive_for_params(passphrase, &salt, params)?;
                let ciphertext = crypto::encrypt(plaintext, derived.key(), &iv, params)?;
                let encoding = match format {
                    EnvelopeFormat::Hex => CiphertextEncoding::Hex,
                    _ => CiphertextEncoding::Base64,
                };
                (crypto::serialize_envelope(&salt, &iv, &ciphertext, encoding), salt, iv)
            }
        };

        let created_at = DateTime::<Utc>::from_timestamp_millis(self.clock.now_ms()).unwrap_or_default();
        let metadata =
            EncryptionMetadata::new(params, format, &salt, &shown_iv, plaintext.len(), created_at);
        info!(
            algorithm = %params.algorithm,
            mode = %params.mode,
            format = format.as_str(),
            bytes = plaintext.len(),
            "image encrypted"
        );
        Ok(EncryptedImage { envelope, metadata })
    }

    // ------------------------------------------------------------------------
    // Decryption
    // ------------------------------------------------------------------------

    pub async fn decrypt_image(
        &self,
        envelope: &str,
        passphrase: &str,
        params: &CipherParameters,
        identity: &Identity,
    ) -> DecryptionOutcome {
        self.decrypt_image_as(envelope, passphrase, params, identity, None)
            .await
    }

    /// Like [`decrypt_image`](Self::decrypt_image), with an explicit
    /// ciphertext encoding for three-part envelopes.
    pub async fn decrypt_image_as(
        &self,
        envelope: &str,
        passphrase: &str,
        params: &CipherParameters,
        identity: &Identity,
        encoding: Option<CiphertextEncoding>,
    ) -> DecryptionOutcome {
        let _busy = match BusyGuard::acquire(&self.busy) {
            Ok(guard) => guard,
            Err(e) => return DecryptionOutcome::failure(&e, params, None, None),
        };

        // Input checks do not cost an attempt.
        let passphrase = match self.preflight(envelope, passphrase, params) {
            Ok(p) => p,
            Err(e) => return DecryptionOutcome::failure(&e, params, None, None),
        };

        let status = match self.limiter.check_or_increment(identity).await {
            Ok(status) => status,
            Err(e) => {
                let e = LabError::from(e);
                warn!(key = %identity.storage_key(), error = %e, "decrypt attempt not permitted");
                let remaining = e.retry_after().map(|_| 0);
                return DecryptionOutcome::failure(&e, params, None, remaining);
            }
        };
        let remaining = if status.unlimited { None } else { status.remaining };

        let parsed = match crypto::decode_token(envelope, encoding) {
            Ok(parsed) => parsed,
            Err(e) => {
                return DecryptionOutcome::failure(&LabError::from(e), params, None, remaining)
            }
        };
        let format = envelope_format(envelope, &parsed, encoding);

        match self.open(&parsed, passphrase, params) {
            Ok(plaintext) => {
                let mut status = status;
                match self.limiter.reset(identity).await {
                    Ok(()) if !status.unlimited => {
                        status.remaining = Some(self.config.limiter.max_attempts)
                    }
                    Ok(()) => {}
                    Err(e) => warn!(error = %e, "could not reset attempts after successful decrypt"),
                }
                let mime = detect_mime(&plaintext);
                info!(
                    format = format.as_str(),
                    mime,
                    bytes = plaintext.len(),
                    "image decrypted"
                );
                DecryptionOutcome::success(plaintext, mime, &status)
            }
            Err(e) => {
                debug!(kind = ?e.kind(), format = format.as_str(), "decryption failed");
                DecryptionOutcome::failure(&e, params, Some(format), remaining)
            }
        }
    }

    fn preflight<'p>(
        &self,
        envelope: &str,
        passphrase: &'p str,
        params: &CipherParameters,
    ) -> Result<&'p str, LabError> {
        let passphrase = normalize_passphrase(passphrase)?;
        params.validate()?;
        if envelope.trim().is_empty() {
            return Err(LabError::MalformedEnvelope("please paste ciphertext".into()));
        }
        self.config.check_size(envelope.len())?;
        Ok(passphrase)
    }

    fn open(
        &self,
        parsed: &ParsedEnvelope,
        passphrase: &str,
        params: &CipherParameters,
    ) -> Result<Vec<u8>, LabError> {
        match parsed {
            ParsedEnvelope::Salted(env) => {
                let derived = crypto::derive_legacy_key_and_iv(
                    passphrase,
                    &env.salt,
                    params.key_size_bytes(),
                    legacy_iv_len(params),
                );
                Ok(crypto::decrypt(&env.ciphertext, derived.key(), derived.iv(), params)?)
            }
            ParsedEnvelope::Explicit(env) => {
                // A mismatch between the envelope and the chosen mode is reported
                // like any other wrong setting.
                let iv_fits = env.iv.is_empty()
                    || (params.mode.uses_iv() && env.iv.len() == params.iv_size_bytes);
                if !iv_fits {
                    return Err(LabError::DecryptionFailed);
                }
                let derived = crypto::derive_for_params(passphrase, &env.salt, params)?;
                // An empty IV field means the IV comes from the KDF (`openssl enc -pbkdf2`).
                let iv = if env.iv.is_empty() { derived.iv() } else { &env.iv };
                Ok(crypto::decrypt(&env.ciphertext, derived.key(), iv, params)?)
            }
        }
    }

    pub async fn remaining_attempts(&self, identity: &Identity) -> Result<AttemptStatus, LabError> {
        Ok(self.limiter.check_only(identity).await?)
    }

    // ------------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------------

    pub fn load_image(&self, name: &str, bytes: Vec<u8>) -> Result<ImageInfo, LabError> {
        if bytes.is_empty() {
            return Err(LabError::InvalidParameter("image is empty".into()));
        }
        self.config.check_size(bytes.len())?;
        let info = self.session.lock().load(name, bytes);
        debug!(mime = %info.mime, bytes = info.size_bytes, "image loaded");
        Ok(info)
    }

    pub fn clear(&self) {
        self.session.lock().clear();
    }

    pub fn current_image(&self) -> Option<LoadedImage> {
        self.session.lock().current().cloned()
    }

    pub fn decrypted_image(&self) -> Option<DecryptedImage> {
        self.session.lock().decrypted().cloned()
    }

    /// Encrypt the loaded image.
    pub fn encrypt_current(
        &self,
        passphrase: &str,
        params: &CipherParameters,
        format: EnvelopeFormat,
    ) -> Result<EncryptedImage, LabError> {
        let _busy = BusyGuard::acquire(&self.busy)?;
        let bytes = self
            .session
            .lock()
            .current()
            .map(|image| Zeroizing::new(image.bytes.clone()))
            .ok_or(LabError::NoImageLoaded)?;
        self.encrypt_unguarded(&bytes, passphrase, params, format)
    }

    /// Decrypt and keep a successful result as the session's decrypted image.
    pub async fn decrypt_and_store(
        &self,
        envelope: &str,
        passphrase: &str,
        params: &CipherParameters,
        identity: &Identity,
        encoding: Option<CiphertextEncoding>,
    ) -> DecryptionOutcome {
        let outcome = self
            .decrypt_image_as(envelope, passphrase, params, identity, encoding)
            .await;
        if let (Some(plaintext), Some(mime)) = (&outcome.plaintext, &outcome.detected_mime_type) {
            self.session.lock().set_decrypted(plaintext.clone(), mime);
        }
        outcome
    }

    /// Make the last decrypted image the current one.
    pub fn promote_decrypted(&self) -> Result<ImageInfo, LabError> {
        self.session.lock().promote_decrypted()
    }
}
