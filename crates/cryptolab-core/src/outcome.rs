use serde::{Deserialize, Serialize};

use cryptolab_crypto::{CipherParameters, EnvelopeFormat};
use cryptolab_limiter::AttemptStatus;

use crate::error::{ErrorKind, LabError};
use crate::metadata::EncryptionMetadata;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedImage {
    pub envelope: String,
    pub metadata: EncryptionMetadata,
}

/// Structured result of a decryption. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptionOutcome {
    pub success: bool,
    /// Decrypted bytes; the WASM layer hands these over as a `Uint8Array`.
    #[serde(skip)]
    pub plaintext: Option<Vec<u8>>,
    pub detected_mime_type: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub message: Option<String>,
    pub retry_after: Option<i64>,
    pub remaining_attempts: Option<u32>,
    /// Settings the user should double-check after a failed decryption.
    pub checklist: Vec<String>,
}

impl DecryptionOutcome {
    pub fn success(plaintext: Vec<u8>, mime: &str, status: &AttemptStatus) -> Self {
        Self {
            success: true,
            plaintext: Some(plaintext),
            detected_mime_type: Some(mime.to_string()),
            error_kind: None,
            message: None,
            retry_after: None,
            remaining_attempts: if status.unlimited { None } else { status.remaining },
            checklist: Vec::new(),
        }
    }

    pub fn failure(
        err: &LabError,
        params: &CipherParameters,
        format: Option<EnvelopeFormat>,
        remaining_attempts: Option<u32>,
    ) -> Self {
        let checklist = match err.kind() {
            ErrorKind::DecryptionFailed | ErrorKind::EmptyPlaintext | ErrorKind::MalformedEnvelope => {
                decryption_checklist(params, format)
            }
            _ => Vec::new(),
        };
        Self {
            success: false,
            plaintext: None,
            detected_mime_type: None,
            error_kind: Some(err.kind()),
            message: Some(err.to_string()),
            retry_after: err.retry_after(),
            remaining_attempts,
            checklist,
        }
    }

    pub fn is_image(&self) -> bool {
        self.detected_mime_type
            .as_deref()
            .is_some_and(crate::mime::is_image)
    }
}

/// Every setting that has to match the encryption side, with the values
/// that were tried. No entry is singled out as the culprit.
pub fn decryption_checklist(params: &CipherParameters, format: Option<EnvelopeFormat>) -> Vec<String> {
    let format = match format {
        Some(EnvelopeFormat::OpenSsl) => "OpenSSL salted token (Salted__ header)",
        Some(EnvelopeFormat::Hex) => "salt:iv:ciphertext (hex ciphertext)",
        Some(EnvelopeFormat::Base64) => "salt:iv:ciphertext (base64 ciphertext)",
        None => "salt:iv:ciphertext or OpenSSL salted token",
    };
    vec![
        "Passphrase (case and whitespace inside it matter)".to_string(),
        format!("Algorithm: {}", params.algorithm),
        format!("Key size: {} bits", params.key_size_bits),
        format!("Mode: {}", params.mode),
        format!("Padding: {}", params.padding),
        format!("Iterations: {} ({})", params.iterations, params.kdf_hash.as_str()),
        format!("Envelope format: {format}"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_lists_every_setting() {
        let outcome = DecryptionOutcome::failure(
            &LabError::DecryptionFailed,
            &CipherParameters::default(),
            Some(EnvelopeFormat::Base64),
            Some(3),
        );
        assert!(!outcome.success);
        assert_eq!(outcome.error_kind, Some(ErrorKind::DecryptionFailed));
        assert_eq!(outcome.checklist.len(), 7);
        assert!(outcome.checklist.iter().any(|l| l == "Mode: CBC"));
        assert!(outcome.checklist.iter().any(|l| l == "Iterations: 10000 (SHA-256)"));
        assert_eq!(outcome.remaining_attempts, Some(3));
    }

    #[test]
    fn exhausted_has_retry_after_and_no_checklist() {
        let outcome = DecryptionOutcome::failure(
            &LabError::AttemptsExhausted { retry_after: 99 },
            &CipherParameters::default(),
            None,
            Some(0),
        );
        assert_eq!(outcome.retry_after, Some(99));
        assert!(outcome.checklist.is_empty());
    }

    #[test]
    fn plaintext_is_not_serialized() {
        let outcome = DecryptionOutcome::success(vec![1, 2, 3], "image/png", &AttemptStatus::default());
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("plaintext").is_none());
        assert_eq!(json["detectedMimeType"], "image/png");
        assert!(outcome.is_image());
    }
}
