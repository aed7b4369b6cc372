use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cryptolab_crypto::CryptoError;
use cryptolab_limiter::LimiterError;

/// Stable classification of a failure, reported to the UI alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    MissingPassphrase,
    InvalidParameter,
    MalformedEnvelope,
    UnsupportedAlgorithm,
    UnsupportedPadding,
    DecryptionFailed,
    EmptyPlaintext,
    AttemptsExhausted,
    OperationInProgress,
    LimiterUnavailable,
    NoImageLoaded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabError {
    #[error("Please enter a passphrase")]
    MissingPassphrase,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Unsupported padding: {0}")]
    UnsupportedPadding(String),

    #[error("Decryption failed. Check the passphrase and cipher settings")]
    DecryptionFailed,

    #[error("Decryption produced empty output. Verify algorithm, passphrase, and ciphertext format")]
    EmptyPlaintext,

    #[error("Too many decryption attempts. Try again after {}", format_instant(.retry_after))]
    AttemptsExhausted { retry_after: i64 },

    #[error("Processing... please wait")]
    OperationInProgress,

    #[error("Attempt counter unavailable: {0}")]
    LimiterUnavailable(String),

    #[error("Please select an image first")]
    NoImageLoaded,
}

impl LabError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LabError::MissingPassphrase => ErrorKind::MissingPassphrase,
            LabError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            LabError::MalformedEnvelope(_) => ErrorKind::MalformedEnvelope,
            LabError::UnsupportedAlgorithm(_) => ErrorKind::UnsupportedAlgorithm,
            LabError::UnsupportedPadding(_) => ErrorKind::UnsupportedPadding,
            LabError::DecryptionFailed => ErrorKind::DecryptionFailed,
            LabError::EmptyPlaintext => ErrorKind::EmptyPlaintext,
            LabError::AttemptsExhausted { .. } => ErrorKind::AttemptsExhausted,
            LabError::OperationInProgress => ErrorKind::OperationInProgress,
            LabError::LimiterUnavailable(_) => ErrorKind::LimiterUnavailable,
            LabError::NoImageLoaded => ErrorKind::NoImageLoaded,
        }
    }

    pub fn retry_after(&self) -> Option<i64> {
        match self {
            LabError::AttemptsExhausted { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

fn format_instant(epoch_ms: &i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(*epoch_ms)
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| epoch_ms.to_string())
}

impl From<CryptoError> for LabError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidParameter(msg) | CryptoError::UnsupportedMode(msg) => {
                LabError::InvalidParameter(msg)
            }
            CryptoError::UnsupportedAlgorithm(msg) => LabError::UnsupportedAlgorithm(msg),
            CryptoError::UnsupportedPadding(msg) => LabError::UnsupportedPadding(msg),
            CryptoError::MalformedEnvelope(msg) => LabError::MalformedEnvelope(msg),
            CryptoError::OddHexLength(_) | CryptoError::InvalidHex(_) | CryptoError::InvalidBase64(_) => {
                LabError::MalformedEnvelope(e.to_string())
            }
            CryptoError::EmptyPlaintext => LabError::EmptyPlaintext,
            CryptoError::RngFailed(msg) => LabError::InvalidParameter(format!("random source: {msg}")),
            CryptoError::DecryptionFailed
            | CryptoError::InvalidKeyLength { .. }
            | CryptoError::InvalidIvLength { .. } => LabError::DecryptionFailed,
        }
    }
}

impl From<LimiterError> for LabError {
    fn from(e: LimiterError) -> Self {
        match e {
            LimiterError::AttemptsExhausted { retry_after } => LabError::AttemptsExhausted { retry_after },
            other => LabError::LimiterUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crypto_failures_collapse_to_decryption_failed() {
        for e in [
            CryptoError::DecryptionFailed,
            CryptoError::InvalidKeyLength {
                expected: 32,
                got: 16,
            },
            CryptoError::InvalidIvLength {
                expected: 16,
                got: 8,
            },
        ] {
            assert_eq!(LabError::from(e), LabError::DecryptionFailed);
        }
    }

    #[test]
    fn codec_errors_are_malformed_envelope() {
        let err = LabError::from(CryptoError::OddHexLength(3));
        assert_eq!(err.kind(), ErrorKind::MalformedEnvelope);
    }

    #[test]
    fn exhausted_message_carries_retry_time() {
        let err = LabError::from(LimiterError::AttemptsExhausted {
            retry_after: 1_700_086_400_000,
        });
        assert_eq!(err.retry_after(), Some(1_700_086_400_000));
        assert_eq!(
            err.to_string(),
            "Too many decryption attempts. Try again after 2023-11-15 22:13 UTC"
        );
    }

    #[test]
    fn limiter_failures_are_unavailable() {
        let err = LabError::from(LimiterError::Unavailable("timeout".into()));
        assert_eq!(err.kind(), ErrorKind::LimiterUnavailable);
        let err = LabError::from(LimiterError::NotAuthenticated("bad token".into()));
        assert_eq!(err.kind(), ErrorKind::LimiterUnavailable);
    }

    #[test]
    fn messages_are_single_line() {
        let errors = [
            LabError::MissingPassphrase,
            LabError::DecryptionFailed,
            LabError::EmptyPlaintext,
            LabError::OperationInProgress,
        ];
        for e in errors {
            assert!(!e.to_string().contains('\n'));
        }
    }
}
