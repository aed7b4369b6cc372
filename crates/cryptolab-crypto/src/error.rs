use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Hex length must be even, got {0} digits")]
    OddHexLength(usize),

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid base64: {0}")]
    InvalidBase64(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Unsupported mode: {0}")]
    UnsupportedMode(String),

    #[error("Unsupported padding: {0}")]
    UnsupportedPadding(String),

    #[error("Invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("Invalid IV length: expected at least {expected} bytes, got {got}")]
    InvalidIvLength { expected: usize, got: usize },

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Deliberately carries no detail: padding, key, IV and mode failures
    /// all look the same to the caller.
    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Decryption produced empty output")]
    EmptyPlaintext,

    #[error("Random number generation failed: {0}")]
    RngFailed(String),
}
