use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cryptolab_crypto::{Algorithm, CipherMode, CipherParameters, EnvelopeFormat, KdfHash, PaddingScheme};

/// Display-only description of an encryption. Nothing here is needed to
/// decrypt beyond what the envelope already carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionMetadata {
    pub algorithm: Algorithm,
    pub key_size_bits: u32,
    pub mode: CipherMode,
    pub padding: PaddingScheme,
    pub iterations: u32,
    pub kdf_hash: KdfHash,
    pub format: EnvelopeFormat,
    pub salt_hex: String,
    pub iv_hex: String,
    pub plaintext_bytes: usize,
    pub created_at: DateTime<Utc>,
}

impl EncryptionMetadata {
    pub fn new(
        params: &CipherParameters,
        format: EnvelopeFormat,
        salt: &[u8],
        iv: &[u8],
        plaintext_bytes: usize,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            algorithm: params.algorithm,
            key_size_bits: params.key_size_bits,
            mode: params.mode,
            padding: params.padding,
            iterations: params.iterations,
            kdf_hash: params.kdf_hash,
            format,
            salt_hex: cryptolab_crypto::bytes_to_hex(salt),
            iv_hex: cryptolab_crypto::bytes_to_hex(iv),
            plaintext_bytes,
            created_at,
        }
    }

    /// One-line summary, e.g. `AES-256 CBC/Pkcs7, PBKDF2-SHA-256 x10000`.
    pub fn summary(&self) -> String {
        let kdf = match self.format {
            EnvelopeFormat::OpenSsl => "OpenSSL MD5".to_string(),
            _ => format!("PBKDF2-{} x{}", self.kdf_hash.as_str(), self.iterations),
        };
        format!(
            "{}-{} {}/{}, {kdf}",
            self.algorithm, self.key_size_bits, self.mode, self.padding
        )
    }
}
