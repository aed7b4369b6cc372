use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// Smallest accepted IV size in bytes.
pub const MIN_IV_SIZE: usize = 8;

/// Largest accepted IV size in bytes.
pub const MAX_IV_SIZE: usize = 32;

/// Largest accepted salt size in bytes (zero disables salting).
pub const MAX_SALT_SIZE: usize = 32;

/// PBKDF2 iteration bounds.
pub const MIN_ITERATIONS: u32 = 1_000;
pub const MAX_ITERATIONS: u32 = 1_000_000;

pub const DEFAULT_ITERATIONS: u32 = 10_000;
pub const DEFAULT_SALT_SIZE: usize = 16;
pub const DEFAULT_IV_SIZE: usize = 16;

/// AES block size in bytes.
pub const AES_BLOCK_SIZE: usize = 16;

/// DES / TripleDES block size in bytes.
pub const DES_BLOCK_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "AES")]
    Aes,
    #[serde(rename = "DES")]
    Des,
    #[serde(rename = "TripleDES")]
    TripleDes,
}

impl Algorithm {
    pub fn block_size(self) -> usize {
        match self {
            Algorithm::Aes => AES_BLOCK_SIZE,
            Algorithm::Des | Algorithm::TripleDes => DES_BLOCK_SIZE,
        }
    }

    /// Key sizes (in bits) this algorithm accepts.
    pub fn key_sizes(self) -> &'static [u32] {
        match self {
            Algorithm::Aes => &[128, 192, 256],
            Algorithm::Des => &[64],
            Algorithm::TripleDes => &[128, 192],
        }
    }

    pub fn default_key_size(self) -> u32 {
        match self {
            Algorithm::Aes => 256,
            Algorithm::Des => 64,
            Algorithm::TripleDes => 192,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Aes => "AES",
            Algorithm::Des => "DES",
            Algorithm::TripleDes => "TripleDES",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AES" => Ok(Algorithm::Aes),
            "DES" => Ok(Algorithm::Des),
            "TRIPLEDES" | "3DES" | "TDES" | "DES-EDE3" => Ok(Algorithm::TripleDes),
            _ => Err(CryptoError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CipherMode {
    Cbc,
    Ecb,
    Cfb,
    Ofb,
    Ctr,
}

impl CipherMode {
    pub fn uses_iv(self) -> bool {
        !matches!(self, CipherMode::Ecb)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CipherMode::Cbc => "CBC",
            CipherMode::Ecb => "ECB",
            CipherMode::Cfb => "CFB",
            CipherMode::Ofb => "OFB",
            CipherMode::Ctr => "CTR",
        }
    }
}

impl fmt::Display for CipherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherMode {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CBC" => Ok(CipherMode::Cbc),
            "ECB" => Ok(CipherMode::Ecb),
            "CFB" => Ok(CipherMode::Cfb),
            "OFB" => Ok(CipherMode::Ofb),
            "CTR" => Ok(CipherMode::Ctr),
            _ => Err(CryptoError::UnsupportedMode(s.to_string())),
        }
    }
}

/// Block padding schemes. Names follow the CryptoJS `pad.*` namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaddingScheme {
    Pkcs7,
    NoPadding,
    ZeroPadding,
    AnsiX923,
    /// ISO/IEC 9797-1 method 2, byte-identical to ISO 7816-4.
    #[serde(alias = "Iso7816")]
    Iso97971,
}

impl PaddingScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            PaddingScheme::Pkcs7 => "Pkcs7",
            PaddingScheme::NoPadding => "NoPadding",
            PaddingScheme::ZeroPadding => "ZeroPadding",
            PaddingScheme::AnsiX923 => "AnsiX923",
            PaddingScheme::Iso97971 => "Iso97971",
        }
    }
}

impl fmt::Display for PaddingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaddingScheme {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pkcs7" | "pkcs5" => Ok(PaddingScheme::Pkcs7),
            "nopadding" | "none" => Ok(PaddingScheme::NoPadding),
            "zeropadding" | "zero" => Ok(PaddingScheme::ZeroPadding),
            "ansix923" => Ok(PaddingScheme::AnsiX923),
            "iso97971" | "iso7816" => Ok(PaddingScheme::Iso97971),
            _ => Err(CryptoError::UnsupportedPadding(s.to_string())),
        }
    }
}

/// PRF used by PBKDF2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KdfHash {
    #[default]
    #[serde(rename = "SHA256", alias = "SHA-256")]
    Sha256,
    #[serde(rename = "SHA1", alias = "SHA-1")]
    Sha1,
}

impl KdfHash {
    pub fn as_str(self) -> &'static str {
        match self {
            KdfHash::Sha256 => "SHA-256",
            KdfHash::Sha1 => "SHA-1",
        }
    }
}

/// Text encoding of the ciphertext field of a three-part envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CiphertextEncoding {
    Hex,
    #[default]
    Base64,
}

/// Envelope serialization chosen at encrypt time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeFormat {
    /// `hex(salt):hex(iv):hex(ciphertext)`
    Hex,
    /// `hex(salt):hex(iv):base64(ciphertext)`
    #[default]
    Base64,
    /// Single base64 token with an embedded `Salted__` header (OpenSSL / CryptoJS).
    #[serde(rename = "openssl")]
    OpenSsl,
}

impl EnvelopeFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            EnvelopeFormat::Hex => "hex",
            EnvelopeFormat::Base64 => "base64",
            EnvelopeFormat::OpenSsl => "openssl",
        }
    }
}

/// Cipher, mode, padding and key-derivation settings for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CipherParameters {
    pub algorithm: Algorithm,
    pub key_size_bits: u32,
    pub mode: CipherMode,
    pub padding: PaddingScheme,
    pub iv_size_bytes: usize,
    pub salt_size_bytes: usize,
    pub iterations: u32,
    pub kdf_hash: KdfHash,
}

impl Default for CipherParameters {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Aes,
            key_size_bits: 256,
            mode: CipherMode::Cbc,
            padding: PaddingScheme::Pkcs7,
            iv_size_bytes: DEFAULT_IV_SIZE,
            salt_size_bytes: DEFAULT_SALT_SIZE,
            iterations: DEFAULT_ITERATIONS,
            kdf_hash: KdfHash::Sha256,
        }
    }
}

impl CipherParameters {
    /// Defaults for `algorithm` (key size and an IV of one block).
    pub fn for_algorithm(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            key_size_bits: algorithm.default_key_size(),
            iv_size_bytes: algorithm.block_size().max(MIN_IV_SIZE),
            ..Self::default()
        }
    }

    pub fn key_size_bytes(&self) -> usize {
        (self.key_size_bits / 8) as usize
    }

    /// IV length actually used by the mode: zero for ECB.
    pub fn effective_iv_size(&self) -> usize {
        if self.mode.uses_iv() {
            self.iv_size_bytes
        } else {
            0
        }
    }

    /// Check every range constraint. Called once at the orchestrator boundary.
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.salt_size_bytes > MAX_SALT_SIZE {
            return Err(CryptoError::InvalidParameter(format!(
                "salt size must be between 0 and {MAX_SALT_SIZE} bytes, got {}",
                self.salt_size_bytes
            )));
        }
        if !(MIN_IV_SIZE..=MAX_IV_SIZE).contains(&self.iv_size_bytes) {
            return Err(CryptoError::InvalidParameter(format!(
                "IV size must be between {MIN_IV_SIZE} and {MAX_IV_SIZE} bytes, got {}",
                self.iv_size_bytes
            )));
        }
        if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&self.iterations) {
            return Err(CryptoError::InvalidParameter(format!(
                "iterations must be between {MIN_ITERATIONS} and {MAX_ITERATIONS}, got {}",
                self.iterations
            )));
        }
        if !self.algorithm.key_sizes().contains(&self.key_size_bits) {
            return Err(CryptoError::InvalidParameter(format!(
                "{} does not support a {}-bit key (allowed: {:?})",
                self.algorithm,
                self.key_size_bits,
                self.algorithm.key_sizes()
            )));
        }
        let block = self.algorithm.block_size();
        if self.mode.uses_iv() && self.iv_size_bytes < block {
            return Err(CryptoError::InvalidParameter(format!(
                "{} {} needs an IV of at least {block} bytes, got {}",
                self.algorithm, self.mode, self.iv_size_bytes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        CipherParameters::default().validate().unwrap();
        for alg in [Algorithm::Aes, Algorithm::Des, Algorithm::TripleDes] {
            CipherParameters::for_algorithm(alg).validate().unwrap();
        }
    }

    #[test]
    fn salt_range() {
        let mut p = CipherParameters::default();
        p.salt_size_bytes = 0;
        p.validate().unwrap();
        p.salt_size_bytes = 32;
        p.validate().unwrap();
        p.salt_size_bytes = 33;
        assert!(matches!(p.validate(), Err(CryptoError::InvalidParameter(_))));
    }

    #[test]
    fn iv_range() {
        let mut p = CipherParameters::for_algorithm(Algorithm::Des);
        p.iv_size_bytes = 7;
        assert!(p.validate().is_err());
        p.iv_size_bytes = 8;
        p.validate().unwrap();
        p.iv_size_bytes = 33;
        assert!(p.validate().is_err());
    }

    #[test]
    fn iteration_range() {
        let mut p = CipherParameters::default();
        p.iterations = 999;
        assert!(p.validate().is_err());
        p.iterations = 1_000;
        p.validate().unwrap();
        p.iterations = 1_000_000;
        p.validate().unwrap();
        p.iterations = 1_000_001;
        assert!(p.validate().is_err());
    }

    #[test]
    fn key_size_must_match_algorithm() {
        let mut p = CipherParameters::default();
        p.key_size_bits = 64;
        assert!(p.validate().is_err());
        p.algorithm = Algorithm::Des;
        p.validate().unwrap();
    }

    #[test]
    fn aes_iv_must_cover_block_unless_ecb() {
        let mut p = CipherParameters::default();
        p.iv_size_bytes = 8;
        assert!(p.validate().is_err());
        p.mode = CipherMode::Ecb;
        p.validate().unwrap();
        assert_eq!(p.effective_iv_size(), 0);
    }

    #[test]
    fn parses_names() {
        assert_eq!("aes".parse::<Algorithm>().unwrap(), Algorithm::Aes);
        assert_eq!("TripleDES".parse::<Algorithm>().unwrap(), Algorithm::TripleDes);
        assert_eq!("ctr".parse::<CipherMode>().unwrap(), CipherMode::Ctr);
        assert_eq!("Pkcs7".parse::<PaddingScheme>().unwrap(), PaddingScheme::Pkcs7);
        assert_eq!(
            "Rabbit".parse::<Algorithm>().unwrap_err(),
            CryptoError::UnsupportedAlgorithm("Rabbit".into())
        );
        assert!(matches!(
            "Iso10126".parse::<PaddingScheme>(),
            Err(CryptoError::UnsupportedPadding(_))
        ));
    }

    #[test]
    fn deserializes_partial_json_with_defaults() {
        let p: CipherParameters =
            serde_json::from_str(r#"{"algorithm":"TripleDES","keySizeBits":192,"ivSizeBytes":8,"mode":"OFB"}"#)
                .unwrap();
        assert_eq!(p.algorithm, Algorithm::TripleDes);
        assert_eq!(p.mode, CipherMode::Ofb);
        assert_eq!(p.padding, PaddingScheme::Pkcs7);
        assert_eq!(p.iterations, DEFAULT_ITERATIONS);
        p.validate().unwrap();
    }

    #[test]
    fn unknown_algorithm_in_json_is_rejected() {
        let res: Result<CipherParameters, _> = serde_json::from_str(r#"{"algorithm":"Blowfish"}"#);
        assert!(res.is_err());
    }
}
