//! Passphrase → key + IV derivation.
//!
//! Two routines:
//! - PBKDF2-HMAC with an explicit iteration count. `key_len + iv_len` bytes are
//!   requested in one call and split key-then-iv (same layout as `openssl enc -pbkdf2`).
//! - The legacy OpenSSL `EVP_BytesToKey` routine (single-pass MD5 chain, one
//!   iteration) used by the `Salted__` token format.

use std::fmt;

use md5::{Digest, Md5};
use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;
use crate::types::{CipherParameters, KdfHash};

/// Salt length fixed by the `Salted__` header format.
pub const LEGACY_SALT_SIZE: usize = 8;

/// Key and IV produced by a derivation routine. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: Vec<u8>,
    iv: Vec<u8>,
}

impl DerivedKey {
    fn split(mut material: Vec<u8>, key_len: usize) -> Self {
        let iv = material.split_off(key_len);
        Self { key: material, iv }
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key_len", &self.key.len())
            .field("iv_len", &self.iv.len())
            .finish()
    }
}

/// Derive a key of `key_size_bits / 8` bytes and an IV of `iv_size_bytes`
/// bytes with PBKDF2-HMAC.
pub fn derive_key_and_iv(
    passphrase: &str,
    salt: &[u8],
    key_size_bits: u32,
    iv_size_bytes: usize,
    iterations: u32,
    hash: KdfHash,
) -> Result<DerivedKey, CryptoError> {
    if key_size_bits == 0 || key_size_bits % 8 != 0 {
        return Err(CryptoError::InvalidParameter(format!(
            "key size must be a positive multiple of 8 bits, got {key_size_bits}"
        )));
    }
    if iterations == 0 {
        return Err(CryptoError::InvalidParameter(
            "iterations must be at least 1".into(),
        ));
    }
    let key_len = (key_size_bits / 8) as usize;
    let mut material = vec![0u8; key_len + iv_size_bytes];
    match hash {
        KdfHash::Sha256 => {
            pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, iterations, &mut material)
        }
        KdfHash::Sha1 => pbkdf2_hmac::<Sha1>(passphrase.as_bytes(), salt, iterations, &mut material),
    }
    Ok(DerivedKey::split(material, key_len))
}

/// PBKDF2 derivation driven by a parameter set. ECB derives an empty IV.
pub fn derive_for_params(
    passphrase: &str,
    salt: &[u8],
    params: &CipherParameters,
) -> Result<DerivedKey, CryptoError> {
    derive_key_and_iv(
        passphrase,
        salt,
        params.key_size_bits,
        params.effective_iv_size(),
        params.iterations,
        params.kdf_hash,
    )
}

/// OpenSSL `EVP_BytesToKey` with MD5 and a single iteration:
/// `D_i = MD5(D_{i-1} || passphrase || salt)`, concatenated until
/// `key_len + iv_len` bytes are available.
pub fn derive_legacy_key_and_iv(
    passphrase: &str,
    salt: &[u8],
    key_len: usize,
    iv_len: usize,
) -> DerivedKey {
    let needed = key_len + iv_len;
    let mut material = Vec::with_capacity(needed + 16);
    let mut block: Vec<u8> = Vec::new();
    while material.len() < needed {
        let mut hasher = Md5::new();
        hasher.update(&block);
        hasher.update(passphrase.as_bytes());
        hasher.update(salt);
        block.zeroize();
        block = hasher.finalize().to_vec();
        material.extend_from_slice(&block);
    }
    block.zeroize();
    material.truncate(needed);
    DerivedKey::split(material, key_len)
}

/// Fill a fresh buffer from the platform CSPRNG.
pub fn random_bytes(len: usize) -> Result<Vec<u8>, CryptoError> {
    let mut out = vec![0u8; len];
    getrandom::getrandom(&mut out).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(out)
}
