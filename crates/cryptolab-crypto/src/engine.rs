//! Block cipher engine: AES / DES / TripleDES in CBC, ECB, CFB, OFB or CTR.
//!
//! The engine is deterministic: salt and IV randomness is injected by the
//! caller. Padding is applied for every mode (see [`crate::padding`]), so
//! all modes run over block-aligned buffers. When the IV is longer than the
//! block only its leading block is used.

use aes::{Aes128, Aes192, Aes256};
use block_padding::NoPadding;
use cipher::{AsyncStreamCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit, StreamCipher};
use ctr::{Ctr128BE, Ctr64BE};
use des::{Des, TdesEde2, TdesEde3};
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::padding::{pad, unpad};
use crate::types::{Algorithm, CipherMode, CipherParameters};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Encrypt,
    Decrypt,
}

fn rejected_length(_: cipher::InvalidLength) -> CryptoError {
    CryptoError::InvalidParameter("key or IV length rejected by the cipher".into())
}

/// Run one mode over a block-aligned buffer in place.
macro_rules! apply_mode {
    ($cipher:ty, $ctr:ident, $mode:expr, $direction:expr, $key:expr, $iv:expr, $buf:expr) => {{
        let buf: &mut [u8] = $buf;
        let len = buf.len();
        match ($mode, $direction) {
            (CipherMode::Cbc, Direction::Encrypt) => cbc::Encryptor::<$cipher>::new_from_slices($key, $iv)
                .map_err(rejected_length)?
                .encrypt_padded_mut::<NoPadding>(buf, len)
                .map(|_| ())
                .map_err(|_| CryptoError::UnsupportedPadding("unaligned buffer".into())),
            (CipherMode::Cbc, Direction::Decrypt) => cbc::Decryptor::<$cipher>::new_from_slices($key, $iv)
                .map_err(rejected_length)?
                .decrypt_padded_mut::<NoPadding>(buf)
                .map(|_| ())
                .map_err(|_| CryptoError::DecryptionFailed),
            (CipherMode::Ecb, Direction::Encrypt) => ecb::Encryptor::<$cipher>::new_from_slice($key)
                .map_err(rejected_length)?
                .encrypt_padded_mut::<NoPadding>(buf, len)
                .map(|_| ())
                .map_err(|_| CryptoError::UnsupportedPadding("unaligned buffer".into())),
            (CipherMode::Ecb, Direction::Decrypt) => ecb::Decryptor::<$cipher>::new_from_slice($key)
                .map_err(rejected_length)?
                .decrypt_padded_mut::<NoPadding>(buf)
                .map(|_| ())
                .map_err(|_| CryptoError::DecryptionFailed),
            (CipherMode::Cfb, Direction::Encrypt) => {
                cfb_mode::Encryptor::<$cipher>::new_from_slices($key, $iv)
                    .map_err(rejected_length)?
                    .encrypt(buf);
                Ok(())
            }
            (CipherMode::Cfb, Direction::Decrypt) => {
                cfb_mode::Decryptor::<$cipher>::new_from_slices($key, $iv)
                    .map_err(rejected_length)?
                    .decrypt(buf);
                Ok(())
            }
            (CipherMode::Ofb, _) => {
                let mut stream = ofb::Ofb::<$cipher>::new_from_slices($key, $iv).map_err(rejected_length)?;
                stream.apply_keystream(buf);
                Ok(())
            }
            (CipherMode::Ctr, _) => {
                let mut stream = $ctr::<$cipher>::new_from_slices($key, $iv).map_err(rejected_length)?;
                stream.apply_keystream(buf);
                Ok(())
            }
        }
    }};
}

fn transform(
    direction: Direction,
    params: &CipherParameters,
    key: &[u8],
    iv: &[u8],
    buf: &mut [u8],
) -> Result<(), CryptoError> {
    let mode = params.mode;
    match (params.algorithm, key.len()) {
        (Algorithm::Aes, 16) => apply_mode!(Aes128, Ctr128BE, mode, direction, key, iv, buf),
        (Algorithm::Aes, 24) => apply_mode!(Aes192, Ctr128BE, mode, direction, key, iv, buf),
        (Algorithm::Aes, 32) => apply_mode!(Aes256, Ctr128BE, mode, direction, key, iv, buf),
        (Algorithm::Des, 8) => apply_mode!(Des, Ctr64BE, mode, direction, key, iv, buf),
        (Algorithm::TripleDes, 16) => apply_mode!(TdesEde2, Ctr64BE, mode, direction, key, iv, buf),
        (Algorithm::TripleDes, 24) => apply_mode!(TdesEde3, Ctr64BE, mode, direction, key, iv, buf),
        (algorithm, got) => Err(CryptoError::InvalidKeyLength {
            expected: (algorithm.default_key_size() / 8) as usize,
            got,
        }),
    }
}

fn check_key(key: &[u8], params: &CipherParameters) -> Result<(), CryptoError> {
    if key.len() != params.key_size_bytes() {
        return Err(CryptoError::InvalidKeyLength {
            expected: params.key_size_bytes(),
            got: key.len(),
        });
    }
    Ok(())
}

/// The IV slice the mode consumes: empty for ECB, otherwise the leading block.
fn select_iv<'a>(iv: &'a [u8], params: &CipherParameters) -> Result<&'a [u8], CryptoError> {
    if !params.mode.uses_iv() {
        return Ok(&[]);
    }
    let block = params.algorithm.block_size();
    if iv.len() < block {
        return Err(CryptoError::InvalidIvLength {
            expected: block,
            got: iv.len(),
        });
    }
    Ok(&iv[..block])
}

/// Pad and encrypt `plaintext`.
pub fn encrypt(
    plaintext: &[u8],
    key: &[u8],
    iv: &[u8],
    params: &CipherParameters,
) -> Result<Vec<u8>, CryptoError> {
    check_key(key, params)?;
    let iv = select_iv(iv, params)?;
    let mut buf = pad(plaintext, params.algorithm.block_size(), params.padding)?;
    transform(Direction::Encrypt, params, key, iv, &mut buf)?;
    Ok(buf)
}

/// Decrypt and unpad `ciphertext`.
///
/// Misaligned input, wrong key/IV/mode and bad padding all come back as
/// [`CryptoError::DecryptionFailed`]; an empty result is
/// [`CryptoError::EmptyPlaintext`].
pub fn decrypt(
    ciphertext: &[u8],
    key: &[u8],
    iv: &[u8],
    params: &CipherParameters,
) -> Result<Vec<u8>, CryptoError> {
    check_key(key, params)?;
    let iv = select_iv(iv, params)?;
    let block = params.algorithm.block_size();
    if ciphertext.is_empty() || ciphertext.len() % block != 0 {
        return Err(CryptoError::DecryptionFailed);
    }

    let mut buf = ciphertext.to_vec();
    let result = transform(Direction::Decrypt, params, key, iv, &mut buf)
        .map_err(|_| CryptoError::DecryptionFailed)
        .and_then(|()| unpad(&buf, block, params.padding));
    buf.zeroize();

    let plaintext = result?;
    if plaintext.is_empty() {
        return Err(CryptoError::EmptyPlaintext);
    }
    Ok(plaintext)
}
