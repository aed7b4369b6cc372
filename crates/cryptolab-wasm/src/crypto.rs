//! WASM bindings for cryptolab-crypto.

use crate::error::{from_js_or_default, to_js_error};
use cryptolab_crypto::{
    decode_token, decrypt, derive_for_params, derive_legacy_key_and_iv, encrypt, random_bytes,
    serialize_envelope, serialize_salted, CipherParameters, CiphertextEncoding, ParsedEnvelope,
    DEFAULT_ITERATIONS, LEGACY_SALT_SIZE,
};
use js_sys::{Object, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;

fn set(obj: &Object, key: &str, value: &JsValue) -> Result<(), JsValue> {
    Reflect::set(obj, &JsValue::from_str(key), value).map(|_| ())
}

fn set_bytes(obj: &Object, key: &str, bytes: &[u8]) -> Result<(), JsValue> {
    set(obj, key, &Uint8Array::from(bytes).into())
}

fn params_from(value: JsValue) -> Result<CipherParameters, JsValue> {
    let params: CipherParameters = from_js_or_default(value)?;
    params.validate().map_err(to_js_error)?;
    Ok(params)
}

// --- Constants ---

#[wasm_bindgen(js_name = "DEFAULT_ITERATIONS")]
pub fn default_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

#[wasm_bindgen(js_name = "defaultParameters")]
pub fn wasm_default_parameters() -> Result<JsValue, JsValue> {
    crate::error::to_js_value(&CipherParameters::default())
}

// --- Key derivation ---

/// PBKDF2 key and IV for `params`, as `{ key, iv }`.
#[wasm_bindgen(js_name = "deriveKeyAndIv")]
pub fn wasm_derive_key_and_iv(
    passphrase: &str,
    salt: &[u8],
    params: JsValue,
) -> Result<JsValue, JsValue> {
    let params = params_from(params)?;
    let derived = derive_for_params(passphrase, salt, &params).map_err(to_js_error)?;
    let out = Object::new();
    set_bytes(&out, "key", derived.key())?;
    set_bytes(&out, "iv", derived.iv())?;
    Ok(out.into())
}

/// OpenSSL `EVP_BytesToKey` (MD5, one round) key and IV, as `{ key, iv }`.
#[wasm_bindgen(js_name = "deriveLegacyKeyAndIv")]
pub fn wasm_derive_legacy_key_and_iv(
    passphrase: &str,
    salt: &[u8],
    key_len: usize,
    iv_len: usize,
) -> Result<JsValue, JsValue> {
    let derived = derive_legacy_key_and_iv(passphrase, salt, key_len, iv_len);
    let out = Object::new();
    set_bytes(&out, "key", derived.key())?;
    set_bytes(&out, "iv", derived.iv())?;
    Ok(out.into())
}

#[wasm_bindgen(js_name = "randomBytes")]
pub fn wasm_random_bytes(len: usize) -> Result<Vec<u8>, JsValue> {
    random_bytes(len).map_err(to_js_error)
}

// --- Cipher ---

#[wasm_bindgen(js_name = "encrypt")]
pub fn wasm_encrypt(
    plaintext: &[u8],
    key: &[u8],
    iv: &[u8],
    params: JsValue,
) -> Result<Vec<u8>, JsValue> {
    let params = params_from(params)?;
    encrypt(plaintext, key, iv, &params).map_err(to_js_error)
}

#[wasm_bindgen(js_name = "decrypt")]
pub fn wasm_decrypt(
    ciphertext: &[u8],
    key: &[u8],
    iv: &[u8],
    params: JsValue,
) -> Result<Vec<u8>, JsValue> {
    let params = params_from(params)?;
    decrypt(ciphertext, key, iv, &params).map_err(to_js_error)
}

// --- Envelopes ---

/// `encoding` is `"hex"` or `"base64"` (default).
#[wasm_bindgen(js_name = "serializeEnvelope")]
pub fn wasm_serialize_envelope(
    salt: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    encoding: JsValue,
) -> Result<String, JsValue> {
    let encoding: CiphertextEncoding = from_js_or_default(encoding)?;
    Ok(serialize_envelope(salt, iv, ciphertext, encoding))
}

#[wasm_bindgen(js_name = "serializeSalted")]
pub fn wasm_serialize_salted(salt: &[u8], ciphertext: &[u8]) -> Result<String, JsValue> {
    let salt: [u8; LEGACY_SALT_SIZE] = salt.try_into().map_err(|_| {
        to_js_error(format!("salt must be {LEGACY_SALT_SIZE} bytes, got {}", salt.len()))
    })?;
    Ok(serialize_salted(&salt, ciphertext))
}

/// Parse either envelope format into `{ format, salt, iv?, ciphertext }`
/// where `format` is `"explicit"` or `"salted"`.
#[wasm_bindgen(js_name = "parseEnvelope")]
pub fn wasm_parse_envelope(token: &str, encoding: JsValue) -> Result<JsValue, JsValue> {
    let encoding: Option<CiphertextEncoding> = if encoding.is_undefined() || encoding.is_null() {
        None
    } else {
        Some(serde_wasm_bindgen::from_value(encoding).map_err(to_js_error)?)
    };
    let parsed = decode_token(token, encoding).map_err(to_js_error)?;
    let out = Object::new();
    match &parsed {
        ParsedEnvelope::Explicit(env) => {
            set(&out, "format", &JsValue::from_str("explicit"))?;
            set_bytes(&out, "salt", &env.salt)?;
            set_bytes(&out, "iv", &env.iv)?;
        }
        ParsedEnvelope::Salted(env) => {
            set(&out, "format", &JsValue::from_str("salted"))?;
            set_bytes(&out, "salt", &env.salt)?;
        }
    }
    set_bytes(&out, "ciphertext", parsed.ciphertext())?;
    Ok(out.into())
}
