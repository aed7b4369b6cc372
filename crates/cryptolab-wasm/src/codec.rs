//! WASM bindings for the text codecs, word arrays and MIME sniffing.

use crate::error::{to_js_error, to_js_value};
use cryptolab_core::{detect_mime, extension_for_mime};
use cryptolab_crypto::{base64_to_bytes, bytes_to_base64, bytes_to_hex, hex_to_bytes, WordArray};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(js_name = "bytesToHex")]
pub fn wasm_bytes_to_hex(data: &[u8]) -> String {
    bytes_to_hex(data)
}

#[wasm_bindgen(js_name = "hexToBytes")]
pub fn wasm_hex_to_bytes(input: &str) -> Result<Vec<u8>, JsValue> {
    hex_to_bytes(input).map_err(to_js_error)
}

#[wasm_bindgen(js_name = "bytesToBase64")]
pub fn wasm_bytes_to_base64(data: &[u8]) -> String {
    bytes_to_base64(data)
}

#[wasm_bindgen(js_name = "base64ToBytes")]
pub fn wasm_base64_to_bytes(input: &str) -> Result<Vec<u8>, JsValue> {
    base64_to_bytes(input).map_err(to_js_error)
}

// --- Word arrays ---

/// `{ words, sigBytes }` in the shape `CryptoJS.lib.WordArray.create` takes.
#[wasm_bindgen(js_name = "bytesToWordArray")]
pub fn wasm_bytes_to_word_array(data: &[u8]) -> Result<JsValue, JsValue> {
    to_js_value(&WordArray::from_bytes(data))
}

/// Accepts any `{ words, sigBytes }` object, including a CryptoJS WordArray.
#[wasm_bindgen(js_name = "wordArrayToBytes")]
pub fn wasm_word_array_to_bytes(word_array: JsValue) -> Result<Vec<u8>, JsValue> {
    if word_array.is_undefined() || word_array.is_null() {
        return Ok(Vec::new());
    }
    let word_array: WordArray = serde_wasm_bindgen::from_value(word_array).map_err(to_js_error)?;
    Ok(word_array.to_bytes())
}

// --- MIME ---

#[wasm_bindgen(js_name = "detectMime")]
pub fn wasm_detect_mime(data: &[u8]) -> String {
    detect_mime(data).to_string()
}

#[wasm_bindgen(js_name = "extensionForMime")]
pub fn wasm_extension_for_mime(mime: &str) -> String {
    extension_for_mime(mime).to_string()
}
