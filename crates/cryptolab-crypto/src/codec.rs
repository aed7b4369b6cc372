//! Byte ⇄ text codecs used by the envelope format and the encode panel.

use base64ct::{Base64, Encoding};

use crate::error::CryptoError;

/// Lowercase hex encoding.
pub fn bytes_to_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Decode hex, tolerating a leading `0x` and any embedded whitespace.
pub fn hex_to_bytes(input: &str) -> Result<Vec<u8>, CryptoError> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let clean: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if clean.len() % 2 != 0 {
        return Err(CryptoError::OddHexLength(clean.len()));
    }
    hex::decode(&clean).map_err(|e| CryptoError::InvalidHex(e.to_string()))
}

/// Standard (padded) base64 encoding.
pub fn bytes_to_base64(data: &[u8]) -> String {
    Base64::encode_string(data)
}

/// Decode standard base64, tolerating a `data:<mime>;base64,` prefix and whitespace.
pub fn base64_to_bytes(input: &str) -> Result<Vec<u8>, CryptoError> {
    let trimmed = input.trim();
    let body = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, payload)| payload)
            .ok_or_else(|| CryptoError::InvalidBase64("data URL is not base64".into()))?,
        None => trimmed,
    };
    let clean: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    Base64::decode_vec(&clean).map_err(|e| CryptoError::InvalidBase64(e.to_string()))
}

/// True when every character is a hex digit and the digit count is even.
pub fn looks_like_hex(input: &str) -> bool {
    let digits: Vec<char> = input.chars().filter(|c| !c.is_whitespace()).collect();
    !digits.is_empty() && digits.len() % 2 == 0 && digits.iter().all(|c| c.is_ascii_hexdigit())
}
