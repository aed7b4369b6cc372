//! Ciphertext envelope text formats.
//!
//! Two serializations are understood:
//! - `hex(salt):hex(iv):ciphertext` where the ciphertext is hex or base64.
//!   Empty salt and empty IV (ECB) keep their separators.
//! - The OpenSSL / CryptoJS single token `base64("Salted__" || salt[8] || ciphertext)`.
//!
//! [`decode_token`] picks the format from the token's structure alone: a
//! token containing a colon is a three-part envelope, anything else must
//! carry the `Salted__` header.

use crate::codec::{base64_to_bytes, bytes_to_base64, bytes_to_hex, hex_to_bytes, looks_like_hex};
use crate::error::CryptoError;
use crate::kdf::LEGACY_SALT_SIZE;
use crate::types::CiphertextEncoding;

/// Magic header of the salted single-token format.
pub const SALTED_MAGIC: &[u8; 8] = b"Salted__";

const SEPARATOR: char = ':';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub salt: Vec<u8>,
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    pub fn serialize(&self, encoding: CiphertextEncoding) -> String {
        serialize_envelope(&self.salt, &self.iv, &self.ciphertext, encoding)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaltedEnvelope {
    pub salt: [u8; LEGACY_SALT_SIZE],
    pub ciphertext: Vec<u8>,
}

impl SaltedEnvelope {
    pub fn serialize(&self) -> String {
        serialize_salted(&self.salt, &self.ciphertext)
    }
}

/// Result of format auto-detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEnvelope {
    Explicit(Envelope),
    Salted(SaltedEnvelope),
}

impl ParsedEnvelope {
    pub fn ciphertext(&self) -> &[u8] {
        match self {
            ParsedEnvelope::Explicit(env) => &env.ciphertext,
            ParsedEnvelope::Salted(env) => &env.ciphertext,
        }
    }
}

pub fn serialize_envelope(
    salt: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    encoding: CiphertextEncoding,
) -> String {
    let body = match encoding {
        CiphertextEncoding::Hex => bytes_to_hex(ciphertext),
        CiphertextEncoding::Base64 => bytes_to_base64(ciphertext),
    };
    format!("{}{SEPARATOR}{}{SEPARATOR}{body}", bytes_to_hex(salt), bytes_to_hex(iv))
}

/// Parse a three-part envelope, detecting the ciphertext encoding.
///
/// Detection cannot tell apart a base64 body that happens to use only hex
/// digits (`00000000` is both); such envelopes only round-trip through
/// [`parse_envelope_as`] with the encoding they were written in.
pub fn parse_envelope(token: &str) -> Result<Envelope, CryptoError> {
    parse_envelope_as(token, None)
}

/// Parse a three-part envelope. `encoding` overrides detection of the
/// ciphertext field: without a hint an even-length all-hex field is hex and
/// anything else is base64.
pub fn parse_envelope_as(
    token: &str,
    encoding: Option<CiphertextEncoding>,
) -> Result<Envelope, CryptoError> {
    let parts: Vec<&str> = token.trim().split(SEPARATOR).collect();
    let [salt, iv, body] = parts.as_slice() else {
        return Err(CryptoError::MalformedEnvelope(format!(
            "expected 3 colon-separated parts, got {}",
            parts.len()
        )));
    };

    let salt = decode_hex_field("salt", salt)?;
    let iv = decode_hex_field("IV", iv)?;

    let body = body.trim();
    if body.is_empty() {
        return Err(CryptoError::MalformedEnvelope("ciphertext is empty".into()));
    }
    let encoding = encoding.unwrap_or(if looks_like_hex(body) {
        CiphertextEncoding::Hex
    } else {
        CiphertextEncoding::Base64
    });
    let ciphertext = match encoding {
        CiphertextEncoding::Hex => decode_hex_field("ciphertext", body)?,
        CiphertextEncoding::Base64 => base64_to_bytes(body)
            .map_err(|e| CryptoError::MalformedEnvelope(format!("ciphertext: {e}")))?,
    };
    if ciphertext.is_empty() {
        return Err(CryptoError::MalformedEnvelope("ciphertext is empty".into()));
    }

    Ok(Envelope {
        salt,
        iv,
        ciphertext,
    })
}

fn decode_hex_field(name: &str, field: &str) -> Result<Vec<u8>, CryptoError> {
    hex_to_bytes(field).map_err(|e| CryptoError::MalformedEnvelope(format!("{name}: {e}")))
}

pub fn serialize_salted(salt: &[u8; LEGACY_SALT_SIZE], ciphertext: &[u8]) -> String {
    let mut raw = Vec::with_capacity(SALTED_MAGIC.len() + LEGACY_SALT_SIZE + ciphertext.len());
    raw.extend_from_slice(SALTED_MAGIC);
    raw.extend_from_slice(salt);
    raw.extend_from_slice(ciphertext);
    bytes_to_base64(&raw)
}

/// Parse a `Salted__` token.
pub fn parse_salted(token: &str) -> Result<SaltedEnvelope, CryptoError> {
    let raw = base64_to_bytes(token)
        .map_err(|e| CryptoError::MalformedEnvelope(format!("salted token: {e}")))?;
    let header_len = SALTED_MAGIC.len() + LEGACY_SALT_SIZE;
    if raw.len() < header_len || &raw[..SALTED_MAGIC.len()] != SALTED_MAGIC {
        return Err(CryptoError::MalformedEnvelope(
            "token has no colon separators and no Salted__ header".into(),
        ));
    }
    let mut salt = [0u8; LEGACY_SALT_SIZE];
    salt.copy_from_slice(&raw[SALTED_MAGIC.len()..header_len]);
    let ciphertext = raw[header_len..].to_vec();
    if ciphertext.is_empty() {
        return Err(CryptoError::MalformedEnvelope("ciphertext is empty".into()));
    }
    Ok(SaltedEnvelope { salt, ciphertext })
}

/// Classify and parse any envelope token.
pub fn decode_token(
    token: &str,
    encoding: Option<CiphertextEncoding>,
) -> Result<ParsedEnvelope, CryptoError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(CryptoError::MalformedEnvelope("envelope is empty".into()));
    }
    if token.contains(SEPARATOR) {
        parse_envelope_as(token, encoding).map(ParsedEnvelope::Explicit)
    } else {
        parse_salted(token).map(ParsedEnvelope::Salted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

    #[test]
    fn serializes_hex_and_base64() {
        let iv = [0xAAu8; 16];
        let ct = [0xDE, 0xAD, 0xBE, 0xEF];
        assert_eq!(
            serialize_envelope(&SALT, &iv, &ct, CiphertextEncoding::Hex),
            format!("0102030405060708:{}:deadbeef", "aa".repeat(16))
        );
        assert_eq!(
            serialize_envelope(&SALT, &iv, &ct, CiphertextEncoding::Base64),
            format!("0102030405060708:{}:3q2+7w==", "aa".repeat(16))
        );
    }

    #[test]
    fn round_trips_both_encodings() {
        let env = Envelope {
            salt: SALT.to_vec(),
            iv: vec![9u8; 16],
            ciphertext: (0u8..32).collect(),
        };
        for encoding in [CiphertextEncoding::Hex, CiphertextEncoding::Base64] {
            let text = env.serialize(encoding);
            assert_eq!(parse_envelope_as(&text, Some(encoding)).unwrap(), env);
            assert_eq!(parse_envelope(&text).unwrap(), env);
        }
    }

    #[test]
    fn empty_salt_and_iv_keep_separators() {
        let env = Envelope {
            salt: vec![],
            iv: vec![],
            ciphertext: vec![0x10; 16],
        };
        let text = env.serialize(CiphertextEncoding::Base64);
        assert!(text.starts_with("::"));
        assert_eq!(parse_envelope(&text).unwrap(), env);
    }

    #[test]
    fn rejects_wrong_part_count() {
        for token in ["aa:bb", "aa:bb:cc:dd", "aabb"] {
            assert!(matches!(
                parse_envelope(token),
                Err(CryptoError::MalformedEnvelope(_))
            ));
        }
    }

    #[test]
    fn rejects_odd_hex_and_empty_ciphertext() {
        assert!(matches!(
            parse_envelope("abc:00112233445566778899aabbccddeeff:AAAA"),
            Err(CryptoError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            parse_envelope("0102:0304:"),
            Err(CryptoError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            parse_envelope("0102:0304:   "),
            Err(CryptoError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn hint_overrides_detection() {
        // "deadbeef" is valid as both hex and base64.
        let as_hex = parse_envelope_as("::deadbeef", Some(CiphertextEncoding::Hex)).unwrap();
        assert_eq!(as_hex.ciphertext, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        let as_b64 = parse_envelope_as("::deadbeef", Some(CiphertextEncoding::Base64)).unwrap();
        assert_eq!(as_b64.ciphertext.len(), 6);
    }

    #[test]
    fn salted_round_trip() {
        let text = serialize_salted(&SALT, &[7u8; 16]);
        assert!(text.starts_with("U2FsdGVkX1"));
        let parsed = parse_salted(&text).unwrap();
        assert_eq!(parsed.salt, SALT);
        assert_eq!(parsed.ciphertext, vec![7u8; 16]);
    }

    #[test]
    fn parses_openssl_token() {
        // openssl enc -aes-256-cbc -md md5 -S 0102030405060708, header prepended
        let token = "U2FsdGVkX18BAgMEBQYHCM4Y1KdcvAKQo5XK49DjuDtAXBnf3utl/I4olR7OPX1W";
        let parsed = parse_salted(token).unwrap();
        assert_eq!(parsed.salt, SALT);
        assert_eq!(parsed.ciphertext.len(), 32);
    }

    #[test]
    fn salted_without_header_is_malformed() {
        let token = bytes_to_base64(b"NotSalt_12345678abcdefghabcdefgh");
        assert!(matches!(
            parse_salted(&token),
            Err(CryptoError::MalformedEnvelope(_))
        ));
        let header_only = serialize_salted(&SALT, &[]);
        assert!(matches!(
            parse_salted(&header_only),
            Err(CryptoError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn decode_token_classifies_by_colon() {
        let explicit = serialize_envelope(&SALT, &[0u8; 16], &[1u8; 16], CiphertextEncoding::Base64);
        assert!(matches!(
            decode_token(&explicit, None).unwrap(),
            ParsedEnvelope::Explicit(_)
        ));
        let salted = serialize_salted(&SALT, &[1u8; 16]);
        let parsed = decode_token(&format!("  {salted}\n"), None).unwrap();
        assert!(matches!(parsed, ParsedEnvelope::Salted(_)));
        assert_eq!(parsed.ciphertext(), &[1u8; 16]);
        assert!(matches!(
            decode_token("", None),
            Err(CryptoError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn hex_looking_base64_needs_the_hint() {
        let ciphertext = [211u8, 77, 52, 211, 77, 52];
        let text = serialize_envelope(&SALT, &[], &ciphertext, CiphertextEncoding::Base64);
        assert_eq!(text, "0102030405060708::00000000");
        assert_ne!(parse_envelope(&text).unwrap().ciphertext, ciphertext);
        assert_eq!(
            parse_envelope_as(&text, Some(CiphertextEncoding::Base64)).unwrap().ciphertext,
            ciphertext
        );
    }
}
