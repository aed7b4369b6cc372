pub mod codec;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod kdf;
pub mod padding;
pub mod types;
pub mod words;

pub use codec::{base64_to_bytes, bytes_to_base64, bytes_to_hex, hex_to_bytes, looks_like_hex};
pub use engine::{decrypt, encrypt};
pub use envelope::{
    decode_token, parse_envelope, parse_envelope_as, parse_salted, serialize_envelope,
    serialize_salted, Envelope, ParsedEnvelope, SaltedEnvelope, SALTED_MAGIC,
};
pub use error::CryptoError;
pub use kdf::{
    derive_for_params, derive_key_and_iv, derive_legacy_key_and_iv, random_bytes, DerivedKey,
    LEGACY_SALT_SIZE,
};
pub use padding::{pad, unpad};
pub use types::{
    Algorithm, CipherMode, CipherParameters, CiphertextEncoding, EnvelopeFormat, KdfHash,
    PaddingScheme, AES_BLOCK_SIZE, DEFAULT_ITERATIONS, DEFAULT_IV_SIZE, DEFAULT_SALT_SIZE,
    DES_BLOCK_SIZE, MAX_ITERATIONS, MAX_IV_SIZE, MAX_SALT_SIZE, MIN_ITERATIONS, MIN_IV_SIZE,
};
pub use words::WordArray;
