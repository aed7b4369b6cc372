//! Password-based image encryption: the orchestrator tying key derivation,
//! the cipher engine and the attempt limiter together, plus the session
//! state a single browser tab works on.

pub mod config;
pub mod error;
pub mod metadata;
pub mod mime;
pub mod orchestrator;
pub mod outcome;
pub mod session;

pub use config::{LabConfig, DEFAULT_MAX_PAYLOAD_BYTES};
pub use error::{ErrorKind, LabError};
pub use metadata::EncryptionMetadata;
pub use mime::{detect_mime, extension_for_mime, is_image};
pub use orchestrator::CryptoLab;
pub use outcome::{decryption_checklist, DecryptionOutcome, EncryptedImage};
pub use session::{DecryptedImage, ImageInfo, LoadedImage, Session};
