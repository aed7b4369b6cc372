//! Per-tab working state: the current image and the last decryption result.

use serde::Serialize;
use zeroize::Zeroize;

use crate::error::LabError;
use crate::mime::{detect_mime, extension_for_mime, is_image};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Sniffed from the bytes, never taken from the file name.
    pub mime: String,
}

impl LoadedImage {
    pub fn info(&self) -> ImageInfo {
        ImageInfo {
            name: self.name.clone(),
            mime: self.mime.clone(),
            size_bytes: self.bytes.len(),
            is_image: is_image(&self.mime),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub name: String,
    pub mime: String,
    pub size_bytes: usize,
    pub is_image: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl DecryptedImage {
    pub fn file_name(&self) -> String {
        format!("decrypted.{}", extension_for_mime(&self.mime))
    }
}

#[derive(Debug, Default)]
pub struct Session {
    current: Option<LoadedImage>,
    decrypted: Option<DecryptedImage>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, name: &str, bytes: Vec<u8>) -> ImageInfo {
        let name = match name.trim() {
            "" => "image".to_string(),
            n => n.to_string(),
        };
        let mime = detect_mime(&bytes).to_string();
        let image = LoadedImage { name, bytes, mime };
        let info = image.info();
        self.replace_current(Some(image));
        info
    }

    pub fn current(&self) -> Option<&LoadedImage> {
        self.current.as_ref()
    }

    pub fn decrypted(&self) -> Option<&DecryptedImage> {
        self.decrypted.as_ref()
    }

    pub fn set_decrypted(&mut self, bytes: Vec<u8>, mime: &str) {
        if let Some(old) = self.decrypted.as_mut() {
            old.bytes.zeroize();
        }
        self.decrypted = Some(DecryptedImage {
            bytes,
            mime: mime.to_string(),
        });
    }

    /// Make the last decrypted image the current one. Only image payloads
    /// can be promoted.
    pub fn promote_decrypted(&mut self) -> Result<ImageInfo, LabError> {
        let decrypted = self
            .decrypted
            .as_ref()
            .ok_or_else(|| LabError::InvalidParameter("nothing has been decrypted yet".into()))?;
        if !is_image(&decrypted.mime) {
            return Err(LabError::InvalidParameter(format!(
                "decrypted data is {}, not a supported image",
                decrypted.mime
            )));
        }
        let image = LoadedImage {
            name: decrypted.file_name(),
            bytes: decrypted.bytes.clone(),
            mime: decrypted.mime.clone(),
        };
        let info = image.info();
        self.replace_current(Some(image));
        Ok(info)
    }

    /// Drop everything, wiping byte buffers first.
    pub fn clear(&mut self) {
        self.replace_current(None);
        if let Some(mut old) = self.decrypted.take() {
            old.bytes.zeroize();
        }
    }

    fn replace_current(&mut self, image: Option<LoadedImage>) {
        if let Some(mut old) = std::mem::replace(&mut self.current, image) {
            old.bytes.zeroize();
        }
    }
}
