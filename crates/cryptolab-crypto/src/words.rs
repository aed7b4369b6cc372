//! Big-endian 32-bit word packing for interop with word-array based crypto
//! libraries running alongside the WASM module.
//!
//! Packing zero-fills the low-order side of the final partial word. The
//! significant byte count is tracked separately and is the only thing that
//! bounds unpacking, so padding introduced here never reaches the output.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordArray {
    #[serde(deserialize_with = "any_sign_words")]
    pub words: Vec<u32>,
    pub sig_bytes: usize,
}

/// JS bit operations yield signed 32-bit words; keep their bit pattern.
fn any_sign_words<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u32>, D::Error> {
    let words = Vec::<i64>::deserialize(deserializer)?;
    Ok(words.into_iter().map(|w| w as u32).collect())
}

impl WordArray {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let words = bytes
            .chunks(4)
            .map(|chunk| {
                let mut word = [0u8; 4];
                word[..chunk.len()].copy_from_slice(chunk);
                u32::from_be_bytes(word)
            })
            .collect();
        Self {
            words,
            sig_bytes: bytes.len(),
        }
    }

    /// Unpack to bytes. Positions past the end of `words` read as zero so a
    /// `sig_bytes` larger than the backing store cannot panic.
    pub fn to_bytes(&self) -> Vec<u8> {
        (0..self.sig_bytes)
            .map(|i| {
                let word = self.words.get(i / 4).copied().unwrap_or(0);
                (word >> (8 * (3 - (i % 4)))) as u8
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sig_bytes == 0
    }
}
