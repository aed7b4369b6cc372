//! Block padding applied before every mode, stream modes included, so the
//! output is byte-compatible with CryptoJS which pads CFB/OFB/CTR as well.

use block_padding::{AnsiX923, Iso7816, Pkcs7, RawPadding, ZeroPadding};

use crate::error::CryptoError;
use crate::types::PaddingScheme;

/// Pad `data` to a multiple of `block_size`.
///
/// `NoPadding` requires aligned input. `ZeroPadding` adds nothing to aligned
/// input; every other scheme always appends between 1 and `block_size` bytes.
pub fn pad(data: &[u8], block_size: usize, scheme: PaddingScheme) -> Result<Vec<u8>, CryptoError> {
    match scheme {
        PaddingScheme::NoPadding => {
            if data.len() % block_size != 0 {
                return Err(CryptoError::UnsupportedPadding(format!(
                    "NoPadding needs a multiple of {block_size} bytes, got {}",
                    data.len()
                )));
            }
            Ok(data.to_vec())
        }
        PaddingScheme::ZeroPadding if data.len() % block_size == 0 => Ok(data.to_vec()),
        PaddingScheme::ZeroPadding => Ok(pad_with::<ZeroPadding>(data, block_size)),
        PaddingScheme::Pkcs7 => Ok(pad_with::<Pkcs7>(data, block_size)),
        PaddingScheme::AnsiX923 => Ok(pad_with::<AnsiX923>(data, block_size)),
        PaddingScheme::Iso97971 => Ok(pad_with::<Iso7816>(data, block_size)),
    }
}

/// Strip padding from decrypted data. Any structural problem is reported as
/// [`CryptoError::DecryptionFailed`] and nothing else.
pub fn unpad(data: &[u8], block_size: usize, scheme: PaddingScheme) -> Result<Vec<u8>, CryptoError> {
    if data.len() % block_size != 0 {
        return Err(CryptoError::DecryptionFailed);
    }
    match scheme {
        PaddingScheme::NoPadding => Ok(data.to_vec()),
        PaddingScheme::ZeroPadding => unpad_with::<ZeroPadding>(data, block_size),
        PaddingScheme::Pkcs7 => unpad_with::<Pkcs7>(data, block_size),
        PaddingScheme::AnsiX923 => unpad_with::<AnsiX923>(data, block_size),
        PaddingScheme::Iso97971 => unpad_with::<Iso7816>(data, block_size),
    }
}

fn pad_with<P: RawPadding>(data: &[u8], block_size: usize) -> Vec<u8> {
    let full = data.len() - data.len() % block_size;
    let tail = &data[full..];
    let mut last = vec![0u8; block_size];
    last[..tail.len()].copy_from_slice(tail);
    P::raw_pad(&mut last, tail.len());

    let mut out = Vec::with_capacity(full + block_size);
    out.extend_from_slice(&data[..full]);
    out.extend_from_slice(&last);
    out
}

fn unpad_with<P: RawPadding>(data: &[u8], block_size: usize) -> Result<Vec<u8>, CryptoError> {
    if data.is_empty() {
        return Err(CryptoError::DecryptionFailed);
    }
    let last_start = data.len() - block_size;
    let kept = P::raw_unpad(&data[last_start..])
        .map_err(|_| CryptoError::DecryptionFailed)?
        .len();
    Ok(data[..last_start + kept].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pkcs7_pads_partial_block() {
        let padded = pad(b"hello image bytes", 16, PaddingScheme::Pkcs7).unwrap();
        assert_eq!(padded.len(), 32);
        assert!(padded[17..].iter().all(|&b| b == 15));
        assert_eq!(unpad(&padded, 16, PaddingScheme::Pkcs7).unwrap(), b"hello image bytes");
    }

    #[test]
    fn pkcs7_adds_full_block_when_aligned() {
        let padded = pad(&[7u8; 8], 8, PaddingScheme::Pkcs7).unwrap();
        assert_eq!(padded.len(), 16);
        assert_eq!(&padded[8..], &[8u8; 8]);
    }

    #[test]
    fn pkcs7_empty_input_is_one_block() {
        let padded = pad(&[], 16, PaddingScheme::Pkcs7).unwrap();
        assert_eq!(padded, vec![16u8; 16]);
        assert!(unpad(&padded, 16, PaddingScheme::Pkcs7).unwrap().is_empty());
    }

    #[test]
    fn no_padding_requires_alignment() {
        assert!(matches!(
            pad(&[1, 2, 3], 8, PaddingScheme::NoPadding),
            Err(CryptoError::UnsupportedPadding(_))
        ));
        assert_eq!(pad(&[0u8; 16], 16, PaddingScheme::NoPadding).unwrap(), vec![0u8; 16]);
    }

    #[test]
    fn zero_padding_leaves_aligned_input_alone() {
        assert_eq!(pad(&[1u8; 8], 8, PaddingScheme::ZeroPadding).unwrap(), vec![1u8; 8]);
        let padded = pad(&[1, 2, 3], 8, PaddingScheme::ZeroPadding).unwrap();
        assert_eq!(padded, vec![1, 2, 3, 0, 0, 0, 0, 0]);
        assert_eq!(unpad(&padded, 8, PaddingScheme::ZeroPadding).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn ansi_and_iso_round_trip() {
        for scheme in [PaddingScheme::AnsiX923, PaddingScheme::Iso97971] {
            let padded = pad(b"abcde", 8, scheme).unwrap();
            assert_eq!(padded.len(), 8);
            assert_eq!(unpad(&padded, 8, scheme).unwrap(), b"abcde");
        }
        assert_eq!(
            pad(b"abcde", 8, PaddingScheme::AnsiX923).unwrap(),
            vec![b'a', b'b', b'c', b'd', b'e', 0, 0, 3]
        );
        assert_eq!(
            pad(b"abcde", 8, PaddingScheme::Iso97971).unwrap(),
            vec![b'a', b'b', b'c', b'd', b'e', 0x80, 0, 0]
        );
    }

    #[test]
    fn malformed_padding_is_a_generic_failure() {
        let mut block = vec![0u8; 16];
        block[15] = 0x20;
        assert_eq!(
            unpad(&block, 16, PaddingScheme::Pkcs7).unwrap_err(),
            CryptoError::DecryptionFailed
        );
        assert_eq!(
            unpad(&[1u8; 15], 16, PaddingScheme::Pkcs7).unwrap_err(),
            CryptoError::DecryptionFailed
        );
        assert_eq!(
            unpad(&[], 16, PaddingScheme::Pkcs7).unwrap_err(),
            CryptoError::DecryptionFailed
        );
    }
}
