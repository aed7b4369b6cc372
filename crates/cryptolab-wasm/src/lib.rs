//! WASM bindings for the image encryption lab.
//!
//! Exposes the codecs, the raw cipher and KDF primitives, and the
//! `ImageCryptoLab` session object via wasm-bindgen for the browser page.

pub mod codec;
pub mod crypto;
mod error;
pub mod lab;
pub mod limiter;
