//! Cryptographic transforms applied to event payloads.
//!
//! Two layers:
//! - [`cipher`]: AES-256-CBC over whole payloads with a fresh random IV per call.
//!   Free of AWS dependencies.
//! - [`service`]: [`KeyCryptoService`], which adds KMS envelope encryption on top
//!   of the cipher and is the only type allowed to hold the KMS handle.
//!
//! # Envelope format
//!
//! ```text
//! {"ciphertext":"<base64>","iv":"<base64>"}
//! ```
//!
//! The JSON envelope is then wrapped with KMS `Encrypt` and base64-encoded
//! before it reaches the stream.

pub mod cipher;
pub mod error;
pub mod key;
pub mod service;

pub use cipher::{IV_LEN, KEY_LEN};
pub use error::CryptoBackendError;
pub use key::StreamKey;
pub use service::{KeyCryptoService, KeyManagement};
