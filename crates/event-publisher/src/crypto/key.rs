//! [`StreamKey`]: the per-stream AES-256 key held in process memory.

use super::cipher::KEY_LEN;
use super::error::CryptoBackendError;

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// Resolved once at startup by unwrapping the configured KMS blob and then
/// only ever borrowed. The buffer is overwritten with zeroes on drop.
#[derive(Clone)]
pub struct StreamKey(Box<[u8; KEY_LEN]>);

impl StreamKey {
    /// Copy `bytes` into a new key buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoBackendError::InvalidKeyLength`] if `bytes` is not
    /// [`KEY_LEN`] bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoBackendError> {
        if bytes.len() != KEY_LEN {
            return Err(CryptoBackendError::InvalidKeyLength(bytes.len()));
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Drop for StreamKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for StreamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StreamKey([REDACTED])")
    }
}
