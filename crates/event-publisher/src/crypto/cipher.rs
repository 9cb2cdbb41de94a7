//! AES-256-CBC encryption and decryption of event payloads.
//!
//! Each call to [`encrypt`] draws a 16-byte IV from the OS CSPRNG, so the same
//! plaintext under the same key yields a different ciphertext and IV every time.
//! CBC carries no authentication tag; the KMS wrap applied downstream is what
//! makes tampering detectable.
//!
//! **Never reuse an IV with the same key.** Callers do not pass IVs in; keep it
//! that way.

use aes::Aes256;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use common::protocol::CipherEnvelope;
use rand::{rngs::OsRng, RngCore};

use super::error::CryptoBackendError;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of a CBC initialization vector (one AES block).
pub const IV_LEN: usize = 16;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Encrypt a UTF-8 payload under `key` with a fresh random IV.
///
/// # Errors
///
/// Returns [`CryptoBackendError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes.
pub fn encrypt(key: &[u8], plaintext: &str) -> Result<CipherEnvelope, CryptoBackendError> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new_from_slices(check_key(key)?, &iv)
        .map_err(|_| CryptoBackendError::InvalidKeyLength(key.len()))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    Ok(CipherEnvelope {
        ciphertext: STANDARD.encode(ciphertext),
        iv: STANDARD.encode(iv),
    })
}

/// Decrypt a base64 ciphertext produced by [`encrypt`].
///
/// # Errors
///
/// Returns a [`CryptoBackendError`] if the key or IV has the wrong length, either
/// input is not base64, the padding does not verify, or the plaintext is not UTF-8.
pub fn decrypt(key: &[u8], iv_b64: &str, ciphertext_b64: &str) -> Result<String, CryptoBackendError> {
    let key = check_key(key)?;

    let iv = STANDARD
        .decode(iv_b64)
        .map_err(|_| CryptoBackendError::InvalidBase64("iv"))?;
    if iv.len() != IV_LEN {
        return Err(CryptoBackendError::InvalidIvLength(iv.len()));
    }

    let ciphertext = STANDARD
        .decode(ciphertext_b64)
        .map_err(|_| CryptoBackendError::InvalidBase64("ciphertext"))?;

    let plaintext = Aes256CbcDec::new_from_slices(key, &iv)
        .map_err(|_| CryptoBackendError::InvalidKeyLength(key.len()))?
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| CryptoBackendError::Cipher)?;

    String::from_utf8(plaintext).map_err(|_| CryptoBackendError::InvalidUtf8)
}

fn check_key(key: &[u8]) -> Result<&[u8], CryptoBackendError> {
    if key.len() != KEY_LEN {
        return Err(CryptoBackendError::InvalidKeyLength(key.len()));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_key() -> Vec<u8> {
        let mut key = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    fn is_base64(s: &str) -> bool {
        !s.is_empty()
            && s.trim_end_matches('=')
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/')
    }

    #[test]
    fn hello_world_round_trip() {
        let key = random_key();
        let env = encrypt(&key, "Hello, World!").unwrap();
        assert!(is_base64(&env.ciphertext), "ciphertext: {}", env.ciphertext);
        assert!(is_base64(&env.iv), "iv: {}", env.iv);
        assert_eq!(decrypt(&key, &env.iv, &env.ciphertext).unwrap(), "Hello, World!");
    }

    #[test]
    fn round_trip_preserves_arbitrary_text() {
        let key = random_key();
        for s in ["", "a", "exactly sixteen!", "{\"a\":1}\n", "naïve café ☕ 日本語"] {
            let env = encrypt(&key, s).unwrap();
            assert_eq!(decrypt(&key, &env.iv, &env.ciphertext).unwrap(), s);
        }
    }

    #[test]
    fn same_input_yields_different_ciphertext_and_iv() {
        let key = random_key();
        let a = encrypt(&key, "Hello, World!").unwrap();
        let b = encrypt(&key, "Hello, World!").unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn iv_decodes_to_one_block() {
        let env = encrypt(&random_key(), "x").unwrap();
        assert_eq!(STANDARD.decode(&env.iv).unwrap().len(), IV_LEN);
        // PKCS#7 always pads to a whole block.
        assert_eq!(STANDARD.decode(&env.ciphertext).unwrap().len() % IV_LEN, 0);
    }

    #[test]
    fn invalid_key_length_rejected() {
        let short_key = vec![0u8; 16];
        assert!(matches!(
            encrypt(&short_key, "x"),
            Err(CryptoBackendError::InvalidKeyLength(16))
        ));
        assert!(matches!(
            decrypt(&short_key, "AAAAAAAAAAAAAAAAAAAAAA==", "AAAAAAAAAAAAAAAAAAAAAA=="),
            Err(CryptoBackendError::InvalidKeyLength(16))
        ));
    }

    #[test]
    fn short_iv_rejected() {
        let key = random_key();
        let env = encrypt(&key, "x").unwrap();
        let short_iv = STANDARD.encode([0u8; 8]);
        assert!(matches!(
            decrypt(&key, &short_iv, &env.ciphertext),
            Err(CryptoBackendError::InvalidIvLength(8))
        ));
    }

    #[test]
    fn bad_base64_rejected() {
        let key = random_key();
        let env = encrypt(&key, "x").unwrap();
        assert!(matches!(
            decrypt(&key, "!!!", &env.ciphertext),
            Err(CryptoBackendError::InvalidBase64("iv"))
        ));
        assert!(matches!(
            decrypt(&key, &env.iv, "not base64!"),
            Err(CryptoBackendError::InvalidBase64("ciphertext"))
        ));
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let key = random_key();
        let env = encrypt(&key, "a payload longer than one block").unwrap();
        let mut raw = STANDARD.decode(&env.ciphertext).unwrap();
        raw.truncate(raw.len() - 3);
        assert!(matches!(
            decrypt(&key, &env.iv, &STANDARD.encode(raw)),
            Err(CryptoBackendError::Cipher)
        ));
    }
}
