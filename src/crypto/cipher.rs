//! RSA-OAEP Encryption
//!
//! Single-block asymmetric encryption: encrypt under the peer's public
//! key, decrypt under the matching private key. Both operations are
//! stateless, single-shot transformations.

use rand::rngs::OsRng;

use super::error::{CryptoError, CryptoResult};
use super::keys::{PrivateKey, PublicKey};

/// Asymmetric cipher over single OAEP blocks
pub struct Cipher;

impl Cipher {
    /// Encrypt a payload under a public key
    ///
    /// OAEP padding is randomized, so encrypting the same payload
    /// twice yields different ciphertexts that decrypt to the same
    /// bytes. The ciphertext is exactly the suite's key length, with
    /// no framing added.
    ///
    /// Payloads larger than [`CipherSuite::max_payload`] are rejected
    /// with [`CryptoError::PayloadTooLarge`] before any work is done.
    ///
    /// [`CipherSuite::max_payload`]: crate::crypto::CipherSuite::max_payload
    pub fn encrypt(key: &PublicKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let limit = key.suite().max_payload();
        if plaintext.len() > limit {
            return Err(CryptoError::PayloadTooLarge {
                limit,
                actual: plaintext.len(),
            });
        }

        let ciphertext = key
            .material()
            .encrypt(&mut OsRng, key.suite().hash().padding(), plaintext)
            .expect("OAEP encryption cannot fail once the payload fits");

        Ok(ciphertext)
    }

    /// Decrypt a ciphertext under the matching private key
    ///
    /// Every failure mode collapses into the single
    /// [`CryptoError::DecryptionFailed`] variant: the caller cannot
    /// tell a wrong key from corrupted or truncated input. A failed
    /// decrypt is final for that ciphertext.
    pub fn decrypt(key: &PrivateKey, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        key.material()
            .decrypt(key.suite().hash().padding(), ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}
