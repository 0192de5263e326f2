//! RSA key material
//!
//! A key pair is generated as a unit and its halves stay linked for
//! their whole lifetime. Only the public half has a wire encoding
//! (SubjectPublicKeyInfo DER), and producing that encoding requires
//! the [`KeyPair`] itself: a [`PublicKey`] decoded from the wire can
//! never be re-encoded, and no API exists to serialize a
//! [`PrivateKey`] at all.

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use super::error::{CryptoError, CryptoResult};
use super::suite::CipherSuite;

/// A public key, usable for encryption only
///
/// Obtained either from a locally generated [`KeyPair`] or by decoding
/// the peer's SubjectPublicKeyInfo blob with [`PublicKey::decode`].
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    key: RsaPublicKey,
    suite: CipherSuite,
}

impl PublicKey {
    /// Parse a SubjectPublicKeyInfo DER blob received from the peer
    ///
    /// The blob must carry the RSA algorithm identifier and a modulus
    /// of the suite's length; anything else is
    /// [`CryptoError::MalformedKey`]. The returned key is import-only:
    /// it can encrypt but has no encoding method.
    pub fn decode(suite: &CipherSuite, blob: &[u8]) -> CryptoResult<Self> {
        let key = RsaPublicKey::from_public_key_der(blob).map_err(|_| CryptoError::MalformedKey)?;

        if key.size() != suite.key_len() {
            return Err(CryptoError::MalformedKey);
        }

        Ok(PublicKey { key, suite: *suite })
    }

    /// Short hex fingerprint of the modulus, for display
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.key.n().to_bytes_be());
        hex::encode(&digest[..8])
    }

    pub(crate) fn material(&self) -> &RsaPublicKey {
        &self.key
    }

    pub(crate) fn suite(&self) -> &CipherSuite {
        &self.suite
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({}...)", self.fingerprint())
    }
}

/// The private half of a key pair, usable for decryption only
///
/// Never serialized, exported or transmitted; the underlying RSA
/// implementation wipes the material when the key is dropped.
pub struct PrivateKey {
    key: RsaPrivateKey,
    suite: CipherSuite,
}

impl PrivateKey {
    pub(crate) fn material(&self) -> &RsaPrivateKey {
        &self.key
    }

    pub(crate) fn suite(&self) -> &CipherSuite {
        &self.suite
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        write!(f, "PrivateKey")
    }
}

/// A linked public/private key pair generated as a unit
///
/// The two halves are mathematically bound to the generation event;
/// mixing halves from different pairs makes decryption fail.
pub struct KeyPair {
    public: PublicKey,
    private: PrivateKey,
}

impl KeyPair {
    /// Generate a fresh key pair with the suite's modulus length
    ///
    /// Draws from the operating system entropy source. Failure means
    /// the environment cannot produce keys at all; it is surfaced once
    /// and never retried internally.
    pub fn generate(suite: &CipherSuite) -> CryptoResult<Self> {
        let private = RsaPrivateKey::new(&mut OsRng, suite.modulus_bits())
            .map_err(|e| CryptoError::KeyGenerationFailed(e.to_string()))?;
        let public = private.to_public_key();

        Ok(KeyPair {
            public: PublicKey {
                key: public,
                suite: *suite,
            },
            private: PrivateKey {
                key: private,
                suite: *suite,
            },
        })
    }

    /// The public half, for local encryption
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// The private half, for decryption
    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    /// Encode the public half as SubjectPublicKeyInfo DER
    ///
    /// Deterministic for a given pair. This is the only way to produce
    /// the wire encoding, so only the peer that generated a key can
    /// publish it.
    pub fn encode_public_key(&self) -> Vec<u8> {
        self.public
            .key
            .to_public_key_der()
            .expect("DER encoding of a generated RSA key cannot fail")
            .into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::suite::OaepHash;

    fn test_suite() -> CipherSuite {
        CipherSuite::new(1024, OaepHash::Sha256)
    }

    #[test]
    fn test_generation_is_unique() {
        let a = KeyPair::generate(&test_suite()).unwrap();
        let b = KeyPair::generate(&test_suite()).unwrap();

        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let pair = KeyPair::generate(&test_suite()).unwrap();

        assert_eq!(pair.encode_public_key(), pair.encode_public_key());
    }

    #[test]
    fn test_decode_roundtrip() {
        let pair = KeyPair::generate(&test_suite()).unwrap();

        let blob = pair.encode_public_key();
        let decoded = PublicKey::decode(&test_suite(), &blob).unwrap();

        assert_eq!(&decoded, pair.public_key());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let blob: Vec<u8> = (0..128).map(|_| rand::random()).collect();

        let result = PublicKey::decode(&test_suite(), &blob);
        assert_eq!(result.unwrap_err(), CryptoError::MalformedKey);
    }

    #[test]
    fn test_decode_rejects_empty_blob() {
        let result = PublicKey::decode(&test_suite(), &[]);
        assert_eq!(result.unwrap_err(), CryptoError::MalformedKey);
    }

    #[test]
    fn test_decode_rejects_wrong_modulus_length() {
        let small = CipherSuite::new(512, OaepHash::Sha256);
        let pair = KeyPair::generate(&small).unwrap();

        let result = PublicKey::decode(&test_suite(), &pair.encode_public_key());
        assert_eq!(result.unwrap_err(), CryptoError::MalformedKey);
    }

    #[test]
    fn test_fingerprint_is_stable_across_decode() {
        let pair = KeyPair::generate(&test_suite()).unwrap();
        let decoded = PublicKey::decode(&test_suite(), &pair.encode_public_key()).unwrap();

        assert_eq!(pair.public_key().fingerprint(), decoded.fingerprint());
    }

    #[test]
    fn test_private_key_debug_hides_material() {
        let pair = KeyPair::generate(&test_suite()).unwrap();

        assert_eq!(format!("{:?}", pair.private_key()), "PrivateKey");
    }
}
