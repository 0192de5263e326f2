//! Cipher parameter configuration
//!
//! Both ends of a share must run the exact same RSA-OAEP parameters,
//! so they live in a single value constructed once at startup and
//! passed explicitly to key generation, key decoding and the cipher.
//! Tests swap in smaller moduli without touching any call site.

use rsa::Oaep;
use sha2::{Sha256, Sha512};

/// Hash function used inside the OAEP padding scheme
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OaepHash {
    /// SHA-256 (32 byte digest)
    Sha256,
    /// SHA-512 (64 byte digest)
    Sha512,
}

impl OaepHash {
    /// Digest length in bytes
    pub const fn digest_len(&self) -> usize {
        match self {
            OaepHash::Sha256 => 32,
            OaepHash::Sha512 => 64,
        }
    }

    /// Build the padding for one encrypt or decrypt call
    pub(crate) fn padding(&self) -> Oaep {
        match self {
            OaepHash::Sha256 => Oaep::new::<Sha256>(),
            OaepHash::Sha512 => Oaep::new::<Sha512>(),
        }
    }
}

/// Fixed RSA-OAEP parameter set shared by both peers
///
/// The public exponent is always 65537. Every key generated, decoded
/// or used under a suite is bound to that suite's modulus length and
/// hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CipherSuite {
    modulus_bits: usize,
    hash: OaepHash,
}

impl CipherSuite {
    /// Create a suite from an RSA modulus length in bits and an OAEP hash
    pub const fn new(modulus_bits: usize, hash: OaepHash) -> Self {
        CipherSuite { modulus_bits, hash }
    }

    /// Modulus length in bits
    pub const fn modulus_bits(&self) -> usize {
        self.modulus_bits
    }

    /// OAEP hash function
    pub const fn hash(&self) -> OaepHash {
        self.hash
    }

    /// Key length in bytes; also the exact ciphertext length
    pub const fn key_len(&self) -> usize {
        self.modulus_bits / 8
    }

    /// Largest plaintext that fits in a single OAEP block
    pub const fn max_payload(&self) -> usize {
        self.key_len().saturating_sub(2 * self.hash.digest_len() + 2)
    }
}

impl Default for CipherSuite {
    /// The production parameters: 4096-bit modulus with SHA-512
    fn default() -> Self {
        CipherSuite::new(4096, OaepHash::Sha512)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_suite_dimensions() {
        let suite = CipherSuite::default();
        assert_eq!(suite.modulus_bits(), 4096);
        assert_eq!(suite.hash(), OaepHash::Sha512);
        assert_eq!(suite.key_len(), 512);
        assert_eq!(suite.max_payload(), 382);
    }

    #[test]
    fn test_small_suite_dimensions() {
        let suite = CipherSuite::new(1024, OaepHash::Sha256);
        assert_eq!(suite.key_len(), 128);
        assert_eq!(suite.max_payload(), 62);
    }

    #[test]
    fn test_degenerate_suite_has_no_capacity() {
        // Modulus too small for the hash: capacity saturates to zero
        // instead of wrapping.
        let suite = CipherSuite::new(512, OaepHash::Sha512);
        assert_eq!(suite.max_payload(), 0);
    }
}
