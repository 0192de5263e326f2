//! Cryptographic error types

use thiserror::Error;

/// Errors that can occur in cryptographic operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The encoded blob could not be parsed as a public key of the
    /// expected algorithm and parameters
    #[error("encoded blob is not a valid RSA public key for this suite")]
    MalformedKey,

    /// The plaintext does not fit in a single OAEP block for the
    /// configured key length
    #[error("payload of {actual} bytes exceeds the {limit} byte block capacity")]
    PayloadTooLarge {
        /// Largest payload the suite can encrypt
        limit: usize,
        /// Size of the rejected payload
        actual: usize,
    },

    /// The ciphertext did not decrypt under the supplied private key
    ///
    /// Carries no detail on purpose: wrong key, corrupted bytes and
    /// truncated input all surface as this same variant.
    #[error("decryption failed")]
    DecryptionFailed,

    /// The system randomness source or the RSA implementation could
    /// not produce a key pair
    #[error("key generation failed: {0}")]
    KeyGenerationFailed(String),
}

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;
