//! Cryptographic core for end-to-end encrypted shares
//!
//! This module provides the whole encryption surface of the crate:
//! - `suite`: the fixed RSA-OAEP parameter set shared by both peers
//! - `keys`: key pair generation and the public-key wire encoding
//! - `cipher`: single-block RSA-OAEP encrypt/decrypt
//! - `error`: the error surface of the above
//!
//! Nothing in here logs, retries or keeps state between calls; every
//! operation is a pure transformation whose failures surface
//! immediately to the caller.

pub mod cipher;
pub mod error;
pub mod keys;
pub mod suite;

// Re-export commonly used types
pub use cipher::Cipher;
pub use error::{CryptoError, CryptoResult};
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use suite::{CipherSuite, OaepHash};
