//! # Chute
//!
//! Peer-to-peer end-to-end encrypted file sharing through an untrusted
//! relay.
//!
//! ## How a share works
//!
//! The sender opens a share on the relay and hands the share code to
//! the receiver out of band. The receiver joins the share, generates
//! an RSA-OAEP key pair and publishes the public half through the
//! relay; the sender encrypts the payload under it and sends the
//! ciphertext back. The private key never leaves the receiver's
//! process, so the relay only ever carries a public key and
//! ciphertext.
//!
//! ## Quick Start
//!
//! ```rust
//! use chute::crypto::{Cipher, CipherSuite, KeyPair, OaepHash, PublicKey};
//!
//! # fn main() -> chute::crypto::CryptoResult<()> {
//! let suite = CipherSuite::new(1024, OaepHash::Sha256);
//!
//! // Receiver: generate a pair and publish the public half
//! let pair = KeyPair::generate(&suite)?;
//! let blob = pair.encode_public_key();
//!
//! // Sender: import the key and encrypt
//! let key = PublicKey::decode(&suite, &blob)?;
//! let ciphertext = Cipher::encrypt(&key, b"Hello World!")?;
//!
//! // Receiver: decrypt with the private half
//! assert_eq!(Cipher::decrypt(pair.private_key(), &ciphertext)?, b"Hello World!");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            APPLICATION LAYER                │
//! │       chute CLI  |  chute-relay             │
//! └─────────────────────┬───────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────┐
//! │             SESSION LAYER                   │
//! │   Share exchange (key offer / payload)      │
//! └─────────────────────┬───────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────┐
//! │              CRYPTO LAYER                   │
//! │   RSA-OAEP keys | SPKI codec | cipher       │
//! └─────────────────────┬───────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────┐
//! │             TRANSPORT LAYER                 │
//! │      WebSocket relay | in-memory            │
//! └─────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod crypto;
pub mod session;
pub mod transport;

// Re-export main types at crate root
pub use crypto::{
    Cipher, CipherSuite, CryptoError, CryptoResult, KeyPair, OaepHash, PrivateKey, PublicKey,
};
