//! Share session protocol
//!
//! One share moves one encrypted payload from a sender to a receiver.
//! The exchange is three causal steps over an already-connected
//! transport:
//!
//! 1. the receiver generates a key pair and publishes the encoded
//!    public half ([`ShareMessage::KeyOffer`])
//! 2. the sender decodes the key, encrypts the payload under it and
//!    sends the ciphertext back ([`ShareMessage::Payload`])
//! 3. the receiver decrypts with the private half, which never leaves
//!    its process
//!
//! Frames are opcode-tagged binary messages with a version byte, one
//! frame per transport message.

use thiserror::Error;

use crate::crypto::{Cipher, CipherSuite, CryptoError, KeyPair, PublicKey};
use crate::transport::{Transport, TransportError};

/// Wire protocol version carried in every frame
const PROTOCOL_VERSION: u8 = 0;

/// Errors that can occur during a share exchange
#[derive(Error, Debug)]
pub enum ShareError {
    /// A cryptographic operation failed
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The underlying transport failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The peer sent a valid frame at the wrong point in the exchange
    #[error("peer sent an unexpected message")]
    UnexpectedMessage,

    /// The peer speaks a different protocol version
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u8),

    /// The frame could not be parsed
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// The peer gave up on the exchange
    #[error("peer aborted the share: {0}")]
    Aborted(String),
}

/// Result type for share exchanges
pub type ShareResult<T> = Result<T, ShareError>;

/// Protocol frames exchanged through a share
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShareMessage {
    /// The receiver's encoded public key, sent right after joining
    KeyOffer {
        /// SubjectPublicKeyInfo DER blob
        key: Vec<u8>,
    },

    /// The encrypted payload from the sender
    Payload {
        /// Raw OAEP ciphertext, exactly one key length long
        ciphertext: Vec<u8>,
    },

    /// Either end giving up on the exchange
    Abort {
        /// Human-readable reason, shown to the other end
        reason: String,
    },
}

impl ShareMessage {
    /// Serialize the frame to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();

        match self {
            ShareMessage::KeyOffer { key } => {
                bytes.push(0x01); // Opcode
                bytes.push(PROTOCOL_VERSION);
                bytes.extend_from_slice(&(key.len() as u16).to_le_bytes());
                bytes.extend_from_slice(key);
            }
            ShareMessage::Payload { ciphertext } => {
                bytes.push(0x02);
                bytes.push(PROTOCOL_VERSION);
                bytes.extend_from_slice(&(ciphertext.len() as u32).to_le_bytes());
                bytes.extend_from_slice(ciphertext);
            }
            ShareMessage::Abort { reason } => {
                bytes.push(0xFF);
                bytes.push(PROTOCOL_VERSION);
                let reason_bytes = reason.as_bytes();
                bytes.extend_from_slice(&(reason_bytes.len() as u16).to_le_bytes());
                bytes.extend_from_slice(reason_bytes);
            }
        }

        bytes
    }

    /// Deserialize a frame from bytes
    pub fn from_bytes(bytes: &[u8]) -> ShareResult<Self> {
        if bytes.len() < 2 {
            return Err(ShareError::InvalidFrame("frame too short".to_string()));
        }

        let opcode = bytes[0];
        let version = bytes[1];
        if version != PROTOCOL_VERSION {
            return Err(ShareError::UnsupportedVersion(version));
        }
        let rest = &bytes[2..];

        match opcode {
            0x01 => {
                let (key, _) = read_vec16(rest)?;
                Ok(ShareMessage::KeyOffer { key })
            }
            0x02 => {
                let (ciphertext, _) = read_vec32(rest)?;
                Ok(ShareMessage::Payload { ciphertext })
            }
            0xFF => {
                let (reason_bytes, _) = read_vec16(rest)?;
                let reason = String::from_utf8(reason_bytes)
                    .map_err(|e| ShareError::InvalidFrame(e.to_string()))?;
                Ok(ShareMessage::Abort { reason })
            }
            _ => Err(ShareError::InvalidFrame(format!(
                "unknown opcode {:#x}",
                opcode
            ))),
        }
    }
}

/// Helper: read a length-prefixed vector (16-bit length)
fn read_vec16(bytes: &[u8]) -> ShareResult<(Vec<u8>, &[u8])> {
    if bytes.len() < 2 {
        return Err(ShareError::InvalidFrame("not enough data".to_string()));
    }

    let len = u16::from_le_bytes([bytes[0], bytes[1]]) as usize;
    let rest = &bytes[2..];

    if rest.len() < len {
        return Err(ShareError::InvalidFrame("not enough data".to_string()));
    }

    Ok((rest[..len].to_vec(), &rest[len..]))
}

/// Helper: read a length-prefixed vector (32-bit length)
fn read_vec32(bytes: &[u8]) -> ShareResult<(Vec<u8>, &[u8])> {
    if bytes.len() < 4 {
        return Err(ShareError::InvalidFrame("not enough data".to_string()));
    }

    let len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let rest = &bytes[4..];

    if rest.len() < len {
        return Err(ShareError::InvalidFrame("not enough data".to_string()));
    }

    Ok((rest[..len].to_vec(), &rest[len..]))
}

/// Sender half of the exchange
///
/// Waits for the receiver's key offer, encrypts the payload under the
/// offered key and pushes the ciphertext back. If encryption is
/// rejected (for example the payload does not fit in one block), a
/// [`ShareMessage::Abort`] is sent so the receiver is not left
/// waiting, and the error is surfaced to the caller.
pub async fn deliver<T: Transport>(
    transport: &mut T,
    suite: &CipherSuite,
    payload: &[u8],
) -> ShareResult<()> {
    let frame = transport.receive().await?;
    let key = match ShareMessage::from_bytes(&frame)? {
        ShareMessage::KeyOffer { key } => PublicKey::decode(suite, &key)?,
        ShareMessage::Abort { reason } => return Err(ShareError::Aborted(reason)),
        _ => return Err(ShareError::UnexpectedMessage),
    };

    let ciphertext = match Cipher::encrypt(&key, payload) {
        Ok(ciphertext) => ciphertext,
        Err(err) => {
            let abort = ShareMessage::Abort {
                reason: err.to_string(),
            };
            let _ = transport.send(&abort.to_bytes()).await;
            return Err(err.into());
        }
    };

    transport
        .send(&ShareMessage::Payload { ciphertext }.to_bytes())
        .await?;

    Ok(())
}

/// Receiver half of the exchange
///
/// Generates a fresh key pair, publishes the public half through the
/// share and decrypts the payload that comes back. The private key
/// lives only inside this call.
pub async fn accept<T: Transport>(transport: &mut T, suite: &CipherSuite) -> ShareResult<Vec<u8>> {
    let pair = KeyPair::generate(suite)?;

    let offer = ShareMessage::KeyOffer {
        key: pair.encode_public_key(),
    };
    transport.send(&offer.to_bytes()).await?;

    let frame = transport.receive().await?;
    match ShareMessage::from_bytes(&frame)? {
        ShareMessage::Payload { ciphertext } => {
            Ok(Cipher::decrypt(pair.private_key(), &ciphertext)?)
        }
        ShareMessage::Abort { reason } => Err(ShareError::Aborted(reason)),
        _ => Err(ShareError::UnexpectedMessage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::OaepHash;
    use crate::transport::memory;

    fn test_suite() -> CipherSuite {
        CipherSuite::new(1024, OaepHash::Sha256)
    }

    #[tokio::test]
    async fn test_deliver_accept_roundtrip() {
        let (mut sender, mut receiver) = memory::create_pair();
        let suite = test_suite();
        let payload = b"the quick brown fox".to_vec();

        let (sent, received) = tokio::join!(
            deliver(&mut sender, &suite, &payload),
            accept(&mut receiver, &suite),
        );

        sent.unwrap();
        assert_eq!(received.unwrap(), payload);
    }

    #[tokio::test]
    async fn test_oversized_payload_aborts_both_ends() {
        let (mut sender, mut receiver) = memory::create_pair();
        let suite = test_suite();
        let payload = vec![0u8; suite.max_payload() + 1];

        let (sent, received) = tokio::join!(
            deliver(&mut sender, &suite, &payload),
            accept(&mut receiver, &suite),
        );

        assert!(matches!(
            sent,
            Err(ShareError::Crypto(CryptoError::PayloadTooLarge { .. }))
        ));
        assert!(matches!(received, Err(ShareError::Aborted(_))));
    }

    #[tokio::test]
    async fn test_deliver_rejects_wrong_first_message() {
        let (mut sender, mut other) = memory::create_pair();
        let suite = test_suite();

        let frame = ShareMessage::Payload {
            ciphertext: vec![0; 16],
        };
        other.send(&frame.to_bytes()).await.unwrap();

        let result = deliver(&mut sender, &suite, b"data").await;
        assert!(matches!(result, Err(ShareError::UnexpectedMessage)));
    }

    #[tokio::test]
    async fn test_deliver_surfaces_peer_abort() {
        let (mut sender, mut other) = memory::create_pair();
        let suite = test_suite();

        let frame = ShareMessage::Abort {
            reason: "changed my mind".to_string(),
        };
        other.send(&frame.to_bytes()).await.unwrap();

        let result = deliver(&mut sender, &suite, b"data").await;
        assert!(matches!(result, Err(ShareError::Aborted(reason)) if reason == "changed my mind"));
    }

    #[test]
    fn test_frame_roundtrip() {
        let messages = vec![
            ShareMessage::KeyOffer {
                key: vec![1, 2, 3, 4],
            },
            ShareMessage::Payload {
                ciphertext: vec![0; 128],
            },
            ShareMessage::Abort {
                reason: "goodbye".to_string(),
            },
        ];

        for msg in messages {
            let restored = ShareMessage::from_bytes(&msg.to_bytes()).unwrap();
            assert_eq!(restored, msg);
        }
    }

    #[test]
    fn test_frame_rejects_unknown_version() {
        let mut bytes = ShareMessage::KeyOffer { key: vec![1] }.to_bytes();
        bytes[1] = 9;

        let result = ShareMessage::from_bytes(&bytes);
        assert!(matches!(result, Err(ShareError::UnsupportedVersion(9))));
    }

    #[test]
    fn test_frame_rejects_unknown_opcode() {
        let result = ShareMessage::from_bytes(&[0x42, PROTOCOL_VERSION, 0, 0]);
        assert!(matches!(result, Err(ShareError::InvalidFrame(_))));
    }

    #[test]
    fn test_frame_rejects_truncation() {
        let bytes = ShareMessage::Payload {
            ciphertext: vec![0; 128],
        }
        .to_bytes();

        let result = ShareMessage::from_bytes(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(ShareError::InvalidFrame(_))));

        let result = ShareMessage::from_bytes(&[]);
        assert!(matches!(result, Err(ShareError::InvalidFrame(_))));
    }
}
