//! Transport layer abstraction
//!
//! The transport moves opaque bytes between the two ends of a share;
//! key encoding and encryption happen above it. Two implementations:
//! - In-memory channel pairs (for tests)
//! - WebSocket connections through a relay server
//!
//! # Design
//!
//! The transport is intentionally dumb: `send` bytes, `receive` bytes,
//! and a closed/error notification. It never inspects what it carries.

use async_trait::async_trait;
use thiserror::Error;

pub mod websocket;
pub use websocket::WebSocketTransport;

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed
    #[error("Connection closed")]
    Disconnected,

    /// Send failed
    #[error("Failed to send: {0}")]
    SendFailed(String),

    /// Receive failed
    #[error("Failed to receive: {0}")]
    ReceiveFailed(String),

    /// Invalid data
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Abstract transport trait
///
/// All transports must implement this trait. The transport is
/// responsible only for moving bytes; the session layer decides what
/// they mean.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send data to the peer
    async fn send(&mut self, data: &[u8]) -> TransportResult<()>;

    /// Receive data from the peer
    ///
    /// Blocks until data is available or the connection is closed.
    async fn receive(&mut self) -> TransportResult<Vec<u8>>;

    /// Check if the transport is connected
    fn is_connected(&self) -> bool;

    /// Close the transport
    async fn close(&mut self) -> TransportResult<()>;
}

/// In-memory transport for testing
///
/// Uses channels to simulate a connection between two endpoints.
pub mod memory {
    use super::*;
    use tokio::sync::mpsc;

    /// Create a pair of connected in-memory transports
    pub fn create_pair() -> (MemoryTransport, MemoryTransport) {
        let (tx1, rx1) = mpsc::channel(100);
        let (tx2, rx2) = mpsc::channel(100);

        let transport1 = MemoryTransport {
            tx: tx1,
            rx: rx2,
            connected: true,
        };

        let transport2 = MemoryTransport {
            tx: tx2,
            rx: rx1,
            connected: true,
        };

        (transport1, transport2)
    }

    /// In-memory transport endpoint
    pub struct MemoryTransport {
        tx: mpsc::Sender<Vec<u8>>,
        rx: mpsc::Receiver<Vec<u8>>,
        connected: bool,
    }

    #[async_trait]
    impl Transport for MemoryTransport {
        async fn send(&mut self, data: &[u8]) -> TransportResult<()> {
            if !self.connected {
                return Err(TransportError::Disconnected);
            }

            self.tx
                .send(data.to_vec())
                .await
                .map_err(|_| TransportError::SendFailed("Channel closed".to_string()))
        }

        async fn receive(&mut self) -> TransportResult<Vec<u8>> {
            if !self.connected {
                return Err(TransportError::Disconnected);
            }

            self.rx.recv().await.ok_or(TransportError::Disconnected)
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        async fn close(&mut self) -> TransportResult<()> {
            self.connected = false;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_transport() {
        let (mut sender, mut receiver) = memory::create_pair();

        // Sender to receiver
        sender.send(b"key blob").await.unwrap();
        let received = receiver.receive().await.unwrap();
        assert_eq!(received, b"key blob");

        // Receiver to sender
        receiver.send(b"ciphertext").await.unwrap();
        let received = sender.receive().await.unwrap();
        assert_eq!(received, b"ciphertext");
    }

    #[tokio::test]
    async fn test_memory_transport_close() {
        let (mut sender, _receiver) = memory::create_pair();

        sender.close().await.unwrap();
        assert!(!sender.is_connected());

        // Should fail after close
        assert!(sender.send(b"test").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_transport_disconnects_when_peer_drops() {
        let (mut sender, receiver) = memory::create_pair();

        drop(receiver);

        assert!(sender.receive().await.is_err());
    }
}
