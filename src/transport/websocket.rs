//! WebSocket transport through the relay server
//!
//! Connects to a chute relay and moves opaque blobs between the two
//! ends of a share. The sender creates the share and learns its code;
//! the receiver joins with that code. Everything forwarded is base64
//! inside the relay's JSON protocol and opaque to the relay.

use super::{Transport, TransportError, TransportResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

/// Messages exchanged with the relay server
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
#[allow(missing_docs)]
pub enum RelayMessage {
    /// Create a new share (sender)
    CreateShare,
    /// Share created; code goes to the receiver out of band
    ShareCreated { code: String },
    /// Join an existing share (receiver)
    JoinShare { code: String },
    /// Successfully joined; both ends are now present
    Joined { code: String },
    /// The receiver joined your share
    PeerJoined,
    /// The other end left the share
    PeerLeft,
    /// Forward an opaque blob to the other end
    Forward { data: String },
    /// An opaque blob from the other end
    Message { data: String },
    /// Error occurred
    Error { message: String },
    /// Ping
    Ping,
    /// Pong
    Pong,
}

/// WebSocket transport connected to a relay server
pub struct WebSocketTransport {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    share_code: Option<String>,
    connected: bool,
    peer_connected: bool,
}

impl WebSocketTransport {
    /// Connect to a relay server
    pub async fn connect(relay_url: &str) -> TransportResult<Self> {
        let (ws, _) = connect_async(relay_url)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        Ok(WebSocketTransport {
            ws,
            share_code: None,
            connected: true,
            peer_connected: false,
        })
    }

    /// Create a new share on the relay and return its code
    pub async fn create_share(&mut self) -> TransportResult<String> {
        self.send_relay_message(&RelayMessage::CreateShare).await?;

        loop {
            match self.receive_relay_message().await? {
                RelayMessage::ShareCreated { code } => {
                    self.share_code = Some(code.clone());
                    return Ok(code);
                }
                RelayMessage::Error { message } => {
                    return Err(TransportError::ConnectionFailed(message));
                }
                _ => continue,
            }
        }
    }

    /// Join an existing share as its receiver
    pub async fn join_share(&mut self, code: &str) -> TransportResult<()> {
        let msg = RelayMessage::JoinShare {
            code: code.to_string(),
        };
        self.send_relay_message(&msg).await?;

        loop {
            match self.receive_relay_message().await? {
                RelayMessage::Joined { code } => {
                    self.share_code = Some(code);
                    // Joining only succeeds while the sender is waiting
                    self.peer_connected = true;
                    return Ok(());
                }
                RelayMessage::Error { message } => {
                    return Err(TransportError::ConnectionFailed(message));
                }
                _ => continue,
            }
        }
    }

    /// Wait for the receiver to join the share
    pub async fn wait_for_peer(&mut self) -> TransportResult<()> {
        if self.peer_connected {
            return Ok(());
        }

        loop {
            match self.receive_relay_message().await? {
                RelayMessage::PeerJoined => {
                    self.peer_connected = true;
                    return Ok(());
                }
                RelayMessage::Error { message } => {
                    return Err(TransportError::ConnectionFailed(message));
                }
                _ => continue,
            }
        }
    }

    /// Check if the other end of the share is connected
    pub fn is_peer_connected(&self) -> bool {
        self.peer_connected
    }

    /// Get the share code
    pub fn share_code(&self) -> Option<&str> {
        self.share_code.as_deref()
    }

    /// Send a relay protocol message
    async fn send_relay_message(&mut self, msg: &RelayMessage) -> TransportResult<()> {
        let json =
            serde_json::to_string(msg).map_err(|e| TransportError::SendFailed(e.to_string()))?;

        self.ws
            .send(Message::Text(json))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    /// Receive a relay protocol message
    async fn receive_relay_message(&mut self) -> TransportResult<RelayMessage> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str(&text)
                        .map_err(|e| TransportError::InvalidData(e.to_string()));
                }
                Some(Ok(Message::Close(_))) | None => {
                    self.connected = false;
                    return Err(TransportError::Disconnected);
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = self.ws.send(Message::Pong(data)).await;
                }
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(e.to_string()));
                }
                _ => continue,
            }
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, data: &[u8]) -> TransportResult<()> {
        if !self.connected {
            return Err(TransportError::Disconnected);
        }

        let msg = RelayMessage::Forward {
            data: BASE64.encode(data),
        };
        self.send_relay_message(&msg).await
    }

    async fn receive(&mut self) -> TransportResult<Vec<u8>> {
        if !self.connected {
            return Err(TransportError::Disconnected);
        }

        loop {
            match self.receive_relay_message().await? {
                RelayMessage::Message { data } => {
                    return BASE64
                        .decode(&data)
                        .map_err(|e| TransportError::InvalidData(e.to_string()));
                }
                RelayMessage::PeerJoined => {
                    self.peer_connected = true;
                    continue;
                }
                RelayMessage::PeerLeft => {
                    self.peer_connected = false;
                    return Err(TransportError::Disconnected);
                }
                RelayMessage::Error { message } => {
                    return Err(TransportError::ReceiveFailed(message));
                }
                _ => continue,
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected && self.peer_connected
    }

    async fn close(&mut self) -> TransportResult<()> {
        self.connected = false;
        self.ws
            .close(None)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Talking to a live relay needs a running server; these only cover
    // the protocol encoding.

    #[test]
    fn test_relay_message_serialization() {
        let msg = RelayMessage::Forward {
            data: "SGVsbG8gV29ybGQ=".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: RelayMessage = serde_json::from_str(&json).unwrap();

        match parsed {
            RelayMessage::Forward { data } => {
                assert_eq!(data, "SGVsbG8gV29ybGQ=");
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_relay_message_types() {
        let messages = vec![
            RelayMessage::CreateShare,
            RelayMessage::ShareCreated {
                code: "gXs-b2c".to_string(),
            },
            RelayMessage::JoinShare {
                code: "gXs-b2c".to_string(),
            },
            RelayMessage::Joined {
                code: "gXs-b2c".to_string(),
            },
            RelayMessage::PeerJoined,
            RelayMessage::PeerLeft,
            RelayMessage::Forward {
                data: "test".to_string(),
            },
            RelayMessage::Message {
                data: "test".to_string(),
            },
            RelayMessage::Error {
                message: "error".to_string(),
            },
            RelayMessage::Ping,
            RelayMessage::Pong,
        ];

        for msg in messages {
            let json = serde_json::to_string(&msg).unwrap();
            let _: RelayMessage = serde_json::from_str(&json).unwrap();
        }
    }
}
