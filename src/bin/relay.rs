//! Chute relay server
//!
//! A WebSocket relay that moves opaque blobs between the two ends of a
//! share. The server provides:
//! - Share-code based routing (one sender, one receiver per share)
//! - Zero-knowledge forwarding (only public keys and ciphertext pass
//!   through, base64 wrapped)
//!
//! Usage:
//!   chute-relay [--port 8765] [--host 0.0.0.0]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};

/// Chute relay server
#[derive(Parser)]
#[command(name = "chute-relay")]
#[command(about = "WebSocket relay for chute encrypted file shares")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8765")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
}

/// Messages between client and relay
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
enum RelayMessage {
    /// Create a new share (sender)
    CreateShare,
    /// Share created successfully
    ShareCreated { code: String },
    /// Join an existing share (receiver)
    JoinShare { code: String },
    /// Successfully joined the share
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

/// Events flowing between the two ends of a share
#[derive(Clone, Debug)]
enum ShareEvent {
    /// The receiver joined
    Joined,
    /// One end disconnected
    Left,
    /// An opaque blob to forward
    Blob(String),
}

/// A share: one sender waiting for exactly one receiver
struct Share {
    code: String,
    /// Broadcast channel between the two ends
    tx: broadcast::Sender<(usize, ShareEvent)>,
    /// Connected ends: 1 = awaiting receiver, 2 = active
    peers: Arc<RwLock<usize>>,
}

impl Share {
    fn new(code: String) -> Self {
        let (tx, _) = broadcast::channel(100);
        Share {
            code,
            tx,
            peers: Arc::new(RwLock::new(0)),
        }
    }
}

/// Server state
struct RelayState {
    shares: RwLock<HashMap<String, Arc<Share>>>,
}

impl RelayState {
    fn new() -> Self {
        RelayState {
            shares: RwLock::new(HashMap::new()),
        }
    }

    /// Generate a share code no existing share is using
    ///
    /// Five random bytes, base64 with a URL-safe alphabet and no
    /// padding, so codes paste cleanly into a terminal.
    async fn generate_share_code(&self) -> String {
        let shares = self.shares.read().await;
        loop {
            let raw: [u8; 5] = rand::random();
            let code = URL_SAFE_NO_PAD.encode(raw);

            if !shares.contains_key(&code) {
                return code;
            }
        }
    }

    /// Create a new share
    async fn create_share(&self) -> String {
        let code = self.generate_share_code().await;
        let share = Arc::new(Share::new(code.clone()));

        let mut shares = self.shares.write().await;
        shares.insert(code.clone(), share);

        info!("Share created: {}", code);
        code
    }

    /// Get a share by code
    async fn get_share(&self, code: &str) -> Option<Arc<Share>> {
        let shares = self.shares.read().await;
        shares.get(code).cloned()
    }

    /// Remove a share once both ends are gone
    async fn cleanup_share(&self, code: &str) {
        let mut shares = self.shares.write().await;
        if let Some(share) = shares.get(code) {
            let count = *share.peers.read().await;
            if count == 0 {
                shares.remove(code);
                info!("Share removed: {}", code);
            }
        }
    }
}

/// Handle a single WebSocket connection
async fn handle_connection(stream: TcpStream, addr: SocketAddr, state: Arc<RelayState>) {
    info!("New connection from: {}", addr);

    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            error!("WebSocket handshake failed for {}: {}", addr, e);
            return;
        }
    };

    let (mut write, mut read) = ws_stream.split();

    // Client state
    let mut current_share: Option<Arc<Share>> = None;
    let mut share_rx: Option<broadcast::Receiver<(usize, ShareEvent)>> = None;
    let client_id: usize = rand::random();

    loop {
        tokio::select! {
            // Handle incoming WebSocket messages
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<RelayMessage>(&text) {
                            Ok(relay_msg) => {
                                match relay_msg {
                                    RelayMessage::CreateShare => {
                                        let code = state.create_share().await;
                                        if let Some(share) = state.get_share(&code).await {
                                            // The creator is the sender
                                            *share.peers.write().await += 1;
                                            share_rx = Some(share.tx.subscribe());
                                            current_share = Some(share);

                                            let response = RelayMessage::ShareCreated { code };
                                            if let Ok(json) = serde_json::to_string(&response) {
                                                let _ = write.send(Message::Text(json)).await;
                                            }
                                        }
                                    }

                                    RelayMessage::JoinShare { code } => {
                                        if let Some(share) = state.get_share(&code).await {
                                            let mut peers = share.peers.write().await;
                                            if *peers != 1 {
                                                // Full, or the sender already left
                                                let response = RelayMessage::Error {
                                                    message: "Share is not accepting a receiver".to_string(),
                                                };
                                                if let Ok(json) = serde_json::to_string(&response) {
                                                    let _ = write.send(Message::Text(json)).await;
                                                }
                                            } else {
                                                *peers += 1;
                                                drop(peers);

                                                share_rx = Some(share.tx.subscribe());

                                                // Notify the waiting sender
                                                let _ = share.tx.send((client_id, ShareEvent::Joined));

                                                current_share = Some(share);

                                                let response = RelayMessage::Joined { code };
                                                if let Ok(json) = serde_json::to_string(&response) {
                                                    let _ = write.send(Message::Text(json)).await;
                                                }

                                                info!("Receiver {} joined share", addr);
                                            }
                                        } else {
                                            let response = RelayMessage::Error {
                                                message: "Share not found".to_string(),
                                            };
                                            if let Ok(json) = serde_json::to_string(&response) {
                                                let _ = write.send(Message::Text(json)).await;
                                            }
                                        }
                                    }

                                    RelayMessage::Forward { data } => {
                                        if let Some(share) = &current_share {
                                            // Forward to the other end of the share
                                            let _ = share.tx.send((client_id, ShareEvent::Blob(data)));
                                        } else {
                                            let response = RelayMessage::Error {
                                                message: "Not in a share".to_string(),
                                            };
                                            if let Ok(json) = serde_json::to_string(&response) {
                                                let _ = write.send(Message::Text(json)).await;
                                            }
                                        }
                                    }

                                    RelayMessage::Ping => {
                                        let response = RelayMessage::Pong;
                                        if let Ok(json) = serde_json::to_string(&response) {
                                            let _ = write.send(Message::Text(json)).await;
                                        }
                                    }

                                    _ => {}
                                }
                            }
                            Err(e) => {
                                warn!("Invalid message from {}: {}", addr, e);
                            }
                        }
                    }

                    Some(Ok(Message::Close(_))) | None => {
                        info!("Client {} disconnected", addr);
                        break;
                    }

                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                    }

                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", addr, e);
                        break;
                    }

                    _ => {}
                }
            }

            // Handle messages from the share
            share_msg = async {
                if let Some(rx) = &mut share_rx {
                    rx.recv().await.ok()
                } else {
                    // Sleep forever if no share
                    std::future::pending::<Option<(usize, ShareEvent)>>().await
                }
            } => {
                if let Some((sender_id, event)) = share_msg {
                    if sender_id != client_id {
                        let response = match event {
                            ShareEvent::Joined => RelayMessage::PeerJoined,
                            ShareEvent::Left => RelayMessage::PeerLeft,
                            ShareEvent::Blob(data) => RelayMessage::Message { data },
                        };
                        if let Ok(json) = serde_json::to_string(&response) {
                            let _ = write.send(Message::Text(json)).await;
                        }
                    }
                }
            }
        }
    }

    // Cleanup on disconnect
    if let Some(share) = current_share {
        let code = share.code.clone();
        let mut peers = share.peers.write().await;
        *peers = peers.saturating_sub(1);
        let remaining = *peers;
        drop(peers);

        // Notify the remaining end
        if remaining > 0 {
            let _ = share.tx.send((client_id, ShareEvent::Left));
        }

        drop(share);
        state.cleanup_share(&code).await;
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chute_relay=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    let listener = TcpListener::bind(&addr).await.expect("Failed to bind");
    info!("Chute relay listening on ws://{}", addr);
    info!("Shares carry exactly one sender and one receiver");

    let state = Arc::new(RelayState::new());

    while let Ok((stream, addr)) = listener.accept().await {
        let state = state.clone();
        tokio::spawn(handle_connection(stream, addr, state));
    }
}
