//! Chute command line client
//!
//! `chute send <file>` opens a share on the relay, prints the share
//! code and delivers the file once the receiver joins.
//! `chute receive <code> <output>` joins the share and writes the
//! decrypted payload to the chosen destination.
//!
//! Any failure during the exchange is a transfer failure: the share is
//! dead and a new one has to be started.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chute::crypto::CipherSuite;
use chute::session;
use chute::transport::{Transport, WebSocketTransport};

const DEFAULT_RELAY: &str = "ws://127.0.0.1:8765";

/// Chute: peer-to-peer end-to-end encrypted file sharing
#[derive(Parser)]
#[command(name = "chute")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Relay server URL
    #[arg(long, default_value = DEFAULT_RELAY)]
    relay: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a file through a new share
    Send {
        /// Path of the file to send
        file: PathBuf,
    },

    /// Receive a file from an existing share
    Receive {
        /// Share code printed by the sender
        code: String,

        /// Destination path for the received file
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Send { file } => cmd_send(&cli.relay, &file).await,
        Commands::Receive { code, output } => cmd_receive(&cli.relay, &code, &output).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("transfer failed: {err}");
            eprintln!("the share is no longer usable; start a new one");
            ExitCode::FAILURE
        }
    }
}

async fn cmd_send(relay: &str, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let suite = CipherSuite::default();
    let payload = fs::read(file)?;

    // The core rejects oversized payloads too; checking here gives the
    // sender a useful message before anything touches the network.
    if payload.len() > suite.max_payload() {
        return Err(format!(
            "{} is {} bytes, more than the {} byte limit of a single share",
            file.display(),
            payload.len(),
            suite.max_payload()
        )
        .into());
    }

    let mut transport = WebSocketTransport::connect(relay).await?;
    let code = transport.create_share().await?;

    println!("Share code: {code}");
    println!("Waiting for the receiver to join...");
    transport.wait_for_peer().await?;

    println!("Receiver joined, exchanging keys...");
    session::deliver(&mut transport, &suite, &payload).await?;
    let _ = transport.close().await;

    println!("Sent {} bytes.", payload.len());
    Ok(())
}

async fn cmd_receive(
    relay: &str,
    code: &str,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let suite = CipherSuite::default();

    let mut transport = WebSocketTransport::connect(relay).await?;
    transport.join_share(code).await?;

    println!("Joined share {code}.");
    println!(
        "Generating a {}-bit key pair (this can take a moment)...",
        suite.modulus_bits()
    );
    let payload = session::accept(&mut transport, &suite).await?;
    let _ = transport.close().await;

    fs::write(output, &payload)?;
    println!("Saved {} bytes to {}.", payload.len(), output.display());
    Ok(())
}
