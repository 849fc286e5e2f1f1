//! SFT peer - Stop-and-wait Fragment Transfer
//!
//! Runs both protocol flows in one process: a background receive loop that
//! reassembles inbound transfers and writes them to disk, and an interactive
//! prompt that transmits messages or files to the configured peer.
//!
//! Usage:
//!   cargo run --release --bin sft-peer -- [OPTIONS]
//!
//! Examples:
//!   # two peers on one machine
//!   cargo run --release --bin sft-peer -- --recv 127.0.0.1:1337 --send 127.0.0.1:1338
//!   cargo run --release --bin sft-peer -- --recv 127.0.0.1:1338 --send 127.0.0.1:1337

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use sft::storage::{self, FileSource, MessageSource, SourceReader};
use sft::{Config, Receiver, Sender};

/// Peer settings
struct PeerConfig {
    output_dir: PathBuf,
    config: Config,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            config: Config::default(),
        }
    }
}

fn parse_args() -> PeerConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut peer = PeerConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--recv" | "-r" => {
                if i + 1 < args.len() {
                    peer.config.recv_addr = args[i + 1].parse().expect("valid address required");
                    i += 1;
                }
            }
            "--send" | "-s" => {
                if i + 1 < args.len() {
                    peer.config.send_addr = args[i + 1].parse().expect("valid address required");
                    i += 1;
                }
            }
            "--retries" => {
                if i + 1 < args.len() {
                    peer.config.max_attempts = args[i + 1].parse().expect("valid number required");
                    i += 1;
                }
            }
            "--ack-timeout-ms" => {
                if i + 1 < args.len() {
                    let ms: u64 = args[i + 1].parse().expect("valid number required");
                    peer.config.ack_timeout = Duration::from_millis(ms);
                    i += 1;
                }
            }
            "--silence-ms" => {
                if i + 1 < args.len() {
                    let ms: u64 = args[i + 1].parse().expect("valid number required");
                    peer.config.session_silence = Duration::from_millis(ms);
                    i += 1;
                }
            }
            "--no-shuffle" => {
                peer.config.shuffle_order = false;
            }
            "--output-prefix" => {
                if i + 1 < args.len() {
                    peer.config.output_prefix = args[i + 1].clone();
                    i += 1;
                }
            }
            "--output-dir" | "-o" => {
                if i + 1 < args.len() {
                    peer.output_dir = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!(
                    r#"SFT Peer - Stop-and-wait Fragment Transfer

Reliable fragment transfer over UDP with positive acknowledgement,
bounded retry, and out-of-order reassembly.

Usage:
  cargo run --release --bin sft-peer -- [OPTIONS]

Options:
  -r, --recv <ADDR>        inbound bind address (default: 127.0.0.1:1337)
  -s, --send <ADDR>        outbound peer address (default: 127.0.0.1:1337)
  --retries <N>            attempts per fragment before aborting (default: 10)
  --ack-timeout-ms <MS>    wait per attempt for an acknowledgement (default: 1000)
  --silence-ms <MS>        silence before an inbound session is discarded (default: 10000)
  --no-shuffle             send fragments in sequence order
  --output-prefix <NAME>   filename stem for received transfers (default: received)
  -o, --output-dir <PATH>  directory received transfers are written to (default: .)
  -h, --help               print this help

At the prompt, a line containing "." is treated as a filename to transmit;
anything else is sent as a literal text message.
"#
                );
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    peer
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let peer = parse_args();

    info!("SFT peer starting...");
    info!("Inbound address: {}", peer.config.recv_addr);
    info!("Outbound peer:   {}", peer.config.send_addr);

    // inbound flow: reassemble and persist, independently of the prompt loop
    let (receiver, mut completed_rx) = Receiver::start(peer.config.clone()).await?;

    let output_dir = peer.output_dir.clone();
    let output_prefix = peer.config.output_prefix.clone();
    tokio::spawn(async move {
        while let Some(transfer) = completed_rx.recv().await {
            match storage::write_transfer(&output_dir, &output_prefix, &transfer) {
                Ok(path) => info!(
                    "received {} bytes from {} -> {}",
                    transfer.data.len(),
                    transfer.origin,
                    path.display()
                ),
                Err(e) => error!("failed to persist transfer: {}", e),
            }
        }
    });

    // outbound flow: one transfer at a time, driven from the terminal
    let send_socket = Arc::new(UdpSocket::bind("0.0.0.0:0").await?);
    let sender = Sender::new(peer.config.clone(), send_socket);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!("Enter the message to send:");
        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break, // stdin closed
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        // naive filename detection: any "." means "this is a file path".
        // Use commas or semicolons for sentence breaks in text messages.
        let result = if input.contains('.') {
            match FileSource::open(input) {
                Ok(mut source) => {
                    info!("file length is {} bytes", source.total_len());
                    sender.send(&mut source).await
                }
                Err(e) => {
                    error!("error opening file {:?}: {}", input, e);
                    continue;
                }
            }
        } else {
            let mut source = MessageSource::new(input);
            info!("message length is {} bytes", source.total_len());
            sender.send(&mut source).await
        };

        match result {
            Ok(report) => info!(
                "transfer complete: {} fragments, {} retries, {:.2}s",
                report.fragments,
                report.retries,
                report.elapsed.as_secs_f64()
            ),
            Err(e) => warn!("transfer aborted: {}", e),
        }
    }

    receiver.stop();
    Ok(())
}
