//! Inbound transfer loop
//!
//! A background task that accepts fragments for one transfer at a time,
//! acknowledges every receipt, and hands each completed stream (with its
//! sniffed content kind) to the caller over a channel. Per-fragment errors
//! are logged and never terminate the task.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::fragment::{Ack, Fragment};
use crate::session::Session;
use crate::sniff::ContentKind;
use crate::{Config, Error, Result};

/// Poll tick while no session is active, so `stop()` stays responsive
const IDLE_POLL: Duration = Duration::from_millis(200);

/// Floor on the collecting-state wait to avoid a zero-duration spin
const MIN_WAIT: Duration = Duration::from_millis(10);

/// Channel receiver for completed transfers
pub type TransferReceiver = mpsc::Receiver<CompletedTransfer>;

/// One fully reassembled inbound transfer
#[derive(Debug, Clone)]
pub struct CompletedTransfer {
    /// The reassembled byte stream, fragments concatenated in
    /// ascending sequence order
    pub data: Bytes,

    /// Sniffed content classification of the stream
    pub kind: ContentKind,

    /// Address the transfer arrived from
    pub origin: SocketAddr,

    /// Fragments the transfer was carried in
    pub fragments: usize,

    /// Time from first fragment to completion
    pub elapsed: Duration,
}

/// Handle to the running inbound loop
pub struct Receiver {
    running: Arc<AtomicBool>,
    local_addr: SocketAddr,
}

impl Receiver {
    /// Bind the inbound socket and spawn the receive loop.
    ///
    /// Returns the control handle and the channel completed transfers
    /// arrive on.
    pub async fn start(config: Config) -> Result<(Self, TransferReceiver)> {
        let socket = Arc::new(UdpSocket::bind(config.recv_addr).await?);
        let local_addr = socket.local_addr()?;

        let (completed_tx, completed_rx) = mpsc::channel::<CompletedTransfer>(8);
        let running = Arc::new(AtomicBool::new(true));

        info!("SFT receiver listening on {}", local_addr);

        let inner = ReceiverInner {
            config,
            socket,
            completed_tx,
        };

        let running_loop = running.clone();
        tokio::spawn(async move {
            inner.run(running_loop).await;
        });

        Ok((
            Self {
                running,
                local_addr,
            },
            completed_rx,
        ))
    }

    /// Address the inbound socket is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Ask the loop to wind down at its next poll tick
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the loop is still running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Loop state, owned exclusively by the spawned task
struct ReceiverInner {
    config: Config,
    socket: Arc<UdpSocket>,
    completed_tx: mpsc::Sender<CompletedTransfer>,
}

impl ReceiverInner {
    async fn run(self, running: Arc<AtomicBool>) {
        let mut buf = vec![0u8; self.config.max_datagram];
        let mut session: Option<Session> = None;

        while running.load(Ordering::SeqCst) {
            let wait = match &session {
                None => IDLE_POLL,
                Some(active) => self
                    .config
                    .session_silence
                    .saturating_sub(active.last_arrival.elapsed())
                    .max(MIN_WAIT),
            };

            match timeout(wait, self.socket.recv_from(&mut buf)).await {
                Ok(Ok((len, addr))) => {
                    self.handle_datagram(&buf[..len], addr, &mut session).await;
                }
                Ok(Err(e)) => {
                    warn!("receive error: {}", e);
                }
                Err(_) => {
                    // idle tick, or the silence bound may have expired
                    let stalled = session
                        .as_ref()
                        .map(|active| active.last_arrival.elapsed() >= self.config.session_silence)
                        .unwrap_or(false);

                    if stalled {
                        if let Some(abandoned) = session.take() {
                            let stall = Error::SessionTimeout {
                                received: abandoned.received(),
                                expected: abandoned.expected(),
                            };
                            warn!("{}, discarding and waiting for a new transfer", stall);
                        }
                    }
                }
            }
        }

        info!("SFT receiver stopped");
    }

    /// Process one inbound datagram. Malformed input is dropped with a
    /// warning; every decoded fragment is stored and acknowledged,
    /// duplicates included.
    async fn handle_datagram(
        &self,
        datagram: &[u8],
        from: SocketAddr,
        session: &mut Option<Session>,
    ) {
        let fragment = match Fragment::from_bytes(datagram) {
            Ok(fragment) => fragment,
            Err(e) => {
                warn!("dropping datagram from {}: {}", from, e);
                return;
            }
        };

        let is_first = session.is_none();
        let active = session.get_or_insert_with(|| Session::open(&fragment, from));
        if is_first {
            info!(
                expected = active.expected(),
                origin = %from,
                "got initial fragment, waiting for the rest"
            );
        } else {
            active.insert(&fragment);
        }

        // acknowledgements always go to the first fragment's address
        let ack = Ack::new(fragment.sequence);
        if let Err(e) = self.socket.send_to(&ack.to_bytes(), active.origin()).await {
            warn!(sequence = fragment.sequence, "ack send failed: {}", e);
        }
        debug!(
            sequence = fragment.sequence,
            received = active.received(),
            expected = active.expected(),
            "fragment stored and acknowledged"
        );

        if active.is_complete() {
            if let Some(complete) = session.take() {
                self.finish_session(complete).await;
            }
        }
    }

    /// Concatenate, sniff, and hand off a complete session
    async fn finish_session(&self, complete: Session) {
        let origin = complete.origin();
        let fragments = complete.expected();
        let elapsed = complete.created_at.elapsed();

        // the stream opens with slot 0's payload, which is what gets sniffed
        let data = complete.into_stream();
        let kind = ContentKind::sniff(&data);

        info!(
            bytes = data.len(),
            fragments,
            kind = ?kind,
            "got all the fragments"
        );

        let transfer = CompletedTransfer {
            data,
            kind,
            origin,
            fragments,
            elapsed,
        };

        if self.completed_tx.send(transfer).await.is_err() {
            warn!("completed transfer dropped: {}", Error::ChannelClosed);
        }
    }
}
