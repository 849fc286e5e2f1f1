//! Acknowledged send with bounded retry
//!
//! The stop-and-wait primitive underneath the sender pipeline: one frame in
//! flight, resent unchanged until any response arrives or the attempt budget
//! runs out.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{Error, Result};

/// Buffer for inbound acknowledgement datagrams
const ACK_RECV_BUF: usize = 32;

/// A stop-and-wait link to one destination
#[derive(Debug, Clone)]
pub struct DeliveryLink {
    socket: Arc<UdpSocket>,
    destination: SocketAddr,
    ack_timeout: Duration,
    max_attempts: u32,
}

impl DeliveryLink {
    pub fn new(
        socket: Arc<UdpSocket>,
        destination: SocketAddr,
        ack_timeout: Duration,
        max_attempts: u32,
    ) -> Self {
        Self {
            socket,
            destination,
            ack_timeout,
            max_attempts,
        }
    }

    /// Send one frame and wait for a response, retrying on silence.
    ///
    /// Any inbound datagram on the sending socket within the wait counts as
    /// the acknowledgement; the sequence number inside it is not matched to
    /// the frame. A stricter variant would decode the ACK and compare
    /// sequence numbers.
    ///
    /// Returns the number of attempts used on success, or
    /// [`Error::RetryExhausted`] once the budget runs out.
    pub async fn send_acknowledged(&self, frame: &[u8], sequence: u16) -> Result<u32> {
        let mut buf = [0u8; ACK_RECV_BUF];

        for attempt in 1..=self.max_attempts {
            self.socket.send_to(frame, self.destination).await?;

            match timeout(self.ack_timeout, self.socket.recv_from(&mut buf)).await {
                Ok(Ok(_)) => return Ok(attempt),
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    debug!(sequence, attempt, "no response, retrying send");
                }
            }
        }

        Err(Error::RetryExhausted {
            sequence,
            attempts: self.max_attempts,
        })
    }
}
