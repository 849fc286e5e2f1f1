//! Protocol configuration
//!
//! Built once at startup and handed to each component by value. No component
//! mutates configuration after construction.

use std::net::SocketAddr;
use std::time::Duration;

use crate::{FRAGMENT_HEADER_LEN, MAX_DATAGRAM_SIZE};

/// Default well-known port both flows use unless overridden.
pub const DEFAULT_PORT: u16 = 1337;

/// SFT protocol configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the inbound flow binds to
    pub recv_addr: SocketAddr,

    /// Address the outbound flow targets
    pub send_addr: SocketAddr,

    /// Maximum datagram size on the wire (header included)
    pub max_datagram: usize,

    /// How long the delivery primitive waits for an acknowledgement
    /// before counting an attempt as failed
    pub ack_timeout: Duration,

    /// Attempts per fragment before the whole transfer is aborted
    pub max_attempts: u32,

    /// How long a collecting session tolerates silence before it is
    /// discarded and the receiver returns to idle
    pub session_silence: Duration,

    /// Shuffle the transmission order of outbound fragments.
    /// Stress-test knob for the receiver's reassembly, on by default.
    pub shuffle_order: bool,

    /// Filename stem for persisted transfers; the sniffed extension
    /// is appended
    pub output_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recv_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            send_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            max_datagram: MAX_DATAGRAM_SIZE,
            ack_timeout: Duration::from_secs(1),
            max_attempts: 10,
            session_silence: Duration::from_secs(10),
            shuffle_order: true,
            output_prefix: "received".to_string(),
        }
    }
}

impl Config {
    /// New configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload bytes carried by one full fragment
    pub fn payload_capacity(&self) -> usize {
        self.max_datagram - FRAGMENT_HEADER_LEN
    }

    /// Settings for lossy links: longer ACK waits, a bigger retry
    /// budget, more patience before a session is discarded
    pub fn lossy_network() -> Self {
        Self {
            ack_timeout: Duration::from_secs(3),
            max_attempts: 20,
            session_silence: Duration::from_secs(30),
            ..Self::default()
        }
    }

    /// Settings for loopback tests: tight timeouts so failure paths
    /// resolve quickly
    pub fn local_test() -> Self {
        Self {
            ack_timeout: Duration::from_millis(100),
            max_attempts: 3,
            session_silence: Duration::from_millis(500),
            ..Self::default()
        }
    }
}
