//! # SFT (Stop-and-wait Fragment Transfer)
//!
//! Reliable, ordered transfer of a byte stream over unreliable UDP.
//!
//! ## Core ideas
//! - **Fragmentation**: the source is split into bounded fragments, each
//!   carrying its sequence number and the transfer's total-minus-one
//! - **Stop-and-wait**: every fragment is positively acknowledged before the
//!   next one is sent, with a bounded retry budget
//! - **Out-of-order reassembly**: the receiver collects fragments into
//!   pre-sized slots and completes once no slot is empty, regardless of
//!   arrival order
//! - **Content sniffing**: the reassembled stream is classified by magic
//!   prefix to pick an output file extension
//!
//! Two independent flows run per process: a background receive loop that
//! reassembles inbound transfers, and a caller-driven send pipeline. They
//! share nothing but the network.

pub mod config;
pub mod delivery;
pub mod error;
pub mod fragment;
pub mod receiver;
pub mod sender;
pub mod session;
pub mod sniff;
pub mod storage;

pub use config::Config;
pub use delivery::DeliveryLink;
pub use error::{Error, Result};
pub use fragment::{Ack, Fragment, SequenceNumber};
pub use receiver::{CompletedTransfer, Receiver, TransferReceiver};
pub use sender::{Sender, TransferReport};
pub use session::Session;
pub use sniff::ContentKind;
pub use storage::{FileSource, MessageSource, SourceReader};

/// Maximum size of one datagram on the wire (header + payload).
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// Fragment header length: two little-endian u16 fields.
pub const FRAGMENT_HEADER_LEN: usize = 4;

/// Payload bytes carried by a full fragment.
pub const PAYLOAD_CAPACITY: usize = MAX_DATAGRAM_SIZE - FRAGMENT_HEADER_LEN;

/// Fixed tag opening every acknowledgement datagram.
pub const ACK_TAG: [u8; 3] = *b"ACK";

/// Acknowledgement length on the wire: tag + sequence number.
pub const ACK_LEN: usize = ACK_TAG.len() + 2;
