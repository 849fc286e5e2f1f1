//! Sender pipeline
//!
//! Splits a source into fragments, drives each through the acknowledged
//! delivery primitive, and reports coarse progress. Transmission order is
//! shuffled by default to exercise the receiver's out-of-order reassembly.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::delivery::DeliveryLink;
use crate::error::{Error, Result};
use crate::fragment::{Fragment, SequenceNumber};
use crate::storage::SourceReader;
use crate::Config;

/// Progress is reported in at most this many steps per transfer
const PROGRESS_PARTS: usize = 20;

/// Outcome of one completed outbound transfer
#[derive(Debug, Clone)]
pub struct TransferReport {
    /// Fragments delivered
    pub fragments: usize,

    /// Payload bytes delivered
    pub bytes: u64,

    /// Resends beyond the first attempt, summed over all fragments
    pub retries: u32,

    /// Wall time for the whole transfer
    pub elapsed: Duration,
}

/// Outbound transfer pipeline
pub struct Sender {
    config: Config,
    link: DeliveryLink,
}

impl Sender {
    /// Create a pipeline sending through `socket` to the configured
    /// destination
    pub fn new(config: Config, socket: Arc<UdpSocket>) -> Self {
        let link = DeliveryLink::new(
            socket,
            config.send_addr,
            config.ack_timeout,
            config.max_attempts,
        );
        Self { config, link }
    }

    /// Transfer a whole source, fragment by fragment.
    ///
    /// The source is read at fragment granularity, never loaded whole. The
    /// first fragment that exhausts its retry budget aborts the remaining
    /// transmission; the peer's partial session is left to time out.
    pub async fn send(&self, source: &mut dyn SourceReader) -> Result<TransferReport> {
        let total_len = source.total_len();
        if total_len == 0 {
            return Err(Error::EmptySource);
        }

        let capacity = self.config.payload_capacity();
        let count = fragment_count(total_len, capacity)?;
        let max_sequence = (count - 1) as SequenceNumber;

        let order = transmission_order(count, self.config.shuffle_order);
        let milestones = progress_milestones(count);

        info!(
            fragments = count,
            bytes = total_len,
            shuffled = self.config.shuffle_order,
            "beginning transmission"
        );

        let started = Instant::now();
        let mut report = TransferReport {
            fragments: 0,
            bytes: 0,
            retries: 0,
            elapsed: Duration::ZERO,
        };

        for (slot, &sequence) in order.iter().enumerate() {
            if let Some(&percent) = milestones.get(&slot) {
                info!(percent, "transmission progress");
            }

            let offset = sequence as u64 * capacity as u64;
            let payload = source.read_at(offset, capacity)?;

            let fragment = Fragment::new(sequence, max_sequence, payload);
            let payload_len = fragment.payload.len() as u64;

            let attempts = self.link.send_acknowledged(&fragment.to_bytes(), sequence).await?;

            report.fragments += 1;
            report.bytes += payload_len;
            report.retries += attempts - 1;

            debug!(sequence, attempts, "fragment acknowledged");
        }

        report.elapsed = started.elapsed();
        info!(
            fragments = report.fragments,
            retries = report.retries,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "transmission done"
        );

        Ok(report)
    }
}

/// Fragments needed for `len` bytes at the given payload capacity.
///
/// Floor-plus-one: a source that divides evenly still gets a trailing empty
/// fragment, which reassembly renders as nothing.
pub fn fragment_count(len: u64, capacity: usize) -> Result<usize> {
    let count = len / capacity as u64 + 1;
    if count - 1 > SequenceNumber::MAX as u64 {
        return Err(Error::SourceTooLarge { fragments: count });
    }
    Ok(count as usize)
}

/// The order fragments are sent in: identity, or a random permutation when
/// shuffling is on
fn transmission_order(count: usize, shuffle: bool) -> Vec<SequenceNumber> {
    let mut order: Vec<SequenceNumber> = (0..count).map(|i| i as SequenceNumber).collect();
    if shuffle {
        order.shuffle(&mut rand::thread_rng());
    }
    order
}

/// Transmission-slot indices at which progress is logged, mapped to the
/// percentage reported there.
///
/// Integer division throughout, so milestones can land unevenly for counts
/// not divisible by the part count. Cosmetic only.
fn progress_milestones(count: usize) -> HashMap<usize, u64> {
    let parts = count.min(PROGRESS_PARTS);
    let part_size = count / parts;

    (1..parts)
        .map(|i| (part_size * i, (100 / parts as u64) * i as u64))
        .collect()
}
