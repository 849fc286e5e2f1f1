//! Receiver-side reassembly state
//!
//! A session tracks one in-progress transfer: a pre-sized row of optional
//! payload slots, filled as fragments arrive in any order. Completion is
//! "no slot is empty" rather than a separate counter.

use std::net::SocketAddr;
use std::time::Instant;

use bytes::{Bytes, BytesMut};
use tracing::warn;

use crate::fragment::Fragment;

/// Reassembly state for one transfer
#[derive(Debug)]
pub struct Session {
    /// One slot per sequence number, filled on receipt
    slots: Vec<Option<Bytes>>,

    /// Where acknowledgements go: the source address of the first
    /// fragment. Later fragments are not re-validated against it.
    origin: SocketAddr,

    /// When the first fragment arrived
    pub created_at: Instant,

    /// When the most recent fragment arrived; drives the silence timeout
    pub last_arrival: Instant,
}

impl Session {
    /// Open a session from the first fragment of a transfer.
    ///
    /// The slot row is sized from that fragment's header and its payload is
    /// stored immediately.
    pub fn open(first: &Fragment, origin: SocketAddr) -> Self {
        let now = Instant::now();
        let mut session = Self {
            slots: vec![None; first.total_fragments()],
            origin,
            created_at: now,
            last_arrival: now,
        };
        session.insert(first);
        session
    }

    /// Store a fragment's payload in its slot.
    ///
    /// Idempotent: duplicates overwrite in place. Sequence numbers outside
    /// the slot row are dropped with a warning (the header of a later
    /// fragment is not trusted over the first one's).
    pub fn insert(&mut self, fragment: &Fragment) {
        self.last_arrival = Instant::now();

        let index = fragment.sequence as usize;
        if index >= self.slots.len() {
            warn!(
                sequence = fragment.sequence,
                expected = self.slots.len(),
                "fragment outside session range, dropping"
            );
            return;
        }

        self.slots[index] = Some(fragment.payload.clone());
    }

    /// Address acknowledgements are returned to
    pub fn origin(&self) -> SocketAddr {
        self.origin
    }

    /// Total fragments this session expects
    pub fn expected(&self) -> usize {
        self.slots.len()
    }

    /// Fragments received so far
    pub fn received(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// True once every slot holds a payload
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_some())
    }

    /// Concatenate all slots in ascending sequence order.
    ///
    /// Only valid on a complete session; empty slots contribute nothing.
    pub fn into_stream(self) -> Bytes {
        let mut stream = BytesMut::new();
        for slot in self.slots.into_iter().flatten() {
            stream.extend_from_slice(&slot);
        }
        stream.freeze()
    }
}
