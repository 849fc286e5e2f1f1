//! Fragment and acknowledgement wire codecs
//!
//! Fragment: `[seq:2 LE][max_seq:2 LE][payload]`
//! Acknowledgement: `b"ACK"` + `[seq:2 LE]`

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::{ACK_LEN, ACK_TAG, FRAGMENT_HEADER_LEN};

/// Position of a fragment in the logical ordering of a transfer (0-based).
pub type SequenceNumber = u16;

/// One datagram-sized piece of a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// This fragment's position in the transfer
    pub sequence: SequenceNumber,

    /// Total fragment count minus one, identical on every fragment
    /// of one transfer
    pub max_sequence: SequenceNumber,

    /// Raw payload bytes
    pub payload: Bytes,
}

impl Fragment {
    pub fn new(sequence: SequenceNumber, max_sequence: SequenceNumber, payload: Bytes) -> Self {
        Self {
            sequence,
            max_sequence,
            payload,
        }
    }

    /// Total fragments in the transfer this fragment belongs to
    pub fn total_fragments(&self) -> usize {
        self.max_sequence as usize + 1
    }

    /// Serialize to wire bytes: exactly `4 + payload.len()`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(FRAGMENT_HEADER_LEN + self.payload.len());
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        buf.extend_from_slice(&self.max_sequence.to_le_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Deserialize from wire bytes.
    ///
    /// Fails only on inputs shorter than the 4-byte header. Payload length
    /// bounds are the caller's responsibility.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FRAGMENT_HEADER_LEN {
            return Err(Error::MalformedFragment { len: bytes.len() });
        }

        Ok(Self {
            sequence: u16::from_le_bytes([bytes[0], bytes[1]]),
            max_sequence: u16::from_le_bytes([bytes[2], bytes[3]]),
            payload: Bytes::copy_from_slice(&bytes[FRAGMENT_HEADER_LEN..]),
        })
    }
}

/// Acknowledgement for one received fragment, returned to its sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// Sequence number being acknowledged
    pub sequence: SequenceNumber,
}

impl Ack {
    pub fn new(sequence: SequenceNumber) -> Self {
        Self { sequence }
    }

    /// Serialize to the fixed 5-byte wire form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(ACK_LEN);
        buf.extend_from_slice(&ACK_TAG);
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        buf
    }

    /// Deserialize, checking length and tag
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != ACK_LEN || bytes[..ACK_TAG.len()] != ACK_TAG {
            return None;
        }

        Some(Self {
            sequence: u16::from_le_bytes([bytes[3], bytes[4]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_roundtrip() {
        let fragment = Fragment::new(7, 41, Bytes::from_static(b"hello"));

        let bytes = fragment.to_bytes();
        assert_eq!(bytes.len(), 4 + 5);

        let restored = Fragment::from_bytes(&bytes).unwrap();
        assert_eq!(restored, fragment);
    }

    #[test]
    fn test_fragment_header_layout() {
        let fragment = Fragment::new(0x0102, 0x0304, Bytes::from_static(b"x"));
        let bytes = fragment.to_bytes();

        // little-endian u16 fields, then the raw payload
        assert_eq!(&bytes, &[0x02, 0x01, 0x04, 0x03, b'x']);
    }

    #[test]
    fn test_fragment_empty_payload() {
        let fragment = Fragment::new(3, 3, Bytes::new());
        let bytes = fragment.to_bytes();
        assert_eq!(bytes.len(), 4);

        let restored = Fragment::from_bytes(&bytes).unwrap();
        assert_eq!(restored.sequence, 3);
        assert_eq!(restored.max_sequence, 3);
        assert!(restored.payload.is_empty());
    }

    #[test]
    fn test_fragment_too_short() {
        let err = Fragment::from_bytes(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::MalformedFragment { len: 3 }));
    }

    #[test]
    fn test_ack_roundtrip() {
        let ack = Ack::new(0xBEEF);
        let bytes = ack.to_bytes();

        assert_eq!(bytes.len(), ACK_LEN);
        assert_eq!(&bytes[..3], b"ACK");
        assert_eq!(Ack::from_bytes(&bytes), Some(ack));
    }

    #[test]
    fn test_ack_rejects_bad_tag_and_length() {
        assert_eq!(Ack::from_bytes(b"NAK\x00\x00"), None);
        assert_eq!(Ack::from_bytes(b"ACK\x00"), None);
        assert_eq!(Ack::from_bytes(b"ACK\x00\x00\x00"), None);
    }
}
