//! Content sniffing for reassembled transfers
//!
//! Classifies a completed stream by matching its leading bytes against an
//! ordered table of known magic prefixes. Advisory only: the result picks an
//! output file extension and never blocks acceptance of a transfer.

/// Content classification of a reassembled stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Bmp,
    Jpeg,
    Png,
    /// No known magic prefix matched
    Text,
    /// Too short to carry a magic prefix
    Unknown,
}

/// Probe table, evaluated in order. First prefix match wins; order matters
/// because prefixes could in principle overlap.
const MAGIC_PROBES: &[(ContentKind, &[u8])] = &[
    (ContentKind::Bmp, &[0x42, 0x4D]),
    (ContentKind::Jpeg, &[0xFF, 0xD8]),
    (ContentKind::Png, &[0x89, 0x50, 0x4E, 0x47]),
];

impl ContentKind {
    /// Classify a stream from its leading bytes.
    ///
    /// Streams shorter than 4 bytes get the fallback kind; streams matching
    /// no probe are treated as plain text.
    pub fn sniff(head: &[u8]) -> Self {
        if head.len() < 4 {
            return ContentKind::Unknown;
        }

        for &(kind, magic) in MAGIC_PROBES {
            if head.starts_with(magic) {
                return kind;
            }
        }

        ContentKind::Text
    }

    /// File extension associated with this kind
    pub fn extension(&self) -> &'static str {
        match self {
            ContentKind::Bmp => "bmp",
            ContentKind::Jpeg => "jpg",
            ContentKind::Png => "png",
            ContentKind::Text => "txt",
            ContentKind::Unknown => "bin",
        }
    }
}
