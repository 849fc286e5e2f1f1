//! Error types

use thiserror::Error;

/// SFT protocol error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed fragment: {len} bytes, need at least 4")]
    MalformedFragment { len: usize },

    #[error("retry budget exhausted for fragment {sequence} after {attempts} attempts")]
    RetryExhausted { sequence: u16, attempts: u32 },

    #[error("session stalled: {received}/{expected} fragments received")]
    SessionTimeout { received: usize, expected: usize },

    #[error("nothing to send: source is empty")]
    EmptySource,

    #[error("source too large: {fragments} fragments exceed the sequence space")]
    SourceTooLarge { fragments: u64 },

    #[error("completed-transfer channel closed")]
    ChannelClosed,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
