//! Storage collaborators
//!
//! The sender streams its source fragment-by-fragment through a
//! [`SourceReader`], so large files are never held in memory whole. The
//! receiver persists completed transfers under a fixed prefix plus the
//! sniffed extension.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::info;

use crate::error::Result;
use crate::receiver::CompletedTransfer;

/// A byte source the sender pipeline can read at arbitrary offsets
pub trait SourceReader {
    /// Total length of the source in bytes
    fn total_len(&self) -> u64;

    /// Read up to `len` bytes starting at `offset`. A short read past the
    /// end of the source is expected for the final fragment.
    fn read_at(&mut self, offset: u64, len: usize) -> Result<Bytes>;
}

/// File-backed source, read one fragment at a time
#[derive(Debug)]
pub struct FileSource {
    file: File,
    len: u64,
}

impl FileSource {
    /// Open a file and measure it by seeking to the end
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = File::open(path)?;
        let len = file.seek(SeekFrom::End(0))?;
        Ok(Self { file, len })
    }
}

impl SourceReader for FileSource {
    fn total_len(&self) -> u64 {
        self.len
    }

    fn read_at(&mut self, offset: u64, len: usize) -> Result<Bytes> {
        self.file.seek(SeekFrom::Start(offset))?;

        let mut buf = Vec::with_capacity(len);
        self.file
            .by_ref()
            .take(len as u64)
            .read_to_end(&mut buf)?;

        Ok(Bytes::from(buf))
    }
}

/// In-memory source for literal text messages
#[derive(Debug)]
pub struct MessageSource {
    bytes: Bytes,
}

impl MessageSource {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            bytes: Bytes::from(message.into()),
        }
    }
}

impl SourceReader for MessageSource {
    fn total_len(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn read_at(&mut self, offset: u64, len: usize) -> Result<Bytes> {
        let start = (offset as usize).min(self.bytes.len());
        let end = (start + len).min(self.bytes.len());
        Ok(self.bytes.slice(start..end))
    }
}

/// Persist a completed transfer as `<prefix>.<sniffed extension>` inside
/// `dir`, returning the path written.
pub fn write_transfer(
    dir: impl AsRef<Path>,
    prefix: &str,
    transfer: &CompletedTransfer,
) -> Result<PathBuf> {
    let path = dir
        .as_ref()
        .join(format!("{}.{}", prefix, transfer.kind.extension()));
    std::fs::write(&path, &transfer.data)?;

    info!(
        path = %path.display(),
        bytes = transfer.data.len(),
        "transfer persisted"
    );
    Ok(path)
}
