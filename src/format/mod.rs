//! Aggregated log file codec.
//!
//! A node file is a header followed by records appended in upload order:
//!
//! ```text
//! file    := MAGIC version:u32 record*
//! record  := key_len:u16 key value_len:u64 segment*
//! segment := type_len:u16 type payload_len:u64 payload
//! ```
//!
//! All integers are big-endian. The segments of a record fill exactly
//! `value_len` bytes, so running out of value bytes at a segment boundary is
//! the end-of-record signal.

pub mod reader;
pub mod writer;

use std::fmt;
use thiserror::Error;

pub use reader::{LogReader, SegmentRead, SegmentStream};
pub use writer::LogWriter;

pub const MAGIC: [u8; 4] = *b"AGLF";
pub const VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt aggregated log: {0}")]
    Corrupt(String),

    #[error("cannot encode record: {0}")]
    Encode(String),

    /// Writing decoded content to the caller's sink failed; the file itself is fine.
    #[error("output error: {0}")]
    Sink(#[source] std::io::Error),
}

/// Identifier of one execution container; the key of a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerKey(String);

impl ContainerKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Header of one segment as read from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHeader {
    pub log_type: String,
    pub length: u64,
}

/// A segment to be written: one named log output of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSegment {
    pub log_type: String,
    pub data: Vec<u8>,
}

impl LogSegment {
    pub fn new(log_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            log_type: log_type.into(),
            data: data.into(),
        }
    }
}
