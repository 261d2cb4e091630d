use std::num::ParseIntError;
use thiserror::Error;

/// Errors produced while parsing, reassembling or decoding SVC units
#[derive(Error, Debug)]
pub enum SvcError {
    /// A read would run past the end of the available bytes.
    #[error("truncated input reading {what}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        /// Field being read
        what: &'static str,
        /// Bytes the field needs
        needed: usize,
        /// Bytes that were left
        available: usize,
    },

    /// A layer description uses the undefined frame rate index 7.
    #[error("unsupported fps index: {0}")]
    UnsupportedFpsIndex(u8),

    /// A fragmented unit was lost: its start was missed, or it never saw an end fragment.
    #[error("abandoned fragment: {0}")]
    AbandonedFragment(String),

    /// The payload's NAL type is not a depacketizable type.
    #[error("unsupported unit type: {0}")]
    UnsupportedUnitType(u8),

    /// Well-formed length but inconsistent content.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// RTP header violates RFC 3550.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Reported by an external decoder.
    #[error("decoder error: {0}")]
    Decoder(String),

    /// I/O error from an output sink or config file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A numeric config value did not parse.
    #[error("parse int error: {0}")]
    ParseInt(#[from] ParseIntError),
}

impl SvcError {
    pub(crate) fn truncated(what: &'static str, needed: usize, available: usize) -> Self {
        SvcError::TruncatedInput {
            what,
            needed,
            available,
        }
    }
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, SvcError>;
