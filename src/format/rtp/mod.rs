//! # Real-time Transport Protocol (RTP) Input
//!
//! This module turns raw RTP packets back into complete NAL units:
//!
//! - RTP fixed header parsing (RFC 3550), CSRC list, header extension and padding
//! - SSRC allow-list filtering
//! - Depacketization of single NAL, STAP-A and FU-A/FU-B payloads
//!
//! Packets are taken in delivery order. There is no jitter buffer and no
//! sequence number checking; a lost fragment simply loses its unit.
//!
//! ## Example: Parsing and filtering RTP packets
//!
//! ```rust
//! use svcio::format::rtp::{RTPPacket, SsrcFilter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let raw = [
//!     0x80, 0xe0, 0x03, 0xe8, // V=2, M=1, PT=96, seq=1000
//!     0x00, 0x01, 0x5f, 0x90, // timestamp=90000
//!     0x12, 0x34, 0x56, 0x78, // SSRC
//!     0x65, 0x88,             // payload
//! ];
//!
//! let packet = RTPPacket::parse(&raw)?;
//! assert_eq!(packet.sequence_number, 1000);
//!
//! let filter = SsrcFilter::new([0x12345678]);
//! assert!(filter.admits(packet.ssrc));
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: Reassembling units
//!
//! ```rust
//! use svcio::format::rtp::Depacketizer;
//!
//! let mut depay = Depacketizer::new();
//! for result in depay.push(&[0x78, 0x00, 0x02, 0x67, 0x42, 0x00, 0x02, 0x68, 0xce]) {
//!     let unit = result.unwrap();
//!     println!("unit type {}", unit.unit_type);
//! }
//! ```

use bytes::Bytes;

use crate::error::{Result, SvcError};
use crate::utils::{extract, flag, ByteReader};

/// Reassembly of NAL units from RTP payloads
pub mod depacketizer;


pub use depacketizer::{Depacketizer, ReassemblyState};

/// Fixed header size, before CSRCs and extension
pub const RTP_HEADER_LEN: usize = 12;
/// The only version accepted
pub const RTP_VERSION: u8 = 2;

const VERSION_MASK: u8 = 0xc0;
const PADDING_MASK: u8 = 0x20;
const EXTENSION_MASK: u8 = 0x10;
const CSRC_COUNT_MASK: u8 = 0x0f;
const MARKER_MASK: u8 = 0x80;
const PAYLOAD_TYPE_MASK: u8 = 0x7f;

/// An RTP packet containing media data and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RTPPacket {
    /// RTP version (always 2 once parsed)
    pub version: u8,
    /// Padding flag
    pub padding: bool,
    /// Header extension flag
    pub extension: bool,
    /// CSRC count
    pub csrc_count: u8,
    /// Marker bit
    pub marker: bool,
    /// Payload type identifier
    pub payload_type: u8,
    /// Packet sequence number
    pub sequence_number: u16,
    /// Media timestamp
    pub timestamp: u32,
    /// Synchronization source identifier
    pub ssrc: u32,
    /// Contributing source identifiers
    pub csrc: Vec<u32>,
    /// Optional header extension (profile-specific ID, data)
    pub extension_data: Option<(u16, Bytes)>,
    /// Packet payload, padding removed
    pub payload: Bytes,
}

impl RTPPacket {
    /// Parses an RTP packet from raw bytes (a UDP payload)
    ///
    /// # Errors
    ///
    /// - [`SvcError::TruncatedInput`] if the header, CSRC list or extension
    ///   runs past the end of `data`
    /// - [`SvcError::Protocol`] if the version is not 2 or the padding length
    ///   is invalid
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < RTP_HEADER_LEN {
            return Err(SvcError::truncated("rtp header", RTP_HEADER_LEN, data.len()));
        }
        let mut reader = ByteReader::new(data);
        let [first_byte, second_byte] = reader.read_array("rtp header")?;

        let version = extract(first_byte, VERSION_MASK);
        if version != RTP_VERSION {
            return Err(SvcError::Protocol(format!(
                "unsupported rtp version {}",
                version
            )));
        }

        let padding = flag(first_byte, PADDING_MASK);
        let extension = flag(first_byte, EXTENSION_MASK);
        let csrc_count = extract(first_byte, CSRC_COUNT_MASK);
        let marker = flag(second_byte, MARKER_MASK);
        let payload_type = extract(second_byte, PAYLOAD_TYPE_MASK);

        let sequence_number = reader.read_u16("rtp sequence number")?;
        let timestamp = reader.read_u32("rtp timestamp")?;
        let ssrc = reader.read_u32("rtp ssrc")?;

        let csrc = (0..csrc_count)
            .map(|_| reader.read_u32("rtp csrc"))
            .collect::<Result<Vec<_>>>()?;

        let extension_data = if extension {
            let profile = reader.read_u16("rtp extension header")?;
            let words = reader.read_u16("rtp extension length")? as usize;
            let ext = reader.read_bytes(words * 4, "rtp extension")?;
            Some((profile, Bytes::copy_from_slice(ext)))
        } else {
            None
        };

        let mut body = reader.rest();
        if padding {
            let padding_len = body.last().copied().unwrap_or(0) as usize;
            if padding_len == 0 || padding_len > body.len() {
                return Err(SvcError::Protocol(format!(
                    "invalid rtp padding length {} for {} byte payload",
                    padding_len,
                    body.len()
                )));
            }
            body = &body[..body.len() - padding_len];
        }

        Ok(Self {
            version,
            padding,
            extension,
            csrc_count,
            marker,
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
            csrc,
            extension_data,
            payload: Bytes::copy_from_slice(body),
        })
    }
}

/// Allow-list of SSRCs. An empty list admits every stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SsrcFilter {
    allowed: Vec<u32>,
}

impl SsrcFilter {
    /// Admits only the given SSRCs, or everything when there are none
    pub fn new<I: IntoIterator<Item = u32>>(ssrcs: I) -> Self {
        Self {
            allowed: ssrcs.into_iter().collect(),
        }
    }

    /// A filter that admits everything
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Whether packets from `ssrc` should be processed
    pub fn admits(&self, ssrc: u32) -> bool {
        self.allowed.is_empty() || self.allowed.contains(&ssrc)
    }

    /// The configured SSRCs
    pub fn allowed(&self) -> &[u32] {
        &self.allowed
    }
}
