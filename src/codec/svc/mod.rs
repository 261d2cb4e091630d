//! # H.264 SVC Payload Metadata
//!
//! Parsing for the scalable-video specific units carried over RTP:
//!
//! - NAL unit classification by header type
//! - PACSI (Payload Content Scalability Information) headers, including the
//!   optional Y/T fields
//! - SEI messages embedded in PACSI units, decoded by UUID into stream layout,
//!   bitstream info, or raw generic payloads
//!
//! ## Example: Parsing a PACSI unit
//!
//! ```rust
//! use svcio::codec::svc::{parse_pacsi, SeiMessage};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Header with the T flag set, DONC = 7, one short generic SEI container
//! let unit = [
//!     0x7e, 0xc0, 0x80, 0x07, 0x20, // fixed header
//!     0x00, 0x07,                   // DONC
//!     0x00, 0x05,                   // SEI size
//!     0x06, 0x05, 0x02, 0xaa, 0xbb, // SEI container
//! ];
//!
//! let pacsi = parse_pacsi(&unit)?;
//! assert_eq!(pacsi.unit_type, 30);
//! assert_eq!(pacsi.decoding_order_number, Some(7));
//! assert!(pacsi.y_fields.is_none());
//! assert!(matches!(pacsi.sei[0], SeiMessage::Generic(_)));
//! # Ok(())
//! # }
//! ```

/// PACSI header parsing
pub mod pacsi;
/// SEI message decoding
pub mod sei;
/// NAL unit types shared by the parsers and the depacketizer
pub mod types;

#[cfg(test)]
mod tests;

pub use pacsi::{parse_pacsi, PacsiRecord, PacsiYFields};
pub use sei::{
    BitStreamInfo, LayerDescription, SeiHeader, SeiMessage, StreamLayoutInfo,
    BITSTREAM_INFO_UUID, STREAM_LAYOUT_UUID,
};
pub use types::{NalUnit, UnitType};
