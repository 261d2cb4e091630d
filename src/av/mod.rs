//! # Decoder Seam and Frame Output
//!
//! Video decoding itself happens outside this crate. A decoder is anything
//! implementing [`SvcDecoder`]: it is handed one complete NAL unit at a time
//! and reports whether a picture came out.
//!
//! ## Example: Writing decoded frames
//!
//! ```rust
//! use svcio::av::{DecodeStatus, SvcDecoder, VideoFrame, YuvWriter};
//! use svcio::codec::svc::NalUnit;
//!
//! struct GreyDecoder;
//!
//! impl SvcDecoder for GreyDecoder {
//!     fn decode(&mut self, _unit: &NalUnit) -> svcio::Result<DecodeStatus> {
//!         let frame = VideoFrame::new(2, 2, vec![128u8; 4], vec![128u8; 1], vec![128u8; 1])?;
//!         Ok(DecodeStatus::ImageReady(frame))
//!     }
//! }
//!
//! # fn main() -> svcio::Result<()> {
//! let mut decoder = GreyDecoder;
//! let mut out = YuvWriter::new(Vec::new(), 1 << 30);
//!
//! let unit = NalUnit::new(bytes::Bytes::from_static(&[0x65, 0x88]))?;
//! if let DecodeStatus::ImageReady(frame) = decoder.decode(&unit)? {
//!     out.write_frame(&frame)?;
//! }
//! assert_eq!(out.bytes_written(), 6);
//! # Ok(())
//! # }
//! ```

use crate::codec::svc::NalUnit;
use crate::Result;

mod frame;
pub use frame::*;

/// Outcome of feeding one unit to a decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Unit consumed, no picture yet
    Ok,
    /// A complete picture is available
    ImageReady(VideoFrame),
    /// The decoder produced a placeholder picture (e.g. after loss)
    GhostImage,
}

impl DecodeStatus {
    /// The picture, if one is ready
    pub fn frame(&self) -> Option<&VideoFrame> {
        match self {
            DecodeStatus::ImageReady(frame) => Some(frame),
            _ => None,
        }
    }
}

/// A video decoder that consumes complete NAL units in decoding order.
pub trait SvcDecoder {
    /// Decodes one unit. An `Err` is reported for this unit only; the next
    /// unit is still offered to the decoder.
    fn decode(&mut self, unit: &NalUnit) -> Result<DecodeStatus>;
}

impl<D: SvcDecoder + ?Sized> SvcDecoder for Box<D> {
    fn decode(&mut self, unit: &NalUnit) -> Result<DecodeStatus> {
        (**self).decode(unit)
    }
}
