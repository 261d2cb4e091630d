use bytes::Bytes;
use std::fmt;

use crate::error::{Result, SvcError};
use crate::utils::extract;

/// Forbidden zero bit of a NAL header
pub const F_MASK: u8 = 0x80;
/// nal_ref_idc bits
pub const NRI_MASK: u8 = 0x60;
/// NAL unit type bits
pub const TYPE_MASK: u8 = 0x1f;

/// NAL unit type as carried in the low 5 bits of the unit header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitType {
    /// Coded picture data and parameter sets (1-23)
    Single(u8),
    /// STAP-A aggregation packet
    StapA,
    /// FU-A fragmentation unit
    FuA,
    /// FU-B fragmentation unit
    FuB,
    /// Payload Content Scalability Information
    Pacsi,
    /// Anything this crate does not depacketize (0, 25-27, 31)
    Other(u8),
}

impl UnitType {
    /// Classifies a NAL header byte by its low 5 bits.
    pub fn from_header(header: u8) -> Self {
        Self::from(extract(header, TYPE_MASK))
    }

    /// Numeric type value (0-31)
    pub fn value(self) -> u8 {
        match self {
            UnitType::Single(t) | UnitType::Other(t) => t,
            UnitType::StapA => 24,
            UnitType::FuA => 28,
            UnitType::FuB => 29,
            UnitType::Pacsi => 30,
        }
    }

    /// True for units handed to the decoder rather than the PACSI parser.
    pub fn is_coded(self) -> bool {
        matches!(self, UnitType::Single(_))
    }
}

impl From<u8> for UnitType {
    fn from(value: u8) -> Self {
        match value & TYPE_MASK {
            t @ 1..=23 => UnitType::Single(t),
            24 => UnitType::StapA,
            28 => UnitType::FuA,
            29 => UnitType::FuB,
            30 => UnitType::Pacsi,
            t => UnitType::Other(t),
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// One complete NAL unit after fragmentation and aggregation are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NalUnit {
    /// Type from the header byte
    pub unit_type: UnitType,
    /// Reference importance (NRI bits)
    pub nal_ref_idc: u8,
    /// The whole unit, header byte included
    pub data: Bytes,
}

impl NalUnit {
    /// Wraps a complete unit. Fails on empty input since there is no header to classify.
    pub fn new(data: Bytes) -> Result<Self> {
        let header = *data
            .first()
            .ok_or_else(|| SvcError::truncated("nal unit header", 1, 0))?;
        Ok(Self {
            unit_type: UnitType::from_header(header),
            nal_ref_idc: extract(header, NRI_MASK),
            data,
        })
    }

    /// The NAL header byte
    pub fn header(&self) -> u8 {
        self.data.first().copied().unwrap_or_default()
    }

    /// The F bit; set means the unit is known to be corrupt.
    pub fn forbidden_bit(&self) -> bool {
        extract(self.header(), F_MASK) != 0
    }

    /// Length in bytes, header included
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the unit holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true for PACSI (type 30) units
    pub fn is_pacsi(&self) -> bool {
        self.unit_type == UnitType::Pacsi
    }

    /// Raw unit bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}
