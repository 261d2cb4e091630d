use std::fmt;

use super::sei::{BitStreamInfo, SeiMessage, StreamLayoutInfo};
use super::types::{NalUnit, F_MASK, NRI_MASK, TYPE_MASK};
use crate::error::Result;
use crate::utils::{extract, flag, ByteReader};

/// Fixed header: NAL header byte plus the 4-byte SVC extension
pub const PACSI_HEADER_LEN: usize = 5;

// byte 1
const R_MASK: u8 = 0x80;
const I_MASK: u8 = 0x40;
const PRID_MASK: u8 = 0x3f;
// byte 2
const N_MASK: u8 = 0x80;
const DID_MASK: u8 = 0x70;
const QID_MASK: u8 = 0x0f;
// byte 3
const TID_MASK: u8 = 0xe0;
const U_MASK: u8 = 0x10;
const D_MASK: u8 = 0x08;
const O_MASK: u8 = 0x04;
const RR_MASK: u8 = 0x03;
// byte 4
const X_MASK: u8 = 0x80;
const Y_MASK: u8 = 0x40;
const T_MASK: u8 = 0x20;
const A_MASK: u8 = 0x10;
const P_MASK: u8 = 0x08;
const C_MASK: u8 = 0x04;
const S_MASK: u8 = 0x02;
const E_MASK: u8 = 0x01;

/// Fields present when the Y flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacsiYFields {
    /// TL0PICIDX
    pub tl0_pic_idx: u8,
    /// IDRPICID
    pub idr_pic_id: u16,
}

/// A decoded Payload Content Scalability Information unit.
#[derive(Debug, Clone, PartialEq)]
pub struct PacsiRecord {
    /// F
    pub forbidden_bit: bool,
    /// NRI
    pub ref_idc: u8,
    /// NAL unit type, 30 for PACSI
    pub unit_type: u8,
    /// R
    pub retransmission: bool,
    /// I, IDR flag
    pub idr_flag: bool,
    /// PRID
    pub priority_id: u8,
    /// N, no inter-layer prediction
    pub no_inter_layer_pred: bool,
    /// DID
    pub dependency_id: u8,
    /// QID
    pub quality_id: u8,
    /// TID
    pub temporal_id: u8,
    /// U, use reference base picture
    pub use_ref_base_pic: bool,
    /// D
    pub discardable: bool,
    /// O
    pub output: bool,
    /// RR, reserved
    pub reserved_rr: u8,
    /// X
    pub extension: bool,
    /// Y, TL0PICIDX and IDRPICID follow the header
    pub has_y_fields: bool,
    /// T, DONC follows the header
    pub has_t_fields: bool,
    /// A
    pub adaptive: bool,
    /// P
    pub highest_temporal_at_level: bool,
    /// C
    pub crop: bool,
    /// S
    pub scan: bool,
    /// E
    pub error_propagation: bool,
    /// Present iff `has_y_fields`
    pub y_fields: Option<PacsiYFields>,
    /// Present iff `has_t_fields`
    pub decoding_order_number: Option<u16>,
    /// SEI messages in container order
    pub sei: Vec<SeiMessage>,
}

impl PacsiRecord {
    /// Decodes the 5 fixed header bytes. Optional fields and SEI messages are left empty.
    pub fn from_header(header: [u8; PACSI_HEADER_LEN]) -> Self {
        let [b0, b1, b2, b3, b4] = header;
        Self {
            forbidden_bit: flag(b0, F_MASK),
            ref_idc: extract(b0, NRI_MASK),
            unit_type: extract(b0, TYPE_MASK),
            retransmission: flag(b1, R_MASK),
            idr_flag: flag(b1, I_MASK),
            priority_id: extract(b1, PRID_MASK),
            no_inter_layer_pred: flag(b2, N_MASK),
            dependency_id: extract(b2, DID_MASK),
            quality_id: extract(b2, QID_MASK),
            temporal_id: extract(b3, TID_MASK),
            use_ref_base_pic: flag(b3, U_MASK),
            discardable: flag(b3, D_MASK),
            output: flag(b3, O_MASK),
            reserved_rr: extract(b3, RR_MASK),
            extension: flag(b4, X_MASK),
            has_y_fields: flag(b4, Y_MASK),
            has_t_fields: flag(b4, T_MASK),
            adaptive: flag(b4, A_MASK),
            highest_temporal_at_level: flag(b4, P_MASK),
            crop: flag(b4, C_MASK),
            scan: flag(b4, S_MASK),
            error_propagation: flag(b4, E_MASK),
            y_fields: None,
            decoding_order_number: None,
            sei: Vec::new(),
        }
    }

    /// Parses a complete PACSI NAL unit.
    pub fn parse(unit: &NalUnit) -> Result<Self> {
        parse_pacsi(&unit.data)
    }

    /// Stream layout messages among [`sei`](Self::sei)
    pub fn stream_layouts(&self) -> impl Iterator<Item = &StreamLayoutInfo> {
        self.sei.iter().filter_map(|sei| match sei {
            SeiMessage::StreamLayout(sl) => Some(sl),
            _ => None,
        })
    }

    /// Bitstream info messages among [`sei`](Self::sei)
    pub fn bitstream_infos(&self) -> impl Iterator<Item = &BitStreamInfo> {
        self.sei.iter().filter_map(|sei| match sei {
            SeiMessage::BitStreamInfo(bi) => Some(bi),
            _ => None,
        })
    }
}

/// Parses a PACSI unit: fixed header, optional Y/T fields, then size-prefixed SEI containers.
///
/// Any field or container that would run past the end of `data` fails the
/// whole unit with [`SvcError::TruncatedInput`](crate::SvcError::TruncatedInput).
pub fn parse_pacsi(data: &[u8]) -> Result<PacsiRecord> {
    let mut reader = ByteReader::new(data);
    let mut pacsi = PacsiRecord::from_header(reader.read_array("pacsi header")?);

    if pacsi.has_y_fields {
        let tl0_pic_idx = reader.read_u8("pacsi tl0picidx")?;
        let idr_pic_id = reader.read_u16("pacsi idrpicid")?;
        pacsi.y_fields = Some(PacsiYFields {
            tl0_pic_idx,
            idr_pic_id,
        });
    }
    if pacsi.has_t_fields {
        pacsi.decoding_order_number = Some(reader.read_u16("pacsi donc")?);
    }

    while !reader.is_empty() {
        let sei_size = reader.read_u16("sei size")? as usize;
        let container = reader.read_bytes(sei_size, "sei container")?;
        pacsi.sei.push(SeiMessage::parse(container)?);
    }

    Ok(pacsi)
}

impl fmt::Display for PacsiRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-- PACSI HEADER --")?;
        writeln!(f, "F    : {}", self.forbidden_bit as u8)?;
        writeln!(f, "NRI  : {}", self.ref_idc)?;
        writeln!(f, "TYPE : {}", self.unit_type)?;
        writeln!(f, "R    : {}", self.retransmission as u8)?;
        writeln!(f, "I    : {}", self.idr_flag as u8)?;
        writeln!(f, "PRID : {}", self.priority_id)?;
        writeln!(f, "N    : {}", self.no_inter_layer_pred as u8)?;
        writeln!(f, "DID  : {}", self.dependency_id)?;
        writeln!(f, "QID  : {}", self.quality_id)?;
        writeln!(f, "TID  : {}", self.temporal_id)?;
        writeln!(f, "U    : {}", self.use_ref_base_pic as u8)?;
        writeln!(f, "D    : {}", self.discardable as u8)?;
        writeln!(f, "O    : {}", self.output as u8)?;
        writeln!(f, "RR   : {}", self.reserved_rr)?;
        writeln!(f, "X    : {}", self.extension as u8)?;
        writeln!(f, "Y    : {}", self.has_y_fields as u8)?;
        writeln!(f, "T    : {}", self.has_t_fields as u8)?;
        writeln!(f, "A    : {}", self.adaptive as u8)?;
        writeln!(f, "P    : {}", self.highest_temporal_at_level as u8)?;
        writeln!(f, "C    : {}", self.crop as u8)?;
        writeln!(f, "S    : {}", self.scan as u8)?;
        writeln!(f, "E    : {}", self.error_propagation as u8)?;
        if let Some(y) = &self.y_fields {
            writeln!(f, "TL0PICIDX : {}", y.tl0_pic_idx)?;
            writeln!(f, "IDRPICID  : {}", y.idr_pic_id)?;
        }
        if let Some(donc) = self.decoding_order_number {
            writeln!(f, "DONC : {}", donc)?;
        }
        for sei in &self.sei {
            write!(f, "{}", sei)?;
        }
        Ok(())
    }
}

