use bytes::Bytes;
use std::fmt;

use super::types::{F_MASK, NRI_MASK, TYPE_MASK};
use crate::error::{Result, SvcError};
use crate::utils::{extract, flag, ByteReader};

/// Length of the per-container header: F/NRI/type, payload type, payload size
pub const SEI_HEADER_LEN: usize = 3;
/// Length of the UUID that opens a user-data SEI payload
pub const UUID_LEN: usize = 16;

/// Identifies a stream layout SEI
pub const STREAM_LAYOUT_UUID: [u8; UUID_LEN] = [
    0x13, 0x9f, 0xb1, 0xa9, 0x44, 0x6a, 0x4d, 0xec, 0x8c, 0xbf, 0x65, 0xb1, 0xe1, 0x2d, 0x2c, 0xfd,
];
/// Identifies a bitstream info SEI
pub const BITSTREAM_INFO_UUID: [u8; UUID_LEN] = [
    0x05, 0xfb, 0xc6, 0xb9, 0x5a, 0x80, 0x40, 0xe5, 0xa2, 0x2a, 0xab, 0x40, 0x20, 0x26, 0x7e, 0x26,
];

const LPB_LEN: usize = 8;
const SL_RESERVED_MASK: u8 = 0xfe;
const SL_P_MASK: u8 = 0x01;

/// Bytes of a layer description record that carry fields; longer records are padded.
pub const LAYER_DESCRIPTION_LEN: usize = 16;
const FPS_INDEX_MASK: u8 = 0xf8;
const LT_MASK: u8 = 0x07;
const LD_PRID_MASK: u8 = 0xfc;
const CB_MASK: u8 = 0x02;
const LD_R_MASK: u8 = 0x01;

const FPS_TABLE: [f32; 7] = [7.5, 12.5, 15.0, 25.0, 30.0, 50.0, 60.0];

type SeiDecoder = fn(SeiHeader) -> Result<SeiMessage>;

/// Payload decoders keyed by UUID, checked in order.
const SEI_DECODERS: [([u8; UUID_LEN], SeiDecoder); 2] = [
    (STREAM_LAYOUT_UUID, decode_stream_layout),
    (BITSTREAM_INFO_UUID, decode_bitstream_info),
];

fn decode_stream_layout(header: SeiHeader) -> Result<SeiMessage> {
    StreamLayoutInfo::parse(header).map(SeiMessage::StreamLayout)
}

fn decode_bitstream_info(header: SeiHeader) -> Result<SeiMessage> {
    BitStreamInfo::parse(header).map(SeiMessage::BitStreamInfo)
}

/// Fields shared by every SEI message, taken from the container itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeiHeader {
    /// F bit of the container's header byte
    pub forbidden_bit: bool,
    /// NRI bits of the container's header byte
    pub ref_idc: u8,
    /// Type bits of the container's header byte
    pub unit_type: u8,
    /// SEI payload type
    pub payload_type: u8,
    /// SEI payload size as declared in the container
    pub payload_size: u8,
    /// Everything after the 3-byte container header, UUID included
    pub payload: Bytes,
}

impl SeiHeader {
    /// Builds a header from the three container header bytes and the payload that follows.
    pub fn new(f_nri_type: u8, payload_type: u8, payload_size: u8, payload: Bytes) -> Self {
        Self {
            forbidden_bit: flag(f_nri_type, F_MASK),
            ref_idc: extract(f_nri_type, NRI_MASK),
            unit_type: extract(f_nri_type, TYPE_MASK),
            payload_type,
            payload_size,
            payload,
        }
    }

    /// The leading UUID, if the payload is long enough to hold one.
    pub fn uuid(&self) -> Option<&[u8]> {
        self.payload.get(..UUID_LEN)
    }

    /// Payload bytes after the UUID; empty if there is no UUID.
    fn body(&self) -> ByteReader<'_> {
        ByteReader::new(self.payload.get(UUID_LEN..).unwrap_or(&[]))
    }
}

/// A decoded SEI message.
#[derive(Debug, Clone, PartialEq)]
pub enum SeiMessage {
    /// Unrecognized payload, kept as raw bytes
    Generic(SeiHeader),
    /// Stream layout, matched by [`STREAM_LAYOUT_UUID`]
    StreamLayout(StreamLayoutInfo),
    /// Bitstream info, matched by [`BITSTREAM_INFO_UUID`]
    BitStreamInfo(BitStreamInfo),
}

impl SeiMessage {
    /// Decodes one SEI container (the bytes following its 2-byte size prefix).
    ///
    /// The variant is picked by the UUID at the start of the payload. Containers
    /// too short to hold a UUID are always `Generic`.
    pub fn parse(container: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(container);
        let f_nri_type = reader.read_u8("sei header")?;
        let payload_type = reader.read_u8("sei payload type")?;
        let payload_size = reader.read_u8("sei payload size")?;
        let header = SeiHeader::new(
            f_nri_type,
            payload_type,
            payload_size,
            Bytes::copy_from_slice(reader.rest()),
        );

        let decoder = header.uuid().and_then(|uuid| {
            SEI_DECODERS
                .iter()
                .find(|(known, _)| known[..] == *uuid)
                .map(|(_, decode)| *decode)
        });
        match decoder {
            Some(decode) => decode(header),
            None => Ok(SeiMessage::Generic(header)),
        }
    }

    /// Container fields common to every variant
    pub fn header(&self) -> &SeiHeader {
        match self {
            SeiMessage::Generic(header) => header,
            SeiMessage::StreamLayout(sl) => &sl.header,
            SeiMessage::BitStreamInfo(bi) => &bi.header,
        }
    }
}

/// Stream layout SEI: which layers are present and, optionally, a description of each.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamLayoutInfo {
    /// Container fields
    pub header: SeiHeader,
    /// Layer-present bits
    pub lpb: [u8; LPB_LEN],
    /// 7 reserved bits
    pub reserved: u8,
    /// Layer descriptions follow
    pub p: bool,
    /// Size of each layer description record; present iff `p`
    pub record_length: Option<u8>,
    /// Empty when `p` is clear
    pub layers: Vec<LayerDescription>,
}

impl StreamLayoutInfo {
    /// Decodes the payload after the UUID: layer bits, P flag and layer descriptions.
    pub fn parse(header: SeiHeader) -> Result<Self> {
        if header.payload.len() < UUID_LEN {
            return Err(SvcError::truncated(
                "stream layout uuid",
                UUID_LEN,
                header.payload.len(),
            ));
        }
        let mut reader = header.body();

        let lpb = reader.read_array::<LPB_LEN>("stream layout lpb")?;
        let r_p = reader.read_u8("stream layout r/p")?;
        let reserved = extract(r_p, SL_RESERVED_MASK);
        let p = flag(r_p, SL_P_MASK);

        let mut record_length = None;
        let mut layers = Vec::new();
        if p {
            let len = reader.read_u8("layer description length")?;
            record_length = Some(len);
            if len == 0 && !reader.is_empty() {
                return Err(SvcError::InvalidData(format!(
                    "zero layer description length with {} bytes left",
                    reader.remaining()
                )));
            }
            while !reader.is_empty() {
                let record = reader.read_bytes(len as usize, "layer description")?;
                layers.push(LayerDescription::parse(record)?);
            }
        }

        Ok(Self {
            header,
            lpb,
            reserved,
            p,
            record_length,
            layers,
        })
    }
}

/// Per-layer description carried in a stream layout SEI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerDescription {
    /// Coded picture width in pixels
    pub coded_width: u16,
    /// Coded picture height in pixels
    pub coded_height: u16,
    /// Display width in pixels
    pub display_width: u16,
    /// Display height in pixels
    pub display_height: u16,
    /// Layer bitrate
    pub bitrate: u32,
    /// Index into the frame rate table; see [`frame_rate`](Self::frame_rate)
    pub fps_index: u8,
    /// Temporal layer
    pub layer_temporal: u8,
    /// Layer priority id
    pub priority_id: u8,
    /// Cropping info present
    pub crop: bool,
    /// Reserved bit
    pub reserved: u8,
    /// Trailing reserved 16 bits
    pub reserved2: u16,
}

impl LayerDescription {
    /// Decodes one record. Bytes past the 16 defined ones are ignored.
    pub fn parse(record: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(record);
        let coded_width = reader.read_u16("coded width")?;
        let coded_height = reader.read_u16("coded height")?;
        let display_width = reader.read_u16("display width")?;
        let display_height = reader.read_u16("display height")?;
        let bitrate = reader.read_u32("bitrate")?;
        let fps_lt = reader.read_u8("fps index/lt")?;
        let prid_cb_r = reader.read_u8("priority id/cb/r")?;
        let reserved2 = reader.read_u16("layer description reserved")?;

        Ok(Self {
            coded_width,
            coded_height,
            display_width,
            display_height,
            bitrate,
            fps_index: extract(fps_lt, FPS_INDEX_MASK),
            layer_temporal: extract(fps_lt, LT_MASK),
            priority_id: extract(prid_cb_r, LD_PRID_MASK),
            crop: flag(prid_cb_r, CB_MASK),
            reserved: extract(prid_cb_r, LD_R_MASK),
            reserved2,
        })
    }

    /// Frames per second for `fps_index`. Index 7 is not defined and is an error.
    pub fn frame_rate(&self) -> Result<f32> {
        FPS_TABLE
            .get(self.fps_index as usize)
            .copied()
            .ok_or(SvcError::UnsupportedFpsIndex(self.fps_index))
    }
}

/// Bitstream info SEI: reference frame and NAL unit counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitStreamInfo {
    /// Container fields
    pub header: SeiHeader,
    /// Number of reference frames
    pub ref_frame_count: u8,
    /// Number of NAL units
    pub nal_unit_count: u8,
}

impl BitStreamInfo {
    /// Decodes the two count bytes after the UUID.
    pub fn parse(header: SeiHeader) -> Result<Self> {
        if header.payload.len() < UUID_LEN {
            return Err(SvcError::truncated(
                "bitstream info uuid",
                UUID_LEN,
                header.payload.len(),
            ));
        }
        let mut reader = header.body();
        let ref_frame_count = reader.read_u8("ref frame count")?;
        let nal_unit_count = reader.read_u8("nal unit count")?;
        Ok(Self {
            header,
            ref_frame_count,
            nal_unit_count,
        })
    }
}

impl fmt::Display for SeiHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "F            : {}", self.forbidden_bit as u8)?;
        writeln!(f, "NRI          : {}", self.ref_idc)?;
        writeln!(f, "TYPE         : {}", self.unit_type)?;
        writeln!(f, "PAYLOAD TYPE : {}", self.payload_type)?;
        writeln!(f, "PAYLOAD SIZE : {}", self.payload_size)
    }
}

impl fmt::Display for SeiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeiMessage::Generic(header) => {
                writeln!(f, "-- SEI --")?;
                write!(f, "{}", header)?;
                write!(f, "PAYLOAD      :")?;
                for (i, byte) in header.payload.iter().enumerate() {
                    if i > 0 && i % 4 == 0 {
                        write!(f, "\n              ")?;
                    }
                    write!(f, " {:#04x}", byte)?;
                }
                writeln!(f)
            }
            SeiMessage::StreamLayout(sl) => write!(f, "{}", sl),
            SeiMessage::BitStreamInfo(bi) => write!(f, "{}", bi),
        }
    }
}

impl fmt::Display for StreamLayoutInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-- SEI STREAM LAYOUT --")?;
        write!(f, "{}", self.header)?;
        for (i, lpb) in self.lpb.iter().enumerate() {
            writeln!(f, "LPB{}         : {}", i, lpb)?;
        }
        writeln!(f, "R            : {}", self.reserved)?;
        writeln!(f, "P            : {}", self.p as u8)?;
        if let Some(len) = self.record_length {
            writeln!(f, "LD LENGTH    : {}", len)?;
        }
        for layer in &self.layers {
            write!(f, "{}", layer)?;
        }
        Ok(())
    }
}

impl fmt::Display for LayerDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-- LAYER DESCRIPTION --")?;
        writeln!(f, "CODED WIDTH    : {}", self.coded_width)?;
        writeln!(f, "CODED HEIGHT   : {}", self.coded_height)?;
        writeln!(f, "DISPLAY WIDTH  : {}", self.display_width)?;
        writeln!(f, "DISPLAY HEIGHT : {}", self.display_height)?;
        writeln!(f, "BITRATE        : {}", self.bitrate)?;
        writeln!(f, "FPS INDEX      : {}", self.fps_index)?;
        match self.frame_rate() {
            Ok(fps) => writeln!(f, "FPS            : {}", fps)?,
            Err(_) => writeln!(f, "FPS            : unknown")?,
        }
        writeln!(f, "LT             : {}", self.layer_temporal)?;
        writeln!(f, "PRID           : {}", self.priority_id)?;
        writeln!(f, "CB             : {}", self.crop as u8)?;
        writeln!(f, "R              : {}", self.reserved)?;
        writeln!(f, "R2             : {}", self.reserved2)
    }
}

impl fmt::Display for BitStreamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-- SEI BITSTREAM INFO --")?;
        write!(f, "{}", self.header)?;
        writeln!(f, "REF FRAME COUNT  : {}", self.ref_frame_count)?;
        writeln!(f, "NUM OF NAL UNITS : {}", self.nal_unit_count)
    }
}
