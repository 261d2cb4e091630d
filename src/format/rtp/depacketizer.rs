use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::svc::types::{NalUnit, UnitType, TYPE_MASK};
use crate::error::{Result, SvcError};
use crate::utils::{flag, ByteReader};

const FU_START_MASK: u8 = 0x80;
const FU_END_MASK: u8 = 0x40;
/// F and NRI bits carried over from the FU indicator
const FU_INDICATOR_HEADER_MASK: u8 = 0xe0;

/// Whether a fragmented unit is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassemblyState {
    /// No fragment buffered
    Idle,
    /// A start fragment was seen and the end has not arrived yet
    Accumulating,
}

/// Rebuilds complete NAL units from RTP payloads (single NAL, STAP-A, FU-A/FU-B).
///
/// One depacketizer serves one RTP stream: the fragment buffer assumes the
/// payloads it sees all belong to the same SSRC and arrive in transmission
/// order. Nothing is resequenced.
///
/// ```rust
/// use svcio::format::rtp::Depacketizer;
///
/// let mut depay = Depacketizer::new();
///
/// // IDR slice split into a start and an end fragment
/// assert!(depay.push(&[0x7c, 0x85, 0x01, 0x02]).is_empty());
/// let units = depay.push(&[0x7c, 0x45, 0x03]);
///
/// let unit = units[0].as_ref().unwrap();
/// assert_eq!(&unit.data[..], &[0x65, 0x01, 0x02, 0x03]);
/// ```
#[derive(Debug, Default)]
pub struct Depacketizer {
    /// Header byte followed by the fragment bodies seen so far; empty when idle
    fragment: BytesMut,
}

impl Depacketizer {
    /// Creates an idle depacketizer
    pub fn new() -> Self {
        Self::default()
    }

    /// Current reassembly state
    pub fn state(&self) -> ReassemblyState {
        if self.fragment.is_empty() {
            ReassemblyState::Idle
        } else {
            ReassemblyState::Accumulating
        }
    }

    /// Processes one RTP payload.
    ///
    /// Returns, in order, every unit completed by this payload and every
    /// failure it caused. A failure only concerns its own unit; the
    /// depacketizer stays usable for the next payload.
    pub fn push(&mut self, payload: &[u8]) -> Vec<Result<NalUnit>> {
        let mut out = Vec::new();

        let Some(&indicator) = payload.first() else {
            out.push(Err(SvcError::truncated("rtp payload", 1, 0)));
            return out;
        };

        match UnitType::from_header(indicator) {
            UnitType::Single(_) | UnitType::Pacsi => {
                out.push(NalUnit::new(Bytes::copy_from_slice(payload)));
            }
            UnitType::StapA => unpack_aggregate(&payload[1..], &mut out),
            UnitType::FuA | UnitType::FuB => match self.push_fragment(payload) {
                Ok(Some(unit)) => out.push(Ok(unit)),
                Ok(None) => {}
                Err(e) => out.push(Err(e)),
            },
            UnitType::Other(t) => out.push(Err(SvcError::UnsupportedUnitType(t))),
        }

        out
    }

    /// Drops any in-flight fragment without reporting it.
    pub fn reset(&mut self) {
        self.fragment.clear();
    }

    /// Signals end of input. A fragment still waiting for its end is discarded and reported.
    pub fn finish(&mut self) -> Result<()> {
        if self.fragment.is_empty() {
            return Ok(());
        }
        let pending = self.fragment.len();
        self.fragment.clear();
        log::warn!("End of input with {} bytes of an unfinished fragment", pending);
        Err(SvcError::AbandonedFragment(format!(
            "input ended with {} bytes buffered and no end fragment",
            pending
        )))
    }

    fn push_fragment(&mut self, payload: &[u8]) -> Result<Option<NalUnit>> {
        if payload.len() < 2 {
            self.fragment.clear();
            return Err(SvcError::truncated("fu header", 2, payload.len()));
        }
        let indicator = payload[0];
        let fu_header = payload[1];
        let body = &payload[2..];

        if flag(fu_header, FU_START_MASK) {
            let abandoned = self.fragment.len();
            self.fragment.clear();
            self.fragment
                .put_u8((indicator & FU_INDICATOR_HEADER_MASK) | (fu_header & TYPE_MASK));
            self.fragment.extend_from_slice(body);

            if abandoned > 0 {
                log::warn!(
                    "Start fragment arrived while {} bytes were still buffered; previous unit lost",
                    abandoned
                );
                return Err(SvcError::AbandonedFragment(format!(
                    "{} buffered bytes discarded by a new start fragment",
                    abandoned
                )));
            }
            return Ok(None);
        }

        if self.fragment.is_empty() {
            log::warn!("Fragment without a preceding start fragment; unit lost");
            return Err(SvcError::AbandonedFragment(
                "continuation fragment with no start fragment".into(),
            ));
        }

        self.fragment.extend_from_slice(body);
        if !flag(fu_header, FU_END_MASK) {
            return Ok(None);
        }

        let unit = NalUnit::new(self.fragment.split().freeze())?;
        log::debug!("Reconstructed NAL type: {}", unit.unit_type);
        Ok(Some(unit))
    }
}

/// Splits a STAP-A body (after its 1-byte header) into its size-prefixed sub-units.
fn unpack_aggregate(body: &[u8], out: &mut Vec<Result<NalUnit>>) {
    let mut reader = ByteReader::new(body);
    while !reader.is_empty() {
        let sub_unit = reader.read_u16("stap-a size").and_then(|size| {
            reader
                .read_bytes(size as usize, "stap-a sub-unit")
                .map(Bytes::copy_from_slice)
        });
        match sub_unit {
            Ok(data) => {
                let unit = NalUnit::new(data);
                if let Ok(unit) = &unit {
                    log::debug!("Sub NAL type: {}", unit.unit_type);
                }
                out.push(unit);
            }
            Err(e) => {
                out.push(Err(e));
                return;
            }
        }
    }
}
