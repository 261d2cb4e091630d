//! # Packet Dispatch Pipeline
//!
//! Ties the pieces together: RTP packets are filtered by SSRC, each SSRC gets
//! its own [`Depacketizer`], and every completed unit is dispatched. PACSI
//! units are parsed into [`PacsiRecord`]s; everything else goes to the
//! [`SvcDecoder`].
//!
//! Failures never stop the pipeline. Each one comes back as a
//! [`PipelineEvent::Error`] alongside the events for the units that did work.
//!
//! ## Example
//!
//! ```rust
//! use svcio::av::{DecodeStatus, SvcDecoder};
//! use svcio::codec::svc::NalUnit;
//! use svcio::pipeline::{Pipeline, PipelineEvent, PipelineOptions};
//!
//! struct NullDecoder;
//!
//! impl SvcDecoder for NullDecoder {
//!     fn decode(&mut self, _unit: &NalUnit) -> svcio::Result<DecodeStatus> {
//!         Ok(DecodeStatus::Ok)
//!     }
//! }
//!
//! let mut pipeline = Pipeline::new(NullDecoder, PipelineOptions::default());
//!
//! let packet = [
//!     0x80, 0x60, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2a,
//!     0x65, 0x88, 0x84,
//! ];
//! let events = pipeline.push_packet(&packet);
//! assert!(matches!(events[0], PipelineEvent::Decoded { .. }));
//! assert_eq!(pipeline.stats().units, 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};

use crate::av::{DecodeStatus, SvcDecoder};
use crate::codec::svc::{NalUnit, PacsiRecord, UnitType};
use crate::config::Config;
use crate::error::{Result, SvcError};
use crate::format::rtp::{Depacketizer, RTPPacket, ReassemblyState, SsrcFilter};

/// Settings fixed when the pipeline is built
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Streams to process; the rest are counted and dropped
    pub ssrc_filter: SsrcFilter,
}

impl PipelineOptions {
    /// Takes the SSRC filter from `config`
    pub fn from_config(config: &Config) -> Self {
        Self {
            ssrc_filter: config.ssrc_filter(),
        }
    }
}

/// Result of processing one completed unit, or a failure.
#[derive(Debug)]
pub enum PipelineEvent {
    /// A PACSI unit was parsed
    Pacsi(PacsiRecord),
    /// The decoder accepted a unit
    Decoded {
        /// Type of the unit handed to the decoder
        unit_type: UnitType,
        /// What the decoder reported
        status: DecodeStatus,
    },
    /// A packet, unit or output write failed
    Error(SvcError),
}

/// Running counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Packets or payloads pushed
    pub packets: u64,
    /// Packets dropped by the SSRC filter
    pub filtered: u64,
    /// Complete units dispatched
    pub units: u64,
    /// PACSI units parsed
    pub pacsi: u64,
    /// Pictures returned by the decoder
    pub frames: u64,
    /// Placeholder pictures returned by the decoder
    pub ghost_images: u64,
    /// Error events produced
    pub errors: u64,
}

/// Filters, reassembles and dispatches the units of any number of RTP streams.
pub struct Pipeline<D: SvcDecoder> {
    decoder: D,
    filter: SsrcFilter,
    streams: HashMap<u32, Depacketizer>,
    stats: PipelineStats,
    unit_log: Option<Box<dyn Write>>,
    pacsi_log: Option<Box<dyn Write>>,
}

impl<D: SvcDecoder> fmt::Debug for Pipeline<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("filter", &self.filter)
            .field("stream_count", &self.streams.len())
            .field("stats", &self.stats)
            .field("unit_log", &self.unit_log.is_some())
            .field("pacsi_log", &self.pacsi_log.is_some())
            .finish()
    }
}

impl<D: SvcDecoder> Pipeline<D> {
    /// Creates a pipeline with no output logs.
    pub fn new(decoder: D, options: PipelineOptions) -> Self {
        Self {
            decoder,
            filter: options.ssrc_filter,
            streams: HashMap::new(),
            stats: PipelineStats::default(),
            unit_log: None,
            pacsi_log: None,
        }
    }

    /// Creates a pipeline writing the unit log and the PACSI dumps to the
    /// configured `unit_log_output` and `pacsi_output` files.
    pub fn from_config(decoder: D, config: &Config) -> Result<Self> {
        let unit_log = BufWriter::new(File::create(&config.unit_log_output)?);
        let pacsi_log = BufWriter::new(File::create(&config.pacsi_output)?);
        Ok(Self::new(decoder, PipelineOptions::from_config(config))
            .with_unit_log(unit_log)
            .with_pacsi_log(pacsi_log))
    }

    /// Writes a line per payload and per decode result to `log`.
    pub fn with_unit_log<W: Write + 'static>(mut self, log: W) -> Self {
        self.unit_log = Some(Box::new(log));
        self
    }

    /// Writes the dump of every parsed PACSI unit to `log`.
    pub fn with_pacsi_log<W: Write + 'static>(mut self, log: W) -> Self {
        self.pacsi_log = Some(Box::new(log));
        self
    }

    /// Parses one raw RTP packet and processes its payload.
    pub fn push_packet(&mut self, data: &[u8]) -> Vec<PipelineEvent> {
        self.stats.packets += 1;

        let packet = match RTPPacket::parse(data) {
            Ok(packet) => packet,
            Err(e) => return vec![self.error(e)],
        };
        if !self.filter.admits(packet.ssrc) {
            self.stats.filtered += 1;
            log::debug!("Dropping packet from SSRC {}", packet.ssrc);
            return Vec::new();
        }

        self.depacketize(packet.ssrc, &packet.payload)
    }

    /// Processes an RTP payload whose header was already stripped.
    ///
    /// The SSRC filter is not applied.
    pub fn push_payload(&mut self, ssrc: u32, payload: &[u8]) -> Vec<PipelineEvent> {
        self.stats.packets += 1;
        self.depacketize(ssrc, payload)
    }

    /// Signals end of input. Unfinished fragments are reported as errors.
    pub fn finish(&mut self) -> Vec<PipelineEvent> {
        let mut ssrcs: Vec<u32> = self.streams.keys().copied().collect();
        ssrcs.sort_unstable();

        let mut events = Vec::new();
        for ssrc in ssrcs {
            let pending = self
                .streams
                .get_mut(&ssrc)
                .map(|depay| depay.finish())
                .unwrap_or(Ok(()));
            if let Err(e) = pending {
                events.push(self.error(e));
            }
        }
        for out in [self.unit_log.as_mut(), self.pacsi_log.as_mut()] {
            if let Some(Err(e)) = out.map(|out| out.flush()) {
                self.stats.errors += 1;
                log::warn!("{}", e);
                events.push(PipelineEvent::Error(e.into()));
            }
        }
        events
    }

    /// Counters so far
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Reassembly state of `ssrc`, or `None` if it was never seen
    pub fn stream_state(&self, ssrc: u32) -> Option<ReassemblyState> {
        self.streams.get(&ssrc).map(Depacketizer::state)
    }

    /// The wrapped decoder
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// The wrapped decoder, mutably
    pub fn decoder_mut(&mut self) -> &mut D {
        &mut self.decoder
    }

    /// Consumes the pipeline, returning the decoder
    pub fn into_decoder(self) -> D {
        self.decoder
    }

    fn depacketize(&mut self, ssrc: u32, payload: &[u8]) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        let packetization = payload.first().map(|&indicator| UnitType::from_header(indicator));
        if let Some(unit_type) = packetization {
            log::debug!("SSRC {} NAL type: {}", ssrc, unit_type);
            self.note(&mut events, format_args!("NAL type: {}", unit_type));
        }

        let results = self.streams.entry(ssrc).or_default().push(payload);
        for result in results {
            match result {
                Ok(unit) => {
                    match packetization {
                        Some(UnitType::StapA) => self.note(
                            &mut events,
                            format_args!("Sub NAL type: {}", unit.unit_type),
                        ),
                        Some(UnitType::FuA | UnitType::FuB) => self.note(
                            &mut events,
                            format_args!("Reconstructed NAL type: {}", unit.unit_type),
                        ),
                        _ => {}
                    }
                    self.dispatch(unit, &mut events)
                }
                Err(e) => events.push(self.error(e)),
            }
        }
        events
    }

    fn dispatch(&mut self, unit: NalUnit, events: &mut Vec<PipelineEvent>) {
        self.stats.units += 1;
        log::debug!("Processing NAL type: {}", unit.unit_type);

        if unit.is_pacsi() {
            match PacsiRecord::parse(&unit) {
                Ok(pacsi) => {
                    self.stats.pacsi += 1;
                    if let Some(Err(e)) = self
                        .pacsi_log
                        .as_mut()
                        .map(|out| write!(out, "\n{}\n", pacsi))
                    {
                        events.push(self.error(e.into()));
                    }
                    events.push(PipelineEvent::Pacsi(pacsi));
                }
                Err(e) => events.push(self.error(e)),
            }
            return;
        }

        let status = match self.decoder.decode(&unit) {
            Ok(status) => status,
            Err(e) => {
                events.push(self.error(e));
                return;
            }
        };

        match &status {
            DecodeStatus::Ok => self.note(events, format_args!("NAL decoded")),
            DecodeStatus::ImageReady(frame) => {
                self.stats.frames += 1;
                self.note(
                    events,
                    format_args!("Got image. Width: {} , Height: {}", frame.width, frame.height),
                );
            }
            DecodeStatus::GhostImage => {
                self.stats.ghost_images += 1;
                self.note(events, format_args!("Got ghost image"));
            }
        }

        events.push(PipelineEvent::Decoded {
            unit_type: unit.unit_type,
            status,
        });
    }

    /// Appends a line to the unit log, if any. Write failures become events.
    fn note(&mut self, events: &mut Vec<PipelineEvent>, line: fmt::Arguments<'_>) {
        let Some(log) = self.unit_log.as_mut() else {
            return;
        };
        if let Err(e) = writeln!(log, "{}", line) {
            events.push(self.error(e.into()));
        }
    }

    fn error(&mut self, e: SvcError) -> PipelineEvent {
        self.stats.errors += 1;
        log::warn!("{}", e);
        PipelineEvent::Error(e)
    }
}
