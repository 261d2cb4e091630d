#![doc(html_root_url = "https://docs.rs/svcio/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

//! # svcio - H.264 SVC over RTP toolkit
//!
//! `svcio` recovers scalable video (H.264/SVC) from an RTP packet stream. It
//! rebuilds complete NAL units from RTP payloads and decodes the per-frame
//! scalability metadata carried in PACSI units, so a capture can be turned
//! into raw YUV plus a readable log of layer information.
//!
//! ## Features
//!
//! ### Transport
//! - RTP header parsing (RFC 3550) and SSRC filtering
//! - Depacketization of single NAL, STAP-A and FU-A/FU-B payloads
//!
//! ### Scalability metadata
//! - PACSI header parsing, including the optional Y and T fields
//! - SEI messages identified by UUID: stream layout (with per-layer
//!   resolution, bitrate and frame rate) and bitstream info
//!
//! ### Output
//! - A decoder seam ([`av::SvcDecoder`]) for an external video decoder
//! - Raw planar YUV 4:2:0 output with a size warning
//!
//! ## Quick Start
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! svcio = "0.1.0"
//! ```
//!
//! ### Dumping PACSI metadata from RTP payloads
//!
//! ```rust
//! use svcio::format::rtp::Depacketizer;
//! use svcio::codec::svc::PacsiRecord;
//!
//! # fn main() -> svcio::Result<()> {
//! let mut depay = Depacketizer::new();
//!
//! // A PACSI unit with no optional fields and no SEI messages
//! for unit in depay.push(&[0x7e, 0xc0, 0x80, 0x07, 0x00]) {
//!     let unit = unit?;
//!     if unit.is_pacsi() {
//!         let pacsi = PacsiRecord::parse(&unit)?;
//!         println!("{}", pacsi);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - `format`: RTP packets, SSRC filtering and depacketization
//! - `codec`: SVC unit types, PACSI and SEI parsing
//! - `av`: Decoder trait, decoded frames and YUV output
//! - `pipeline`: Per-SSRC dispatch of units to the PACSI parser or decoder
//! - `config`: Output paths, SSRC filter and thresholds
//! - `error`: Error type and result alias
//! - `utils`: Bitfield extraction and a bounds-checked byte reader
//!
/// Decoder seam and frame output
pub mod av;

/// SVC unit types and metadata parsers
pub mod codec;

/// Error types and utilities
pub mod error;

/// Transport formats (RTP)
pub mod format;

/// Unit dispatch from packets to parser and decoder
pub mod pipeline;

/// Common utilities and helper functions
pub mod utils;

/// Configuration module
pub mod config;

pub use error::{Result, SvcError};
