//! # Utility Functions and Types
//!
//! Byte- and bit-level helpers shared by the codec and format modules:
//!
//! - [`extract`]: pulls a masked bit-run out of a byte, right-aligned
//! - [`ByteReader`]: bounds-checked big-endian cursor that reports which
//!   field ran out of bytes
//!
//! ```rust
//! use svcio::utils::{extract, ByteReader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let header = [0x7e, 0x00, 0x3d];
//! let mut reader = ByteReader::new(&header);
//!
//! let first = reader.read_u8("nal header")?;
//! assert_eq!(extract(first, 0x1f), 30); // PACSI
//! assert_eq!(reader.read_u16("sei size")?, 0x3d);
//! # Ok(())
//! # }
//! ```

/// Bitfield extraction and byte reading utilities
pub mod bits;

pub use bits::*;
