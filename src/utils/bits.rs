use crate::error::{Result, SvcError};

/// Extracts the bit-run selected by `mask` from `byte`, right-aligned at bit 0.
///
/// `mask` must be a contiguous run of 1 bits. Masks with gaps are not
/// rejected; the result is `(byte & mask)` shifted by the mask's trailing
/// zero count, whatever that means for such a mask.
///
/// ```
/// use svcio::utils::extract;
///
/// assert_eq!(extract(0b1001_1111, 0x80), 1);
/// assert_eq!(extract(0b1001_1111, 0x1f), 0b11111);
/// assert_eq!(extract(0b1001_1111, 0x60), 0b00);
/// ```
#[inline]
pub fn extract(byte: u8, mask: u8) -> u8 {
    if mask == 0 {
        return 0;
    }
    (byte & mask) >> mask.trailing_zeros()
}

/// Extracts a single-bit field as a bool.
#[inline]
pub fn flag(byte: u8, mask: u8) -> bool {
    extract(byte, mask) != 0
}

/// A bounds-checked, big-endian reader over a byte slice.
///
/// Every read names the field it is reading so a short buffer reports
/// exactly which field ran out of bytes.
///
/// Example:
/// ```
/// use svcio::utils::ByteReader;
///
/// let data = [0x01, 0x40, 0x00, 0xb4];
/// let mut reader = ByteReader::new(&data);
///
/// assert_eq!(reader.read_u16("width").unwrap(), 320);
/// assert_eq!(reader.read_u16("height").unwrap(), 180);
/// assert!(reader.read_u8("extra").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data, offset: 0 }
    }

    /// Number of bytes not read yet.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Returns true once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Current offset from the start of the slice.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// The unread tail, without consuming it.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }

    /// Consumes `n` bytes and returns them as a sub-slice.
    pub fn read_bytes(&mut self, n: usize, what: &'static str) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(SvcError::truncated(what, n, self.remaining()));
        }
        let bytes = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(bytes)
    }

    /// Reads a fixed-size array.
    pub fn read_array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N, what)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Reads one byte.
    pub fn read_u8(&mut self, what: &'static str) -> Result<u8> {
        Ok(self.read_bytes(1, what)?[0])
    }

    /// Reads a big-endian `u16`.
    pub fn read_u16(&mut self, what: &'static str) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array(what)?))
    }

    /// Reads a big-endian `u32`.
    pub fn read_u32(&mut self, what: &'static str) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array(what)?))
    }

    /// Skips `n` bytes.
    pub fn skip(&mut self, n: usize, what: &'static str) -> Result<()> {
        self.read_bytes(n, what).map(|_| ())
    }
}
