//! Bit-level field packing
//!
//! InfiniBand transport headers mix byte-aligned fields with 1-, 2-, 4-,
//! 6-, 7- and 24-bit fields. [`BitWriter`] and [`BitReader`] pack and
//! unpack such fields in network bit order: the most significant bit of
//! a field lands in the most significant free bit of the buffer, exactly
//! as the fields appear on the wire.
//!
//! Both are pure accumulators with no I/O. Header codecs are expected to
//! emit fields whose widths sum to whole bytes; a trailing partial byte
//! is zero-padded on [`BitWriter::into_bytes`].

use rocewire_core::{Error, Result};

/// Packs values of arbitrary bit width into a byte buffer, MSB first
#[derive(Debug, Default)]
pub struct BitWriter {
    buf: Vec<u8>,
    bits: usize,
}

impl BitWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty writer with room for `bytes` bytes
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buf: Vec::with_capacity(bytes),
            bits: 0,
        }
    }

    /// Append `width` bits of `value`
    ///
    /// Fails with [`Error::Encoding`] if `value` has bits set above
    /// `width`, or if `width` exceeds 64.
    pub fn put(&mut self, value: u64, width: u32) -> Result<()> {
        if width > 64 || (width < 64 && value >> width != 0) {
            return Err(Error::Encoding { value, width });
        }

        let mut remaining = width;
        while remaining > 0 {
            if self.bits % 8 == 0 {
                self.buf.push(0);
            }
            let free = 8 - (self.bits % 8) as u32;
            let take = remaining.min(free);
            let chunk = ((value >> (remaining - take)) & ((1u64 << take) - 1)) as u8;
            let last = self.buf.len() - 1;
            self.buf[last] |= chunk << (free - take);
            self.bits += take as usize;
            remaining -= take;
        }

        Ok(())
    }

    /// Number of bits written so far
    pub fn bit_len(&self) -> usize {
        self.bits
    }

    /// True if the written bits end on a byte boundary
    pub fn is_aligned(&self) -> bool {
        self.bits % 8 == 0
    }

    /// Consume the writer, returning the packed bytes
    ///
    /// A trailing partial byte, if any, has its low bits zero.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Unpacks values of arbitrary bit width from a byte buffer, MSB first
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bits: usize,
}

impl<'a> BitReader<'a> {
    /// Create a reader over `data`, positioned at bit 0
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bits: 0 }
    }

    /// Read the next `width` bits as an unsigned value
    ///
    /// Fails with [`Error::Truncated`] if the buffer has fewer than
    /// `width` bits left.
    pub fn get(&mut self, width: u32) -> Result<u64> {
        if width > 64 {
            return Err(Error::decoding(format!("{width}-bit read exceeds u64")));
        }
        if self.bits + width as usize > self.data.len() * 8 {
            return Err(Error::Truncated {
                needed: (self.bits + width as usize).div_ceil(8),
                got: self.data.len(),
            });
        }

        let mut value = 0u64;
        let mut remaining = width;
        while remaining > 0 {
            let byte = self.data[self.bits / 8];
            let avail = 8 - (self.bits % 8) as u32;
            let take = remaining.min(avail);
            let chunk = (byte >> (avail - take)) & (((1u16 << take) - 1) as u8);
            value = (value << take) | chunk as u64;
            self.bits += take as usize;
            remaining -= take;
        }

        Ok(value)
    }

    /// Current position in bits from the start of the buffer
    pub fn bit_pos(&self) -> usize {
        self.bits
    }
}
