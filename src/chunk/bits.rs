//! Bit-level I/O primitives for the XOR chunk codec.
//!
//! Bits are stored MSB-first within each byte. `BitWriter` accumulates bits
//! into a byte buffer; `BitReader` walks a borrowed slice in the same order.

use crate::chunk::ChunkError;

/// Writer that packs individual bits into a byte buffer, MSB-first.
pub struct BitWriter {
    buffer: Vec<u8>,
    current: u8,
    /// Number of bits already written into `current` (0-7).
    filled: u8,
}

impl BitWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self { buffer: Vec::new(), current: 0, filled: 0 }
    }

    /// Write a single bit (`true` = 1).
    pub fn write_bit(&mut self, bit: bool) {
        if bit {
            self.current |= 1 << (7 - self.filled);
        }
        self.filled += 1;
        if self.filled == 8 {
            self.buffer.push(self.current);
            self.current = 0;
            self.filled = 0;
        }
    }

    /// Write the low `num_bits` bits of `value`, MSB-first.
    ///
    /// # Parameters
    ///
    /// - `value` - Source bits; anything above `num_bits` is ignored
    /// - `num_bits` - Number of bits to write (<= 64)
    pub fn write_bits(&mut self, value: u64, num_bits: u8) {
        debug_assert!(num_bits <= 64, "cannot write more than 64 bits");
        for i in (0..num_bits).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
    }

    /// Flush any partial byte (zero-padded) and return the buffer.
    pub fn finish(mut self) -> Vec<u8> {
        if self.filled > 0 {
            self.buffer.push(self.current);
        }
        self.buffer
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reader that walks a byte slice bit by bit, MSB-first.
pub struct BitReader<'a> {
    buffer: &'a [u8],
    byte_pos: usize,
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    /// Create a reader positioned at the first bit of `buffer`.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, byte_pos: 0, bit_pos: 0 }
    }

    /// Read the next bit.
    ///
    /// # Errors
    ///
    /// Returns `ChunkError::Truncated` when the buffer is exhausted, which
    /// means the chunk data is corrupt or cut short.
    pub fn read_bit(&mut self) -> Result<bool, ChunkError> {
        let byte = *self.buffer.get(self.byte_pos).ok_or(ChunkError::Truncated)?;
        let bit = (byte >> (7 - self.bit_pos)) & 1 == 1;
        self.bit_pos += 1;
        if self.bit_pos == 8 {
            self.byte_pos += 1;
            self.bit_pos = 0;
        }
        Ok(bit)
    }

    /// Read `num_bits` bits into a `u64`, MSB-first.
    ///
    /// Reading zero bits returns `Ok(0)` without advancing, which the
    /// variable-width decoders rely on.
    ///
    /// # Errors
    ///
    /// Returns `ChunkError::Truncated` if the buffer ends mid-read.
    pub fn read_bits(&mut self, num_bits: u8) -> Result<u64, ChunkError> {
        debug_assert!(num_bits <= 64, "cannot read more than 64 bits");
        let mut value = 0u64;
        for _ in 0..num_bits {
            value = (value << 1) | u64::from(self.read_bit()?);
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that single bits round-trip in order.
    #[test]
    fn test_single_bits() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bit(false);
        writer.write_bit(true);

        let buffer = writer.finish();
        let mut reader = BitReader::new(&buffer);
        assert!(reader.read_bit().expect("bit available"));
        assert!(!reader.read_bit().expect("bit available"));
        assert!(reader.read_bit().expect("bit available"));
    }

    /// Test multi-bit writes crossing byte boundaries.
    #[test]
    fn test_cross_byte_boundaries() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b1, 1);
        writer.write_bits(0b1010101, 7);
        writer.write_bits(0b11, 2);

        let buffer = writer.finish();
        let mut reader = BitReader::new(&buffer);
        assert_eq!(reader.read_bits(1).expect("bits available"), 0b1);
        assert_eq!(reader.read_bits(7).expect("bits available"), 0b1010101);
        assert_eq!(reader.read_bits(2).expect("bits available"), 0b11);
    }

    /// Test full 64-bit boundary patterns.
    #[test]
    fn test_64_bit_patterns() {
        let patterns =
            [u64::MAX, 0, 0xAAAA_AAAA_AAAA_AAAA, 0x5555_5555_5555_5555, 0x8000_0000_0000_0001];
        for &value in &patterns {
            let mut writer = BitWriter::new();
            writer.write_bits(value, 64);
            let buffer = writer.finish();
            let mut reader = BitReader::new(&buffer);
            assert_eq!(reader.read_bits(64).expect("bits available"), value);
        }
    }

    /// Test that a partial byte is zero-padded on the right.
    #[test]
    fn test_partial_byte_padding() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b1011, 4);
        let buffer = writer.finish();
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer[0] >> 4, 0b1011);
        assert_eq!(buffer[0] & 0b1111, 0);
    }

    /// Test that reading past the end reports truncation.
    #[test]
    fn test_read_past_end() {
        let buffer = vec![0b1010_1010];
        let mut reader = BitReader::new(&buffer);
        reader.read_bits(8).expect("one byte available");
        assert!(reader.read_bit().is_err());
    }

    /// Test random values and widths round-trip through the bit stream.
    #[test]
    fn test_random_round_trip() {
        use rand::Rng;

        let mut rng = rand::thread_rng();
        for _ in 0..5_000 {
            let width: u8 = rng.gen_range(1..=64);
            let value: u64 = rng.gen();

            let mut writer = BitWriter::new();
            writer.write_bits(value, width);
            let buffer = writer.finish();

            let mut reader = BitReader::new(&buffer);
            let read = reader.read_bits(width).expect("bits available");
            let mask = if width == 64 { u64::MAX } else { (1u64 << width) - 1 };
            assert_eq!(read, value & mask);
        }
    }
}
