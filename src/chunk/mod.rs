//! XOR-compressed chunk encoding for time series samples.
//!
//! This module implements the Gorilla-style codec used for series payloads:
//! timestamps are delta-of-delta encoded with variable-width buckets, values
//! are XOR encoded against the previous value's bit pattern. The encoding is
//! lossless, forward-only, and append-only - decoding reproduces every
//! `(timestamp, value)` pair bit-exactly, in original order.

pub mod bits;

use bytes::Bytes;
use thiserror::Error;

use crate::chunk::bits::{BitReader, BitWriter};

/// Errors produced when decoding chunk data.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// The byte stream ended before all declared samples were read.
    #[error("chunk data is truncated")]
    Truncated,
    /// The byte stream declares an impossible encoding state.
    #[error("chunk data is corrupt: {0}")]
    Corrupt(&'static str),
}

/// Chunk payload encodings. Only XOR compression is produced today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkEncoding {
    /// Gorilla delta-of-delta timestamps with XOR-compressed values.
    Xor,
}

/// A single sample with millisecond timestamp and value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: i64,
    pub value: f64,
}

impl Sample {
    /// Create a new sample with the given timestamp (milliseconds) and value.
    pub const fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// A compressed, immutable block of samples for one series.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Timestamp of the first encoded sample, milliseconds.
    pub min_time_ms: i64,
    /// Timestamp of the last encoded sample, milliseconds.
    pub max_time_ms: i64,
    /// Payload encoding of `data`.
    pub encoding: ChunkEncoding,
    /// Encoded sample bytes.
    pub data: Bytes,
}

/// Encode an ordered run of samples into a single XOR chunk.
///
/// Samples are assumed already sorted by ascending timestamp (the upstream
/// API guarantees this); the encoder does not re-sort. A chunk holds at most
/// `u16::MAX` samples.
///
/// # Parameters
///
/// - `samples` - Samples to encode, millisecond timestamps, ascending
///
/// # Returns
///
/// Returns `Some(Chunk)` spanning the first and last timestamps, or `None`
/// when `samples` is empty - an empty series yields no chunk, not an empty
/// chunk.
pub fn encode(samples: &[Sample]) -> Option<Chunk> {
    let (first, last) = match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return None,
    };
    debug_assert!(samples.len() <= u16::MAX as usize, "chunk sample count overflow");

    let mut writer = BitWriter::new();
    writer.write_bits(samples.len() as u64, 16);

    let mut prev_ts = 0i64;
    let mut prev_delta = 0i64;
    let mut prev_bits = 0u64;
    // Leading/trailing zero window of the last explicitly coded XOR value.
    let mut window: Option<(u32, u32)> = None;

    for (i, sample) in samples.iter().enumerate() {
        match i {
            0 => {
                writer.write_bits(sample.timestamp as u64, 64);
                writer.write_bits(sample.value.to_bits(), 64);
            }
            1 => {
                prev_delta = sample.timestamp.wrapping_sub(prev_ts);
                writer.write_bits(prev_delta as u64, 64);
                write_value(&mut writer, sample.value.to_bits(), prev_bits, &mut window);
            }
            _ => {
                let delta = sample.timestamp.wrapping_sub(prev_ts);
                let dod = delta.wrapping_sub(prev_delta);
                write_timestamp_dod(&mut writer, dod);
                write_value(&mut writer, sample.value.to_bits(), prev_bits, &mut window);
                prev_delta = delta;
            }
        }
        prev_ts = sample.timestamp;
        prev_bits = sample.value.to_bits();
    }

    Some(Chunk {
        min_time_ms: first.timestamp,
        max_time_ms: last.timestamp,
        encoding: ChunkEncoding::Xor,
        data: Bytes::from(writer.finish()),
    })
}

/// Decode XOR chunk bytes back into the original samples.
///
/// # Parameters
///
/// - `data` - Bytes previously produced by [`encode`]
///
/// # Returns
///
/// Returns the samples in original order, bit-exact.
///
/// # Errors
///
/// Returns `ChunkError` when the stream is truncated or internally
/// inconsistent.
pub fn decode(data: &[u8]) -> Result<Vec<Sample>, ChunkError> {
    let mut reader = BitReader::new(data);
    let count = reader.read_bits(16)? as usize;
    let mut samples = Vec::with_capacity(count);

    let mut prev_ts = 0i64;
    let mut prev_delta = 0i64;
    let mut prev_bits = 0u64;
    let mut window: Option<(u32, u32)> = None;

    for i in 0..count {
        let (timestamp, bits) = match i {
            0 => {
                let ts = reader.read_bits(64)? as i64;
                let bits = reader.read_bits(64)?;
                (ts, bits)
            }
            1 => {
                prev_delta = reader.read_bits(64)? as i64;
                let bits = read_value(&mut reader, prev_bits, &mut window)?;
                (prev_ts.wrapping_add(prev_delta), bits)
            }
            _ => {
                let dod = read_timestamp_dod(&mut reader)?;
                let delta = prev_delta.wrapping_add(dod);
                let bits = read_value(&mut reader, prev_bits, &mut window)?;
                prev_delta = delta;
                (prev_ts.wrapping_add(delta), bits)
            }
        };
        prev_ts = timestamp;
        prev_bits = bits;
        samples.push(Sample::new(timestamp, f64::from_bits(bits)));
    }

    Ok(samples)
}

/// Write one delta-of-delta using variable-width buckets.
///
/// Bucket prefixes follow the Gorilla layout: `0` for an unchanged interval,
/// then `10`/`110`/`1110` with 7/9/12 payload bits, and `1111` with the full
/// 64-bit value for irregular jumps.
fn write_timestamp_dod(writer: &mut BitWriter, dod: i64) {
    if dod == 0 {
        writer.write_bit(false);
    } else if (-63..64).contains(&dod) {
        writer.write_bits(0b10, 2);
        writer.write_bits((dod + 63) as u64, 7);
    } else if (-255..256).contains(&dod) {
        writer.write_bits(0b110, 3);
        writer.write_bits((dod + 255) as u64, 9);
    } else if (-2047..2048).contains(&dod) {
        writer.write_bits(0b1110, 4);
        writer.write_bits((dod + 2047) as u64, 12);
    } else {
        writer.write_bits(0b1111, 4);
        writer.write_bits(dod as u64, 64);
    }
}

fn read_timestamp_dod(reader: &mut BitReader<'_>) -> Result<i64, ChunkError> {
    if !reader.read_bit()? {
        return Ok(0);
    }
    if !reader.read_bit()? {
        return Ok(reader.read_bits(7)? as i64 - 63);
    }
    if !reader.read_bit()? {
        return Ok(reader.read_bits(9)? as i64 - 255);
    }
    if !reader.read_bit()? {
        return Ok(reader.read_bits(12)? as i64 - 2047);
    }
    Ok(reader.read_bits(64)? as i64)
}

/// XOR-encode one value against the previous value's bit pattern.
///
/// `0` repeats the previous value. `10` reuses the current leading/trailing
/// window and writes only the meaningful bits. `11` opens a new window:
/// 5 bits of leading-zero count (capped at 31), 6 bits of meaningful length
/// with 64 encoded as 0, then the meaningful bits.
fn write_value(writer: &mut BitWriter, bits: u64, prev_bits: u64, window: &mut Option<(u32, u32)>) {
    let xor = prev_bits ^ bits;
    if xor == 0 {
        writer.write_bit(false);
        return;
    }
    writer.write_bit(true);

    let leading = xor.leading_zeros().min(31);
    let trailing = xor.trailing_zeros();

    match *window {
        Some((win_leading, win_trailing))
            if leading >= win_leading && trailing >= win_trailing =>
        {
            writer.write_bit(false);
            let meaningful = 64 - win_leading - win_trailing;
            writer.write_bits(xor >> win_trailing, meaningful as u8);
        }
        _ => {
            writer.write_bit(true);
            let meaningful = 64 - leading - trailing;
            writer.write_bits(u64::from(leading), 5);
            writer.write_bits(u64::from(meaningful) & 0x3f, 6);
            writer.write_bits(xor >> trailing, meaningful as u8);
            *window = Some((leading, trailing));
        }
    }
}

fn read_value(
    reader: &mut BitReader<'_>,
    prev_bits: u64,
    window: &mut Option<(u32, u32)>,
) -> Result<u64, ChunkError> {
    if !reader.read_bit()? {
        return Ok(prev_bits);
    }
    let xor = if !reader.read_bit()? {
        let (win_leading, win_trailing) =
            window.ok_or(ChunkError::Corrupt("window reuse before any window was coded"))?;
        let meaningful = 64 - win_leading - win_trailing;
        reader.read_bits(meaningful as u8)? << win_trailing
    } else {
        let leading = reader.read_bits(5)? as u32;
        let mut meaningful = reader.read_bits(6)? as u32;
        if meaningful == 0 {
            meaningful = 64;
        }
        if leading + meaningful > 64 {
            return Err(ChunkError::Corrupt("meaningful bit run exceeds 64 bits"));
        }
        let trailing = 64 - leading - meaningful;
        *window = Some((leading, trailing));
        reader.read_bits(meaningful as u8)? << trailing
    };
    Ok(prev_bits ^ xor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(samples: &[Sample]) -> Vec<Sample> {
        let chunk = encode(samples).expect("non-empty input yields a chunk");
        decode(&chunk.data).expect("just encoded valid data")
    }

    /// Test that an empty sample run yields no chunk at all.
    #[test]
    fn test_empty_input_yields_no_chunk() {
        assert!(encode(&[]).is_none());
    }

    /// Test a single sample round-trips with equal chunk bounds.
    #[test]
    fn test_single_sample() {
        let samples = vec![Sample::new(1_000_000, 42.5)];
        let chunk = encode(&samples).expect("chunk present");
        assert_eq!(chunk.min_time_ms, 1_000_000);
        assert_eq!(chunk.max_time_ms, 1_000_000);
        assert_eq!(chunk.encoding, ChunkEncoding::Xor);
        assert_eq!(round_trip(&samples), samples);
    }

    /// Test the two-sample shape produced by a minimal upstream window.
    #[test]
    fn test_two_samples_with_bounds() {
        let samples = vec![Sample::new(1_000_000, 10.0), Sample::new(1_060_000, 12.5)];
        let chunk = encode(&samples).expect("chunk present");
        assert_eq!(chunk.min_time_ms, 1_000_000);
        assert_eq!(chunk.max_time_ms, 1_060_000);
        assert_eq!(round_trip(&samples), samples);
    }

    /// Test regular intervals with slowly changing values, the common case.
    #[test]
    fn test_regular_interval_series() {
        let samples: Vec<Sample> =
            (0..500i64).map(|i| Sample::new(1_000_000 + i * 60_000, 100.0 + i as f64 * 0.5)).collect();
        assert_eq!(round_trip(&samples), samples);
    }

    /// Test constant values, which exercise the repeat bit.
    #[test]
    fn test_constant_values() {
        let samples: Vec<Sample> = (0..100).map(|i| Sample::new(i * 1000, 7.25)).collect();
        let chunk = encode(&samples).expect("chunk present");
        // One repeat bit per constant sample keeps the chunk small.
        assert!(chunk.data.len() < 100);
        assert_eq!(round_trip(&samples), samples);
    }

    /// Test irregular intervals spanning every delta-of-delta bucket.
    #[test]
    fn test_irregular_intervals() {
        // Deltas chosen so consecutive differences hit the 1-, 7-, 9- and
        // 12-bit buckets plus the 64-bit fallback and the zero case.
        let deltas: [i64; 7] =
            [60_000, 60_001, 60_100, 61_000, 5_000_000, 5_000_000, 3_600_000_000];
        let mut ts = 1_000_000i64;
        let mut samples = vec![Sample::new(ts, 1.5)];
        for (i, delta) in deltas.iter().enumerate() {
            ts += delta;
            samples.push(Sample::new(ts, i as f64 * -3.125));
        }
        assert_eq!(round_trip(&samples), samples);
    }

    /// Test special float values survive bit-exactly, including NaN.
    #[test]
    fn test_special_float_values() {
        let samples = vec![
            Sample::new(1000, 0.0),
            Sample::new(2000, -0.0),
            Sample::new(3000, f64::INFINITY),
            Sample::new(4000, f64::NEG_INFINITY),
            Sample::new(5000, f64::NAN),
            Sample::new(6000, f64::MIN_POSITIVE),
        ];
        let decoded = round_trip(&samples);
        assert_eq!(decoded.len(), samples.len());
        for (original, decoded) in samples.iter().zip(&decoded) {
            assert_eq!(decoded.timestamp, original.timestamp);
            assert_eq!(decoded.value.to_bits(), original.value.to_bits());
        }
    }

    /// Test randomized strictly increasing series round-trip bit-exactly.
    #[test]
    fn test_random_round_trip() {
        use rand::Rng;

        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let len = rng.gen_range(1..300);
            let mut ts = rng.gen_range(0..1_600_000_000_000i64);
            let samples: Vec<Sample> = (0..len)
                .map(|_| {
                    ts += rng.gen_range(1..10_000_000i64);
                    Sample::new(ts, f64::from_bits(rng.gen()))
                })
                .collect();

            let decoded = round_trip(&samples);
            assert_eq!(decoded.len(), samples.len());
            for (original, decoded) in samples.iter().zip(&decoded) {
                assert_eq!(decoded.timestamp, original.timestamp);
                assert_eq!(decoded.value.to_bits(), original.value.to_bits());
            }
        }
    }

    /// Test that truncated chunk bytes surface a decode error.
    #[test]
    fn test_truncated_data() {
        let samples: Vec<Sample> = (0..10i64).map(|i| Sample::new(i * 1000, i as f64)).collect();
        let chunk = encode(&samples).expect("chunk present");
        let cut = &chunk.data[..chunk.data.len() / 2];
        assert!(decode(cut).is_err());
    }
}
