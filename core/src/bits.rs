//! Packed bit strings and a forward-only reader over them.
//!
//! Bits are stored MSB-first within each byte, so the textual form
//! `"0001111"` maps to the leading seven bits of the first byte.

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBits")]
pub struct BitString {
    bytes: Vec<u8>,
    len: usize,
}

/// Wire shape of [`BitString`]; checked before it becomes one.
#[derive(Deserialize)]
struct RawBits {
    bytes: Vec<u8>,
    len: usize,
}

impl TryFrom<RawBits> for BitString {
    type Error = IndexError;

    fn try_from(raw: RawBits) -> Result<Self> {
        if raw.bytes.len() != raw.len.div_ceil(8) {
            return Err(IndexError::CorruptStore(format!(
                "bit string claims {} bits but holds {} bytes",
                raw.len,
                raw.bytes.len()
            )));
        }
        let used = raw.len % 8;
        if used != 0 && raw.bytes[raw.bytes.len() - 1] & (0xFF >> used) != 0 {
            return Err(IndexError::CorruptStore("bit string has non-zero padding".into()));
        }
        Ok(Self { bytes: raw.bytes, len: raw.len })
    }
}

impl BitString {
    pub fn new() -> Self { Self::default() }

    pub fn with_capacity(bits: usize) -> Self {
        Self { bytes: Vec::with_capacity(bits.div_ceil(8)), len: 0 }
    }

    pub fn len(&self) -> usize { self.len }

    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Packed storage; the final byte is zero-padded on the right.
    pub fn as_bytes(&self) -> &[u8] { &self.bytes }

    pub fn push(&mut self, bit: bool) {
        let shift = 7 - (self.len % 8);
        if shift == 7 {
            self.bytes.push(0);
        }
        if bit {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 1 << shift;
        }
        self.len += 1;
    }

    /// Appends `count` copies of `bit`.
    pub fn push_run(&mut self, bit: bool, count: usize) {
        for _ in 0..count {
            self.push(bit);
        }
    }

    /// Appends the low `width` bits of `value`, most significant first.
    pub fn push_bits(&mut self, value: u64, width: u32) {
        debug_assert!(width <= 64);
        for i in (0..width).rev() {
            self.push((value >> i) & 1 == 1);
        }
    }

    pub fn extend_from(&mut self, other: &BitString) {
        if self.len % 8 == 0 {
            self.bytes.extend_from_slice(&other.bytes);
            self.len += other.len;
            return;
        }
        for bit in other.iter() {
            self.push(bit);
        }
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.len {
            return None;
        }
        Some(self.bytes[index / 8] >> (7 - (index % 8)) & 1 == 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.bytes[i / 8] >> (7 - (i % 8)) & 1 == 1)
    }

    pub fn reader(&self) -> BitReader<'_> { BitReader::new(self) }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for BitString {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        let mut bits = BitString::with_capacity(s.len());
        for (i, ch) in s.chars().enumerate() {
            match ch {
                '0' => bits.push(false),
                '1' => bits.push(true),
                _ => {
                    return Err(IndexError::InvalidArgument(format!(
                        "bit string contains {ch:?} at position {i}"
                    )))
                }
            }
        }
        Ok(bits)
    }
}

impl FromIterator<bool> for BitString {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut bits = BitString::new();
        for bit in iter {
            bits.push(bit);
        }
        bits
    }
}

/// Cursor over a [`BitString`]. Reads never go past the end; they return
/// `None` and leave the cursor where it was.
pub struct BitReader<'a> {
    bits: &'a BitString,
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bits: &'a BitString) -> Self { Self { bits, pos: 0 } }

    pub fn position(&self) -> usize { self.pos }

    pub fn remaining(&self) -> usize { self.bits.len() - self.pos }

    pub fn is_exhausted(&self) -> bool { self.pos >= self.bits.len() }

    pub fn read_bit(&mut self) -> Option<bool> {
        let bit = self.bits.get(self.pos)?;
        self.pos += 1;
        Some(bit)
    }

    /// Counts zero bits up to the next `1` and consumes that `1` as well.
    pub fn read_unary(&mut self) -> Option<usize> {
        let start = self.pos;
        let mut zeros = 0;
        loop {
            match self.bits.get(start + zeros)? {
                true => break,
                false => zeros += 1,
            }
        }
        self.pos = start + zeros + 1;
        Some(zeros)
    }

    /// Reads `width` bits as an unsigned big-endian integer.
    pub fn read_bits(&mut self, width: u32) -> Option<u64> {
        debug_assert!(width <= 64);
        if (width as usize) > self.remaining() {
            return None;
        }
        let mut value = 0u64;
        for _ in 0..width {
            let bit = self.bits.get(self.pos)?;
            value = (value << 1) | bit as u64;
            self.pos += 1;
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_text_form() {
        let bits: BitString = "000010011".parse().unwrap();
        assert_eq!(bits.len(), 9);
        assert_eq!(bits.as_bytes(), &[0b0000_1001, 0b1000_0000]);
        assert_eq!(bits.to_string(), "000010011");
    }

    #[test]
    fn rejects_foreign_characters() {
        let err = "0102".parse::<BitString>().unwrap_err();
        assert!(matches!(err, IndexError::InvalidArgument(_)));
    }

    #[test]
    fn extend_handles_unaligned_tail() {
        let mut a: BitString = "101".parse().unwrap();
        let b: BitString = "0000000011".parse().unwrap();
        a.extend_from(&b);
        assert_eq!(a.to_string(), "1010000000011");

        let mut aligned: BitString = "11110000".parse().unwrap();
        aligned.extend_from(&"01".parse().unwrap());
        assert_eq!(aligned.to_string(), "1111000001");
    }

    #[test]
    fn deserialize_rejects_length_beyond_bytes() {
        // same wire layout as BitString { bytes, len }
        let forged = bincode::serialize(&(vec![0u8], 64usize)).unwrap();
        let err = bincode::deserialize::<BitString>(&forged).unwrap_err();
        assert!(err.to_string().contains("64 bits"));

        let padded = bincode::serialize(&(vec![0b1010_0001u8], 3usize)).unwrap();
        assert!(bincode::deserialize::<BitString>(&padded).is_err());
    }

    #[test]
    fn serde_round_trip_keeps_bits() {
        let bits: BitString = "0010011".parse().unwrap();
        let bytes = bincode::serialize(&bits).unwrap();
        assert_eq!(bincode::deserialize::<BitString>(&bytes).unwrap(), bits);
    }

    #[test]
    fn reader_unary_and_fixed_width() {
        let bits: BitString = "0001111".parse().unwrap();
        let mut r = bits.reader();
        assert_eq!(r.read_unary(), Some(3));
        assert_eq!(r.position(), 4);
        assert_eq!(r.read_bits(3), Some(0b111));
        assert!(r.is_exhausted());
        assert_eq!(r.read_bit(), None);
    }

    #[test]
    fn reader_does_not_advance_on_short_read() {
        let bits: BitString = "000".parse().unwrap();
        let mut r = bits.reader();
        assert_eq!(r.read_unary(), None);
        assert_eq!(r.position(), 0);
        assert_eq!(r.read_bits(4), None);
        assert_eq!(r.position(), 0);
    }
}
