//! Elias gamma and delta codes for positive integers.
//!
//! Both codes are prefix-free, so any number of codewords can be
//! concatenated into one [`BitString`] and split apart again by scanning.
//!
//! Gamma: `k-1` zeros followed by the `k` bits of `n`, where `k` is the
//! bit length of `n`. `15 -> 000 1111`.
//!
//! Delta: the gamma code of `k`, followed by the low `k-1` bits of `n`
//! (its leading 1 is implied). `8 -> 00100 000`.

use crate::bits::{BitReader, BitString};
use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    Gamma,
    Delta,
}

impl CodecKind {
    pub fn name(self) -> &'static str {
        match self {
            CodecKind::Gamma => "gamma",
            CodecKind::Delta => "delta",
        }
    }

    /// Appends the codeword for `n` to `out`. `n` must be at least 1.
    pub fn encode_into(self, n: u32, out: &mut BitString) -> Result<()> {
        if n == 0 {
            return Err(IndexError::InvalidArgument(format!(
                "{} code is defined for integers >= 1, got 0",
                self.name()
            )));
        }
        match self {
            CodecKind::Gamma => write_gamma(n as u64, out),
            CodecKind::Delta => write_delta(n, out),
        }
        Ok(())
    }

    pub fn encode(self, n: u32) -> Result<BitString> {
        let mut out = BitString::with_capacity(2 * bit_len(n as u64) as usize);
        self.encode_into(n, &mut out)?;
        Ok(out)
    }

    /// Concatenates the codewords of `values` in order, with no separators.
    pub fn encode_all(self, values: &[u32]) -> Result<BitString> {
        let mut out = BitString::with_capacity(values.len() * 8);
        for &n in values {
            self.encode_into(n, &mut out)?;
        }
        Ok(out)
    }

    /// Decodes a bit string holding exactly one codeword.
    pub fn decode(self, bits: &BitString) -> Result<u32> {
        if bits.is_empty() {
            return Err(IndexError::malformed(0, "empty input"));
        }
        let mut reader = bits.reader();
        let value = self.read(&mut reader)?;
        if !reader.is_exhausted() {
            return Err(IndexError::malformed(reader.position(), "trailing bits after codeword"));
        }
        Ok(value)
    }

    /// Splits a delimiter-free concatenation of codewords back into integers.
    /// An empty input is the concatenation of zero codewords.
    pub fn decode_all(self, bits: &BitString) -> Result<Vec<u32>> {
        let mut reader = bits.reader();
        let mut values = Vec::new();
        while !reader.is_exhausted() {
            values.push(self.read(&mut reader)?);
        }
        tracing::trace!(codec = self.name(), bits = bits.len(), values = values.len(), "decoded postings");
        Ok(values)
    }

    /// Reads the next codeword at the reader's cursor.
    pub fn read(self, reader: &mut BitReader<'_>) -> Result<u32> {
        match self {
            CodecKind::Gamma => read_gamma(reader, u32::BITS).map(|v| v as u32),
            CodecKind::Delta => read_delta(reader),
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CodecKind {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gamma" => Ok(CodecKind::Gamma),
            "delta" => Ok(CodecKind::Delta),
            other => Err(IndexError::InvalidArgument(format!(
                "unknown codec {other:?}, expected \"gamma\" or \"delta\""
            ))),
        }
    }
}

pub fn gamma_encode(n: u32) -> Result<BitString> { CodecKind::Gamma.encode(n) }

pub fn gamma_decode(bits: &BitString) -> Result<u32> { CodecKind::Gamma.decode(bits) }

pub fn gamma_decode_all(bits: &BitString) -> Result<Vec<u32>> { CodecKind::Gamma.decode_all(bits) }

pub fn delta_encode(n: u32) -> Result<BitString> { CodecKind::Delta.encode(n) }

pub fn delta_decode(bits: &BitString) -> Result<u32> { CodecKind::Delta.decode(bits) }

pub fn delta_decode_all(bits: &BitString) -> Result<Vec<u32>> { CodecKind::Delta.decode_all(bits) }

#[inline]
fn bit_len(n: u64) -> u32 { u64::BITS - n.leading_zeros() }

fn write_gamma(n: u64, out: &mut BitString) {
    let k = bit_len(n);
    out.push_run(false, (k - 1) as usize);
    out.push_bits(n, k);
}

fn write_delta(n: u32, out: &mut BitString) {
    let k = bit_len(n as u64);
    write_gamma(k as u64, out);
    out.push_bits(n as u64, k - 1);
}

/// Reads one gamma codeword whose value must fit in `max_bits` bits.
fn read_gamma(reader: &mut BitReader<'_>, max_bits: u32) -> Result<u64> {
    let start = reader.position();
    let m = reader
        .read_unary()
        .ok_or_else(|| IndexError::malformed(start, "no terminating 1 bit"))?;
    if m >= max_bits as usize {
        return Err(IndexError::malformed(start, "value exceeds 32 bits"));
    }
    let low = reader
        .read_bits(m as u32)
        .ok_or_else(|| IndexError::malformed(start, "truncated codeword"))?;
    Ok((1u64 << m) | low)
}

fn read_delta(reader: &mut BitReader<'_>) -> Result<u32> {
    let start = reader.position();
    // k <= 32 needs at most 6 bits
    let k = read_gamma(reader, 6)?;
    if k > u32::BITS as u64 {
        return Err(IndexError::malformed(start, "value exceeds 32 bits"));
    }
    let width = (k - 1) as u32;
    let low = reader
        .read_bits(width)
        .ok_or_else(|| IndexError::malformed(start, "truncated codeword"))?;
    Ok(((1u64 << width) | low) as u32)
}
