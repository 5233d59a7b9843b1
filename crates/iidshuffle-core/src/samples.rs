//! Sample representations.
//!
//! Every score is written once against the [`Samples`] trait. The two
//! implementations, integer vectors and packed bit sequences, only differ in
//! the hooks where the scoring algorithm genuinely depends on the
//! representation: the text fed to the compressor, the over/under symbol
//! stream, the series used for directional runs, and the series scanned for
//! collisions.

use serde::Serialize;

use crate::arith::median_bounds;
use crate::error::ScoreError;

/// How observations are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// One integer per observation (e.g. a byte value 0-255).
    Integer,
    /// One bit per observation.
    Binary,
}

impl std::fmt::Display for Representation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Ordered, fixed-length view over a sample sequence.
pub trait Samples {
    fn representation(&self) -> Representation;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Observation at `index` as an integer (bits read as 0 or 1).
    fn value(&self, index: usize) -> i64;

    /// Exchange two observations in place.
    fn swap(&mut self, a: usize, b: usize);

    /// Owned copy of `len` observations starting at `start`.
    fn subsequence(&self, start: usize, len: usize) -> Self
    where
        Self: Sized;

    fn observations(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.len()).map(move |i| self.value(i))
    }

    /// Text handed to the compressor: comma-joined decimal values.
    fn encode_text(&self) -> String {
        self.observations()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Over/under symbol stream (`true` = over the median).
    ///
    /// Values equal to the median are skipped; if nothing remains the
    /// sequence cannot be classified.
    fn over_under_symbols(&self) -> Result<Vec<bool>, ScoreError> {
        let values: Vec<i64> = self.observations().collect();
        let bounds = median_bounds(&values)?;
        let symbols: Vec<bool> = values.iter().filter_map(|&v| bounds.classify(v)).collect();
        if symbols.is_empty() {
            return Err(ScoreError::NoMedianSplit);
        }
        Ok(symbols)
    }

    /// Series whose adjacent differences drive the directional runs score.
    fn trend_series(&self) -> Vec<i64> {
        self.observations().collect()
    }

    /// Series scanned for repeated values by the collision score.
    fn collision_series(&self) -> Vec<i64> {
        self.observations().collect()
    }
}

impl Samples for Vec<i64> {
    fn representation(&self) -> Representation {
        Representation::Integer
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn value(&self, index: usize) -> i64 {
        self[index]
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.as_mut_slice().swap(a, b);
    }

    fn subsequence(&self, start: usize, len: usize) -> Self {
        self[start..start + len].to_vec()
    }

    fn observations(&self) -> impl Iterator<Item = i64> + '_ {
        self.as_slice().iter().copied()
    }

    fn trend_series(&self) -> Vec<i64> {
        self.clone()
    }

    fn collision_series(&self) -> Vec<i64> {
        self.clone()
    }
}

// ---------------------------------------------------------------------------
// Packed bit sequence
// ---------------------------------------------------------------------------

const WORD_BITS: usize = 64;

/// Bits per Hamming-weight bucket when collapsing bits for directional runs.
pub const TREND_BLOCK_BITS: usize = 8;

/// Fixed-length sequence of bits packed into 64-bit words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitSequence {
    words: Vec<u64>,
    len: usize,
}

impl BitSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unpack bytes MSB first, eight observations per byte.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        bytes
            .iter()
            .flat_map(|&byte| (0..8).rev().map(move |shift| (byte >> shift) & 1 == 1))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> bool {
        assert!(
            index < self.len,
            "bit index {index} out of range {}",
            self.len
        );
        (self.words[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1
    }

    pub fn set(&mut self, index: usize, bit: bool) {
        assert!(
            index < self.len,
            "bit index {index} out of range {}",
            self.len
        );
        let mask = 1u64 << (index % WORD_BITS);
        let word = &mut self.words[index / WORD_BITS];
        if bit {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    pub fn push(&mut self, bit: bool) {
        if self.len % WORD_BITS == 0 {
            self.words.push(0);
        }
        self.len += 1;
        self.set(self.len - 1, bit);
    }

    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Pack bits MSB first into bytes. A trailing partial byte is dropped.
    pub fn to_bytes(&self) -> Vec<u8> {
        (0..self.len / 8)
            .map(|block| {
                (0..8).fold(0u8, |byte, offset| {
                    (byte << 1) | u8::from(self.get(block * 8 + offset))
                })
            })
            .collect()
    }

    /// Number of ones in each consecutive block of `block_bits` bits.
    /// A trailing partial block is dropped.
    pub fn hamming_weights(&self, block_bits: usize) -> Vec<i64> {
        if block_bits == 0 {
            return Vec::new();
        }
        (0..self.len / block_bits)
            .map(|block| {
                let start = block * block_bits;
                (start..start + block_bits).filter(|&i| self.get(i)).count() as i64
            })
            .collect()
    }
}

impl FromIterator<bool> for BitSequence {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut bits = BitSequence::new();
        for bit in iter {
            bits.push(bit);
        }
        bits
    }
}

impl Samples for BitSequence {
    fn representation(&self) -> Representation {
        Representation::Binary
    }

    fn len(&self) -> usize {
        self.len
    }

    fn value(&self, index: usize) -> i64 {
        i64::from(self.get(index))
    }

    fn swap(&mut self, a: usize, b: usize) {
        let (bit_a, bit_b) = (self.get(a), self.get(b));
        if bit_a != bit_b {
            self.set(a, bit_b);
            self.set(b, bit_a);
        }
    }

    fn subsequence(&self, start: usize, len: usize) -> Self {
        (start..start + len).map(|i| self.get(i)).collect()
    }

    fn encode_text(&self) -> String {
        self.bits().map(|bit| if bit { '1' } else { '0' }).collect()
    }

    /// Bits are already a binary symbol stream; no median is needed.
    fn over_under_symbols(&self) -> Result<Vec<bool>, ScoreError> {
        if self.is_empty() {
            return Err(ScoreError::Empty);
        }
        Ok(self.bits().collect())
    }

    fn trend_series(&self) -> Vec<i64> {
        self.hamming_weights(TREND_BLOCK_BITS)
    }

    fn collision_series(&self) -> Vec<i64> {
        self.to_bytes().into_iter().map(i64::from).collect()
    }
}
