//! The six permutation-test scores.
//!
//! Each score is computed on one arrangement of one subset and yields a
//! fixed-arity vector of integers. Scores are written once against
//! [`Samples`]; the integer and bit representations only differ in the hooks
//! that trait exposes.
//!
//! Excursion and covariance are rational statistics. They are reported exactly
//! as integers by scaling with factors that depend only on the subset length
//! `n` and the subset sum `S`. Both are unchanged by shuffling, so the scaled
//! values order the observed score and its replicates exactly as the unscaled
//! statistic would.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use serde::Serialize;

use crate::arith::{all_collisions, average};
use crate::error::ScoreError;
use crate::samples::Samples;

/// One component of a score vector.
pub type Score = i128;

// ═══════════════════════════════════════════════════════════════════════════════
// Core types
// ═══════════════════════════════════════════════════════════════════════════════

/// The statistics computed on every arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    Compression,
    Runs,
    Excursion,
    DirectionalRuns,
    Covariance,
    Collision,
}

impl ScoreKind {
    pub const ALL: [ScoreKind; 6] = [
        ScoreKind::Compression,
        ScoreKind::Runs,
        ScoreKind::Excursion,
        ScoreKind::DirectionalRuns,
        ScoreKind::Covariance,
        ScoreKind::Collision,
    ];

    /// Number of components in this kind's score vector.
    pub fn arity(self) -> usize {
        match self {
            Self::Compression | Self::Excursion | Self::Covariance => 1,
            Self::Runs => 2,
            Self::DirectionalRuns | Self::Collision => 3,
        }
    }

    /// Human-readable component names, in vector order.
    pub fn components(self) -> &'static [&'static str] {
        match self {
            Self::Compression => &["compressed_length"],
            Self::Runs => &["longest_run", "run_count"],
            Self::Excursion => &["max_excursion"],
            Self::DirectionalRuns => &["longest_run", "run_count", "max_direction_count"],
            Self::Covariance => &["lag1_covariance"],
            Self::Collision => &["min_gap", "max_gap", "mean_gap"],
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Compression => "Compression",
            Self::Runs => "Over/Under Runs",
            Self::Excursion => "Excursion",
            Self::DirectionalRuns => "Directional Runs",
            Self::Covariance => "Covariance",
            Self::Collision => "Collision",
        }
    }
}

impl std::fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compression => write!(f, "compression"),
            Self::Runs => write!(f, "runs"),
            Self::Excursion => write!(f, "excursion"),
            Self::DirectionalRuns => write!(f, "directional_runs"),
            Self::Covariance => write!(f, "covariance"),
            Self::Collision => write!(f, "collision"),
        }
    }
}

/// Fixed-arity integer result of one score on one arrangement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScoreVector(Vec<Score>);

impl ScoreVector {
    pub fn new(components: Vec<Score>) -> Self {
        Self(components)
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[Score] {
        &self.0
    }
}

impl<const N: usize> From<[Score; N]> for ScoreVector {
    fn from(components: [Score; N]) -> Self {
        Self(components.to_vec())
    }
}

impl std::ops::Index<usize> for ScoreVector {
    type Output = Score;

    fn index(&self, index: usize) -> &Score {
        &self.0[index]
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Compression collaborator
// ═══════════════════════════════════════════════════════════════════════════════

/// General-purpose lossless compressor, seen only through its output length.
pub trait Compressor {
    fn compressed_len(&self, data: &[u8]) -> std::io::Result<usize>;
}

impl<C: Compressor + ?Sized> Compressor for &C {
    fn compressed_len(&self, data: &[u8]) -> std::io::Result<usize> {
        (**self).compressed_len(data)
    }
}

impl<C: Compressor + ?Sized> Compressor for Box<C> {
    fn compressed_len(&self, data: &[u8]) -> std::io::Result<usize> {
        (**self).compressed_len(data)
    }
}

/// zlib via `flate2`. Absolute compression scores depend on this choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZlibCompressor {
    level: u32,
}

impl ZlibCompressor {
    /// `level` is clamped to zlib's 0-9 range.
    pub fn new(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }
}

impl Default for ZlibCompressor {
    fn default() -> Self {
        Self::new(Compression::best().level())
    }
}

impl Compressor for ZlibCompressor {
    fn compressed_len(&self, data: &[u8]) -> std::io::Result<usize> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(self.level));
        encoder.write_all(data)?;
        Ok(encoder.finish()?.len())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Score bank
// ═══════════════════════════════════════════════════════════════════════════════

/// Dispatches [`ScoreKind`]s to their score functions with a pinned compressor.
#[derive(Debug, Clone, Default)]
pub struct Scorer<C = ZlibCompressor> {
    compressor: C,
}

impl<C: Compressor> Scorer<C> {
    pub fn new(compressor: C) -> Self {
        Self { compressor }
    }

    pub fn compressor(&self) -> &C {
        &self.compressor
    }

    pub fn score<S: Samples + ?Sized>(
        &self,
        kind: ScoreKind,
        samples: &S,
    ) -> Result<ScoreVector, ScoreError> {
        match kind {
            ScoreKind::Compression => compression_score(samples, &self.compressor),
            ScoreKind::Runs => runs_score(samples),
            ScoreKind::Excursion => excursion_score(samples),
            ScoreKind::DirectionalRuns => directional_runs_score(samples),
            ScoreKind::Covariance => covariance_score(samples),
            ScoreKind::Collision => collision_score(samples),
        }
    }
}

fn overflow(context: &'static str) -> ScoreError {
    ScoreError::Overflow { context }
}

// ═══════════════════════════════════════════════════════════════════════════════
// 1. COMPRESSION
// ═══════════════════════════════════════════════════════════════════════════════

/// Compressed length of the sample text (decimal values joined by commas, or
/// a string of '0'/'1' for bits).
pub fn compression_score<S, C>(samples: &S, compressor: &C) -> Result<ScoreVector, ScoreError>
where
    S: Samples + ?Sized,
    C: Compressor + ?Sized,
{
    if samples.is_empty() {
        return Err(ScoreError::Empty);
    }
    let text = samples.encode_text();
    let length = compressor
        .compressed_len(text.as_bytes())
        .map_err(|e| ScoreError::CompressionUnavailable {
            reason: e.to_string(),
        })?;
    Ok(ScoreVector::from([length as Score]))
}

// ═══════════════════════════════════════════════════════════════════════════════
// 2. OVER/UNDER RUNS
// ═══════════════════════════════════════════════════════════════════════════════

/// Longest run and number of runs in the over/under symbol stream.
pub fn runs_score<S: Samples + ?Sized>(samples: &S) -> Result<ScoreVector, ScoreError> {
    let symbols = samples.over_under_symbols()?;
    let (longest, count) = symbol_runs(&symbols);
    Ok(ScoreVector::from([longest as Score, count as Score]))
}

/// `(longest run, number of runs)` of a non-empty symbol stream.
fn symbol_runs(symbols: &[bool]) -> (usize, usize) {
    let mut longest = 0;
    let mut count = 0;
    let mut current = 0;
    for (i, &symbol) in symbols.iter().enumerate() {
        if i > 0 && symbol == symbols[i - 1] {
            current += 1;
        } else {
            count += 1;
            current = 1;
        }
        longest = longest.max(current);
    }
    (longest, count)
}

// ═══════════════════════════════════════════════════════════════════════════════
// 3. EXCURSION
// ═══════════════════════════════════════════════════════════════════════════════

/// Largest absolute running deviation from the mean, scaled by `n`.
///
/// With prefix sums `P_i` and total `S`, the running deviation after `i`
/// samples is `P_i − i·S/n`; the reported value is `max_i |n·P_i − i·S|`.
pub fn excursion_score<S: Samples + ?Sized>(samples: &S) -> Result<ScoreVector, ScoreError> {
    let mean = average(samples.observations())?;
    let total = mean.sum()?;
    let n = mean.count() as i128;

    let mut prefix: i128 = 0;
    let mut max_excursion: i128 = 0;
    for (i, value) in samples.observations().enumerate() {
        prefix = prefix
            .checked_add(i128::from(value))
            .ok_or(overflow("excursion"))?;
        let deviation = n
            .checked_mul(prefix)
            .zip((i as i128 + 1).checked_mul(total))
            .and_then(|(a, b)| a.checked_sub(b))
            .and_then(i128::checked_abs)
            .ok_or(overflow("excursion"))?;
        max_excursion = max_excursion.max(deviation);
    }
    Ok(ScoreVector::from([max_excursion]))
}

// ═══════════════════════════════════════════════════════════════════════════════
// 4. DIRECTIONAL RUNS
// ═══════════════════════════════════════════════════════════════════════════════

/// Directional runs over the sign of each adjacent difference of the trend
/// series (the values themselves, or 8-bit Hamming weights for bits).
pub fn directional_runs_score<S: Samples + ?Sized>(
    samples: &S,
) -> Result<ScoreVector, ScoreError> {
    let series = samples.trend_series();
    if series.len() < 2 {
        return Err(ScoreError::TooShort {
            needed: 2,
            got: series.len(),
        });
    }
    let signs: Vec<i8> = series
        .windows(2)
        .map(|pair| match pair[1].cmp(&pair[0]) {
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
        })
        .collect();
    Ok(directional_runs(&signs))
}

/// Run analysis of a derivative sign sequence.
///
/// Leading zeros are skipped. A sign opposite to the current run's sign starts
/// a new run; zeros extend the current run. Returns `[longest run, number of
/// runs, max(#+1, #−1)]`, or `[0, 0, 0]` when every sign is zero.
pub fn directional_runs(signs: &[i8]) -> ScoreVector {
    let ups = signs.iter().filter(|&&s| s > 0).count();
    let downs = signs.iter().filter(|&&s| s < 0).count();
    let Some(start) = signs.iter().position(|&s| s != 0) else {
        return ScoreVector::from([0, 0, 0]);
    };

    let mut direction = signs[start];
    let mut runs = 1;
    let mut current = 1;
    let mut longest = 1;
    for &sign in &signs[start + 1..] {
        if sign == -direction {
            runs += 1;
            longest = longest.max(current);
            current = 1;
            direction = sign;
        } else {
            current += 1;
        }
    }
    longest = longest.max(current);
    ScoreVector::from([longest as Score, runs as Score, ups.max(downs) as Score])
}

// ═══════════════════════════════════════════════════════════════════════════════
// 5. COVARIANCE
// ═══════════════════════════════════════════════════════════════════════════════

/// Lag-1 covariance of mean-centred values, scaled by `n²·(n−1)`.
///
/// Reported as `Σ (n·x_i − S)(n·x_{i+1} − S)` over the `n−1` adjacent pairs.
pub fn covariance_score<S: Samples + ?Sized>(samples: &S) -> Result<ScoreVector, ScoreError> {
    let values: Vec<i64> = samples.observations().collect();
    if values.len() < 2 {
        return Err(ScoreError::TooShort {
            needed: 2,
            got: values.len(),
        });
    }
    let mean = average(values.iter().copied())?;
    let total = mean.sum()?;
    let n = mean.count() as i128;
    let centred = |x: i64| {
        n.checked_mul(i128::from(x))
            .and_then(|v| v.checked_sub(total))
            .ok_or(overflow("covariance"))
    };

    let mut sum: i128 = 0;
    for pair in values.windows(2) {
        let product = centred(pair[0])?
            .checked_mul(centred(pair[1])?)
            .ok_or(overflow("covariance"))?;
        sum = sum.checked_add(product).ok_or(overflow("covariance"))?;
    }
    Ok(ScoreVector::from([sum]))
}

// ═══════════════════════════════════════════════════════════════════════════════
// 6. COLLISION
// ═══════════════════════════════════════════════════════════════════════════════

/// Minimum, maximum and floored exact mean of the collision gap lengths.
pub fn collision_score<S: Samples + ?Sized>(samples: &S) -> Result<ScoreVector, ScoreError> {
    let series = samples.collision_series();
    let gaps = all_collisions(&series);
    let (Some(&min), Some(&max)) = (gaps.iter().min(), gaps.iter().max()) else {
        return Err(ScoreError::NoCollisions);
    };
    let mean = average(gaps.iter().map(|&g| g as i64))?;
    Ok(ScoreVector::from([min as Score, max as Score, mean.floor()]))
}
