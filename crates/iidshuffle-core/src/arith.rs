//! Exact arithmetic primitives shared by the score functions.
//!
//! Means are tracked as an integer part plus a remainder over the running
//! count, so a mean over millions of values never accumulates floating-point
//! drift. Conversion to `f64` happens once, at the very end, and only when a
//! caller asks for it.

use std::collections::HashSet;

use crate::error::ScoreError;

// ---------------------------------------------------------------------------
// Exact running mean
// ---------------------------------------------------------------------------

/// Exact mean of a sequence of integers.
///
/// Invariant: `sum = integer_part * count + remainder` with
/// `0 <= remainder < count`, so `integer_part` is the floor of the mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExactMean {
    integer_part: i128,
    remainder: i128,
    count: i128,
}

impl ExactMean {
    fn empty() -> Self {
        Self {
            integer_part: 0,
            remainder: 0,
            count: 0,
        }
    }

    fn push(&mut self, value: i128) -> Result<(), ScoreError> {
        let overflow = ScoreError::Overflow {
            context: "exact mean",
        };
        let count = self.count.checked_add(1).ok_or(overflow.clone())?;
        let delta = value
            .checked_sub(self.integer_part)
            .and_then(|d| d.checked_add(self.remainder))
            .ok_or(overflow.clone())?;
        self.integer_part = self
            .integer_part
            .checked_add(delta.div_euclid(count))
            .ok_or(overflow)?;
        self.remainder = delta.rem_euclid(count);
        self.count = count;
        Ok(())
    }

    /// Number of values averaged.
    pub fn count(&self) -> usize {
        self.count as usize
    }

    /// Floor of the mean.
    pub fn floor(&self) -> i128 {
        self.integer_part
    }

    /// Remainder over [`count`](Self::count), always in `[0, count)`.
    pub fn remainder(&self) -> i128 {
        self.remainder
    }

    /// Exact sum of the averaged values (the mean's numerator over `count`).
    pub fn sum(&self) -> Result<i128, ScoreError> {
        self.integer_part
            .checked_mul(self.count)
            .and_then(|s| s.checked_add(self.remainder))
            .ok_or(ScoreError::Overflow {
                context: "exact sum",
            })
    }

    /// The mean as a floating value. This is the only lossy step.
    pub fn value(&self) -> f64 {
        self.integer_part as f64 + self.remainder as f64 / self.count as f64
    }
}

/// Exact mean of `f(x)` over `values`, where `f` may fail.
pub fn try_expectation<I, F>(values: I, mut f: F) -> Result<ExactMean, ScoreError>
where
    I: IntoIterator<Item = i64>,
    F: FnMut(i64) -> Result<i128, ScoreError>,
{
    let mut mean = ExactMean::empty();
    for value in values {
        mean.push(f(value)?)?;
    }
    if mean.count == 0 {
        return Err(ScoreError::Empty);
    }
    Ok(mean)
}

/// Exact mean of `f(x)` over `values`.
pub fn expectation<I, F>(values: I, mut f: F) -> Result<ExactMean, ScoreError>
where
    I: IntoIterator<Item = i64>,
    F: FnMut(i64) -> i128,
{
    try_expectation(values, |x| Ok(f(x)))
}

/// Exact mean of `values`.
pub fn average<I>(values: I) -> Result<ExactMean, ScoreError>
where
    I: IntoIterator<Item = i64>,
{
    expectation(values, i128::from)
}

/// `base` raised to `exp`, failing on overflow.
pub fn int_pow(base: i128, exp: u32) -> Result<i128, ScoreError> {
    base.checked_pow(exp).ok_or(ScoreError::Overflow {
        context: "integer power",
    })
}

/// Exact mean of `x^order`.
pub fn raw_moment(values: &[i64], order: u32) -> Result<ExactMean, ScoreError> {
    try_expectation(values.iter().copied(), |x| int_pow(x.into(), order))
}

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

/// Unbiased sample variance, `(n·Σx² − (Σx)²) / (n·(n−1))`.
///
/// Numerator and denominator are exact integers; only the final quotient is
/// rounded.
pub fn variance(values: &[i64]) -> Result<f64, ScoreError> {
    let n = values.len();
    if n < 2 {
        return Err(ScoreError::TooShort { needed: 2, got: n });
    }
    let sum = average(values.iter().copied())?.sum()?;
    let sum_sq = raw_moment(values, 2)?.sum()?;
    let n = n as i128;
    let overflow = ScoreError::Overflow {
        context: "variance",
    };
    let numerator = n
        .checked_mul(sum_sq)
        .and_then(|a| sum.checked_mul(sum).and_then(|b| a.checked_sub(b)))
        .ok_or(overflow.clone())?;
    let denominator = n.checked_mul(n - 1).ok_or(overflow)?;
    Ok(numerator as f64 / denominator as f64)
}

pub fn standard_deviation(values: &[i64]) -> Result<f64, ScoreError> {
    Ok(variance(values)?.sqrt())
}

/// 95% confidence interval of the mean: `mean ± 1.96·σ/√n`.
pub fn confidence_interval(values: &[i64]) -> Result<(f64, f64), ScoreError> {
    let mean = average(values.iter().copied())?.value();
    let half_width = 1.96 * standard_deviation(values)? / (values.len() as f64).sqrt();
    Ok((mean - half_width, mean + half_width))
}

// ---------------------------------------------------------------------------
// Median bounds
// ---------------------------------------------------------------------------

/// Integer bounds around the median used to split values into over/under.
///
/// Values strictly below `upper` are under the median; otherwise values
/// strictly above `lower` are over it; anything else sits on the median and is
/// not classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MedianBounds {
    pub lower: i64,
    pub upper: i64,
}

impl MedianBounds {
    /// `Some(true)` for over, `Some(false)` for under, `None` on the median.
    pub fn classify(&self, value: i64) -> Option<bool> {
        if value < self.upper {
            Some(false)
        } else if value > self.lower {
            Some(true)
        } else {
            None
        }
    }
}

/// Compute median bounds.
///
/// The lower bound starts at the lower-middle element and walks down while it
/// equals the maximum; the upper bound starts at the upper-middle element and
/// walks up while it equals the minimum. When the centre is pinned to an
/// extreme value this widens the split so the extreme is still separable.
pub fn median_bounds(values: &[i64]) -> Result<MedianBounds, ScoreError> {
    if values.is_empty() {
        return Err(ScoreError::Empty);
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    let (min, max) = (sorted[0], sorted[n - 1]);

    let mut lower = (n - 1) / 2;
    while lower > 0 && sorted[lower] == max {
        lower -= 1;
    }
    let mut upper = n / 2;
    while upper < n - 1 && sorted[upper] == min {
        upper += 1;
    }
    Ok(MedianBounds {
        lower: sorted[lower],
        upper: sorted[upper],
    })
}

// ---------------------------------------------------------------------------
// Collisions
// ---------------------------------------------------------------------------

/// Lengths of consecutive segments that each end at their first repeated value.
///
/// Each length counts the samples from the segment start up to and including
/// the repeat. The partial segment after the last collision is dropped.
pub fn all_collisions(values: &[i64]) -> Vec<usize> {
    let mut seen = HashSet::new();
    let mut gaps = Vec::new();
    let mut start = 0;
    for (i, &value) in values.iter().enumerate() {
        if !seen.insert(value) {
            gaps.push(i - start + 1);
            seen.clear();
            start = i + 1;
        }
    }
    gaps
}
