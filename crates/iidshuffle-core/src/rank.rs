//! Empirical rank of an observed score inside its replicate distribution.

use crate::scores::{Score, ScoreVector};

/// Rank of `observed` within ascending `sorted` replicate values.
///
/// With `R = sorted.len()` and median `sorted[R/2]`:
/// - median above `observed`: last index at or below `R/2` holding a value
///   `<= observed`, or 0 when there is none;
/// - median equal to `observed`: `R/2`;
/// - median below `observed`: first index at or above `R/2` holding a value
///   `>= observed`, or `R` when there is none.
///
/// The result always lies in `[0, R]`.
///
/// # Panics
///
/// Panics if `sorted` is empty.
pub fn rank_component(sorted: &[Score], observed: Score) -> usize {
    let middle = sorted.len() / 2;
    let median = sorted[middle];
    match median.cmp(&observed) {
        std::cmp::Ordering::Greater => {
            // every value <= observed sits below the median
            sorted
                .partition_point(|&v| v <= observed)
                .saturating_sub(1)
        }
        std::cmp::Ordering::Equal => middle,
        std::cmp::Ordering::Less => sorted.partition_point(|&v| v < observed),
    }
}

/// Rank every component of `observed` against the same component of each
/// replicate.
///
/// # Panics
///
/// Panics if `replicates` is empty.
pub fn rank_scores(observed: &ScoreVector, replicates: &[ScoreVector]) -> Vec<usize> {
    (0..observed.arity())
        .map(|component| {
            let mut column: Vec<Score> = replicates.iter().map(|r| r[component]).collect();
            column.sort_unstable();
            rank_component(&column, observed[component])
        })
        .collect()
}
