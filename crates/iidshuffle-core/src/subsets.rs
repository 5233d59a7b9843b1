//! Subset construction and the per-subset shuffle-and-score loop.

use log::{debug, warn};
use rand::Rng;

use crate::error::{IidError, Result, ScoreError};
use crate::rank::rank_scores;
use crate::samples::Samples;
use crate::scores::{Compressor, ScoreKind, ScoreVector, Scorer};
use crate::shuffle::shuffle;

/// Split `samples` into `count` contiguous subsets of `len / count`
/// observations each. Trailing observations that do not fill a subset are
/// discarded.
pub fn split_subsets<S: Samples>(samples: &S, count: usize) -> Result<Vec<S>> {
    let length = if count == 0 { 0 } else { samples.len() / count };
    if length == 0 {
        return Err(IidError::InsufficientSamples {
            subsets: count,
            needed: count.max(1),
            got: samples.len(),
        });
    }
    Ok((0..count)
        .map(|i| samples.subsequence(i * length, length))
        .collect())
}

/// Observed score of one subset and the scores of its shuffled replicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreDistribution {
    pub observed: ScoreVector,
    pub replicates: Vec<ScoreVector>,
}

impl ScoreDistribution {
    fn new(observed: ScoreVector, capacity: usize) -> Self {
        Self {
            observed,
            replicates: Vec::with_capacity(capacity),
        }
    }

    /// Per-component rank of the observed score.
    ///
    /// # Panics
    ///
    /// Panics if `replicates` is empty. Distributions built by
    /// [`SubsetManager`] always hold at least two.
    pub fn ranks(&self) -> Vec<usize> {
        rank_scores(&self.observed, &self.replicates)
    }
}

/// Everything computed for one subset, in [`ScoreKind::ALL`] order.
#[derive(Debug, Clone)]
pub struct SubsetEvaluation {
    pub index: usize,
    pub kinds: Vec<(ScoreKind, std::result::Result<ScoreDistribution, ScoreError>)>,
}

/// Drives the observed-then-replicates loop for each subset.
pub struct SubsetManager<'a, C> {
    scorer: &'a Scorer<C>,
    replicates: usize,
    fail_fast: bool,
}

impl<'a, C: Compressor> SubsetManager<'a, C> {
    /// Fails with [`IidError::Config`] when `replicates` is below 2.
    pub fn new(scorer: &'a Scorer<C>, replicates: usize, fail_fast: bool) -> Result<Self> {
        if replicates < 2 {
            return Err(IidError::Config(format!(
                "replicates must be at least 2, got {replicates}"
            )));
        }
        Ok(Self {
            scorer,
            replicates,
            fail_fast,
        })
    }

    /// Score `subset` as given, then shuffle it `replicates` times in place,
    /// scoring every kind after each shuffle.
    ///
    /// A kind whose score errors on the observed arrangement or on any
    /// replicate is excluded for this subset. In fail-fast mode the error
    /// aborts with [`IidError::Score`] instead.
    pub fn evaluate<S, R>(
        &self,
        index: usize,
        subset: &mut S,
        rng: &mut R,
    ) -> Result<SubsetEvaluation>
    where
        S: Samples,
        R: Rng,
    {
        debug!(
            "subset {index}: {} observations, {} replicates",
            subset.len(),
            self.replicates
        );

        let mut kinds = Vec::with_capacity(ScoreKind::ALL.len());
        for kind in ScoreKind::ALL {
            let slot = match self.scorer.score(kind, subset) {
                Ok(observed) => Ok(ScoreDistribution::new(observed, self.replicates)),
                Err(e) => Err(self.exclude(kind, index, e)?),
            };
            kinds.push((kind, slot));
        }

        for _ in 0..self.replicates {
            shuffle(subset, rng);
            for (kind, slot) in kinds.iter_mut() {
                let Ok(distribution) = slot else { continue };
                match self.scorer.score(*kind, subset) {
                    Ok(score) => distribution.replicates.push(score),
                    Err(e) => *slot = Err(self.exclude(*kind, index, e)?),
                }
            }
        }

        Ok(SubsetEvaluation { index, kinds })
    }

    fn exclude(&self, kind: ScoreKind, subset: usize, source: ScoreError) -> Result<ScoreError> {
        if self.fail_fast {
            return Err(IidError::Score {
                kind,
                subset,
                source,
            });
        }
        warn!("{kind} excluded on subset {subset}: {source}");
        Ok(source)
    }
}
