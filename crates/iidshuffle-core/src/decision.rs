//! Pass/fail decisions from subset ranks.

use serde::Serialize;

/// Outcome for one score kind, or for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    /// Too many subsets were excluded to decide either way.
    Inconclusive,
}

impl Verdict {
    pub fn passed(self) -> bool {
        self == Verdict::Pass
    }

    /// Aggregate per-kind verdicts: any failure fails, otherwise any
    /// inconclusive kind makes the whole run inconclusive.
    pub fn combine<I: IntoIterator<Item = Verdict>>(verdicts: I) -> Verdict {
        let mut overall = Verdict::Pass;
        for verdict in verdicts {
            match verdict {
                Verdict::Fail => return Verdict::Fail,
                Verdict::Inconclusive => overall = Verdict::Inconclusive,
                Verdict::Pass => {}
            }
        }
        overall
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
            Self::Inconclusive => write!(f, "INCONCLUSIVE"),
        }
    }
}

/// Tail thresholds and the failure count that together decide a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionRule {
    pub lower_tail: usize,
    pub upper_tail: usize,
    pub failure_threshold: usize,
}

impl DecisionRule {
    pub fn is_extreme(&self, rank: usize) -> bool {
        rank <= self.lower_tail || rank >= self.upper_tail
    }

    /// A subset fails when every component of its score ranks in a tail.
    pub fn subset_failed(&self, ranks: &[usize]) -> bool {
        !ranks.is_empty() && ranks.iter().all(|&r| self.is_extreme(r))
    }

    /// Verdict for one score kind given `failed` failing subsets and
    /// `excluded` subsets whose score could not be computed.
    ///
    /// Excluded subsets count as neither: the kind passes only if it would
    /// still pass with every excluded subset failing.
    pub fn verdict(&self, failed: usize, excluded: usize) -> Verdict {
        if failed >= self.failure_threshold {
            Verdict::Fail
        } else if failed + excluded < self.failure_threshold {
            Verdict::Pass
        } else {
            Verdict::Inconclusive
        }
    }
}
