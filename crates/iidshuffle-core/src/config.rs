//! Run configuration.
//!
//! Defaults follow the standard permutation-testing setup: 10 subsets, 1000
//! replicates per subset, tails at ranks 50 and 950, and a score kind failing
//! when 8 of the 10 subsets are extreme. Every constant can be overridden,
//! either in code or from a JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decision::DecisionRule;
use crate::error::{IidError, Result};

pub const DEFAULT_SUBSETS: usize = 10;
pub const DEFAULT_REPLICATES: usize = 1000;
pub const DEFAULT_LOWER_TAIL: usize = 50;
pub const DEFAULT_UPPER_TAIL: usize = 950;
pub const DEFAULT_FAILURE_THRESHOLD: usize = 8;

/// Parameters of one permutation test run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermutationConfig {
    /// Number of contiguous, equal-length subsets.
    pub subsets: usize,
    /// Shuffled replicates scored per subset.
    pub replicates: usize,
    /// Ranks at or below this are tail-extreme.
    pub lower_tail: usize,
    /// Ranks at or above this are tail-extreme.
    pub upper_tail: usize,
    /// Failed subsets needed for a score kind to fail.
    pub failure_threshold: usize,
    /// Generator seed; drawn at random (and reported) when absent.
    pub seed: Option<u64>,
    /// Abort on the first score error instead of excluding the subset.
    pub fail_fast: bool,
}

impl Default for PermutationConfig {
    fn default() -> Self {
        Self {
            subsets: DEFAULT_SUBSETS,
            replicates: DEFAULT_REPLICATES,
            lower_tail: DEFAULT_LOWER_TAIL,
            upper_tail: DEFAULT_UPPER_TAIL,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            seed: None,
            fail_fast: false,
        }
    }
}

impl PermutationConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Change the replicate count, rescaling both tails so they keep the same
    /// fraction of the distribution.
    pub fn with_replicates(mut self, replicates: usize) -> Self {
        let old = self.replicates.max(1);
        self.lower_tail = self.lower_tail * replicates / old;
        self.upper_tail = self.upper_tail * replicates / old;
        self.replicates = replicates;
        self
    }

    /// Change the subset count, rescaling the failure threshold in proportion.
    pub fn with_subsets(mut self, subsets: usize) -> Self {
        let old = self.subsets.max(1);
        self.failure_threshold = (self.failure_threshold * subsets).div_ceil(old).max(1);
        self.subsets = subsets;
        self
    }

    /// Check that the constants describe a usable test.
    pub fn validate(&self) -> Result<()> {
        if self.subsets == 0 {
            return Err(IidError::Config("subsets must be at least 1".into()));
        }
        if self.replicates < 2 {
            return Err(IidError::Config("replicates must be at least 2".into()));
        }
        let middle = self.replicates / 2;
        if self.lower_tail >= middle {
            return Err(IidError::Config(format!(
                "lower_tail {} must be below the median rank {middle}",
                self.lower_tail
            )));
        }
        if self.upper_tail <= middle || self.upper_tail > self.replicates {
            return Err(IidError::Config(format!(
                "upper_tail {} must lie in ({middle}, {}]",
                self.upper_tail,
                self.replicates
            )));
        }
        if self.failure_threshold == 0 || self.failure_threshold > self.subsets {
            return Err(IidError::Config(format!(
                "failure_threshold {} must lie in [1, {}]",
                self.failure_threshold,
                self.subsets
            )));
        }
        Ok(())
    }

    /// Load and validate a JSON configuration. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            IidError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn decision_rule(&self) -> DecisionRule {
        DecisionRule {
            lower_tail: self.lower_tail,
            upper_tail: self.upper_tail,
            failure_threshold: self.failure_threshold,
        }
    }
}
