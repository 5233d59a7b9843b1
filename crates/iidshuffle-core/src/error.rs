//! Error types for score computation and permutation runs.

use serde::Serialize;
use thiserror::Error;

use crate::scores::ScoreKind;

/// Failure of a single score computation on one arrangement of one subset.
///
/// These are local: by default the engine excludes the affected subset from
/// that score kind's tally instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum ScoreError {
    #[error("empty sample sequence")]
    Empty,

    #[error("insufficient samples: need {needed}, got {got}")]
    TooShort { needed: usize, got: usize },

    #[error("every sample equals the median, no over/under symbols to classify")]
    NoMedianSplit,

    #[error("no collision occurs before the end of the sequence")]
    NoCollisions,

    #[error("compression unavailable: {reason}")]
    CompressionUnavailable { reason: String },

    #[error("arithmetic overflow while computing {context}")]
    Overflow { context: &'static str },
}

/// Run-level failure of a permutation test.
#[derive(Debug, Error)]
pub enum IidError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("insufficient samples: {subsets} subsets need at least {needed} samples, got {got}")]
    InsufficientSamples {
        subsets: usize,
        needed: usize,
        got: usize,
    },

    #[error("{kind} score failed on subset {subset}: {source}")]
    Score {
        kind: ScoreKind,
        subset: usize,
        #[source]
        source: ScoreError,
    },

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = IidError> = std::result::Result<T, E>;
