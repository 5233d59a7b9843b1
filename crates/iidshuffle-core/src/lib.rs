//! # iidshuffle-core
//!
//! **Does your entropy source look IID?**
//!
//! `iidshuffle-core` implements the permutation test for independent and
//! identically distributed samples. The input is split into contiguous subsets;
//! each subset is scored with six statistics, shuffled a thousand times, and
//! re-scored after every shuffle. If the original arrangement keeps landing in
//! the tails of its own shuffled distribution, the order of the samples carried
//! information and the source is not IID.
//!
//! ## Quick Start
//!
//! ```no_run
//! use iidshuffle_core::{
//!     PermutationConfig, PermutationTest, SampleSource, UniformSource, to_integers,
//! };
//!
//! let bytes = UniformSource::new(42).collect(10_000);
//! let samples = to_integers(&bytes);
//!
//! let config = PermutationConfig::default().with_seed(7);
//! let test = PermutationTest::new(config).unwrap();
//! let report = test.run(&samples).unwrap();
//! println!("overall: {}", report.verdict);
//! for kind in &report.kinds {
//!     println!(
//!         "{:<18} {} ({} of 10 subsets failed)",
//!         kind.kind.title(),
//!         kind.verdict,
//!         kind.failed_subsets
//!     );
//! }
//! ```
//!
//! ## Architecture
//!
//! Samples → Subsets → (score, shuffle × R, score) → Ranks → Verdicts
//!
//! Scores are exact integers: means are carried as integer part plus
//! remainder, so ranks never depend on floating-point rounding. Both integer
//! samples (`Vec<i64>`) and packed bits ([`BitSequence`]) implement
//! [`Samples`]; each score is written once against that trait.

pub mod arith;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod rank;
pub mod samples;
pub mod scores;
pub mod shuffle;
pub mod source;
pub mod subsets;

pub use config::PermutationConfig;
pub use decision::{DecisionRule, Verdict};
pub use engine::{KindReport, PermutationReport, PermutationTest, SampleSummary, SubsetOutcome};
pub use error::{IidError, Result, ScoreError};
pub use rank::{rank_component, rank_scores};
pub use samples::{BitSequence, Representation, Samples};
pub use scores::{Compressor, Score, ScoreKind, ScoreVector, Scorer, ZlibCompressor};
pub use shuffle::shuffle;
pub use source::{
    ConstantSource, OsSource, RampSource, RandomWalkSource, SampleSource, SourceInfo, UniformSource,
    all_sources, source_by_name, to_integers,
};
pub use subsets::{ScoreDistribution, SubsetManager, split_subsets};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
