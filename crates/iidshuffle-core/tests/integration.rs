//! Integration tests for iidshuffle-core.
//!
//! These tests drive the full pipeline:
//! source → samples → subsets → shuffled replicates → ranks → verdicts.

use iidshuffle_core::{
    BitSequence, Compressor, ConstantSource, IidError, PermutationConfig, PermutationTest,
    RampSource, RandomWalkSource, SampleSource, ScoreError, ScoreKind, SubsetOutcome,
    UniformSource, Verdict, to_integers,
};
use statrs::distribution::{Binomial, DiscreteCDF};

fn uniform_samples(seed: u64, n: usize) -> Vec<i64> {
    to_integers(&UniformSource::new(seed).collect(n))
}

fn quick(seed: u64) -> PermutationConfig {
    PermutationConfig::default()
        .with_replicates(200)
        .with_seed(seed)
}

#[test]
fn uniform_bytes_pass_the_default_test() {
    let samples = uniform_samples(2024, 10_000);
    let config = PermutationConfig::default().with_seed(99);
    let test = PermutationTest::new(config).unwrap();
    let report = test.run(&samples).unwrap();

    assert_eq!(report.subset_length, 1000);
    for kind in &report.kinds {
        assert_eq!(
            kind.verdict,
            Verdict::Pass,
            "{} failed on {} subsets",
            kind.kind,
            kind.failed_subsets
        );
        assert_eq!(kind.excluded_subsets, 0, "{}", kind.kind);
    }
    assert_eq!(report.verdict, Verdict::Pass);

    let summary = report.summary.unwrap();
    assert!((summary.mean - 127.5).abs() < 3.0, "mean {}", summary.mean);
    assert!(summary.confidence_interval.0 < summary.mean);
    assert!(summary.mean < summary.confidence_interval.1);
}

// Twenty runs at 5,000 samples and 200 replicates each, rather than the
// default 10,000 x 1000, to keep the runtime tolerable. The default sizes are
// exercised by `uniform_bytes_pass_the_default_test`.
#[test]
#[ignore] // Run with: cargo test -- --ignored
fn false_failure_rate_is_small() {
    let runs = 20u64;
    let failures = (0..runs)
        .filter(|&seed| {
            let samples = uniform_samples(seed, 5_000);
            let report = PermutationTest::new(quick(seed + 1000))
                .unwrap()
                .run(&samples)
                .unwrap();
            report.verdict == Verdict::Fail
        })
        .count() as u64;

    // Generous per-run false failure bound; observing this many or more
    // failures should be very unlikely under it.
    let binomial = Binomial::new(0.01, runs).unwrap();
    if failures > 0 {
        let p = binomial.sf(failures - 1);
        assert!(
            p > 1e-3,
            "{failures}/{runs} uniform runs failed (p={p:.2e})"
        );
    }
}

#[test]
fn constant_input_is_inconclusive_not_pass() {
    let samples = to_integers(&ConstantSource::new(0x5A).collect(2_000));
    let report = PermutationTest::new(quick(1))
        .unwrap()
        .run(&samples)
        .unwrap();

    let runs = report.kind(ScoreKind::Runs).unwrap();
    assert_eq!(runs.verdict, Verdict::Inconclusive);
    assert_eq!(runs.excluded_subsets, 10);
    assert_eq!(runs.failed_subsets, 0);
    for outcome in &runs.subsets {
        assert!(matches!(
            outcome,
            SubsetOutcome::Excluded {
                reason: ScoreError::NoMedianSplit
            }
        ));
    }
    assert_eq!(report.verdict, Verdict::Inconclusive);
}

#[test]
fn constant_input_aborts_in_fail_fast_mode() {
    let samples = to_integers(&ConstantSource::new(3).collect(2_000));
    let err = PermutationTest::new(quick(1).with_fail_fast(true))
        .unwrap()
        .run(&samples)
        .unwrap_err();
    assert!(
        matches!(
            err,
            IidError::Score {
                kind: ScoreKind::Runs,
                subset: 0,
                ..
            }
        ),
        "unexpected error: {err}"
    );
}

#[test]
fn ramp_fails() {
    let samples = to_integers(&RampSource.collect(5_000));
    let report = PermutationTest::new(quick(5))
        .unwrap()
        .run(&samples)
        .unwrap();
    assert_eq!(report.verdict, Verdict::Fail);
    assert_eq!(
        report.kind(ScoreKind::Compression).unwrap().verdict,
        Verdict::Fail
    );
}

#[test]
fn random_walk_fails() {
    let samples = to_integers(&RandomWalkSource::new(8).collect(5_000));
    let report = PermutationTest::new(quick(6))
        .unwrap()
        .run(&samples)
        .unwrap();
    assert_eq!(report.verdict, Verdict::Fail);
    let covariance = report.kind(ScoreKind::Covariance).unwrap();
    assert_eq!(covariance.verdict, Verdict::Fail);
    assert_eq!(covariance.failed_subsets, 10);
    let runs = report.kind(ScoreKind::Runs).unwrap();
    assert_eq!(runs.verdict, Verdict::Fail);
}

#[test]
fn same_seed_same_report() {
    let samples = uniform_samples(77, 3_000);
    let test = PermutationTest::new(quick(123)).unwrap();
    let first = test.run(&samples).unwrap();
    let second = test.run(&samples).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

struct BrokenCompressor;

impl Compressor for BrokenCompressor {
    fn compressed_len(&self, _data: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("compressor offline"))
    }
}

#[test]
fn broken_compressor_excludes_compression_only() {
    let samples = uniform_samples(4, 3_000);
    let test = PermutationTest::with_compressor(quick(4), BrokenCompressor)
        .unwrap();
    let report = test.run(&samples).unwrap();

    let compression = report.kind(ScoreKind::Compression).unwrap();
    assert_eq!(compression.excluded_subsets, 10);
    assert_eq!(compression.failed_subsets, 0);
    assert_eq!(compression.verdict, Verdict::Inconclusive);
    match &compression.subsets[0] {
        SubsetOutcome::Excluded {
            reason: ScoreError::CompressionUnavailable { reason },
        } => assert!(reason.contains("offline")),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_ne!(report.verdict, Verdict::Pass);
    assert_ne!(report.verdict, Verdict::Fail);
}

#[test]
fn uniform_bits_pass() {
    let bits = BitSequence::from_bytes(&UniformSource::new(31).collect(2_000));
    let report = PermutationTest::new(quick(31)).unwrap().run(&bits).unwrap();
    assert_eq!(report.sample_count, 16_000);
    assert_eq!(report.subset_length, 1_600);
    assert_eq!(report.representation.to_string(), "binary");
    assert_eq!(report.verdict, Verdict::Pass);
}

#[test]
fn alternating_bits_fail() {
    let bits = BitSequence::from_bytes(&[0xAA; 1_000]);
    let report = PermutationTest::new(quick(2)).unwrap().run(&bits).unwrap();
    assert_eq!(report.kind(ScoreKind::Runs).unwrap().verdict, Verdict::Fail);
    assert_eq!(report.verdict, Verdict::Fail);
}

#[test]
fn too_few_samples_for_subsets() {
    let samples = uniform_samples(1, 9);
    let err = PermutationTest::new(quick(1))
        .unwrap()
        .run(&samples)
        .unwrap_err();
    assert!(matches!(
        err,
        IidError::InsufficientSamples {
            subsets: 10,
            got: 9,
            ..
        }
    ));
}
