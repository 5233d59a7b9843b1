//! The permutation test facade: configuration, generator, subsets, verdicts.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::arith::{average, confidence_interval, variance};
use crate::config::PermutationConfig;
use crate::decision::{DecisionRule, Verdict};
use crate::error::{Result, ScoreError};
use crate::samples::{Representation, Samples};
use crate::scores::{Compressor, ScoreKind, ScoreVector, Scorer, ZlibCompressor};
use crate::subsets::{SubsetManager, split_subsets};

/// Result of one subset for one score kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubsetOutcome {
    Ranked {
        observed: ScoreVector,
        ranks: Vec<usize>,
        failed: bool,
    },
    Excluded {
        reason: ScoreError,
    },
}

impl SubsetOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Ranked { failed: true, .. })
    }

    pub fn is_excluded(&self) -> bool {
        matches!(self, Self::Excluded { .. })
    }
}

/// Verdict and per-subset detail for one score kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindReport {
    pub kind: ScoreKind,
    pub verdict: Verdict,
    pub failed_subsets: usize,
    pub excluded_subsets: usize,
    pub subsets: Vec<SubsetOutcome>,
}

impl KindReport {
    fn new(kind: ScoreKind, subsets: Vec<SubsetOutcome>, rule: &DecisionRule) -> Self {
        let failed_subsets = subsets.iter().filter(|s| s.is_failed()).count();
        let excluded_subsets = subsets.iter().filter(|s| s.is_excluded()).count();
        Self {
            kind,
            verdict: rule.verdict(failed_subsets, excluded_subsets),
            failed_subsets,
            excluded_subsets,
            subsets,
        }
    }
}

/// Descriptive statistics of the whole input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSummary {
    pub mean: f64,
    pub variance: f64,
    /// 95% confidence interval of the mean.
    pub confidence_interval: (f64, f64),
}

impl SampleSummary {
    pub fn of<S: Samples + ?Sized>(samples: &S) -> std::result::Result<Self, ScoreError> {
        let values: Vec<i64> = samples.observations().collect();
        Ok(Self {
            mean: average(values.iter().copied())?.value(),
            variance: variance(&values)?,
            confidence_interval: confidence_interval(&values)?,
        })
    }
}

/// Everything a run produced. Rendering is left to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermutationReport {
    pub representation: Representation,
    pub sample_count: usize,
    pub subset_length: usize,
    /// Seed of the run's generator, when the run owned it.
    pub seed: Option<u64>,
    pub config: PermutationConfig,
    pub kinds: Vec<KindReport>,
    pub verdict: Verdict,
    pub summary: Option<SampleSummary>,
}

impl PermutationReport {
    pub fn kind(&self, kind: ScoreKind) -> Option<&KindReport> {
        self.kinds.iter().find(|k| k.kind == kind)
    }
}

/// Permutation test over a fixed configuration and compressor.
pub struct PermutationTest<C = ZlibCompressor> {
    config: PermutationConfig,
    scorer: Scorer<C>,
}

impl PermutationTest {
    /// Validate `config` and use the default zlib compressor.
    pub fn new(config: PermutationConfig) -> Result<Self> {
        Self::with_compressor(config, ZlibCompressor::default())
    }
}

impl<C: Compressor> PermutationTest<C> {
    pub fn with_compressor(config: PermutationConfig, compressor: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            scorer: Scorer::new(compressor),
        })
    }

    pub fn config(&self) -> &PermutationConfig {
        &self.config
    }

    /// Run with a generator seeded from the configuration, or from a freshly
    /// drawn seed that is logged and recorded in the report.
    pub fn run<S: Samples>(&self, samples: &S) -> Result<PermutationReport> {
        let seed = match self.config.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::rng().random::<u64>();
                info!("no seed configured, using {seed}");
                seed
            }
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let mut report = self.run_with_rng(samples, &mut rng)?;
        report.seed = Some(seed);
        Ok(report)
    }

    /// Run with a caller-owned generator. Subsets are processed in order and
    /// the generator is never reseeded.
    pub fn run_with_rng<S, R>(&self, samples: &S, rng: &mut R) -> Result<PermutationReport>
    where
        S: Samples,
        R: Rng,
    {
        let subsets = split_subsets(samples, self.config.subsets)?;
        let subset_length = subsets.first().map_or(0, |s| s.len());
        info!(
            "permutation test: {} {} samples, {} subsets of {}, {} replicates",
            samples.len(),
            samples.representation(),
            subsets.len(),
            subset_length,
            self.config.replicates
        );

        let rule = self.config.decision_rule();
        let manager = SubsetManager::new(
            &self.scorer,
            self.config.replicates,
            self.config.fail_fast,
        )?;
        let mut outcomes: Vec<Vec<SubsetOutcome>> = ScoreKind::ALL
            .iter()
            .map(|_| Vec::with_capacity(subsets.len()))
            .collect();

        for (index, mut subset) in subsets.into_iter().enumerate() {
            let evaluation = manager.evaluate(index, &mut subset, rng)?;
            for (slot, (kind, result)) in outcomes.iter_mut().zip(evaluation.kinds) {
                let outcome = match result {
                    Ok(distribution) => {
                        let ranks = distribution.ranks();
                        let failed = rule.subset_failed(&ranks);
                        debug!("subset {index} {kind}: ranks {ranks:?} failed={failed}");
                        SubsetOutcome::Ranked {
                            observed: distribution.observed,
                            ranks,
                            failed,
                        }
                    }
                    Err(reason) => SubsetOutcome::Excluded { reason },
                };
                slot.push(outcome);
            }
        }

        let kinds: Vec<KindReport> = ScoreKind::ALL
            .into_iter()
            .zip(outcomes)
            .map(|(kind, subsets)| KindReport::new(kind, subsets, &rule))
            .collect();
        for report in &kinds {
            info!(
                "{}: {} ({} failed, {} excluded)",
                report.kind,
                report.verdict,
                report.failed_subsets,
                report.excluded_subsets
            );
        }
        let verdict = Verdict::combine(kinds.iter().map(|k| k.verdict));
        info!("overall verdict: {verdict}");

        Ok(PermutationReport {
            representation: samples.representation(),
            sample_count: samples.len(),
            subset_length,
            seed: None,
            config: self.config.clone(),
            kinds,
            verdict,
            summary: SampleSummary::of(samples).ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IidError;
    use crate::samples::BitSequence;

    fn quick_config() -> PermutationConfig {
        PermutationConfig::default()
            .with_replicates(20)
            .with_seed(11)
    }

    #[test]
    fn report_shape() {
        let values: Vec<i64> = (0..205).map(|i| (i * 7919 % 256) as i64).collect();
        let report = PermutationTest::new(quick_config())
            .unwrap()
            .run(&values)
            .unwrap();
        assert_eq!(report.sample_count, 205);
        assert_eq!(report.subset_length, 20);
        assert_eq!(report.seed, Some(11));
        assert_eq!(report.kinds.len(), 6);
        for kind in &report.kinds {
            assert_eq!(kind.subsets.len(), 10);
            for outcome in &kind.subsets {
                if let SubsetOutcome::Ranked { ranks, .. } = outcome {
                    assert_eq!(ranks.len(), kind.kind.arity());
                    assert!(ranks.iter().all(|&r| r <= 20));
                }
            }
        }
        assert!(report.summary.is_some());
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = PermutationConfig {
            replicates: 1,
            ..PermutationConfig::default()
        };
        assert!(matches!(PermutationTest::new(config), Err(IidError::Config(_))));
    }

    #[test]
    fn too_few_samples() {
        let values: Vec<i64> = vec![1, 2, 3];
        let err = PermutationTest::new(quick_config())
            .unwrap()
            .run(&values)
            .unwrap_err();
        assert!(matches!(err, IidError::InsufficientSamples { .. }));
    }

    #[test]
    fn seeded_runs_replay() {
        let bytes: Vec<u8> = (0..120u32).map(|i| (i * 97 % 251) as u8).collect();
        let bits = BitSequence::from_bytes(&bytes);
        let test = PermutationTest::new(quick_config()).unwrap();
        assert_eq!(test.run(&bits).unwrap(), test.run(&bits).unwrap());
    }

    #[test]
    fn unseeded_run_records_its_seed() {
        let config = PermutationConfig::default().with_replicates(10);
        let values: Vec<i64> = (0..100).map(|i| i % 13).collect();
        let report = PermutationTest::new(config).unwrap().run(&values).unwrap();
        let seed = report.seed.unwrap();
        let replay = PermutationTest::new(report.config.clone().with_seed(seed))
            .unwrap()
            .run(&values)
            .unwrap();
        assert_eq!(replay.kinds, report.kinds);
    }

    #[test]
    fn report_serializes_outcomes() {
        let values: Vec<i64> = vec![3; 50];
        let report = PermutationTest::new(quick_config())
            .unwrap()
            .run(&values)
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        let runs = &json["kinds"][1];
        assert_eq!(runs["kind"], "runs");
        assert_eq!(runs["verdict"], "inconclusive");
        assert_eq!(runs["subsets"][0]["status"], "excluded");
        assert_eq!(runs["subsets"][0]["reason"]["error"], "no_median_split");
        assert_eq!(json["representation"], "integer");
    }
}
