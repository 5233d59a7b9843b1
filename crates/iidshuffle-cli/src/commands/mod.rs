pub mod report;
pub mod run;
pub mod sources;

use std::path::Path;
use std::time::{Duration, Instant};

use iidshuffle_core::{
    BitSequence, PermutationConfig, PermutationReport, PermutationTest, SampleSource, Verdict,
    source_by_name, to_integers,
};
use serde::Serialize;
use uuid::Uuid;

/// Flags shared by `run` and `report`.
#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Sample source (see `iidshuffle sources`)
    #[arg(long, default_value = "uniform")]
    pub source: String,

    /// Number of bytes to collect from the source
    #[arg(long, default_value = "10000")]
    pub samples: usize,

    /// Test the bytes as a bit sequence (8 observations per byte)
    #[arg(long)]
    pub bits: bool,

    /// Seed for the shuffling generator (drawn at random and reported if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Seed for seeded sources (defaults to --seed, then 0)
    #[arg(long)]
    pub source_seed: Option<u64>,

    /// JSON configuration file; flags below override it
    #[arg(long)]
    pub config: Option<String>,

    /// Number of subsets (rescales the failure threshold)
    #[arg(long)]
    pub subsets: Option<usize>,

    /// Replicates per subset (rescales the tail thresholds)
    #[arg(long)]
    pub replicates: Option<usize>,

    /// Abort on the first score error instead of excluding the subset
    #[arg(long)]
    pub fail_fast: bool,

    /// Output path (JSON for `run`, Markdown for `report`)
    #[arg(long)]
    pub output: Option<String>,
}

/// One finished test over one source.
pub struct Execution {
    pub run_id: Uuid,
    pub source: &'static str,
    pub report: PermutationReport,
    pub elapsed: Duration,
}

/// Look up a source and make sure it can run here.
pub fn make_source(name: &str, seed: u64) -> Result<Box<dyn SampleSource>, String> {
    let Some(source) = source_by_name(name, seed) else {
        let known: Vec<&str> = iidshuffle_core::all_sources(seed)
            .iter()
            .map(|s| s.name())
            .collect();
        return Err(format!(
            "Source '{name}' not found. Available: {}",
            known.join(", ")
        ));
    };
    if !source.is_available() {
        return Err(format!("Source '{name}' is not available on this machine."));
    }
    Ok(source)
}

/// Configuration file (or defaults) with command-line overrides applied.
pub fn build_config(args: &RunArgs) -> Result<PermutationConfig, String> {
    let mut config = match &args.config {
        Some(path) => PermutationConfig::load(Path::new(path)),
        None => Ok(PermutationConfig::default()),
    }
    .map_err(|e| e.to_string())?;
    if let Some(subsets) = args.subsets {
        config = config.with_subsets(subsets);
    }
    if let Some(replicates) = args.replicates {
        config = config.with_replicates(replicates);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if args.fail_fast {
        config = config.with_fail_fast(true);
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Collect from the requested source and run the permutation test on it.
pub fn execute(args: &RunArgs) -> Result<Execution, String> {
    let config = build_config(args)?;
    let source_seed = args.source_seed.or(args.seed).unwrap_or(0);
    let source = make_source(&args.source, source_seed)?;
    let test = PermutationTest::new(config).map_err(|e| e.to_string())?;

    println!(
        "Collecting {} bytes from {} ({})...",
        args.samples,
        source.name(),
        source.info().description
    );
    let bytes = source.collect(args.samples);
    if bytes.is_empty() {
        return Err(format!("Source '{}' produced no data.", source.name()));
    }
    if bytes.len() < args.samples {
        log::warn!(
            "{} returned {} of {} requested bytes",
            source.name(),
            bytes.len(),
            args.samples
        );
    }

    let t0 = Instant::now();
    let report = if args.bits {
        test.run(&BitSequence::from_bytes(&bytes))
    } else {
        test.run(&to_integers(&bytes))
    }
    .map_err(|e| e.to_string())?;

    Ok(Execution {
        run_id: Uuid::new_v4(),
        source: source.name(),
        report,
        elapsed: t0.elapsed(),
    })
}

/// Process exit status for a finished run.
pub fn exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Pass => 0,
        Verdict::Fail | Verdict::Inconclusive => 2,
    }
}

/// Pretty-print `value` as JSON to `path`.
pub fn write_json<T: Serialize>(value: &T, path: &str, label: &str) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => match std::fs::write(path, json) {
            Ok(()) => println!("\n{label} saved to: {path}"),
            Err(e) => eprintln!("Failed to write {path}: {e}"),
        },
        Err(e) => eprintln!("Failed to serialize {label}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args() -> RunArgs {
        RunArgs {
            source: "uniform".into(),
            samples: 2_000,
            bits: false,
            seed: None,
            source_seed: None,
            config: None,
            subsets: None,
            replicates: None,
            fail_fast: false,
            output: None,
        }
    }

    // -----------------------------------------------------------------------
    // build_config tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_default_config() {
        let config = build_config(&args()).unwrap();
        assert_eq!(config, PermutationConfig::default());
    }

    #[test]
    fn test_flags_override() {
        let args = RunArgs {
            replicates: Some(100),
            subsets: Some(5),
            seed: Some(9),
            fail_fast: true,
            ..args()
        };
        let config = build_config(&args).unwrap();
        assert_eq!(config.replicates, 100);
        assert_eq!((config.lower_tail, config.upper_tail), (5, 95));
        assert_eq!(config.subsets, 5);
        assert_eq!(config.failure_threshold, 4);
        assert_eq!(config.seed, Some(9));
        assert!(config.fail_fast);
    }

    #[test]
    fn test_config_file_then_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = r#"{"failure_threshold": 6, "seed": 1}"#;
        file.write_all(json.as_bytes()).unwrap();
        let args = RunArgs {
            config: Some(file.path().display().to_string()),
            seed: Some(2),
            ..args()
        };
        let config = build_config(&args).unwrap();
        assert_eq!(config.failure_threshold, 6);
        assert_eq!(config.seed, Some(2));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = RunArgs {
            replicates: Some(1),
            ..args()
        };
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let args = RunArgs {
            config: Some(dir.path().join("none.json").display().to_string()),
            ..args()
        };
        assert!(build_config(&args).is_err());
    }

    // -----------------------------------------------------------------------
    // make_source / execute tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_make_source_known_and_unknown() {
        assert_eq!(make_source("ramp", 0).unwrap().name(), "ramp");
        let err = make_source("clock_jitter", 0).err().unwrap();
        assert!(err.contains("uniform"));
    }

    #[test]
    fn test_execute_small_run() {
        let args = RunArgs {
            source: "ramp".into(),
            replicates: Some(50),
            seed: Some(3),
            ..args()
        };
        let execution = execute(&args).unwrap();
        assert_eq!(execution.source, "ramp");
        assert_eq!(execution.report.sample_count, 2_000);
        assert_eq!(execution.report.seed, Some(3));
        assert_eq!(exit_code(execution.report.verdict), 2);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(Verdict::Pass), 0);
        assert_eq!(exit_code(Verdict::Fail), 2);
        assert_eq!(exit_code(Verdict::Inconclusive), 2);
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let path = path.to_str().unwrap();
        write_json(&serde_json::json!({"verdict": "pass"}), path, "Results");
        let raw = std::fs::read_to_string(path).unwrap();
        let back: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(back["verdict"], "pass");
    }
}
