use iidshuffle_core::SubsetOutcome;

use super::{Execution, RunArgs};

pub fn run(args: &RunArgs) -> i32 {
    let execution = match super::execute(args) {
        Ok(execution) => execution,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };

    print_summary(&execution);

    if let Some(path) = &args.output {
        let json = serde_json::json!({
            "run_id": execution.run_id.to_string(),
            "source": execution.source,
            "elapsed_ms": execution.elapsed.as_millis() as u64,
            "report": execution.report,
        });
        super::write_json(&json, path, "Results");
    }

    super::exit_code(execution.report.verdict)
}

fn print_summary(execution: &Execution) {
    let report = &execution.report;
    println!(
        "\nPermutation test on {} {} samples: {} subsets of {}, {} replicates [{:.1}s]",
        report.sample_count,
        report.representation,
        report.config.subsets,
        report.subset_length,
        report.config.replicates,
        execution.elapsed.as_secs_f64()
    );

    println!("\n{}", "=".repeat(64));
    println!(
        "{:<20} {:>14} {:>8} {:>9} {:>9}",
        "Score", "Verdict", "Failed", "Excluded", "Median"
    );
    println!("{}", "-".repeat(64));
    for kind in &report.kinds {
        let median = median_rank(kind.subsets.iter())
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<18} {:>14} {:>5}/{} {:>9} {:>9}",
            kind.kind.title(),
            kind.verdict.to_string(),
            kind.failed_subsets,
            kind.subsets.len(),
            kind.excluded_subsets,
            median
        );
    }
    println!("{}", "=".repeat(64));

    println!("\nOverall: {}", report.verdict);
    if let Some(seed) = report.seed {
        println!("Seed:    {seed}");
    }
    println!("Run id:  {}", execution.run_id);
}

/// Median of every rank across the ranked subsets of one score kind.
fn median_rank<'a>(subsets: impl Iterator<Item = &'a SubsetOutcome>) -> Option<usize> {
    let mut ranks: Vec<usize> = subsets
        .filter_map(|s| match s {
            SubsetOutcome::Ranked { ranks, .. } => Some(ranks.iter().copied()),
            SubsetOutcome::Excluded { .. } => None,
        })
        .flatten()
        .collect();
    if ranks.is_empty() {
        return None;
    }
    ranks.sort_unstable();
    Some(ranks[ranks.len() / 2])
}
