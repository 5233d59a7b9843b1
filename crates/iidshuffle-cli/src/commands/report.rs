use iidshuffle_core::{KindReport, SubsetOutcome};

use super::{Execution, RunArgs};

pub fn run(args: &RunArgs) -> i32 {
    let execution = match super::execute(args) {
        Ok(execution) => execution,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };

    let report = generate_report(&execution);
    match &args.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &report) {
                eprintln!("Failed to write report to {path}: {e}");
                return 1;
            }
            println!("\nReport saved to: {path}");
            println!("Overall: {}", execution.report.verdict);
        }
        None => print!("{report}"),
    }

    super::exit_code(execution.report.verdict)
}

fn generate_report(execution: &Execution) -> String {
    let report = &execution.report;
    let config = &report.config;
    let mut out = String::new();
    out.push_str("# iidshuffle: Permutation Test Report\n\n");
    out.push_str(&format!("Generated: {}\n\n", unix_now()));
    out.push_str(&format!("- Run id: `{}`\n", execution.run_id));
    out.push_str(&format!("- Source: `{}`\n", execution.source));
    out.push_str(&format!(
        "- Samples: {} ({})\n- Subsets: {} of {}\n- Replicates: {}\n",
        report.sample_count,
        report.representation,
        config.subsets,
        report.subset_length,
        config.replicates,
    ));
    out.push_str(&format!(
        "- Tails: rank <= {} or >= {}\n- Failure threshold: {} subsets\n",
        config.lower_tail,
        config.upper_tail,
        config.failure_threshold,
    ));
    if let Some(seed) = report.seed {
        out.push_str(&format!("- Seed: {seed}\n"));
    }
    if let Some(summary) = &report.summary {
        out.push_str(&format!(
            "- Mean: {:.4} (95% CI {:.4} to {:.4}), variance {:.4}\n",
            summary.mean,
            summary.confidence_interval.0,
            summary.confidence_interval.1,
            summary.variance
        ));
    }
    out.push_str(&format!("\n**Overall verdict: {}**\n\n", report.verdict));

    out.push_str("| Score | Verdict | Failed | Excluded |\n");
    out.push_str("|-------|---------|--------|----------|\n");
    for kind in &report.kinds {
        out.push_str(&format!(
            "| {} | {} | {}/{} | {} |\n",
            kind.kind.title(),
            kind.verdict,
            kind.failed_subsets,
            kind.subsets.len(),
            kind.excluded_subsets
        ));
    }
    out.push('\n');

    for kind in &report.kinds {
        push_kind_section(&mut out, kind);
    }
    out
}

fn push_kind_section(out: &mut String, kind: &KindReport) {
    out.push_str(&format!("## {} ({})\n\n", kind.kind.title(), kind.verdict));
    out.push_str(&format!("Components: {}\n\n", kind.kind.components().join(", ")));
    out.push_str("| Subset | Observed | Ranks | Result |\n");
    out.push_str("|--------|----------|-------|--------|\n");
    for (index, outcome) in kind.subsets.iter().enumerate() {
        match outcome {
            SubsetOutcome::Ranked {
                observed,
                ranks,
                failed,
            } => {
                let observed: Vec<String> =
                    observed.as_slice().iter().map(|v| v.to_string()).collect();
                let ranks: Vec<String> = ranks.iter().map(|r| r.to_string()).collect();
                let result = if *failed {
                    "\u{2717} extreme"
                } else {
                    "\u{2713}"
                };
                out.push_str(&format!(
                    "| {index} | {} | {} | {result} |\n",
                    observed.join(", "),
                    ranks.join(", ")
                ));
            }
            SubsetOutcome::Excluded { reason } => {
                out.push_str(&format!("| {index} | - | - | excluded: {reason} |\n"));
            }
        }
    }
    out.push_str("\n---\n\n");
}

fn unix_now() -> String {
    let dur = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format!("Unix timestamp: {}", dur.as_secs())
}
