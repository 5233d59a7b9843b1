//! CLI for iidshuffle: do your entropy samples survive a thousand shuffles?

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "iidshuffle")]
#[command(about = "iidshuffle: permutation testing of entropy samples for IID behaviour")]
#[command(version = iidshuffle_core::VERSION)]
struct Cli {
    /// Log run progress and per-kind verdicts (overrides RUST_LOG's default)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in sample sources
    Sources,

    /// Collect samples, run the permutation test, print a per-kind summary.
    /// Exits 0 on PASS, 2 on FAIL or INCONCLUSIVE, 1 on errors.
    Run {
        #[command(flatten)]
        args: commands::RunArgs,
    },

    /// Same as `run`, rendered as a Markdown report with per-subset ranks
    Report {
        #[command(flatten)]
        args: commands::RunArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "info" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(filter);
    env_logger::Builder::from_env(env).init();

    let code = match cli.command {
        Commands::Sources => {
            commands::sources::run();
            0
        }
        Commands::Run { args } => commands::run::run(&args),
        Commands::Report { args } => commands::report::run(&args),
    };
    std::process::exit(code);
}
