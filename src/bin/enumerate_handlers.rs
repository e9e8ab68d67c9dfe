use std::process::ExitCode;

use clap::Parser;
use lambda_meta::enumerate::{init_thread_pool, scan};
use lambda_meta::Config;

/// Print serverless function definitions for the handler descriptors
/// matching a glob pattern.
#[derive(Debug, Parser)]
#[command(name = "enumerate-handlers")]
struct Cli {
    /// Glob over handler descriptor files, e.g. `handlers/*.json`
    pattern: String,

    /// Prepended to every function name
    #[arg(default_value = "")]
    prefix: String,

    /// Parser threads (defaults to WORKER_COUNT or the CPU count, max 6)
    #[arg(long, env = "WORKER_COUNT")]
    workers: Option<usize>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let workers = cli
        .workers
        .map(|count| count.clamp(1, 6))
        .unwrap_or_else(|| Config::from_env().workers);
    init_thread_pool(workers);

    let functions = match scan(&cli.pattern, &cli.prefix) {
        Ok(functions) => functions,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&functions) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("failed to render handlers: {error}");
            ExitCode::FAILURE
        }
    }
}
