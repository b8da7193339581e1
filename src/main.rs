//! imperius - declarative HTTP API test runner
//!
//! Runs YAML test definitions whose stages send requests, extract response
//! values into variables and check expectations against them.

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use imperius::cli::{self, RunOptions};
use imperius::common::logging;

#[derive(Parser)]
#[command(name = "imperius", about = "Declarative HTTP API test runner")]
#[command(version, long_about = None)]
struct Cli {
    /// Test definition files, or directories of *.yaml test files
    paths: Vec<PathBuf>,

    /// Print the version and exit
    #[arg(short = 'v')]
    show_version: bool,

    /// Log debug details and print each dispatched request
    #[arg(long)]
    verbose: bool,

    /// Configuration file (default: the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.show_version {
        println!("version {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if cli.paths.is_empty() {
        println!("No test file given -- imperius [test_file_or_directory]...");
        return;
    }

    logging::init_cli(cli.verbose);

    let result = cli::run(RunOptions {
        paths: cli.paths,
        verbose: cli.verbose,
        config: cli.config,
    })
    .await;

    if let Err(e) = result {
        if e.is_halt() {
            println!("{} {}\n-----", "FATAL:".red().bold(), e);
        } else {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}
