//! CLI command handling
//!
//! Resolves configuration and test files, then runs each test in turn with a
//! shared transport and script engine.

mod discover;

use std::path::PathBuf;

use crate::common::config::Config;
use crate::common::Result;
use crate::http::HttpTransport;
use crate::script::ScriptEngine;
use crate::testing::{print_summary, Runner, TestDefinition};

pub use discover::collect_test_files;

/// Options for a batch run
#[derive(Debug, Default)]
pub struct RunOptions {
    /// Test files, or directories of `*.yaml` test files
    pub paths: Vec<PathBuf>,
    /// Print each dispatched request
    pub verbose: bool,
    /// Explicit configuration file
    pub config: Option<PathBuf>,
}

/// Run every test named by the options
///
/// Each file gets its own variable store. A halt or configuration error in
/// any file stops the batch and is returned to the caller.
pub async fn run(options: RunOptions) -> Result<()> {
    let config = match &options.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if !config.output.color {
        colored::control::set_override(false);
    }

    let files = collect_test_files(&options.paths)?;
    tracing::debug!(count = files.len(), "collected test files");

    let transport = HttpTransport::new(&config.http)?;
    let mut scripts = ScriptEngine::new();
    let mut runner = Runner::new(&transport, &mut scripts).verbose(options.verbose);

    for file in &files {
        let mut definition = TestDefinition::load(file)?;
        definition.apply_default_vars(&config.vars);

        let report = runner.run(definition).await?;
        print_summary(&report);
    }

    Ok(())
}
