//! Test runner implementation
//!
//! Executes the stages of a test definition strictly in order, threading one
//! variable store through all of them. Each stage runs:
//!
//! before-script, hydrate, build request, dispatch, extract values,
//! evaluate expectations, run actions, after-script.
//!
//! Transport failures and non-fatal expectation failures are collected in the
//! run report. Fatal expectation failures and script errors are returned as
//! `Err` and stop the run at once; the caller decides how to exit.

use std::path::Path;

use colored::Colorize;

use crate::common::{Error, Result};
use crate::http::{self, PreparedRequest, Transport};
use crate::script::{Hook, ScriptEngine};

use super::actions::render_actions;
use super::definition::{Stage, TestDefinition};
use super::expect;
use super::extract::extract_values;
use super::template::Hydrate;
use super::vars::VariableStore;

/// A non-fatal error recorded against a stage
#[derive(Debug)]
pub struct StageError {
    /// 1-based stage number
    pub stage: usize,
    pub stage_name: String,
    pub error: Error,
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Step {} -- {}: {}", self.stage, self.stage_name, self.error)
    }
}

/// Result of a completed test run
#[derive(Debug)]
pub struct RunReport {
    pub name: String,
    pub stages_run: usize,
    pub stages_total: usize,
    pub errors: Vec<StageError>,
    /// Variable store as left by the last stage
    pub vars: VariableStore,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs test definitions against a transport
pub struct Runner<'a> {
    transport: &'a dyn Transport,
    scripts: &'a mut ScriptEngine,
    verbose: bool,
}

impl<'a> Runner<'a> {
    pub fn new(transport: &'a dyn Transport, scripts: &'a mut ScriptEngine) -> Self {
        Self {
            transport,
            scripts,
            verbose: false,
        }
    }

    /// Print each dispatched request line
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Load and run a test definition file
    pub async fn run_file(&mut self, path: &Path) -> Result<RunReport> {
        let definition = TestDefinition::load(path)?;
        self.run(definition).await
    }

    /// Run every stage of a loaded definition
    pub async fn run(&mut self, definition: TestDefinition) -> Result<RunReport> {
        println!(
            "\n{} {}",
            "Running Test:".blue().bold(),
            definition.name.white().bold()
        );
        if !definition.description.is_empty() {
            println!("  {}", definition.description.dimmed());
        }
        tracing::info!(test = %definition.name, stages = definition.stages.len(), "starting test");

        let mut report = RunReport {
            name: definition.name,
            stages_run: 0,
            stages_total: definition.stages.len(),
            errors: Vec::new(),
            vars: VariableStore::from(definition.vars),
        };

        for (i, stage) in definition.stages.iter().enumerate() {
            let stage_num = i + 1;
            println!("\n-----\n{} {} -- {}", "Step".cyan(), stage_num, stage.name);

            let errors = self.run_stage(stage, &mut report.vars).await?;
            report.stages_run = stage_num;
            report
                .errors
                .extend(errors.into_iter().map(|error| StageError {
                    stage: stage_num,
                    stage_name: stage.name.clone(),
                    error,
                }));
        }

        Ok(report)
    }

    /// Execute a single stage
    ///
    /// Returns the stage's recorded errors; `Err` means the run must halt.
    pub async fn run_stage(
        &mut self,
        stage: &Stage,
        vars: &mut VariableStore,
    ) -> Result<Vec<Error>> {
        if let Some(source) = &stage.before {
            self.scripts.run(Hook::Before, source, stage, vars)?;
        }

        let hydrated = stage.hydrate(vars);
        let request = PreparedRequest::build(&hydrated.request);
        tracing::debug!(method = %request.method, url = %request.url, "dispatching");
        if self.verbose {
            println!("  {} {}", request.method.dimmed(), request.url.dimmed());
        }

        let outcome = http::dispatch(self.transport, &request).await;
        let mut errors = Vec::new();
        if let Some(error) = outcome.error {
            println!("  {} {}", "✗".red(), error);
            errors.push(error);
        }

        extract_values(&hydrated.response.resp_values, &outcome.body, vars);

        let failures = expect::evaluate(&hydrated.response, outcome.status, vars)?;
        if failures.is_empty() {
            println!(
                "  {} PASS - Expectations all within normal parameters.",
                "✓".green()
            );
        } else {
            for failure in &failures {
                println!("  {} FAIL - {}", "✗".red(), failure);
            }
        }
        errors.extend(failures);

        for line in render_actions(&hydrated.response.actions, vars, &outcome.body) {
            println!("{}", line);
        }

        if let Some(source) = &stage.after {
            self.scripts.run(Hook::After, source, stage, vars)?;
        }

        Ok(errors)
    }
}

/// Print the trailing summary of a run
pub fn print_summary(report: &RunReport) {
    println!("\n-----\n");
    if report.passed() {
        println!(
            "{} No errors were detected during this test run.",
            "✓".green().bold()
        );
    } else {
        println!(
            "{} {} error(s) in '{}':",
            "✗".red().bold(),
            report.errors.len(),
            report.name
        );
        for error in &report.errors {
            println!("  {}", error);
        }
    }
}
