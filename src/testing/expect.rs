//! Expectation evaluation
//!
//! Expectations are checked in declared order against the status code and
//! the variable store. A failing expectation marked `fatal` (or a mismatch of
//! the response-level `status_code`) is returned as `Err` and halts the run;
//! every other failure is collected and returned to the caller.

use crate::common::{Error, Result};

use super::definition::{Expectation, ExpectationKind, ResponseSpec};
use super::vars::VariableStore;

/// Evaluate a response spec against the outcome of a request
///
/// Returns the non-fatal failures, or the first fatal one as `Err`.
pub fn evaluate(response: &ResponseSpec, status: u16, vars: &VariableStore) -> Result<Vec<Error>> {
    if let Some(expected) = response.status_code {
        if expected != status {
            return Err(Error::FatalExpectation(status_mismatch(expected, status)));
        }
    }

    let mut failures = Vec::new();
    for expectation in &response.expectations {
        let Some(message) = check(expectation, status, vars)? else {
            continue;
        };

        if expectation.fatal {
            return Err(Error::FatalExpectation(message));
        }
        tracing::debug!(kind = expectation.kind.as_str(), %message, "expectation failed");
        failures.push(Error::Expectation(message));
    }

    Ok(failures)
}

/// Check one expectation, returning a failure message on mismatch
///
/// Unknown kinds always pass.
fn check(expectation: &Expectation, status: u16, vars: &VariableStore) -> Result<Option<String>> {
    match &expectation.kind {
        ExpectationKind::Status => {
            let raw = argument(expectation, 0)?;
            let expected: u16 = raw.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "status expectation argument '{}' is not a status code",
                    raw
                ))
            })?;
            Ok((expected != status).then(|| status_mismatch(expected, status)))
        }
        ExpectationKind::StringEquals => {
            let expected = argument(expectation, 0)?;
            let name = argument(expectation, 1)?;
            let actual = vars.value(name);
            Ok((actual != expected).then(|| {
                format!(
                    "expected '{}' to equal \"{}\" but it was \"{}\"",
                    name, expected, actual
                )
            }))
        }
        ExpectationKind::StringContains => {
            let expected = argument(expectation, 0)?;
            let name = argument(expectation, 1)?;
            let actual = vars.value(name);
            Ok((!actual.contains(expected)).then(|| {
                format!(
                    "expected '{}' to contain \"{}\" but it was \"{}\"",
                    name, expected, actual
                )
            }))
        }
        ExpectationKind::Other(kind) => {
            tracing::debug!(kind = %kind, "ignoring unknown expectation type");
            Ok(None)
        }
    }
}

fn argument(expectation: &Expectation, index: usize) -> Result<&str> {
    expectation
        .arguments
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| {
            Error::Config(format!(
                "'{}' expectation is missing argument {}",
                expectation.kind.as_str(),
                index
            ))
        })
}

fn status_mismatch(expected: u16, actual: u16) -> String {
    format!(
        "status code expected {} was not what was returned {}",
        expected, actual
    )
}
