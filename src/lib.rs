//! imperius - declarative HTTP API test runner
//!
//! This library runs stage-based HTTP API tests described in YAML: each stage
//! sends a request, extracts values from the response into a shared variable
//! store, and checks expectations against it.

pub mod cli;
pub mod common;
pub mod http;
pub mod script;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use http::{PreparedRequest, RawResponse, Transport};
pub use script::ScriptEngine;
pub use testing::{RunReport, Runner, Stage, TestDefinition, VariableStore};
