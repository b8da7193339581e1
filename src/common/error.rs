//! Error types for the test runner
//!
//! Most variants abort the run: they describe a broken test definition or a
//! broken script. `Transport` and `Expectation` are the exception, they are
//! collected per stage and reported in the run summary.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the test runner
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Import '{alias}' is not declared in the test's imports")]
    UnknownImport { alias: String },

    // === Request Errors ===
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Transport error: {0}")]
    Transport(String),

    // === Assertion Errors ===
    #[error("{0}")]
    Expectation(String),

    #[error("{0}")]
    FatalExpectation(String),

    // === Scripting Errors ===
    #[error("Script error in {hook} hook of stage '{stage}': {message}")]
    Script {
        hook: String,
        stage: String,
        message: String,
    },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a file read error for the given path
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create a script error raised by a stage hook
    pub fn script(hook: &str, stage: &str, message: impl std::fmt::Display) -> Self {
        Self::Script {
            hook: hook.to_string(),
            stage: stage.to_string(),
            message: message.to_string(),
        }
    }

    /// Whether this error terminates the whole run rather than being recorded
    ///
    /// Configuration errors also stop the run, but they are reported as
    /// plain errors rather than as a halt diagnostic.
    pub fn is_halt(&self) -> bool {
        matches!(self, Error::FatalExpectation(_) | Error::Script { .. })
    }
}
