//! Common utilities shared by the CLI and the test engine

pub mod config;
pub(crate) mod de;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};
