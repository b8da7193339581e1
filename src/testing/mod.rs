//! Stage execution engine
//!
//! Reads YAML test definitions and runs their stages in order: hydrate the
//! stage from the variable store, send its request, extract response values,
//! check expectations and perform actions.

mod actions;
mod definition;
mod expect;
mod extract;
mod runner;
mod template;
mod vars;

pub use actions::render_actions;
pub use definition::*;
pub use expect::evaluate;
pub use extract::{extract_values, query, JSON_KIND};
pub use runner::{print_summary, RunReport, Runner, StageError};
pub use template::{render, Hydrate};
pub use vars::VariableStore;
