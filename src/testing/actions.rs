//! Stage actions
//!
//! Actions only observe: they read the variable store and the raw response
//! and produce report lines, never changing control flow.

use super::definition::{Action, ActionKind};
use super::vars::VariableStore;

/// Render the output of every action, in declared order
pub fn render_actions(actions: &[Action], vars: &VariableStore, body: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for action in actions {
        match &action.kind {
            ActionKind::Print => {
                for name in &action.arguments {
                    lines.push(format!("{} = {}", name, vars.value(name)));
                }
            }
            ActionKind::PrintResponse => {
                lines.push("Response:".to_string());
                lines.push(body.to_string());
            }
            ActionKind::Other(kind) => {
                tracing::debug!(kind = %kind, "ignoring unknown action type");
            }
        }
    }
    lines
}
