//! Response value extraction
//!
//! Evaluates `resp_values` queries against the raw response body and stores
//! the results as variables. Extraction is best effort: a query that matches
//! nothing stores the empty string.
//!
//! Query paths are dot separated:
//! - `token` / `.token` reads a top-level key
//! - `users.0.name` indexes into arrays
//! - `users.#` is the length of an array
//! - `users.#.name` collects `name` from every element
//! - `a\.b` reads the key `a.b`

use std::collections::BTreeMap;

use serde_json::Value;

use super::vars::VariableStore;

/// The only extraction kind currently understood
pub const JSON_KIND: &str = "json";

/// Run every supported extraction and store the results in `vars`
pub fn extract_values(
    resp_values: &BTreeMap<String, BTreeMap<String, String>>,
    body: &str,
    vars: &mut VariableStore,
) {
    for (kind, queries) in resp_values {
        if kind != JSON_KIND {
            tracing::debug!(kind = %kind, "ignoring unsupported resp_values kind");
            continue;
        }

        let document = serde_json::from_str::<Value>(body).ok();
        if document.is_none() && !queries.is_empty() {
            tracing::debug!("response body is not JSON; queries match nothing");
        }

        for (name, path) in queries {
            let value = document
                .as_ref()
                .map(|doc| query(doc, path))
                .unwrap_or_default();
            tracing::debug!(name = %name, path = %path, value = %value, "extracted");
            vars.set(name.clone(), value);
        }
    }
}

/// Evaluate a query path and render the match as a string
pub fn query(document: &Value, path: &str) -> String {
    let segments = parse_path(path);
    if segments.is_empty() {
        return String::new();
    }
    select(document, &segments)
        .map(|value| render_value(&value))
        .unwrap_or_default()
}

/// Split a query path into segments, honouring `\.` escapes
pub fn parse_path(path: &str) -> Vec<String> {
    let clean = path.trim_start_matches('.');
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = clean.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            '.' => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);

    segments.retain(|s| !s.is_empty());
    segments
}

fn select(value: &Value, segments: &[String]) -> Option<Value> {
    let Some((head, rest)) = segments.split_first() else {
        return Some(value.clone());
    };

    match value {
        Value::Array(items) if head == "#" => {
            if rest.is_empty() {
                Some(Value::from(items.len()))
            } else {
                Some(Value::Array(
                    items.iter().filter_map(|item| select(item, rest)).collect(),
                ))
            }
        }
        Value::Array(items) => {
            let index = head.parse::<usize>().ok()?;
            select(items.get(index)?, rest)
        }
        Value::Object(map) => select(map.get(head.as_str())?, rest),
        _ => None,
    }
}

/// String form of a matched value: strings raw, null empty, containers as JSON
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
