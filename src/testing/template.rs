//! Stage hydration
//!
//! Walks every string of a stage and substitutes `{name}` placeholders with
//! the current variable values. A key may carry a `:`-suffixed formatting hint
//! (`{id:int}`); only the part before the first `:` is looked up and the hint
//! is ignored. Unknown keys render as the empty string.

use std::collections::BTreeMap;

use serde_json::Value;

use super::definition::{Action, Expectation, Request, ResponseSpec, Stage};
use super::vars::VariableStore;

/// Produce a copy of a value with every placeholder resolved
pub trait Hydrate {
    fn hydrate(&self, vars: &VariableStore) -> Self;
}

/// Substitute placeholders in a single string
///
/// Substituted values are not scanned again. A `{` met before the closing
/// brace is kept as literal text, as is an unclosed `{`.
pub fn render(template: &str, vars: &VariableStore) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };

        let inner = &after[..close];
        if let Some(nested) = inner.find('{') {
            out.push_str(&rest[open..=open + nested]);
            rest = &after[nested..];
            continue;
        }

        let key = inner.split(':').next().unwrap_or(inner);
        match vars.get(key) {
            Some(value) => out.push_str(value),
            None => tracing::debug!(key, "unresolved placeholder"),
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

impl Hydrate for String {
    fn hydrate(&self, vars: &VariableStore) -> Self {
        render(self, vars)
    }
}

impl<T: Hydrate> Hydrate for Vec<T> {
    fn hydrate(&self, vars: &VariableStore) -> Self {
        self.iter().map(|item| item.hydrate(vars)).collect()
    }
}

impl<T: Hydrate> Hydrate for BTreeMap<String, T> {
    fn hydrate(&self, vars: &VariableStore) -> Self {
        self.iter()
            .map(|(key, value)| (render(key, vars), value.hydrate(vars)))
            .collect()
    }
}

impl Hydrate for serde_json::Map<String, Value> {
    fn hydrate(&self, vars: &VariableStore) -> Self {
        self.iter()
            .map(|(key, value)| (render(key, vars), value.hydrate(vars)))
            .collect()
    }
}

impl Hydrate for Value {
    fn hydrate(&self, vars: &VariableStore) -> Self {
        match self {
            Value::String(s) => Value::String(render(s, vars)),
            Value::Array(items) => Value::Array(items.hydrate(vars)),
            Value::Object(map) => Value::Object(map.hydrate(vars)),
            other => other.clone(),
        }
    }
}

impl Hydrate for Request {
    fn hydrate(&self, vars: &VariableStore) -> Self {
        Self {
            url: self.url.hydrate(vars),
            url_pattern: self.url_pattern.hydrate(vars),
            method: self.method.hydrate(vars),
            headers: self.headers.hydrate(vars),
            json: self.json.hydrate(vars),
            data: self.data.hydrate(vars),
        }
    }
}

impl Hydrate for Expectation {
    fn hydrate(&self, vars: &VariableStore) -> Self {
        Self {
            kind: self.kind.clone(),
            arguments: self.arguments.hydrate(vars),
            fatal: self.fatal,
        }
    }
}

impl Hydrate for Action {
    fn hydrate(&self, vars: &VariableStore) -> Self {
        Self {
            kind: self.kind.clone(),
            arguments: self.arguments.hydrate(vars),
        }
    }
}

impl Hydrate for ResponseSpec {
    fn hydrate(&self, vars: &VariableStore) -> Self {
        Self {
            status_code: self.status_code,
            resp_values: self.resp_values.hydrate(vars),
            expectations: self.expectations.hydrate(vars),
            actions: self.actions.hydrate(vars),
        }
    }
}

impl Hydrate for Stage {
    /// Scripts and the import alias are carried over untouched
    fn hydrate(&self, vars: &VariableStore) -> Self {
        Self {
            import: self.import.clone(),
            before: self.before.clone(),
            after: self.after.clone(),
            name: self.name.hydrate(vars),
            request: self.request.hydrate(vars),
            response: self.response.hydrate(vars),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars() -> VariableStore {
        [
            ("base", "http://localhost:5000"),
            ("id", "42"),
            ("session", "xyz"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_render_basic() {
        assert_eq!(render("{base}/users/{id}", &vars()), "http://localhost:5000/users/42");
        assert_eq!(render("no placeholders", &vars()), "no placeholders");
        assert_eq!(render("", &vars()), "");
    }

    #[test]
    fn test_render_format_hint_is_ignored() {
        assert_eq!(render("{id:int}", &vars()), "42");
        assert_eq!(render("{id:a:b}", &vars()), "42");
    }

    #[test]
    fn test_render_unknown_key_is_empty() {
        assert_eq!(render("Bearer {token}", &vars()), "Bearer ");
        assert_eq!(render("{}", &vars()), "");
    }

    #[test]
    fn test_render_braces_that_are_not_placeholders() {
        assert_eq!(render("{{id}}", &vars()), "{42}");
        assert_eq!(render("open { only", &vars()), "open { only");
        assert_eq!(render("close } only", &vars()), "close } only");
        assert_eq!(render("a { b {id} c", &vars()), "a { b 42 c");
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let vars: VariableStore = [("a", "{b}"), ("b", "nope")].into_iter().collect();
        assert_eq!(render("{a}", &vars), "{b}");
    }

    #[test]
    fn test_render_multibyte_text() {
        assert_eq!(render("héllo {id} wörld", &vars()), "héllo 42 wörld");
    }

    #[test]
    fn test_hydrate_stage_walks_nested_fields() {
        let stage: Stage = serde_yaml::from_str(
            r#"
name: fetch {id}
before: "environment.x = {a: 1};"
request:
  url: "{base}"
  url_pattern: users/{id}
  method: GET
  headers:
    Authorization: Bearer {session}
    X-{id}: key
  json:
    user: "{id}"
    nested:
      list: ["{session}", 7]
  data:
    session: "{session}"
response:
  resp_values:
    json:
      name_{id}: users.{id}.name
  expectations:
    - type: string_equals
      arguments: ["{session}", token]
  actions:
    - type: print
      arguments: ["{id}"]
"#,
        )
        .unwrap();

        let hydrated = stage.hydrate(&vars());
        assert_eq!(hydrated.name, "fetch 42");
        assert_eq!(hydrated.before.as_deref(), Some("environment.x = {a: 1};"));
        assert_eq!(hydrated.request.url, "http://localhost:5000");
        assert_eq!(hydrated.request.url_pattern, "users/42");
        assert_eq!(hydrated.request.headers["Authorization"], "Bearer xyz");
        assert_eq!(hydrated.request.headers["X-42"], "key");
        assert_eq!(
            serde_json::Value::Object(hydrated.request.json.clone()),
            json!({"user": "42", "nested": {"list": ["xyz", 7]}})
        );
        assert_eq!(hydrated.request.data["session"], "xyz");
        assert_eq!(hydrated.response.resp_values["json"]["name_42"], "users.42.name");
        assert_eq!(hydrated.response.expectations[0].arguments, vec!["xyz", "token"]);
        assert_eq!(hydrated.response.actions[0].arguments, vec!["42"]);
    }

    #[test]
    fn test_hydration_is_idempotent() {
        let stage = Stage {
            name: "{id}".into(),
            request: Request {
                url: "{base}".into(),
                url_pattern: "users/{id}".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let once = stage.hydrate(&vars());
        let twice = once.hydrate(&vars());
        assert_eq!(once, twice);
    }
}
