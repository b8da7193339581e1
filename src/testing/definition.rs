//! Test definition types
//!
//! Defines the data structures for deserializing YAML test definitions and
//! the loader that resolves stage imports and imported default variables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::common::de;
use crate::common::paths::resolve_relative;
use crate::common::{Error, Result};

/// Reserved `vars` entry naming a file of default variables
pub const IMPORT_VARS_KEY: &str = "Import";

/// A complete test definition loaded from a YAML file
#[derive(Deserialize, Debug, Default)]
pub struct TestDefinition {
    /// Name of the test
    #[serde(rename = "test_name", default)]
    pub name: String,
    /// Optional description of what the test verifies
    #[serde(default)]
    pub description: String,
    /// Initial variables
    #[serde(default, deserialize_with = "de::string_map")]
    pub vars: BTreeMap<String, String>,
    /// Stages, executed in order
    #[serde(default)]
    pub stages: Vec<Stage>,
    /// Import alias to stage file path
    #[serde(default, deserialize_with = "de::string_map")]
    pub imports: BTreeMap<String, String>,
}

/// One declarative unit of work: a request plus its response handling
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Stage {
    /// Alias into the test's `imports`; the whole stage is replaced when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<String>,
    /// Script run before the stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    /// Script run after the stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub request: Request,
    #[serde(default)]
    pub response: ResponseSpec,
}

impl Stage {
    /// Load a single-stage partial from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        serde_yaml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse stage import '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// The import alias, if one is set and non-empty
    pub fn import_alias(&self) -> Option<&str> {
        self.import.as_deref().filter(|alias| !alias.is_empty())
    }
}

/// The request half of a stage
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Request {
    /// Base URL
    #[serde(default)]
    pub url: String,
    /// Path appended to the base URL with a `/` separator
    #[serde(default)]
    pub url_pattern: String,
    /// HTTP method (empty means GET)
    #[serde(default)]
    pub method: String,
    #[serde(default, deserialize_with = "de::string_map")]
    pub headers: BTreeMap<String, String>,
    /// JSON body; takes precedence over `data` when non-empty
    #[serde(default, deserialize_with = "de::json_object")]
    pub json: serde_json::Map<String, serde_json::Value>,
    /// Form-encoded body
    #[serde(default, deserialize_with = "de::string_map")]
    pub data: BTreeMap<String, String>,
}

/// The response half of a stage
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ResponseSpec {
    /// Expected status code; any mismatch halts the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Extraction kind (only `json`) to variable name to query path
    #[serde(default)]
    pub resp_values: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub expectations: Vec<Expectation>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

/// A declarative assertion evaluated after the request completes
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Expectation {
    #[serde(rename = "type")]
    pub kind: ExpectationKind,
    #[serde(default, deserialize_with = "de::string_list")]
    pub arguments: Vec<String>,
    /// Halt the whole run on mismatch instead of recording an error
    #[serde(default)]
    pub fatal: bool,
}

/// Expectation kinds; unrecognised kinds are carried through and ignored
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum ExpectationKind {
    /// `status <code>`
    Status,
    /// `string_equals <expected> <variable>`
    StringEquals,
    /// `string_contains <substring> <variable>`
    StringContains,
    Other(String),
}

impl ExpectationKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Status => "status",
            Self::StringEquals => "string_equals",
            Self::StringContains => "string_contains",
            Self::Other(kind) => kind,
        }
    }

    /// Number of positional arguments the kind requires
    pub fn arity(&self) -> usize {
        match self {
            Self::Status => 1,
            Self::StringEquals | Self::StringContains => 2,
            Self::Other(_) => 0,
        }
    }
}

impl From<String> for ExpectationKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "status" => Self::Status,
            "string_equals" => Self::StringEquals,
            "string_contains" => Self::StringContains,
            _ => Self::Other(kind),
        }
    }
}

impl From<ExpectationKind> for String {
    fn from(kind: ExpectationKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A declarative side effect run after expectations
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(default, deserialize_with = "de::string_list")]
    pub arguments: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    /// Print `name = value` for each named variable
    Print,
    /// Print the raw response body
    PrintResponse,
    Other(String),
}

impl ActionKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Print => "print",
            Self::PrintResponse => "print_response",
            Self::Other(kind) => kind,
        }
    }
}

impl From<String> for ActionKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "print" => Self::Print,
            "print_response" => Self::PrintResponse,
            _ => Self::Other(kind),
        }
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl TestDefinition {
    /// Load a test definition from a YAML file
    ///
    /// Imported default variables and stage imports are resolved relative to
    /// the file, so the returned definition is ready to run.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read test definition '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut definition = Self::parse(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse test definition '{}': {}",
                path.display(),
                e
            ))
        })?;

        definition.import_vars(path)?;
        definition.resolve_imports(path)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Parse a definition without resolving anything on disk
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Merge variables from the file named by the reserved `Import` entry
    ///
    /// Existing variables win; the reserved entry itself is removed.
    pub fn import_vars(&mut self, base: &Path) -> Result<()> {
        let Some(import) = self.vars.remove(IMPORT_VARS_KEY) else {
            return Ok(());
        };

        let path = resolve_relative(base, &import);
        let content = std::fs::read_to_string(&path).map_err(|e| Error::file_read(&path, e))?;
        let imported: de::StringMap = serde_yaml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse imported variables '{}': {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(path = %path.display(), count = imported.0.len(), "imported variables");
        self.apply_default_vars(&imported.0);
        Ok(())
    }

    /// Add default variables without overwriting existing ones
    pub fn apply_default_vars(&mut self, defaults: &BTreeMap<String, String>) {
        for (key, value) in defaults {
            self.vars
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// Replace every stage naming an import alias by the imported stage
    pub fn resolve_imports(&mut self, base: &Path) -> Result<()> {
        for stage in &mut self.stages {
            let Some(alias) = stage.import_alias() else {
                continue;
            };

            let target = self
                .imports
                .get(alias)
                .ok_or_else(|| Error::UnknownImport {
                    alias: alias.to_string(),
                })?;
            let path = resolve_relative(base, target);
            let imported = Stage::load(&path)?;

            if imported.import_alias().is_some() {
                return Err(Error::Config(format!(
                    "Stage import '{}' cannot itself import another stage",
                    path.display()
                )));
            }

            tracing::debug!(alias, path = %path.display(), "resolved stage import");
            *stage = imported;
        }
        Ok(())
    }

    /// Check that every expectation carries the arguments its kind needs
    pub fn validate(&self) -> Result<()> {
        for (index, stage) in self.stages.iter().enumerate() {
            if stage.import_alias().is_some() {
                return Err(Error::Config(format!(
                    "Stage {} still references an unresolved import",
                    index + 1
                )));
            }
            for expectation in &stage.response.expectations {
                let needed = expectation.kind.arity();
                if expectation.arguments.len() < needed {
                    return Err(Error::Config(format!(
                        "Stage {} ('{}'): '{}' expectation needs {} argument(s), found {}",
                        index + 1,
                        stage.name,
                        expectation.kind.as_str(),
                        needed,
                        expectation.arguments.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const LOGIN_TEST: &str = r#"
test_name: Login flow
description: Logs in and reads numbers
vars:
  base: http://localhost:5000
  retries: 3
stages:
  - name: login
    request:
      url: "{base}"
      url_pattern: login
      method: POST
      data:
        username: jon
        password: "shhh!"
    response:
      resp_values:
        json:
          token: token
      expectations:
        - type: status
          arguments: [200]
          fatal: true
        - type: string_contains
          arguments: ["ey", token]
      actions:
        - type: print
          arguments: [token]
        - type: shout
"#;

    #[test]
    fn test_parse_definition() {
        let def = TestDefinition::parse(LOGIN_TEST).unwrap();
        assert_eq!(def.name, "Login flow");
        assert_eq!(def.vars["retries"], "3");
        assert_eq!(def.stages.len(), 1);

        let stage = &def.stages[0];
        assert_eq!(stage.request.data["password"], "shhh!");
        assert_eq!(stage.response.resp_values["json"]["token"], "token");

        let status = &stage.response.expectations[0];
        assert_eq!(status.kind, ExpectationKind::Status);
        assert_eq!(status.arguments, vec!["200"]);
        assert!(status.fatal);

        assert!(!stage.response.expectations[1].fatal);
        assert_eq!(
            stage.response.actions[1].kind,
            ActionKind::Other("shout".to_string())
        );
    }

    #[test]
    fn test_kind_serializes_back_to_its_name() {
        let action: Action = serde_yaml::from_str("type: print_response").unwrap();
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "print_response");

        let unknown: Expectation = serde_yaml::from_str("type: json_schema").unwrap();
        let json = serde_json::to_value(&unknown).unwrap();
        assert_eq!(json["type"], "json_schema");
    }

    #[test]
    fn test_json_body_must_be_mapping() {
        let err = serde_yaml::from_str::<Request>("json: [1, 2]").unwrap_err();
        assert!(err.to_string().contains("mapping"));

        let req: Request = serde_yaml::from_str("json:").unwrap();
        assert!(req.json.is_empty());
    }

    #[test]
    fn test_validate_rejects_missing_arguments() {
        let def = TestDefinition::parse(
            r#"
stages:
  - name: check
    response:
      expectations:
        - type: string_equals
          arguments: [ok]
"#,
        )
        .unwrap();
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("needs 2 argument(s), found 1"));
    }

    #[test]
    fn test_unknown_expectation_kind_needs_no_arguments() {
        let def = TestDefinition::parse(
            r#"
stages:
  - response:
      expectations:
        - type: header_present
"#,
        )
        .unwrap();
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_load_resolves_imports_and_vars() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("partials")).unwrap();
        fs::write(
            dir.path().join("partials/login.yaml"),
            "name: imported login\nrequest:\n  url: \"{base}\"\n  url_pattern: login\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("defaults.yaml"),
            "base: http://imported\nuser: jon\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("test.yaml"),
            r#"
test_name: imports
vars:
  Import: defaults.yaml
  base: http://local
imports:
  login: partials/login.yaml
stages:
  - import: login
    name: this name is discarded
    request:
      method: DELETE
  - name: inline
"#,
        )
        .unwrap();

        let def = TestDefinition::load(&dir.path().join("test.yaml")).unwrap();
        assert_eq!(def.vars["base"], "http://local");
        assert_eq!(def.vars["user"], "jon");
        assert!(!def.vars.contains_key(IMPORT_VARS_KEY));

        let imported = &def.stages[0];
        assert_eq!(imported.name, "imported login");
        assert_eq!(imported.request.method, "");
        assert_eq!(imported.import, None);
        assert_eq!(def.stages[1].name, "inline");
    }

    #[test]
    fn test_unknown_import_alias() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.yaml");
        fs::write(&path, "stages:\n  - import: missing\n").unwrap();

        let err = TestDefinition::load(&path).unwrap_err();
        assert!(matches!(err, Error::UnknownImport { alias } if alias == "missing"));
    }

    #[test]
    fn test_missing_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.yaml");
        fs::write(
            &path,
            "imports:\n  login: nope.yaml\nstages:\n  - import: login\n",
        )
        .unwrap();

        let err = TestDefinition::load(&path).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }

    #[test]
    fn test_malformed_yaml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "stages: [\n").unwrap();

        let err = TestDefinition::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("broken.yaml")));
    }

    #[test]
    fn test_apply_default_vars_keeps_existing() {
        let mut def = TestDefinition::parse("vars:\n  a: mine\n").unwrap();
        let defaults = BTreeMap::from([
            ("a".to_string(), "default".to_string()),
            ("b".to_string(), "default".to_string()),
        ]);
        def.apply_default_vars(&defaults);
        assert_eq!(def.vars["a"], "mine");
        assert_eq!(def.vars["b"], "default");
    }
}
