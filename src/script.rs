//! Stage scripting hooks
//!
//! `before` and `after` scripts are JavaScript, evaluated with Boa. Each run
//! sees two globals:
//! - `script`: the stage definition as a plain object (changes are discarded)
//! - `environment`: the variable store
//!
//! After the script finishes, the store is rebuilt from the own properties of
//! `environment`, so scripts can add, overwrite and delete variables. Values
//! are converted with JavaScript `ToString`.
//!
//! One engine is created per CLI invocation and passed explicitly to every
//! run; other globals a script defines persist into later invocations.

use std::collections::BTreeMap;

use boa_engine::object::builtins::JsArray;
use boa_engine::object::JsObject;
use boa_engine::property::PropertyKey;
use boa_engine::{js_string, Context, JsResult, JsString, JsValue, Source};
use serde_json::Value;

use crate::common::{Error, Result};
use crate::testing::{Stage, VariableStore};

const STAGE_BINDING: &str = "script";
const ENV_BINDING: &str = "environment";

/// Which side of a stage a script runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Before,
    After,
}

impl Hook {
    pub fn as_str(self) -> &'static str {
        match self {
            Hook::Before => "before",
            Hook::After => "after",
        }
    }
}

/// Embedded JavaScript interpreter for stage hooks
pub struct ScriptEngine {
    context: Context,
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptEngine {
    pub fn new() -> Self {
        Self {
            context: Context::default(),
        }
    }

    /// Run a hook script against a stage and the variable store
    ///
    /// Any script failure is returned as `Error::Script`, which halts the run.
    pub fn run(
        &mut self,
        hook: Hook,
        source: &str,
        stage: &Stage,
        vars: &mut VariableStore,
    ) -> Result<()> {
        let fail = |message: String| Error::script(hook.as_str(), &stage.name, message);

        tracing::debug!(hook = hook.as_str(), stage = %stage.name, "running script");

        let stage_json = serde_json::to_value(stage).map_err(|e| fail(e.to_string()))?;
        self.bind(&stage_json, vars).map_err(|e| fail(e.to_string()))?;

        self.context
            .eval(Source::from_bytes(source.as_bytes()))
            .map_err(|e| fail(e.to_string()))?;

        let updated = self.read_environment().map_err(fail)?;
        vars.replace_all(updated);
        Ok(())
    }

    /// Install the `script` and `environment` globals, replacing old ones
    fn bind(&mut self, stage: &Value, vars: &VariableStore) -> JsResult<()> {
        let js_stage = json_to_js(&mut self.context, stage)?;

        let js_env = JsObject::with_object_proto(self.context.intrinsics());
        for (name, value) in vars.iter() {
            js_env.set(
                js_string!(name),
                JsValue::from(JsString::from(value)),
                false,
                &mut self.context,
            )?;
        }

        let global = self.context.global_object();
        global.set(js_string!(STAGE_BINDING), js_stage, false, &mut self.context)?;
        global.set(
            js_string!(ENV_BINDING),
            JsValue::from(js_env),
            false,
            &mut self.context,
        )?;
        Ok(())
    }

    /// Read `environment` back into a plain string map
    fn read_environment(&mut self) -> std::result::Result<BTreeMap<String, String>, String> {
        let global = self.context.global_object();
        let env = global
            .get(js_string!(ENV_BINDING), &mut self.context)
            .map_err(|e| e.to_string())?;
        let Some(object) = env.as_object() else {
            return Err(format!("'{}' must remain an object", ENV_BINDING));
        };

        let keys = object
            .own_property_keys(&mut self.context)
            .map_err(|e| e.to_string())?;

        let mut values = BTreeMap::new();
        for key in keys {
            if matches!(key, PropertyKey::Symbol(_)) {
                continue;
            }
            let name = js_to_string(&JsValue::from(key.clone()), &mut self.context)?;
            let value = object
                .get(key, &mut self.context)
                .map_err(|e| e.to_string())?;
            let value = js_to_string(&value, &mut self.context)?;
            values.insert(name, value);
        }
        Ok(values)
    }
}

fn js_to_string(value: &JsValue, context: &mut Context) -> std::result::Result<String, String> {
    value
        .to_string(context)
        .map_err(|e| e.to_string())?
        .to_std_string()
        .map_err(|e| e.to_string())
}

fn json_to_js(context: &mut Context, value: &Value) -> JsResult<JsValue> {
    match value {
        Value::Null => Ok(JsValue::null()),
        Value::Bool(b) => Ok(JsValue::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(JsValue::from(i))
            } else if let Some(f) = n.as_f64() {
                Ok(JsValue::from(f))
            } else {
                Ok(JsValue::from(0))
            }
        }
        Value::String(s) => Ok(JsValue::from(JsString::from(s.as_str()))),
        Value::Array(items) => {
            let array = JsArray::new(context);
            for (index, item) in items.iter().enumerate() {
                let js_item = json_to_js(context, item)?;
                array.set(index, js_item, false, context)?;
            }
            Ok(JsValue::from(array))
        }
        Value::Object(map) => {
            let object = JsObject::with_object_proto(context.intrinsics());
            for (key, item) in map {
                let js_item = json_to_js(context, item)?;
                object.set(js_string!(key.as_str()), js_item, false, context)?;
            }
            Ok(JsValue::from(object))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(name: &str) -> Stage {
        serde_yaml::from_str(&format!(
            "name: {}\nrequest:\n  url: http://localhost\n  headers:\n    Accept: text/plain\n",
            name
        ))
        .unwrap()
    }

    #[test]
    fn test_script_mutates_variables() {
        let mut engine = ScriptEngine::new();
        let mut vars: VariableStore = [("id", "41"), ("drop", "me")].into_iter().collect();

        engine
            .run(
                Hook::Before,
                "environment.id = String(Number(environment.id) + 1); \
                 environment.count = 3; \
                 delete environment.drop;",
                &stage("login"),
                &mut vars,
            )
            .unwrap();

        assert_eq!(vars.get("id"), Some("42"));
        assert_eq!(vars.get("count"), Some("3"));
        assert!(!vars.contains("drop"));
    }

    #[test]
    fn test_script_reads_stage_definition() {
        let mut engine = ScriptEngine::new();
        let mut vars = VariableStore::new();

        engine
            .run(
                Hook::After,
                "environment.stage = script.name + ' ' + script.request.headers.Accept;",
                &stage("fetch"),
                &mut vars,
            )
            .unwrap();

        assert_eq!(vars.get("stage"), Some("fetch text/plain"));
    }

    #[test]
    fn test_script_error_is_halt() {
        let mut engine = ScriptEngine::new();
        let mut vars: VariableStore = [("keep", "1")].into_iter().collect();

        let err = engine
            .run(Hook::Before, "throw new Error('nope');", &stage("broken"), &mut vars)
            .unwrap_err();

        assert!(err.is_halt());
        assert!(err.to_string().contains("before hook of stage 'broken'"));
        assert_eq!(vars.get("keep"), Some("1"));
    }

    #[test]
    fn test_syntax_error_is_halt() {
        let mut engine = ScriptEngine::new();
        let err = engine
            .run(Hook::After, "environment.x = ;", &stage("s"), &mut VariableStore::new())
            .unwrap_err();
        assert!(matches!(err, Error::Script { .. }));
    }

    #[test]
    fn test_environment_must_stay_an_object() {
        let mut engine = ScriptEngine::new();
        let err = engine
            .run(Hook::After, "environment = 5;", &stage("s"), &mut VariableStore::new())
            .unwrap_err();
        assert!(err.to_string().contains("must remain an object"));
    }

    #[test]
    fn test_globals_persist_between_runs() {
        let mut engine = ScriptEngine::new();
        let mut vars = VariableStore::new();

        engine
            .run(Hook::Before, "var counter = 1;", &stage("one"), &mut vars)
            .unwrap();
        engine
            .run(
                Hook::Before,
                "counter += 1; environment.counter = counter;",
                &stage("two"),
                &mut vars,
            )
            .unwrap();

        assert_eq!(vars.get("counter"), Some("2"));
    }

    #[test]
    fn test_environment_is_rebound_each_run() {
        let mut engine = ScriptEngine::new();

        let mut first: VariableStore = [("a", "1")].into_iter().collect();
        engine
            .run(Hook::Before, "environment.b = '2';", &stage("one"), &mut first)
            .unwrap();

        let mut second: VariableStore = [("z", "26")].into_iter().collect();
        engine
            .run(Hook::Before, "", &stage("two"), &mut second)
            .unwrap();

        assert_eq!(second.iter().collect::<Vec<_>>(), vec![("z", "26")]);
    }
}
