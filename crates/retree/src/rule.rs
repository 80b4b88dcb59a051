//! Rule model and input parsing.
//!
//! Rules arrive as loosely-typed JSON. A rule list is checked for shape when
//! the engine is built; each rule is checked for an `action` when it is
//! applied; parameters are interpreted by the action's handler, which turns
//! anything it cannot use into a warning.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EngineError;

/// A rule list as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleInput {
    /// JSON text, parsed when the engine is built.
    Text(String),
    /// An already-parsed JSON value.
    Value(Value),
}

impl From<&str> for RuleInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for RuleInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Value> for RuleInput {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Vec<Value>> for RuleInput {
    fn from(rules: Vec<Value>) -> Self {
        Self::Value(Value::Array(rules))
    }
}

impl RuleInput {
    /// Parses the input into an ordered list of rule values.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Syntax`] for malformed JSON text and
    /// [`EngineError::Validation`] when the document is not a list.
    pub fn into_rules(self) -> Result<Vec<Value>, EngineError> {
        let value = match self {
            Self::Text(text) => serde_json::from_str(&text).map_err(EngineError::Syntax)?,
            Self::Value(value) => value,
        };
        match value {
            Value::Array(rules) => Ok(rules),
            other => Err(EngineError::validation(format!(
                "rules must be a list, found {}",
                json_kind(&other)
            ))),
        }
    }
}

/// A rule with a validated action name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    /// Name of the action that handles this rule.
    pub action: String,
    /// Remaining keys of the rule object.
    #[serde(flatten)]
    pub parameters: Map<String, Value>,
}

impl Rule {
    /// Splits a rule object into its action and parameters.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] when `value` is not an object or
    /// its `action` is missing or not a string.
    pub fn from_value(value: &Value) -> Result<Self, EngineError> {
        let Value::Object(object) = value else {
            return Err(EngineError::validation(format!(
                "rule must be an object, found {}",
                json_kind(value)
            )));
        };
        let Some(Value::String(action)) = object.get("action") else {
            return Err(EngineError::validation("rule action must be a string"));
        };
        let parameters = object
            .iter()
            .filter(|(key, _)| key.as_str() != "action")
            .map(|(key, param)| (key.clone(), param.clone()))
            .collect();
        Ok(Self {
            action: action.clone(),
            parameters,
        })
    }

    /// Looks up a parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Looks up a parameter that must be a string.
    #[must_use]
    pub fn str_parameter(&self, name: &str) -> Option<&str> {
        self.parameter(name).and_then(Value::as_str)
    }

    /// Reassembles the rule as a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(self.parameters.len() + 1);
        object.insert(String::from("action"), Value::String(self.action.clone()));
        object.extend(self.parameters.clone());
        Value::Object(object)
    }
}

/// An entry of an `exclude` list.
///
/// A bare string excludes a file or directory. The object form may add a
/// 1-based `line`, which keeps only occurrences starting on that line of the
/// named file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExcludeEntry {
    /// A path, relative to the root unless absolute.
    Path(String),
    /// A path with an optional line.
    Scoped {
        /// Path, relative to the root unless absolute.
        name: String,
        /// 1-based line whose occurrences are kept.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        line: Option<usize>,
    },
}

impl ExcludeEntry {
    /// Parses one list element, rejecting empty names and line zero.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let entry: Self = serde_json::from_value(value.clone()).ok()?;
        if entry.name().is_empty() || entry.line() == Some(0) {
            None
        } else {
            Some(entry)
        }
    }

    /// The path this entry names.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Path(name) | Self::Scoped { name, .. } => name,
        }
    }

    /// The line this entry is scoped to, if any.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::Path(_) => None,
            Self::Scoped { line, .. } => *line,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
