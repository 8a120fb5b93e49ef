//! Core configuration types
//!
//! This module defines the data structures that represent one task
//! definition in a build script. The script itself is an ordered mapping of
//! task name to [`TaskDefinition`]; declaration order is kept by
//! [`serde_yaml::Mapping`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A task definition as loaded from the build script
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TaskDefinition {
    /// Shell command line template with optional `{name}` placeholders
    pub command: String,

    /// Placeholder values used to fill `command`
    #[serde(
        default,
        skip_serializing_if = "HashMap::is_empty",
        deserialize_with = "deserialize_arguments"
    )]
    pub arguments: HashMap<String, String>,

    /// Tasks that must have completed successfully before this one runs
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_names"
    )]
    pub dependencies: Vec<String>,

    /// Whether this task runs at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Conditions that must all hold for this task to run
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_when"
    )]
    pub when: Vec<When>,

    /// Run through the shell (`true`) or as a raw argument vector (`false`)
    #[serde(default = "default_true")]
    pub shell: bool,

    /// Directory to run in, relative to the base working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

fn default_true() -> bool {
    true
}

/// A structured condition; exactly one field is expected to be set
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct When {
    /// Context value equals the given value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equal: Option<WhenComparison>,

    /// Context value differs from the given value
    #[serde(rename = "not-equal", skip_serializing_if = "Option::is_none")]
    pub not_equal: Option<WhenComparison>,

    /// Context value is one of the given values
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub one_of: Option<WhenMembership>,

    /// Context value is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<String>,

    /// Context value is not set
    #[serde(rename = "not-set", skip_serializing_if = "Option::is_none")]
    pub not_set: Option<String>,

    /// Environment variable is set
    #[serde(rename = "env-set", skip_serializing_if = "Option::is_none")]
    pub env_set: Option<String>,

    /// Path exists relative to the task's working directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<String>,
}

/// An equality check against a named context value
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct WhenComparison {
    pub key: String,
    pub value: String,
}

/// A membership check against a named context value
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct WhenMembership {
    pub key: String,
    pub values: Vec<String>,
}

/// Render a scalar YAML value the way it would appear in a command line
pub fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value;

    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Arguments accept any scalar value and store its string form
fn deserialize_arguments<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let value = Value::deserialize(deserializer)?;

    match value {
        Value::Mapping(map) => {
            let mut args = HashMap::new();
            for (key, val) in map {
                let key = scalar_to_string(&key)
                    .ok_or_else(|| D::Error::custom("argument names must be scalars"))?;
                let val = scalar_to_string(&val).ok_or_else(|| {
                    D::Error::custom(format!("argument '{}' must be a scalar value", key))
                })?;
                args.insert(key, val);
            }
            Ok(args)
        }
        Value::Null => Ok(HashMap::new()),
        _ => Err(D::Error::custom("arguments must be a mapping")),
    }
}

/// Dependencies accept a sequence of names or nothing
fn deserialize_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let value = Value::deserialize(deserializer)?;

    match value {
        Value::Sequence(seq) => seq
            .iter()
            .map(|item| {
                scalar_to_string(item)
                    .ok_or_else(|| D::Error::custom("dependency names must be scalars"))
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("dependencies must be a sequence")),
    }
}

/// Conditions accept a single condition or a sequence of them
fn deserialize_when<'de, D>(deserializer: D) -> Result<Vec<When>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let value = Value::deserialize(deserializer)?;

    match value {
        Value::Mapping(_) => {
            let when = When::deserialize(value).map_err(D::Error::custom)?;
            Ok(vec![when])
        }
        Value::Sequence(seq) => {
            let mut conditions = Vec::new();
            for item in seq {
                let when = When::deserialize(item).map_err(D::Error::custom)?;
                conditions.push(when);
            }
            Ok(conditions)
        }
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("when must be a mapping or sequence")),
    }
}
