//! Build script validation
//!
//! Structural checks over the parsed mapping, run before any task object is
//! built. Dependency names are deliberately not resolved here: a dependency
//! may name a task declared later in the document, and an unknown name is
//! reported by the engine's gate at run time.

use crate::config::types::{scalar_to_string, TaskDefinition, When};
use crate::error::{ConfigError, ConfigResult};
use serde_yaml::{Mapping, Value};

/// Validate every task in a build script, stopping at the first failure
pub fn validate_script(script: &Mapping) -> ConfigResult<()> {
    for (key, definition) in script {
        let name = task_name(key)?;
        validate_task(&name, definition)?;
    }
    Ok(())
}

/// Validate a script and convert it into definitions in declaration order
pub fn load_definitions(script: &Mapping) -> ConfigResult<Vec<(String, TaskDefinition)>> {
    validate_script(script)?;

    let mut definitions = Vec::with_capacity(script.len());
    for (key, value) in script {
        let name = task_name(key)?;
        // serde_yaml prefixes the message with the offending field's path
        let definition: TaskDefinition = serde_yaml::from_value(value.clone())
            .map_err(|e| ConfigError::Invalid(format!("Task '{}': {}", name, e)))?;
        definitions.push((name, definition));
    }

    Ok(definitions)
}

/// Validate a single task definition
pub fn validate_task(name: &str, definition: &Value) -> ConfigResult<()> {
    let fields = match definition {
        Value::Mapping(fields) => fields,
        Value::Null => return Err(missing(name, "command")),
        _ => {
            return Err(ConfigError::Invalid(format!(
                "Task '{}' must be a mapping of fields",
                name
            )))
        }
    };

    match fields.get("command") {
        None => return Err(missing(name, "command")),
        Some(value) if !is_truthy(value) => return Err(missing(name, "command")),
        Some(Value::String(_)) => {}
        Some(_) => return Err(invalid(name, "command", "a string")),
    }

    for flag in ["enabled", "shell"] {
        if let Some(value) = fields.get(flag) {
            if !value.is_bool() {
                return Err(invalid(name, flag, "a boolean"));
            }
        }
    }

    match fields.get("arguments") {
        None | Some(Value::Null) => {}
        Some(Value::Mapping(arguments)) => {
            for (key, value) in arguments {
                let key = scalar_to_string(key)
                    .ok_or_else(|| invalid(name, "arguments", "scalar argument names"))?;
                if scalar_to_string(value).is_none() {
                    return Err(invalid(
                        name,
                        &format!("arguments.{}", key),
                        "a scalar value",
                    ));
                }
            }
        }
        Some(_) => return Err(invalid(name, "arguments", "a mapping")),
    }

    match fields.get("dependencies") {
        None | Some(Value::Null) => {}
        Some(Value::Sequence(dependencies)) => {
            if dependencies.iter().any(|d| scalar_to_string(d).is_none()) {
                return Err(invalid(name, "dependencies", "a sequence of task names"));
            }
        }
        Some(_) => return Err(invalid(name, "dependencies", "a sequence")),
    }

    match fields.get("when") {
        None | Some(Value::Null) => {}
        Some(Value::Mapping(condition)) => validate_condition(name, condition)?,
        Some(Value::Sequence(conditions)) => {
            for condition in conditions {
                match condition {
                    Value::Mapping(condition) => validate_condition(name, condition)?,
                    _ => return Err(invalid(name, "when", "a sequence of conditions")),
                }
            }
        }
        Some(_) => return Err(invalid(name, "when", "a mapping or sequence")),
    }

    if let Some(dir) = fields.get("dir") {
        if !dir.is_string() {
            return Err(invalid(name, "dir", "a string"));
        }
    }

    Ok(())
}

/// A condition entry names exactly one known predicate
fn validate_condition(name: &str, condition: &Mapping) -> ConfigResult<()> {
    if condition.len() != 1 {
        return Err(invalid(
            name,
            "when",
            &format!(
                "exactly one predicate per condition, found {}",
                condition.len()
            ),
        ));
    }

    serde_yaml::from_value::<When>(Value::Mapping(condition.clone()))
        .map(|_| ())
        .map_err(|e| invalid(name, "when", &format!("a valid condition ({})", e)))
}

/// Task names are mapping keys; scalar keys are accepted in their string form
fn task_name(key: &Value) -> ConfigResult<String> {
    scalar_to_string(key).ok_or_else(|| {
        ConfigError::Invalid(format!("Task names must be scalars, found {:?}", key))
    })
}

/// Empty strings, `false`, zero, null and empty collections are not usable commands
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::Sequence(seq) => !seq.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}

fn missing(task: &str, field: &str) -> ConfigError {
    ConfigError::MissingField {
        task: task.to_string(),
        field: field.to_string(),
    }
}

fn invalid(task: &str, field: &str, expected: &str) -> ConfigError {
    ConfigError::InvalidType {
        task: task.to_string(),
        field: field.to_string(),
        expected: expected.to_string(),
    }
}
