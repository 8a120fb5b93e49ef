//! Condition evaluation
//!
//! Conditions are a closed set of predicates over named context values, the
//! environment and the filesystem. Nothing from the build script is ever
//! evaluated as code.

use crate::config;
use crate::runner::RunContext;
use std::env;
use std::path::Path;

/// Runtime representation of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equal { key: String, value: String },
    NotEqual { key: String, value: String },
    OneOf { key: String, values: Vec<String> },
    Set(String),
    NotSet(String),
    EnvSet(String),
    Exists(String),
}

impl Condition {
    /// Create from config, one condition per populated field
    ///
    /// Validation only admits entries with exactly one predicate, but an entry
    /// carrying several still yields all of them so none is silently dropped.
    pub fn from_config(when: config::When) -> Vec<Self> {
        let mut conditions = Vec::new();
        if let Some(eq) = when.equal {
            conditions.push(Condition::Equal {
                key: eq.key,
                value: eq.value,
            });
        }
        if let Some(ne) = when.not_equal {
            conditions.push(Condition::NotEqual {
                key: ne.key,
                value: ne.value,
            });
        }
        if let Some(member) = when.one_of {
            conditions.push(Condition::OneOf {
                key: member.key,
                values: member.values,
            });
        }
        if let Some(key) = when.set {
            conditions.push(Condition::Set(key));
        }
        if let Some(key) = when.not_set {
            conditions.push(Condition::NotSet(key));
        }
        if let Some(var) = when.env_set {
            conditions.push(Condition::EnvSet(var));
        }
        if let Some(path) = when.exists {
            conditions.push(Condition::Exists(path));
        }
        conditions
    }

    /// Human readable form used in skip diagnostics
    pub fn describe(&self) -> String {
        match self {
            Condition::Equal { key, value } => format!("{} == {}", key, value),
            Condition::NotEqual { key, value } => format!("{} != {}", key, value),
            Condition::OneOf { key, values } => format!("{} in [{}]", key, values.join(", ")),
            Condition::Set(key) => format!("{} is set", key),
            Condition::NotSet(key) => format!("{} is not set", key),
            Condition::EnvSet(var) => format!("${} is set", var),
            Condition::Exists(path) => format!("{} exists", path),
        }
    }
}

/// Evaluate a single condition
pub fn evaluate_condition(condition: &Condition, ctx: &RunContext, dir: &Path) -> bool {
    match condition {
        Condition::Equal { key, value } => ctx.get_var(key) == Some(value),
        Condition::NotEqual { key, value } => ctx.get_var(key) != Some(value),
        Condition::OneOf { key, values } => ctx
            .get_var(key)
            .map_or(false, |actual| values.contains(actual)),
        Condition::Set(key) => ctx.get_var(key).is_some(),
        Condition::NotSet(key) => ctx.get_var(key).is_none(),
        Condition::EnvSet(var) => env::var_os(var).is_some(),
        Condition::Exists(path) => dir.join(path).exists(),
    }
}

/// Find the first condition that does not hold (all must hold - AND logic)
pub fn first_unmet<'a>(
    conditions: &'a [Condition],
    ctx: &RunContext,
    dir: &Path,
) -> Option<&'a Condition> {
    conditions
        .iter()
        .find(|condition| !evaluate_condition(condition, ctx, dir))
}
