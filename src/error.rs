//! Error types for Taskrun

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Taskrun operations
pub type Result<T> = std::result::Result<T, TaskrunError>;

/// Main error type for Taskrun
#[derive(Error, Debug)]
pub enum TaskrunError {
    /// Script loading and validation errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Working directory could not be resolved
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Script loading and validation errors
///
/// All of these are fatal and surface before any task runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find build script (searched: {0})")]
    NotFound(String),

    #[error("Failed to parse build script '{path}': {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Build script must be a mapping of task name to task definition")]
    NotAMapping,

    #[error("Task '{task}' is missing required field '{field}'")]
    MissingField { task: String, field: String },

    #[error("Task '{task}' has invalid field '{field}': expected {expected}")]
    InvalidType {
        task: String,
        field: String,
        expected: String,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Task execution errors
///
/// These are local to one task and never abort a run on their own.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Failed to spawn '{command}': {error}")]
    Spawn { command: String, error: String },

    #[error("Command is empty after templating")]
    EmptyCommand,

    #[error("{0}")]
    Template(#[from] TemplateError),

    #[error("Failed to write execution log '{path}': {error}")]
    Log { path: PathBuf, error: String },
}

/// Argument templating errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Argument '{0}' is not defined")]
    UndefinedArgument(String),

    #[error("Invalid placeholder syntax: {0}")]
    InvalidSyntax(String),
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for execution operations
pub type ExecResult<T> = std::result::Result<T, ExecutionError>;

/// Specialized result type for templating operations
pub type TemplateResult<T> = std::result::Result<T, TemplateError>;
