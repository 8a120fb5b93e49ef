//! Build script discovery and parsing

use crate::error::{ConfigError, ConfigResult};
use serde_yaml::{Mapping, Value};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default build script names to search for
pub const SCRIPT_FILE_NAMES: &[&str] = &["taskrun.yml", "taskrun.yaml"];

/// Environment variable consulted when no script path is given
pub const SCRIPT_ENV_VAR: &str = "TASKRUN_SCRIPT";

/// A parsed build script together with where it came from
#[derive(Debug, Clone)]
pub struct Script {
    /// Absolute path of the script file
    pub path: PathBuf,

    /// Directory containing the script, the default working directory of every task
    pub dir: PathBuf,

    /// Task name to definition, in declaration order
    pub tasks: Mapping,
}

/// Find the build script by searching the current and parent directories
pub fn find_script_file() -> ConfigResult<PathBuf> {
    find_script_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the build script starting from a specific directory
pub fn find_script_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in SCRIPT_FILE_NAMES {
            let script_path = current_dir.join(file_name);
            searched_paths.push(script_path.display().to_string());

            if script_path.is_file() {
                return Ok(script_path);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ConfigError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// Resolve the build script path from the process environment
///
/// See [`resolve_script_path_with`] for the precedence rules.
pub fn resolve_script_path(
    explicit: Option<PathBuf>,
    env_var: Option<&str>,
) -> ConfigResult<PathBuf> {
    let lookup = |name: &str| env::var(name).ok();
    match explicit {
        Some(path) => resolve_script_path_with(Some(path), env_var, lookup, None),
        None => {
            let start = env::current_dir().map_err(|e| {
                ConfigError::Invalid(format!("Failed to get current directory: {}", e))
            })?;
            resolve_script_path_with(None, env_var, lookup, Some(start))
        }
    }
}

/// Resolve the build script path
///
/// A named environment variable wins over an explicit path, then the
/// explicit path, then [`SCRIPT_ENV_VAR`], then discovery upward from
/// `start_dir`.
pub fn resolve_script_path_with<F>(
    explicit: Option<PathBuf>,
    env_var: Option<&str>,
    lookup: F,
    start_dir: Option<PathBuf>,
) -> ConfigResult<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let from_env = |name: &str| lookup(name).filter(|v| !v.is_empty()).map(PathBuf::from);

    if let Some(path) = env_var.and_then(from_env) {
        return Ok(path);
    }
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Some(path) = from_env(SCRIPT_ENV_VAR) {
        return Ok(path);
    }

    match start_dir {
        Some(dir) => find_script_file_from(dir),
        None => Err(ConfigError::NotFound(format!(
            "no script given and ${} is not set",
            SCRIPT_ENV_VAR
        ))),
    }
}

/// Load and parse a build script file
pub fn load_script(path: &Path) -> ConfigResult<Script> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }

    let path = path
        .canonicalize()
        .map_err(|_| ConfigError::NotFound(path.display().to_string()))?;
    let contents = fs::read_to_string(&path)
        .map_err(|e| ConfigError::NotFound(format!("{} ({})", path.display(), e)))?;

    let tasks = parse_script(&contents, &path)?;
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"));

    Ok(Script { path, dir, tasks })
}

/// Parse build script text into an ordered task mapping
pub fn parse_script(yaml: &str, path: &Path) -> ConfigResult<Mapping> {
    let document: Value = serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    match document {
        Value::Mapping(tasks) => Ok(tasks),
        Value::Null => Ok(Mapping::new()),
        _ => Err(ConfigError::NotAMapping),
    }
}
