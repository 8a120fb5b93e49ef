//! Run context
//!
//! The context carries the policy and settings for one engine run along with
//! the console reporting helpers used by the engine.

use colored::Colorize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

/// File name of the execution log, created next to the build script
pub const DEFAULT_LOG_FILE: &str = "taskrun.log";

/// Settings and policy for one run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Keep evaluating tasks after one exits non-zero
    pub continue_on_failure: bool,

    /// What to do with a task whose dependency is disabled
    pub on_disabled_dependency: DisabledDependencyPolicy,

    /// Named values consulted by `when` conditions
    pub vars: HashMap<String, String>,

    /// Shell used to run commands (e.g., ["sh", "-c"])
    pub interpreter: Vec<String>,

    /// Execution log location; `None` means next to the build script
    pub log_path: Option<PathBuf>,

    /// Verbosity level
    pub verbosity: Verbosity,
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

/// Handling of a dependency that is disabled
///
/// The engine cannot tell "dependency never ran" from "dependency failed";
/// this policy decides what a disabled link in a dependency chain means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisabledDependencyPolicy {
    /// Report a gate failure and decline to run the dependent; the run goes on
    #[default]
    Warn,
    /// Skip the dependent as if it were disabled too, transitively
    Skip,
    /// Stop the run with a failing exit code
    Abort,
}

impl FromStr for DisabledDependencyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warn" => Ok(Self::Warn),
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            other => Err(format!(
                "unknown policy '{}', expected one of: warn, skip, abort",
                other
            )),
        }
    }
}

/// Default shell for the current platform
pub fn default_interpreter() -> Vec<String> {
    if cfg!(windows) {
        vec!["cmd".to_string(), "/C".to_string()]
    } else {
        vec!["sh".to_string(), "-c".to_string()]
    }
}

impl RunContext {
    /// Create a new context with default settings
    pub fn new() -> Self {
        RunContext {
            continue_on_failure: false,
            on_disabled_dependency: DisabledDependencyPolicy::default(),
            vars: HashMap::new(),
            interpreter: default_interpreter(),
            log_path: None,
            verbosity: Verbosity::Normal,
        }
    }

    /// Set the continue-on-failure policy
    pub fn with_continue_on_failure(mut self, continue_on_failure: bool) -> Self {
        self.continue_on_failure = continue_on_failure;
        self
    }

    /// Set the disabled-dependency policy
    pub fn with_disabled_dependency_policy(mut self, policy: DisabledDependencyPolicy) -> Self {
        self.on_disabled_dependency = policy;
        self
    }

    /// Set condition values
    pub fn with_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.vars = vars;
        self
    }

    /// Set a single condition value
    pub fn set_var(&mut self, key: String, value: String) {
        self.vars.insert(key, value);
    }

    /// Get a condition value
    pub fn get_var(&self, key: &str) -> Option<&String> {
        self.vars.get(key)
    }

    /// Set the execution log location
    pub fn with_log_path(mut self, path: PathBuf) -> Self {
        self.log_path = Some(path);
        self
    }

    /// Set verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Execution log path for a script living in `script_dir`
    pub fn log_file(&self, script_dir: &std::path::Path) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| script_dir.join(DEFAULT_LOG_FILE))
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{} {}", "[INFO]".cyan(), message);
        }
    }

    /// Print success message
    pub fn print_success(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{} {}", "[ OK ]".green(), message);
        }
    }

    /// Print warning message
    pub fn print_warn(&self, message: &str) {
        if self.verbosity >= Verbosity::Quiet {
            eprintln!("{} {}", "[WARN]".yellow(), message);
        }
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        if self.verbosity >= Verbosity::Quiet {
            eprintln!("{} {}", "[ERROR]".red().bold(), message);
        }
    }

    /// Print debug message (only in verbose mode)
    pub fn print_debug(&self, message: &str) {
        if self.verbosity >= Verbosity::Verbose {
            eprintln!("{} {}", "[DEBUG]".dimmed(), message);
        }
    }

    /// Print task start message
    pub fn print_task_start(&self, task_name: &str) {
        self.print_info(&format!("Running task '{}'", task_name));
    }

    /// Print task skip message
    pub fn print_task_skip(&self, task_name: &str, reason: &str) {
        self.print_info(&format!("Skipping task '{}': {}", task_name, reason));
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_context_new() {
        let ctx = RunContext::new();
        assert!(!ctx.continue_on_failure);
        assert_eq!(ctx.on_disabled_dependency, DisabledDependencyPolicy::Warn);
        assert_eq!(ctx.verbosity, Verbosity::Normal);
        assert!(ctx.vars.is_empty());
        assert!(ctx.log_path.is_none());
    }

    #[test]
    fn test_context_with_vars() {
        let mut vars = HashMap::new();
        vars.insert("env".to_string(), "prod".to_string());

        let mut ctx = RunContext::new().with_vars(vars);
        assert_eq!(ctx.get_var("env"), Some(&"prod".to_string()));

        ctx.set_var("region".to_string(), "eu".to_string());
        assert_eq!(ctx.get_var("region"), Some(&"eu".to_string()));
    }

    #[test]
    fn test_log_file_defaults_to_script_dir() {
        let ctx = RunContext::new();
        assert_eq!(
            ctx.log_file(Path::new("/work")),
            PathBuf::from("/work").join(DEFAULT_LOG_FILE)
        );

        let ctx = ctx.with_log_path(PathBuf::from("/tmp/run.log"));
        assert_eq!(ctx.log_file(Path::new("/work")), PathBuf::from("/tmp/run.log"));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("skip".parse::<DisabledDependencyPolicy>(), Ok(DisabledDependencyPolicy::Skip));
        assert_eq!("abort".parse::<DisabledDependencyPolicy>(), Ok(DisabledDependencyPolicy::Abort));
        assert!("sometimes".parse::<DisabledDependencyPolicy>().is_err());
    }

    #[test]
    fn test_verbosity_levels() {
        assert!(Verbosity::Verbose > Verbosity::Normal);
        assert!(Verbosity::Normal > Verbosity::Quiet);
        assert!(Verbosity::Quiet > Verbosity::Silent);
    }
}
