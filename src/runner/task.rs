//! Task execution types and logic
//!
//! This module contains the runtime representation of tasks and execution logic.

use crate::config::TaskDefinition;
use crate::error::ExecResult;
use crate::runner::{
    first_unmet, format_argv, format_command, run_argv, run_shell, Condition, ExecutionLog,
    LogEntry, RunContext,
};
use chrono::Local;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Exit code reported for a task that was not executed because it is disabled
/// or its conditions do not hold. Real processes never report it; signals are
/// mapped to `128 + signal`.
pub const SKIPPED_EXIT_CODE: i32 = -1;

/// Outcome of [`Task::execute`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,

    /// Captured standard output, absent when nothing was executed
    pub stdout: Option<String>,

    pub stderr: String,
}

impl ExecutionResult {
    /// Result for a task that did not run
    pub fn skipped() -> Self {
        ExecutionResult {
            exit_code: SKIPPED_EXIT_CODE,
            stdout: None,
            stderr: String::new(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.exit_code == SKIPPED_EXIT_CODE
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runtime task representation
///
/// This differs from [`TaskDefinition`] by carrying its resolved working
/// directory and parsed conditions.
#[derive(Debug, Clone)]
pub struct Task {
    /// Task name
    pub name: String,

    /// Command line template
    pub command: String,

    /// Placeholder values
    pub arguments: HashMap<String, String>,

    /// Names of tasks that must complete first
    pub dependencies: Vec<String>,

    /// Whether this task runs at all
    pub enabled: bool,

    /// Conditions that must all hold
    pub conditions: Vec<Condition>,

    /// Run through the interpreter rather than as an argument vector
    pub shell: bool,

    /// Absolute directory the command runs in
    pub working_directory: PathBuf,
}

impl Task {
    /// Create a bare task running `command` in `working_directory`
    pub fn new(name: impl Into<String>, command: impl Into<String>, working_directory: PathBuf) -> Self {
        Task {
            name: name.into(),
            command: command.into(),
            arguments: HashMap::new(),
            dependencies: Vec::new(),
            enabled: true,
            conditions: Vec::new(),
            shell: true,
            working_directory,
        }
    }

    /// Create a task from its definition; `dir` is resolved against `base_dir`
    pub fn from_definition(name: String, definition: TaskDefinition, base_dir: &Path) -> Self {
        let working_directory = match &definition.dir {
            Some(dir) => base_dir.join(dir),
            None => base_dir.to_path_buf(),
        };

        Task {
            name,
            command: definition.command,
            arguments: definition.arguments,
            dependencies: definition.dependencies,
            enabled: definition.enabled,
            conditions: definition
                .when
                .into_iter()
                .flat_map(Condition::from_config)
                .collect(),
            shell: definition.shell,
            working_directory,
        }
    }

    /// Set an argument value
    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Set the dependency list
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Set the enabled flag
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Why this task would not run in `ctx`, if anything
    pub fn skip_reason(&self, ctx: &RunContext) -> Option<String> {
        if !self.enabled {
            return Some("task is disabled".to_string());
        }

        first_unmet(&self.conditions, ctx, &self.working_directory)
            .map(|condition| format!("condition not met ({})", condition.describe()))
    }

    /// Execute the task in the given context
    ///
    /// Disabled tasks and tasks with unmet conditions return
    /// [`ExecutionResult::skipped`] without spawning anything or touching
    /// the log. Otherwise exactly one child process is spawned, awaited,
    /// and one log entry is appended.
    pub fn execute(&self, ctx: &RunContext, log: &ExecutionLog) -> ExecResult<ExecutionResult> {
        if let Some(reason) = self.skip_reason(ctx) {
            ctx.print_task_skip(&self.name, &reason);
            return Ok(ExecutionResult::skipped());
        }

        ctx.print_task_start(&self.name);

        let (command_line, output) = if self.shell {
            let line = format_command(&self.command, &self.arguments)?;
            ctx.print_debug(&format!("$ {}", line));
            let output = run_shell(&line, &ctx.interpreter, &self.working_directory)?;
            (line, output)
        } else {
            let argv = format_argv(&self.command, &self.arguments)?;
            let line = argv.join(" ");
            ctx.print_debug(&format!("exec {:?}", argv));
            let output = run_argv(&argv, &self.working_directory)?;
            (line, output)
        };

        log.append(&LogEntry {
            task: &self.name,
            timestamp: Local::now(),
            command: &command_line,
            stdout: &output.stdout,
            stderr: &output.stderr,
            exit_code: output.exit_code,
        })?;

        Ok(ExecutionResult {
            exit_code: output.exit_code,
            stdout: Some(output.stdout),
            stderr: output.stderr,
        })
    }
}
