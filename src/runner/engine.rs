//! Execution engine
//!
//! Walks the registry in declaration order, gates each task on its
//! dependencies, executes it and applies the run policy. Tasks are never
//! reordered by their dependencies: a dependency declared after its dependent
//! has simply not completed yet when the dependent is reached.

use crate::config::load_script;
use crate::error::Result;
use crate::runner::{DisabledDependencyPolicy, ExecutionLog, RunContext, Task, TaskRegistry};
use std::collections::HashSet;
use std::fmt;
use std::env;
use std::io;
use std::path::{Path, PathBuf};

/// Exit code of a run stopped by [`DisabledDependencyPolicy::Abort`], or of a
/// task that failed before its process could report one
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Why a dependency did not satisfy the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnmetDependency {
    /// No task with this name exists
    Unknown(String),
    /// The dependency is disabled
    Disabled(String),
    /// The dependency was skipped (conditions or skip policy)
    Skipped(String),
    /// The dependency has not completed successfully (yet)
    Incomplete(String),
}

impl UnmetDependency {
    pub fn name(&self) -> &str {
        match self {
            UnmetDependency::Unknown(name)
            | UnmetDependency::Disabled(name)
            | UnmetDependency::Skipped(name)
            | UnmetDependency::Incomplete(name) => name,
        }
    }
}

impl fmt::Display for UnmetDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmetDependency::Unknown(name) => write!(f, "unknown task '{}'", name),
            UnmetDependency::Disabled(name) => write!(f, "disabled task '{}'", name),
            UnmetDependency::Skipped(name) => write!(f, "skipped task '{}'", name),
            UnmetDependency::Incomplete(name) => write!(f, "incomplete task '{}'", name),
        }
    }
}

/// What happened to one task during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Ran and exited 0
    Succeeded,
    /// Ran and exited non-zero, or could not be run (template or spawn error)
    Failed { exit_code: i32, stderr: String },
    /// Not executed: disabled, conditions unmet, or skipped by policy
    Skipped,
    /// Not attempted because the dependency gate failed
    Blocked(Vec<UnmetDependency>),
}

impl TaskOutcome {
    /// Whether a process was (or was meant to be) started for this task
    pub fn was_attempted(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded | TaskOutcome::Failed { .. })
    }
}

/// Summary of one engine run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Tasks that ran and exited 0
    pub completed: HashSet<String>,

    /// Every evaluated task, in evaluation order
    pub outcomes: Vec<(String, TaskOutcome)>,

    /// Exit code of the last executed task, 0 if none ran
    pub exit_code: i32,

    /// Whether the run stopped before evaluating every task
    pub stopped_early: bool,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Outcome of a task, `None` if it was never evaluated
    pub fn outcome(&self, name: &str) -> Option<&TaskOutcome> {
        self.outcomes
            .iter()
            .find(|(task, _)| task == name)
            .map(|(_, outcome)| outcome)
    }

    /// Names of evaluated tasks, in order
    pub fn evaluated(&self) -> Vec<&str> {
        self.outcomes.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Names of tasks that were attempted, in order
    pub fn attempted(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.was_attempted())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Sequential, dependency-gated task runner
pub struct Engine<'a> {
    registry: &'a TaskRegistry,
    ctx: &'a RunContext,
    log: ExecutionLog,
}

/// Per-run mutable state
#[derive(Default)]
struct RunState {
    report: RunReport,
    skipped: HashSet<String>,
}

impl RunState {
    fn record(&mut self, task: &Task, outcome: TaskOutcome) {
        match &outcome {
            TaskOutcome::Succeeded => {
                self.report.completed.insert(task.name.clone());
            }
            TaskOutcome::Skipped => {
                self.skipped.insert(task.name.clone());
            }
            _ => {}
        }
        self.report.outcomes.push((task.name.clone(), outcome));
    }
}

impl<'a> Engine<'a> {
    pub fn new(registry: &'a TaskRegistry, ctx: &'a RunContext, log: ExecutionLog) -> Self {
        Engine { registry, ctx, log }
    }

    /// Evaluate every task once, in declaration order
    pub fn run(&self) -> RunReport {
        let mut state = RunState::default();

        for task in self.registry.iter() {
            let unmet = self.check_gate(task, &state);

            if !unmet.is_empty() {
                if self.handle_gate_failure(task, unmet, &mut state) {
                    state.report.stopped_early = true;
                    break;
                }
                continue;
            }

            let outcome = self.execute(task);
            let failed = matches!(outcome, TaskOutcome::Failed { .. });
            match &outcome {
                TaskOutcome::Failed { exit_code, .. } => state.report.exit_code = *exit_code,
                TaskOutcome::Succeeded => state.report.exit_code = 0,
                _ => {}
            }
            state.record(task, outcome);

            if failed && !self.ctx.continue_on_failure {
                self.ctx
                    .print_error("Stopping: a task failed and --no-stop is not set");
                state.report.stopped_early = true;
                break;
            }
        }

        state.report
    }

    /// Dependencies of `task` that do not satisfy the gate
    ///
    /// A dependency passes only if it is enabled and has completed.
    fn check_gate(&self, task: &Task, state: &RunState) -> Vec<UnmetDependency> {
        task.dependencies
            .iter()
            .filter_map(|name| {
                let unmet = match self.registry.get(name) {
                    None => UnmetDependency::Unknown(name.clone()),
                    Some(dependency) if !dependency.enabled => {
                        UnmetDependency::Disabled(name.clone())
                    }
                    Some(_) if state.report.completed.contains(name) => return None,
                    Some(_) if state.skipped.contains(name) => {
                        UnmetDependency::Skipped(name.clone())
                    }
                    Some(_) => UnmetDependency::Incomplete(name.clone()),
                };
                Some(unmet)
            })
            .collect()
    }

    /// Report a gate failure; returns whether the run must stop
    fn handle_gate_failure(
        &self,
        task: &Task,
        unmet: Vec<UnmetDependency>,
        state: &mut RunState,
    ) -> bool {
        let only_skips = unmet.iter().all(|u| {
            matches!(u, UnmetDependency::Disabled(_) | UnmetDependency::Skipped(_))
        });
        let any_disabled = unmet
            .iter()
            .any(|u| matches!(u, UnmetDependency::Disabled(_)));

        match self.ctx.on_disabled_dependency {
            DisabledDependencyPolicy::Skip if only_skips => {
                let names: Vec<&str> = unmet.iter().map(UnmetDependency::name).collect();
                self.ctx.print_task_skip(
                    &task.name,
                    &format!("depends on skipped task(s) {}", names.join(", ")),
                );
                state.record(task, TaskOutcome::Skipped);
                false
            }
            DisabledDependencyPolicy::Abort if any_disabled => {
                for dependency in &unmet {
                    self.ctx.print_error(&format!(
                        "Task '{}' depends on {}",
                        task.name, dependency
                    ));
                }
                self.ctx
                    .print_error("Stopping: a dependency is disabled (policy: abort)");
                state.record(task, TaskOutcome::Blocked(unmet));
                state.report.exit_code = FAILURE_EXIT_CODE;
                true
            }
            _ => {
                for dependency in &unmet {
                    self.ctx.print_warn(&format!(
                        "Task '{}' depends on {}; not running it",
                        task.name, dependency
                    ));
                }
                state.record(task, TaskOutcome::Blocked(unmet));
                false
            }
        }
    }

    fn execute(&self, task: &Task) -> TaskOutcome {
        match task.execute(self.ctx, &self.log) {
            Ok(result) if result.is_skipped() => TaskOutcome::Skipped,
            Ok(result) if result.is_success() => {
                self.ctx
                    .print_success(&format!("Task '{}' completed successfully", task.name));
                TaskOutcome::Succeeded
            }
            Ok(result) => {
                self.ctx.print_error(&format!(
                    "Task '{}' failed with exit code {}",
                    task.name, result.exit_code
                ));
                if !result.stderr.is_empty() {
                    self.ctx
                        .print_error(&format!("Error output:\n{}", result.stderr.trim_end()));
                }
                TaskOutcome::Failed {
                    exit_code: result.exit_code,
                    stderr: result.stderr,
                }
            }
            Err(e) => {
                self.ctx
                    .print_error(&format!("Task '{}' could not run: {}", task.name, e));
                TaskOutcome::Failed {
                    exit_code: FAILURE_EXIT_CODE,
                    stderr: e.to_string(),
                }
            }
        }
    }
}

/// Load, validate and run a build script
///
/// Loading and validation errors are returned before any task runs or the
/// log is touched. `working_dir` overrides the script's directory as the
/// working directory of every task.
pub fn run_script(path: &Path, ctx: &RunContext, working_dir: Option<&Path>) -> Result<RunReport> {
    let script = load_script(path)?;
    let working_dir = working_dir.map(absolute_dir).transpose()?;
    let registry = TaskRegistry::from_script(&script, working_dir.as_deref())?;
    ctx.print_debug(&format!(
        "Loaded {} task(s) from {}",
        registry.len(),
        script.path.display()
    ));

    let log = ExecutionLog::new(ctx.log_file(&script.dir));
    Ok(Engine::new(&registry, ctx, log).run())
}

/// Resolve a relative directory against the current directory
fn absolute_dir(dir: &Path) -> io::Result<PathBuf> {
    if dir.is_absolute() {
        Ok(dir.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::Verbosity;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        registry: TaskRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                dir: TempDir::new().unwrap(),
                registry: TaskRegistry::default(),
            }
        }

        fn task(&mut self, name: &str, command: &str, deps: &[&str]) -> &mut Task {
            let task = Task::new(name, command, self.dir.path().to_path_buf())
                .with_dependencies(deps.iter().map(|d| d.to_string()).collect());
            self.registry.insert(task);
            self.registry.get_mut(name).unwrap()
        }

        fn run(&self, ctx: RunContext) -> RunReport {
            let ctx = ctx.with_verbosity(Verbosity::Silent);
            let log = ExecutionLog::new(self.log_path());
            Engine::new(&self.registry, &ctx, log).run()
        }

        fn log_path(&self) -> PathBuf {
            self.dir.path().join("run.log")
        }
    }

    #[test]
    fn test_single_task_completes() {
        let mut fx = Fixture::new();
        fx.task("t1", "echo hi", &[]);

        let report = fx.run(RunContext::new());

        assert_eq!(report.completed, HashSet::from(["t1".to_string()]));
        assert_eq!(report.exit_code, 0);
        assert!(!report.stopped_early);
        assert!(std::fs::read_to_string(fx.log_path()).unwrap().contains("hi"));
    }

    #[test]
    fn test_declaration_order_is_kept() {
        let mut fx = Fixture::new();
        fx.task("zeta", "echo z >> order.txt", &[]);
        fx.task("alpha", "echo a >> order.txt", &[]);
        fx.task("mid", "echo m >> order.txt", &[]);

        let report = fx.run(RunContext::new());

        assert_eq!(report.evaluated(), vec!["zeta", "alpha", "mid"]);
        let order = std::fs::read_to_string(fx.dir.path().join("order.txt")).unwrap();
        assert_eq!(order, "z\na\nm\n");
    }

    #[test]
    fn test_dependency_declared_later_blocks() {
        let mut fx = Fixture::new();
        fx.task("consumer", "echo use", &["producer"]);
        fx.task("producer", "echo make", &[]);

        let report = fx.run(RunContext::new());

        assert_eq!(
            report.outcome("consumer"),
            Some(&TaskOutcome::Blocked(vec![UnmetDependency::Incomplete(
                "producer".to_string()
            )]))
        );
        assert_eq!(report.completed, HashSet::from(["producer".to_string()]));
        assert_eq!(report.exit_code, 0);
    }

    #[test]
    fn test_disabled_dependency_chain() {
        let mut fx = Fixture::new();
        fx.task("a", "echo a", &[]);
        fx.task("b", "echo b", &["a"]).enabled = false;
        fx.task("c", "echo c", &["b"]);

        let report = fx.run(RunContext::new());

        assert_eq!(report.completed, HashSet::from(["a".to_string()]));
        assert_eq!(report.outcome("b"), Some(&TaskOutcome::Skipped));
        assert_eq!(
            report.outcome("c"),
            Some(&TaskOutcome::Blocked(vec![UnmetDependency::Disabled(
                "b".to_string()
            )]))
        );
        assert_eq!(report.attempted(), vec!["a"]);
        assert!(report.is_success());
    }

    #[test]
    fn test_skip_policy_propagates() {
        let mut fx = Fixture::new();
        fx.task("b", "echo b", &[]).enabled = false;
        fx.task("c", "echo c", &["b"]);
        fx.task("d", "echo d", &["c"]);

        let report = fx.run(
            RunContext::new().with_disabled_dependency_policy(DisabledDependencyPolicy::Skip),
        );

        assert_eq!(report.outcome("c"), Some(&TaskOutcome::Skipped));
        assert_eq!(report.outcome("d"), Some(&TaskOutcome::Skipped));
        assert!(report.completed.is_empty());
        assert!(report.is_success());
    }

    #[test]
    fn test_abort_policy_stops_run() {
        let mut fx = Fixture::new();
        fx.task("b", "echo b", &[]).enabled = false;
        fx.task("c", "echo c", &["b"]);
        fx.task("e", "echo e", &[]);

        let report = fx.run(
            RunContext::new().with_disabled_dependency_policy(DisabledDependencyPolicy::Abort),
        );

        assert!(report.stopped_early);
        assert_eq!(report.exit_code, FAILURE_EXIT_CODE);
        assert!(report.outcome("e").is_none());
    }

    #[test]
    fn test_failure_stops_run_by_default() {
        let mut fx = Fixture::new();
        fx.task("ok", "true", &[]);
        fx.task("bad", "exit 4", &[]);
        fx.task("later", "echo later", &[]);

        let report = fx.run(RunContext::new());

        assert_eq!(report.exit_code, 4);
        assert!(report.stopped_early);
        assert_eq!(report.evaluated(), vec!["ok", "bad"]);
        assert!(report.outcome("later").is_none());
    }

    #[test]
    fn test_continue_on_failure() {
        let mut fx = Fixture::new();
        fx.task("bad", "echo nope >&2; exit 4", &[]);
        fx.task("independent", "echo fine", &[]);
        fx.task("dependent", "echo never", &["bad"]);

        let report = fx.run(RunContext::new().with_continue_on_failure(true));

        assert_eq!(
            report.outcome("bad"),
            Some(&TaskOutcome::Failed {
                exit_code: 4,
                stderr: "nope\n".to_string()
            })
        );
        assert_eq!(report.outcome("independent"), Some(&TaskOutcome::Succeeded));
        assert!(matches!(report.outcome("dependent"), Some(TaskOutcome::Blocked(_))));
        assert_eq!(report.exit_code, 0);
        assert!(!report.stopped_early);
    }

    #[test]
    fn test_unknown_dependency_is_gate_failure() {
        let mut fx = Fixture::new();
        fx.task("t", "echo t", &["ghost"]);

        let report = fx.run(RunContext::new());

        assert_eq!(
            report.outcome("t"),
            Some(&TaskOutcome::Blocked(vec![UnmetDependency::Unknown(
                "ghost".to_string()
            )]))
        );
        assert!(report.is_success());
    }

    #[test]
    fn test_template_error_is_a_failure() {
        let mut fx = Fixture::new();
        fx.task("t", "echo {missing}", &[]);
        fx.task("after", "echo after", &[]);

        let report = fx.run(RunContext::new());

        assert!(matches!(
            report.outcome("t"),
            Some(TaskOutcome::Failed { exit_code: FAILURE_EXIT_CODE, .. })
        ));
        assert!(report.outcome("after").is_none());
    }

    #[test]
    fn test_disabled_task_writes_no_log() {
        let mut fx = Fixture::new();
        fx.task("off", "echo off", &[]).enabled = false;

        let report = fx.run(RunContext::new());

        assert!(report.completed.is_empty());
        assert!(!fx.log_path().exists());
    }

    #[test]
    fn test_relative_working_dir_is_made_absolute() {
        let resolved = absolute_dir(Path::new("sub/dir")).unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, env::current_dir().unwrap().join("sub/dir"));

        let fixed = absolute_dir(Path::new("/already/absolute")).unwrap();
        assert_eq!(fixed, PathBuf::from("/already/absolute"));
    }
}
