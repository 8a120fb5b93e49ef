//! Taskrun - a declarative YAML task runner
//!
//! A build script maps task names to shell commands. Tasks run one at a
//! time in declaration order, each gated on its dependencies having
//! completed, with every execution recorded in an append-only log.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;

// Re-export commonly used types
pub use error::{Result, TaskrunError};
pub use runner::{run_script, Engine, RunContext, RunReport, Task, TaskOutcome, TaskRegistry};

/// Current version of Taskrun
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
