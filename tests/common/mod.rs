//! Common test utilities

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use taskrun::runner::{RunContext, Verbosity};
use tempfile::TempDir;

/// Create a temporary directory with a build script
pub fn create_test_script(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let script_path = temp_dir.path().join("build.yml");
    fs::write(&script_path, content).unwrap();
    (temp_dir, script_path)
}

/// A run context that prints nothing
pub fn quiet_context() -> RunContext {
    RunContext::new().with_verbosity(Verbosity::Silent)
}

/// Contents of the default execution log next to the script
pub fn read_log(temp_dir: &TempDir) -> String {
    fs::read_to_string(temp_dir.path().join(taskrun::runner::DEFAULT_LOG_FILE)).unwrap_or_default()
}
