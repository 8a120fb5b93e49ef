//! Append-only execution log
//!
//! Every executed task appends one entry. Skipped tasks write nothing.

use crate::error::{ExecResult, ExecutionError};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";
const LINE_PREFIX: &str = "  | ";
const SEPARATOR: &str = "----------------------------------------";

/// Handle to the on-disk execution log
#[derive(Debug, Clone)]
pub struct ExecutionLog {
    path: PathBuf,
}

/// One executed task, as recorded in the log
#[derive(Debug, Clone)]
pub struct LogEntry<'a> {
    pub task: &'a str,
    pub timestamp: DateTime<Local>,
    pub command: &'a str,
    pub stdout: &'a str,
    pub stderr: &'a str,
    pub exit_code: i32,
}

impl ExecutionLog {
    pub fn new(path: PathBuf) -> Self {
        ExecutionLog { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry
    ///
    /// The entry is rendered up front and written in one call; the file is
    /// flushed and closed before returning, on both the success and error paths.
    pub fn append(&self, entry: &LogEntry<'_>) -> ExecResult<()> {
        let rendered = entry.render();
        let log_error = |e: std::io::Error| ExecutionError::Log {
            path: self.path.clone(),
            error: e.to_string(),
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(log_error)?;

        let mut writer = BufWriter::new(file);
        let written = writer.write_all(rendered.as_bytes());
        let flushed = writer.flush();
        written.and(flushed).map_err(log_error)
    }
}

impl LogEntry<'_> {
    /// Render the entry as text
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "[{}] task '{}'",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.task
        );
        let _ = writeln!(out, "command: {}", self.command);

        out.push_str("stdout:\n");
        push_prefixed(&mut out, self.stdout);

        if !self.stderr.is_empty() {
            out.push_str("stderr:\n");
            push_prefixed(&mut out, self.stderr);
        }

        let _ = writeln!(out, "exit code: {}", self.exit_code);
        out.push_str(SEPARATOR);
        out.push('\n');
        out
    }
}

fn push_prefixed(out: &mut String, text: &str) {
    for line in text.lines() {
        out.push_str(LINE_PREFIX);
        out.push_str(line);
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn entry<'a>(task: &'a str, stdout: &'a str, stderr: &'a str) -> LogEntry<'a> {
        LogEntry {
            task,
            timestamp: Local::now(),
            command: "echo hi",
            stdout,
            stderr,
            exit_code: 0,
        }
    }

    #[test]
    fn test_render_prefixes_output_lines() {
        let text = entry("t1", "one\ntwo\n", "").render();
        assert!(text.contains("task 't1'"));
        assert!(text.contains("command: echo hi"));
        assert!(text.contains("  | one\n  | two\n"));
        assert!(!text.contains("stderr:"));
        assert!(text.ends_with(&format!("{}\n", SEPARATOR)));
    }

    #[test]
    fn test_render_includes_stderr_when_present() {
        let text = entry("t1", "", "bad thing").render();
        assert!(text.contains("stderr:\n  | bad thing\n"));
    }

    #[test]
    fn test_append_accumulates_entries() {
        let temp_dir = TempDir::new().unwrap();
        let log = ExecutionLog::new(temp_dir.path().join("run.log"));

        log.append(&entry("first", "a", "")).unwrap();
        log.append(&entry("second", "b", "")).unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let first = contents.find("task 'first'").unwrap();
        let second = contents.find("task 'second'").unwrap();
        assert!(first < second);
        assert_eq!(contents.matches(SEPARATOR).count(), 2);
    }

    #[test]
    fn test_append_to_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let log = ExecutionLog::new(temp_dir.path().join("no").join("such").join("run.log"));
        let result = log.append(&entry("t", "", ""));
        assert!(matches!(result, Err(ExecutionError::Log { .. })));
    }
}
