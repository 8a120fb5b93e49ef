//! Task registry
//!
//! Every task of a script is built before any of them runs, so the engine can
//! look at a dependency's `enabled` flag no matter where it is declared.
//! Tasks are stored in declaration order with a separate name index.

use crate::config::{load_definitions, Script, TaskDefinition};
use crate::error::ConfigResult;
use crate::runner::Task;
use std::collections::HashMap;
use std::path::Path;

/// Name to task lookup that remembers declaration order
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
}

impl TaskRegistry {
    /// Build a registry from definitions in declaration order
    ///
    /// Every task runs in `working_dir`, or its own `dir` resolved against it.
    pub fn from_definitions(definitions: Vec<(String, TaskDefinition)>, working_dir: &Path) -> Self {
        let mut registry = TaskRegistry::default();
        for (name, definition) in definitions {
            registry.insert(Task::from_definition(name, definition, working_dir));
        }
        registry
    }

    /// Validate a loaded script and build its registry
    ///
    /// `working_dir` overrides the script's own directory.
    pub fn from_script(script: &Script, working_dir: Option<&Path>) -> ConfigResult<Self> {
        let definitions = load_definitions(&script.tasks)?;
        Ok(Self::from_definitions(
            definitions,
            working_dir.unwrap_or(&script.dir),
        ))
    }

    /// Add a task; a task with the same name is replaced in place
    pub fn insert(&mut self, task: Task) {
        match self.index.get(&task.name) {
            Some(&slot) => self.tasks[slot] = task,
            None => {
                self.index.insert(task.name.clone(), self.tasks.len());
                self.tasks.push(task);
            }
        }
    }

    /// Look up a task by name
    pub fn get(&self, name: &str) -> Option<&Task> {
        self.index.get(name).map(|&slot| &self.tasks[slot])
    }

    /// Look up a task by name for modification
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Task> {
        let slot = *self.index.get(name)?;
        self.tasks.get_mut(slot)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Tasks in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Task names in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
