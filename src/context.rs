//! Shared state threaded through every phase of one invocation.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ProjectConfig;
use crate::flags::RunFlags;
use crate::localizer::Localizer;

/// Stable identifier of a unit of work: bucket, include pattern and target locale.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(bucket: &str, pattern: &str, target_locale: &str) -> Self {
        Self(format!("{}:{}:{}", bucket, pattern, target_locale))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One planned localization: a source file rendered into one target locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub bucket: String,
    pub pattern: String,
    pub source_locale: String,
    pub target_locale: String,
    pub source_path: PathBuf,
    pub target_path: PathBuf,
}

/// Result of executing a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TaskOutcome {
    /// Keys were sent to the engine and written to the target file.
    Localized { keys: usize },
    /// Nothing needed translating.
    Skipped,
    Failed { error: String },
}

impl TaskOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, TaskOutcome::Failed { .. })
    }
}

/// Mutable record owned by the orchestrator and lent to one phase at a time.
///
/// Phases only append to or replace entries in `tasks` and `results`; nothing
/// is ever removed during a run.
pub struct RunContext {
    pub flags: RunFlags,
    pub config: Option<ProjectConfig>,
    pub results: BTreeMap<TaskId, TaskOutcome>,
    pub tasks: Vec<Task>,
    pub localizer: Option<Arc<dyn Localizer>>,
}

impl RunContext {
    pub fn new(flags: RunFlags) -> Self {
        Self {
            flags,
            config: None,
            results: BTreeMap::new(),
            tasks: Vec::new(),
            localizer: None,
        }
    }

    /// Replace the task with the same id in place, or append it.
    pub fn upsert_task(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
    }

    pub fn record(&mut self, id: TaskId, outcome: TaskOutcome) {
        self.results.insert(id, outcome);
    }

    /// Counts of (localized, skipped, failed) results.
    pub fn tally(&self) -> (usize, usize, usize) {
        self.results
            .values()
            .fold((0, 0, 0), |(ok, skip, fail), outcome| match outcome {
                TaskOutcome::Localized { .. } => (ok + 1, skip, fail),
                TaskOutcome::Skipped => (ok, skip + 1, fail),
                TaskOutcome::Failed { .. } => (ok, skip, fail + 1),
            })
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("flags", &self.flags)
            .field("config", &self.config)
            .field("results", &self.results)
            .field("tasks", &self.tasks)
            .field("localizer", &self.localizer.is_some())
            .finish()
    }
}
