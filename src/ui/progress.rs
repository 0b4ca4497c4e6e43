use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::context::TaskOutcome;

/// Progress bar for the execute phase: one tick per finished task.
pub struct TaskProgress {
    bar: ProgressBar,
}

impl TaskProgress {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:.bold.dim} {spinner} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("progress bar template is a valid static string")
                .progress_chars("█▓▒░"),
        );
        bar.set_prefix("Localizing");
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn task_done(&self, task: &str, outcome: &TaskOutcome) {
        let status = match outcome {
            TaskOutcome::Localized { keys } => format!("{} keys", keys),
            TaskOutcome::Skipped => "up to date".to_string(),
            TaskOutcome::Failed { .. } => "failed".to_string(),
        };
        self.bar
            .set_message(format!("{} {}", task, style(format!("({})", status)).dim()));
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
