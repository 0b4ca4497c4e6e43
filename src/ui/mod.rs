//! Terminal output for `lingo run`.

pub mod icons;
pub mod progress;

pub use progress::TaskProgress;

use console::{Term, style};
use std::collections::BTreeMap;

use crate::context::{TaskId, TaskOutcome};
use crate::errors::RunError;
use icons::{CHECK, CROSS, GLOBE, SKIP, SPARKLE};

/// What the orchestrator shows the user. Rendering never fails a run.
pub trait Renderer: Send + Sync {
    /// Clear the screen and print the banner and hero text.
    fn intro(&self);

    fn summary(&self, results: &BTreeMap<TaskId, TaskOutcome>);

    fn error(&self, error: &RunError);
}

pub struct TerminalRenderer {
    term: Term,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    fn line(&self, msg: impl AsRef<str>) {
        if self.term.write_line(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }

    pub fn spacer(&self) {
        self.line("");
    }

    pub fn banner(&self) {
        self.line(format!(
            "{}",
            style(format!("{}lingo v{}", GLOBE, env!("CARGO_PKG_VERSION")))
                .cyan()
                .bold()
        ));
    }

    pub fn hero(&self) {
        self.line(format!(
            "{}",
            style("Localize your project: plan, translate and write every target locale.").dim()
        ));
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for TerminalRenderer {
    fn intro(&self) {
        if self.term.is_term() {
            let _ = self.term.clear_screen();
        }
        self.banner();
        self.hero();
        self.spacer();
    }

    fn summary(&self, results: &BTreeMap<TaskId, TaskOutcome>) {
        self.spacer();
        if results.is_empty() {
            self.line(format!("{}", style("Nothing to localize.").dim()));
            self.spacer();
            return;
        }
        self.line(format!("{}", style("Localization summary").underlined()));
        let mut keys = 0;
        let mut failed = 0;
        for (id, outcome) in results {
            match outcome {
                TaskOutcome::Localized { keys: n } => {
                    keys += n;
                    self.line(format!("  {}{} {}", CHECK, id, style(format!("({} keys)", n)).dim()));
                }
                TaskOutcome::Skipped => {
                    self.line(format!("  {}{} {}", SKIP, id, style("(up to date)").dim()));
                }
                TaskOutcome::Failed { error } => {
                    failed += 1;
                    self.line(format!("  {}{} {}", CROSS, id, style(error).red()));
                }
            }
        }
        self.spacer();
        if failed == 0 {
            self.line(format!(
                "{}Localized {} keys across {} tasks",
                SPARKLE,
                style(keys).green().bold(),
                results.len()
            ));
        } else {
            self.line(format!(
                "{}{} of {} tasks failed",
                CROSS,
                style(failed).red().bold(),
                results.len()
            ));
        }
        self.spacer();
    }

    fn error(&self, error: &RunError) {
        eprintln!("\n{}{}", CROSS, style(error).red());
    }
}
