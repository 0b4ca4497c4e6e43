//! Process exit: failures exit fast, successes exit clean.

use std::io::Write;
use std::process::ExitCode;

use crate::telemetry::Telemetry;

/// Terminal state of one orchestrator pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    Failure,
}

impl ExitOutcome {
    pub fn code(self) -> i32 {
        match self {
            ExitOutcome::Success => 0,
            ExitOutcome::Failure => 1,
        }
    }
}

/// Flush telemetry and stdout, then let `main` return normally.
pub async fn graceful(telemetry: &dyn Telemetry) -> ExitCode {
    telemetry.flush().await;
    let _ = std::io::stdout().flush();
    ExitCode::SUCCESS
}

/// Terminate immediately with status 1. Destructors do not run.
pub fn hard() -> ! {
    std::process::exit(ExitOutcome::Failure.code())
}
