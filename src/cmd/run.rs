//! The localization run: `lingo run`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use lingo::exit::{self, ExitOutcome};
use lingo::flags::RunArgs;
use lingo::orchestrator::Orchestrator;
use lingo::pipeline::ProjectPipeline;
use lingo::telemetry::{self, Telemetry};

pub async fn cmd_run(project_dir: PathBuf, args: &RunArgs) -> ExitCode {
    let telemetry: Arc<dyn Telemetry> = Arc::from(telemetry::from_env());
    let orchestrator =
        Orchestrator::new(Arc::new(ProjectPipeline::new(project_dir))).with_telemetry(telemetry);

    match orchestrator.run(args).await {
        ExitOutcome::Success => exit::graceful(orchestrator.telemetry()).await,
        ExitOutcome::Failure => exit::hard(),
    }
}
