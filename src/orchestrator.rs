//! Drives one `lingo run` invocation.
//!
//! ```text
//! validate → [debug gate] → intro → setup → auth id → run.start
//!          → plan → execute → summary → [success sound] → run.success → [watch]
//! ```
//!
//! Every failure up to and including the summary lands in one place: the
//! failure sound (with `--sound`), a `run.error` event, and `ExitOutcome::Failure`.

use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use crate::context::RunContext;
use crate::errors::{PhaseKind, RunError};
use crate::exit::ExitOutcome;
use crate::flags::RunArgs;
use crate::gate::{ConfirmGate, StdinGate};
use crate::notify::{AudioNotifier, Notify, SoundKind};
use crate::pipeline::Pipeline;
use crate::telemetry::{
    NoopTelemetry, RUN_ERROR, RUN_START, RUN_SUCCESS, Telemetry, UNKNOWN_AUTH_ID,
};
use crate::ui::{Renderer, TerminalRenderer};

/// Upper bound on how long a telemetry call may hold up the run.
pub const TELEMETRY_TIMEOUT: Duration = Duration::from_secs(2);

pub struct Orchestrator {
    pipeline: Arc<dyn Pipeline>,
    notifier: Arc<dyn Notify>,
    telemetry: Arc<dyn Telemetry>,
    renderer: Arc<dyn Renderer>,
    gate: Arc<dyn ConfirmGate>,
}

impl Orchestrator {
    /// Orchestrator with the terminal renderer, the audio notifier, a
    /// stdin debug gate and no telemetry.
    pub fn new(pipeline: Arc<dyn Pipeline>) -> Self {
        Self {
            pipeline,
            notifier: Arc::new(AudioNotifier::new()),
            telemetry: Arc::new(NoopTelemetry),
            renderer: Arc::new(TerminalRenderer::new()),
            gate: Arc::new(StdinGate),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notify>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_gate(mut self, gate: Arc<dyn ConfirmGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn telemetry(&self) -> &dyn Telemetry {
        self.telemetry.as_ref()
    }

    pub async fn run(&self, args: &RunArgs) -> ExitOutcome {
        let mut auth_id: Option<String> = None;
        match self.first_pass(args, &mut auth_id).await {
            Ok(mut ctx) => self.succeed(&mut ctx, auth_id.as_deref()).await,
            Err(err) => self.fail(&err, args.sound, auth_id.as_deref()).await,
        }
    }

    /// Everything between flag validation and the summary. Any `Err` here is
    /// a failed run.
    async fn first_pass(
        &self,
        args: &RunArgs,
        auth_id: &mut Option<String>,
    ) -> Result<RunContext, RunError> {
        let flags = args.validate()?;

        if flags.debug {
            self.gate.confirm().await.map_err(RunError::Gate)?;
        }

        self.renderer.intro();

        let mut ctx = RunContext::new(flags);
        self.pipeline
            .setup(&mut ctx)
            .await
            .map_err(|e| RunError::phase(PhaseKind::Setup, e))?;

        *auth_id = match self.pipeline.resolve_auth_id(&ctx).await {
            Ok(id) => id,
            Err(e) => {
                debug!(error = %format!("{:#}", e), "Could not resolve auth id");
                None
            }
        };

        self.track(auth_id.as_deref(), RUN_START, snapshot(&ctx)).await;

        self.pipeline
            .plan(&mut ctx)
            .await
            .map_err(|e| RunError::phase(PhaseKind::Plan, e))?;
        self.pipeline
            .execute(&mut ctx)
            .await
            .map_err(|e| RunError::phase(PhaseKind::Execute, e))?;

        self.renderer.summary(&ctx.results);
        Ok(ctx)
    }

    async fn succeed(&self, ctx: &mut RunContext, auth_id: Option<&str>) -> ExitOutcome {
        if ctx.flags.sound {
            self.notifier.notify(SoundKind::Success).await;
        }

        self.track(auth_id, RUN_SUCCESS, snapshot(ctx)).await;

        if ctx.flags.watch
            && let Err(e) = self.pipeline.watch(ctx).await
        {
            // run.success is already out; report locally only.
            let err = RunError::phase(PhaseKind::Watch, e);
            error!(error = %err, "Watch mode stopped");
            self.renderer.error(&err);
            return ExitOutcome::Failure;
        }

        ExitOutcome::Success
    }

    async fn fail(&self, err: &RunError, sound: bool, auth_id: Option<&str>) -> ExitOutcome {
        self.renderer.error(err);
        if sound {
            self.notifier.notify(SoundKind::Failure).await;
        }
        self.track(auth_id, RUN_ERROR, Value::Object(Map::new()))
            .await;
        ExitOutcome::Failure
    }

    async fn track(&self, auth_id: Option<&str>, event: &str, payload: Value) {
        let auth_id = auth_id.unwrap_or(UNKNOWN_AUTH_ID);
        let send = self.telemetry.track(auth_id, event, payload);
        if tokio::time::timeout(TELEMETRY_TIMEOUT, send).await.is_err() {
            debug!(event, "Telemetry timed out");
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// `{config, flags}` payload for run.start / run.success.
fn snapshot(ctx: &RunContext) -> Value {
    let mut payload = Map::new();
    payload.insert("config".to_string(), to_value(&ctx.config));
    payload.insert("flags".to_string(), to_value(&ctx.flags));
    Value::Object(payload)
}
