//! Run telemetry: named events with a JSON payload, keyed by the auth id.
//!
//! Sinks swallow their own failures. Nothing here can fail a run.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

pub const RUN_START: &str = "run.start";
pub const RUN_SUCCESS: &str = "run.success";
pub const RUN_ERROR: &str = "run.error";

/// Correlation id used when the auth id was never resolved.
pub const UNKNOWN_AUTH_ID: &str = "unknown";

/// Env var that disables telemetry when set to anything but `0`/`false`.
pub const DO_NOT_TRACK_ENV: &str = "DO_NOT_TRACK";

#[async_trait]
pub trait Telemetry: Send + Sync {
    async fn track(&self, auth_id: &str, event: &str, payload: Value);

    /// Push out anything buffered. Called once before a graceful exit.
    async fn flush(&self) {}
}

/// Drops every event.
pub struct NoopTelemetry;

#[async_trait]
impl Telemetry for NoopTelemetry {
    async fn track(&self, _auth_id: &str, _event: &str, _payload: Value) {}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub distinct_id: String,
    pub event: String,
    pub properties: Value,
}

/// Appends one JSON object per line to a local event journal.
pub struct JsonlTelemetry {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlTelemetry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".lingo").join("telemetry").join("events.jsonl"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, event: &TelemetryEvent) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');
        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl Telemetry for JsonlTelemetry {
    async fn track(&self, auth_id: &str, event: &str, payload: Value) {
        let record = TelemetryEvent {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            distinct_id: auth_id.to_string(),
            event: event.to_string(),
            properties: payload,
        };
        if let Err(e) = self.append(&record).await {
            debug!(error = %e, event, path = %self.path.display(), "Dropped telemetry event");
        }
    }
}

fn tracking_disabled(value: Option<String>) -> bool {
    value
        .map(|v| !matches!(v.trim().to_lowercase().as_str(), "" | "0" | "false"))
        .unwrap_or(false)
}

/// Pick the sink for this process: the journal, unless `DO_NOT_TRACK` is set
/// or there is no home directory.
pub fn from_env() -> Box<dyn Telemetry> {
    if tracking_disabled(std::env::var(DO_NOT_TRACK_ENV).ok()) {
        debug!("Telemetry disabled by {}", DO_NOT_TRACK_ENV);
        return Box::new(NoopTelemetry);
    }
    match JsonlTelemetry::default_path() {
        Some(path) => Box::new(JsonlTelemetry::new(path)),
        None => Box::new(NoopTelemetry),
    }
}
