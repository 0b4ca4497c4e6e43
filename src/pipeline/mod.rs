//! The phases the orchestrator drives.
//!
//! | Phase | Reads | Writes |
//! |-------|-------|--------|
//! | `setup` | `flags` | `config`, `localizer` |
//! | `plan` | `flags`, `config` | `tasks` |
//! | `execute` | `tasks`, `localizer` | `results` |
//! | `watch` | everything | `tasks`, `results` (repeatedly) |

pub mod messages;
pub mod project;
pub mod watch;

pub use project::ProjectPipeline;

use anyhow::Result;
use async_trait::async_trait;

use crate::context::RunContext;

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn setup(&self, ctx: &mut RunContext) -> Result<()>;

    /// Correlation id for telemetry. Only called after a successful setup.
    async fn resolve_auth_id(&self, ctx: &RunContext) -> Result<Option<String>>;

    async fn plan(&self, ctx: &mut RunContext) -> Result<()>;

    async fn execute(&self, ctx: &mut RunContext) -> Result<()>;

    /// Long-running loop entered after a successful first pass.
    async fn watch(&self, ctx: &mut RunContext) -> Result<()>;
}
