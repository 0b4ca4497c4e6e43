//! Watch mode: re-run plan and execute whenever a source file changes.

use anyhow::Result;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

use super::Pipeline;
use crate::context::RunContext;
use crate::ui::icons::EYES;

/// Content hash of every planned source file. Missing files hash to `None`.
pub type Fingerprint = BTreeMap<PathBuf, Option<String>>;

pub fn fingerprint(ctx: &RunContext) -> Fingerprint {
    ctx.tasks
        .iter()
        .map(|task| {
            let digest = std::fs::read(&task.source_path)
                .ok()
                .map(|bytes| format!("{:x}", Sha256::digest(&bytes)));
            (task.source_path.clone(), digest)
        })
        .collect()
}

/// One plan + execute pass. Failures are logged and the loop keeps going.
async fn rerun<P: Pipeline + ?Sized>(pipeline: &P, ctx: &mut RunContext) {
    if let Err(e) = pipeline.plan(ctx).await {
        warn!(error = %format!("{:#}", e), "Watch: plan failed");
        return;
    }
    if let Err(e) = pipeline.execute(ctx).await {
        warn!(error = %format!("{:#}", e), "Watch: execute failed");
        return;
    }
    let (localized, skipped, failed) = ctx.tally();
    info!(localized, skipped, failed, "Watch: pass complete");
}

/// Poll source files every debounce interval until Ctrl-C.
pub async fn run<P: Pipeline + ?Sized>(pipeline: &P, ctx: &mut RunContext) -> Result<()> {
    run_until(pipeline, ctx, interrupted()).await
}

/// Resolves on the first Ctrl-C. If the handler cannot be installed it never resolves.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Watch: could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Watch loop that stops when `shutdown` resolves, including in the middle
/// of a re-run.
pub async fn run_until<P, F>(pipeline: &P, ctx: &mut RunContext, shutdown: F) -> Result<()>
where
    P: Pipeline + ?Sized,
    F: Future<Output = ()> + Send,
{
    tokio::pin!(shutdown);
    let interval = ctx.flags.debounce;
    let mut last = fingerprint(ctx);
    println!(
        "{}Watching {} source file(s) for changes. Press Ctrl+C to stop.",
        EYES,
        last.len()
    );

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(interval) => {}
        }
        let current = fingerprint(ctx);
        if current == last {
            continue;
        }
        info!("Watch: source change detected");
        tokio::select! {
            _ = &mut shutdown => break,
            _ = rerun(pipeline, ctx) => {}
        }
        last = fingerprint(ctx);
    }
    println!("\nStopped watching.");
    Ok(())
}
