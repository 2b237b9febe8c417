//! Periodic trigger for the reconciliation sweep.
//!
//! A single tokio task invokes the engine on a fixed interval. The trigger is
//! at-least-once: the same sweep is also reachable through the manual
//! endpoint, and a tick may overlap a still-running manual invocation. That
//! is safe — every transition the engine performs is a compare-and-swap, so
//! re-entry degrades to no-ops.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::engine::ReconciliationEngine;

/// Spawn the sweep loop.
///
/// The first tick fires immediately, then every `interval`. Ticks missed
/// while a slow sweep runs are delayed rather than bursted.
///
/// The returned handle is detached by the caller; the loop runs for the
/// lifetime of the process.
pub fn spawn(engine: Arc<ReconciliationEngine>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match engine.sweep().await {
                Ok(report) => {
                    tracing::info!(
                        submitted = report.submitted,
                        settled = report.settled,
                        failed = report.failed,
                        skipped = report.skipped,
                        abandoned = report.abandoned,
                        errors = report.errors.len(),
                        "reconciliation sweep complete"
                    );
                }
                Err(e) => {
                    // Loading the work lists failed; nothing was mutated.
                    tracing::error!("reconciliation sweep aborted: {e}");
                }
            }
        }
    })
}
