//! Manual reconciliation trigger.
//!
//! The sweep normally runs on the scheduler's interval, but it is also
//! exposed as a callable endpoint so operators (or an external cron) can
//! force a pass. Overlap with the scheduled sweep is safe: every transition
//! the engine performs is a compare-and-swap.

use axum::{Json, extract::State};

use crate::{AppState, engine::SweepReport, error::AppError};

/// Run one reconciliation sweep and return its report.
///
/// # Endpoint
///
/// `POST /api/v1/reconciliation/run`
///
/// # Response (200)
///
/// ```json
/// {
///   "submitted": 3,
///   "settled": 2,
///   "failed": 0,
///   "skipped": 1,
///   "abandoned": 0,
///   "errors": []
/// }
/// ```
pub async fn run_sweep(State(state): State<AppState>) -> Result<Json<SweepReport>, AppError> {
    let report = state.engine.sweep().await?;

    Ok(Json(report))
}
