use std::time::Duration;

use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::AppError;
use crate::services::gc::{self, SweepReport};
use crate::state::AppState;

/// Runs a garbage collection sweep over stored assets.
#[utoipa::path(
    post,
    path = "/admin/gc",
    tag = "Admin",
    operation_id = "runGarbageCollection",
    summary = "Delete assets no release references",
    description = "Scans asset rows older than the configured grace period, removes those no release references and deletes their blobs from storage.",
    responses(
        (status = 200, description = "Sweep finished", body = SweepReport),
    ),
)]
#[instrument(skip(state))]
pub async fn run_gc(State(state): State<AppState>) -> Result<Json<SweepReport>, AppError> {
    let grace = Duration::from_secs(state.config.gc.grace_period_secs);
    let report = gc::sweep(&state.db, &state.assets, grace).await?;
    Ok(Json(report))
}
