//! Run status and cancellation.

use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rf_protocol::RunSnapshot;
use uuid::Uuid;

fn parse_run_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Run not found.".to_string()))
}

/// GET /api/v1/runs - every known run, most recent first
pub async fn list_runs(State(state): State<AppState>) -> Json<Vec<RunSnapshot>> {
    Json(state.runs.list().await)
}

/// GET /api/v1/runs/:run_id - one run's snapshot
pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunSnapshot>, ApiError> {
    let id = parse_run_id(&run_id)?;
    state
        .runs
        .snapshot(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Run not found.".to_string()))
}

/// DELETE /api/v1/runs/:run_id - cancel an in-flight run
///
/// Answers 202 once cancellation is requested; the run's stream then ends
/// with an error event.
pub async fn cancel_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_run_id(&run_id)?;
    state.runs.cancel(id).await?;
    Ok(StatusCode::ACCEPTED)
}
