//! Artifact download.

use crate::error::ApiError;
use crate::AppState;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;
use tracing::debug;

/// GET /api/v1/videos/:video_id - stream a published video
///
/// Unknown and malformed ids both answer 404 `{"detail": "Video not found."}`.
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Response, ApiError> {
    let path = state.artifacts.get(&video_id).await?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| ApiError::NotFound("Video not found.".to_string()))?;
    let length = file
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .len();

    debug!(video_id = %video_id, bytes = length, "Serving video");

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (header::CONTENT_LENGTH, length.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{video_id}\""),
            ),
        ],
        body,
    )
        .into_response())
}
