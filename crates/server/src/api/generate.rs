//! Pipeline submission with a Server-Sent Events progress stream.

use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Multipart, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use rf_core::progress::ProgressReceiver;
use rf_protocol::{PipelineRequest, UploadedVideo};
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Interval between keep-alive comments on an idle stream.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Raw multipart fields before validation.
#[derive(Debug, Default)]
struct GenerateForm {
    script: Option<String>,
    voice: Option<String>,
    video_query: Option<String>,
    video_file: Option<UploadedVideo>,
}

impl GenerateForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = GenerateForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "script" => form.script = Some(text(field).await?),
                "voice" => form.voice = Some(text(field).await?),
                "video_query" => form.video_query = Some(text(field).await?),
                "video_file" => {
                    let file_name = field.file_name().map(str::to_string);
                    let bytes = field.bytes().await?;
                    form.video_file = Some(UploadedVideo::new(file_name, bytes));
                }
                other => debug!(field = other, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    fn into_request(self) -> Result<PipelineRequest, ApiError> {
        let request = PipelineRequest::new(
            self.script.unwrap_or_default(),
            self.voice.unwrap_or_default(),
            self.video_query,
            self.video_file,
        )?;
        Ok(request)
    }
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    Ok(field.text().await?)
}

/// POST /api/v1/generate - start a pipeline and stream its progress
///
/// Validation failures are answered with 400 and an oversized body with 413,
/// both before any stream exists.
/// Otherwise the response is `text/event-stream`, one `data:` line per
/// progress event, ending after the terminal event. The run id is returned
/// in the `x-run-id` header.
pub async fn generate_video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let request = GenerateForm::read(multipart).await?.into_request()?;

    let (run_id, progress) = state.runs.start(request).await;
    info!(run_id = %run_id, "Streaming pipeline progress");

    let sse = Sse::new(event_stream(progress)).keep_alive(
        KeepAlive::new().interval(KEEP_ALIVE_INTERVAL),
    );
    Ok(([("x-run-id", run_id.to_string())], sse))
}

fn event_stream(
    mut progress: ProgressReceiver,
) -> impl futures::Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        while let Some(event) = progress.recv().await {
            match serde_json::to_string(&event.to_wire()) {
                Ok(json) => yield Ok(Event::default().data(json)),
                Err(e) => warn!(error = %e, "Failed to serialize progress event"),
            }
        }
    }
}
