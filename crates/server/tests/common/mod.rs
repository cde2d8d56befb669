//! Shared helpers for HTTP tests.

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use http_body_util::BodyExt;
use rf_core::capabilities::CapabilitySet;
use rf_protocol::{ServiceConfig, WireEvent};
use rf_server::{build_router, AppState};
use tempfile::TempDir;

pub const BOUNDARY: &str = "reelforge-test-boundary";

/// Router over mock capabilities, storing everything under a temp dir.
pub struct TestApp {
    pub temp: TempDir,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_capabilities(CapabilitySet::mock())
    }

    pub fn with_capabilities(capabilities: CapabilitySet) -> Self {
        Self::build(capabilities, |_| {})
    }

    pub fn with_upload_limit(max_upload_bytes: usize) -> Self {
        Self::build(CapabilitySet::mock(), |config| {
            config.server.max_upload_bytes = max_upload_bytes;
        })
    }

    fn build(capabilities: CapabilitySet, tweak: impl FnOnce(&mut ServiceConfig)) -> Self {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut config = ServiceConfig::default();
        config.storage.output_dir = temp.path().join("outputs");
        config.storage.work_root = Some(temp.path().join("work"));
        tweak(&mut config);

        let state = AppState::from_config(&config, capabilities).expect("build state");
        Self { temp, state }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }
}

/// One multipart part.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, file_name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: video/mp4\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn generate_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/generate")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .expect("build request")
}

pub async fn body_bytes(body: Body) -> Vec<u8> {
    body.collect().await.expect("read body").to_bytes().to_vec()
}

/// Parse the `data:` lines of an SSE body.
pub fn parse_sse(body: &[u8]) -> Vec<WireEvent> {
    String::from_utf8_lossy(body)
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim()).expect("event is JSON"))
        .collect()
}
