//! Stock footage from the Pexels video search API.

use crate::capabilities::base::{clip_count, CapabilityError, ClipLink, VideoSource};
use async_trait::async_trait;
use futures::StreamExt;
use rf_protocol::PexelsConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("reelforge/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    #[serde(default)]
    video_files: Vec<PexelsVideoFile>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideoFile {
    quality: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    link: String,
}

impl PexelsVideoFile {
    fn quality_rank(&self) -> u8 {
        match self.quality.as_deref() {
            Some("uhd") => 3,
            Some("hd") => 2,
            Some("sd") => 1,
            _ => 0,
        }
    }

    fn pixels(&self) -> u64 {
        u64::from(self.width.unwrap_or(0)) * u64::from(self.height.unwrap_or(0))
    }
}

/// Pick, per video, the best file covering `min_width` x `min_height`.
///
/// Videos without such a file are skipped; result order follows the API.
fn select_clips(response: SearchResponse, min_width: u32, min_height: u32) -> Vec<ClipLink> {
    response
        .videos
        .into_iter()
        .filter_map(|video| {
            let mut files = video.video_files;
            files.sort_by(|a, b| {
                b.quality_rank()
                    .cmp(&a.quality_rank())
                    .then_with(|| b.pixels().cmp(&a.pixels()))
            });
            files
                .into_iter()
                .find(|f| {
                    f.width.unwrap_or(0) >= min_width && f.height.unwrap_or(0) >= min_height
                })
                .map(|f| ClipLink {
                    url: f.link,
                    width: f.width.unwrap_or(0),
                    height: f.height.unwrap_or(0),
                })
        })
        .collect()
}

pub struct PexelsVideoSource {
    http_client: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
    average_clip: Duration,
    min_width: u32,
    min_height: u32,
}

impl PexelsVideoSource {
    /// Build a client from configuration.
    ///
    /// A missing key is not an error here; searches fail with
    /// `CapabilityError::Configuration` instead.
    pub fn new(config: &PexelsConfig) -> Result<Self, CapabilityError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| CapabilityError::Configuration(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            api_url: config.api_url.clone(),
            average_clip: Duration::from_secs(config.average_clip_secs),
            min_width: config.min_width,
            min_height: config.min_height,
        })
    }
}

#[async_trait]
impl VideoSource for PexelsVideoSource {
    async fn search(
        &self,
        query: &str,
        target_duration: Duration,
    ) -> Result<Vec<ClipLink>, CapabilityError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            CapabilityError::Configuration("PEXELS_API_KEY not set".to_string())
        })?;

        let per_page = clip_count(target_duration, self.average_clip);
        let params = [
            ("query", query.to_string()),
            ("per_page", per_page.to_string()),
            ("orientation", "portrait".to_string()),
        ];

        debug!(query, per_page, "Searching Pexels");

        let response = self
            .http_client
            .get(&self.api_url)
            .header(reqwest::header::AUTHORIZATION, api_key)
            .query(&params)
            .send()
            .await
            .map_err(|e| CapabilityError::SourceFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CapabilityError::SourceFetch(format!(
                "Pexels returned {status}: {}",
                body.trim()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::SourceFetch(format!("Malformed search response: {e}")))?;

        let clips = select_clips(body, self.min_width, self.min_height);
        info!(query, requested = per_page, found = clips.len(), "Pexels search finished");
        Ok(clips)
    }

    async fn download(&self, link: &ClipLink, dest: &Path) -> Result<PathBuf, CapabilityError> {
        let response = self
            .http_client
            .get(&link.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| CapabilityError::SourceFetch(e.to_string()))?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| CapabilityError::SourceFetch(format!("{}: {e}", dest.display())))?;

        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| CapabilityError::SourceFetch(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| CapabilityError::SourceFetch(e.to_string()))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| CapabilityError::SourceFetch(e.to_string()))?;

        debug!(url = %link.url, bytes = written, "Downloaded clip");
        Ok(dest.to_path_buf())
    }
}
