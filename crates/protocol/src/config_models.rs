//! Service configuration models for `reelforge.toml`.
//!
//! This module defines the structure of the configuration file read once at
//! process start. Every field has a default, so an empty file (or no file at
//! all) yields a runnable local configuration.

use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;

/// Represents all settings from `reelforge.toml`.
///
/// # Example
///
/// ```toml
/// [server]
/// port = 8000
///
/// [storage]
/// output_dir = "backend/outputs"
/// artifact_ttl_secs = 86400
///
/// [pexels]
/// average_clip_secs = 8
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub pexels: PexelsConfig,
    pub tools: ToolsConfig,
    pub pipeline: PipelineConfig,
}

/// HTTP listener settings.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
    /// Largest accepted multipart body, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost".to_string(),
            ],
            max_upload_bytes: 512 * 1024 * 1024,
        }
    }
}

/// Where intermediate and published files live.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Durable directory holding published videos.
    pub output_dir: PathBuf,

    /// Parent of per-run temporary directories. `None` uses the system
    /// temporary directory.
    pub work_root: Option<PathBuf>,

    /// Published videos older than this are removed by the sweeper.
    /// `None` keeps them forever.
    pub artifact_ttl_secs: Option<u64>,

    /// How often the sweeper runs.
    pub sweep_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            work_root: None,
            artifact_ttl_secs: None,
            sweep_interval_secs: 600,
        }
    }
}

/// Stock-video search settings.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PexelsConfig {
    /// API key. Usually supplied through `PEXELS_API_KEY` rather than the file.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub api_url: String,
    /// Assumed length of one stock clip, used to size the search.
    pub average_clip_secs: u64,
    pub min_width: u32,
    pub min_height: u32,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for PexelsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.pexels.com/videos/search".to_string(),
            average_clip_secs: 8,
            min_width: 1080,
            min_height: 1920,
            request_timeout_secs: 60,
            connect_timeout_secs: 5,
        }
    }
}

/// External programs invoked by the capability adapters.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
    pub edge_tts: String,
    pub whisper: String,
    pub whisper_model: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            edge_tts: "edge-tts".to_string(),
            whisper: "whisper".to_string(),
            whisper_model: "tiny".to_string(),
        }
    }
}

/// Orchestrator tuning.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capacity of each run's progress channel.
    pub event_buffer: usize,

    /// Finished run snapshots older than this are forgotten.
    pub run_retention_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            event_buffer: 32,
            run_retention_secs: 3600,
        }
    }
}
