//! Configuration loading.
//!
//! Settings come from an optional TOML file, with the Pexels API key
//! overlaid from the environment once at startup.

pub mod error;
pub mod loader;

pub use error::{ConfigError, ConfigResult};
pub use loader::{apply_env_overrides, load_config, validate, DEFAULT_CONFIG_FILE, PEXELS_API_KEY_ENV};
