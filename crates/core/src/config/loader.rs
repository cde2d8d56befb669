//! Configuration file loader.

use crate::config::error::{ConfigError, ConfigResult};
use rf_protocol::ServiceConfig;
use std::path::Path;
use tracing::debug;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "reelforge.toml";

/// Environment variable holding the Pexels API key.
pub const PEXELS_API_KEY_ENV: &str = "PEXELS_API_KEY";

/// Loads the service configuration.
///
/// With `Some(path)` the file must exist. With `None`, [`DEFAULT_CONFIG_FILE`]
/// is read if present and defaults are used otherwise. The
/// `PEXELS_API_KEY` environment variable, when set, replaces the key from
/// the file.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - The file exists but cannot be read
/// - The TOML is malformed
/// - A value is out of range
///
/// # Example
///
/// ```rust,no_run
/// use rf_core::config::load_config;
///
/// let config = load_config(None)?;
/// println!("Listening on {}:{}", config.server.host, config.server.port);
/// # Ok::<(), rf_core::config::ConfigError>(())
/// ```
pub fn load_config(path: Option<&Path>) -> ConfigResult<ServiceConfig> {
    let config = match path {
        Some(path) => read_config_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                read_config_file(default_path)?
            } else {
                ServiceConfig::default()
            }
        }
    };

    let config = apply_env_overrides(config, |key| std::env::var(key).ok());
    validate(&config)?;
    Ok(config)
}

fn read_config_file(path: &Path) -> ConfigResult<ServiceConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let config: ServiceConfig = toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), "Loaded configuration file");
    Ok(config)
}

/// Overlay environment values onto `config`.
///
/// `lookup` maps a variable name to its value; blank values are ignored.
pub fn apply_env_overrides<F>(mut config: ServiceConfig, lookup: F) -> ServiceConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup(PEXELS_API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
        config.pexels.api_key = Some(key.trim().to_string());
    }
    config
}

/// Reject values no run could work with.
pub fn validate(config: &ServiceConfig) -> ConfigResult<()> {
    fn invalid(field: &'static str, reason: &str) -> ConfigError {
        ConfigError::InvalidConfig {
            field,
            reason: reason.to_string(),
        }
    }

    if config.server.host.trim().is_empty() {
        return Err(invalid("server.host", "must not be empty"));
    }
    if config.server.max_upload_bytes == 0 {
        return Err(invalid("server.max_upload_bytes", "must be greater than zero"));
    }
    if config.storage.sweep_interval_secs == 0 {
        return Err(invalid("storage.sweep_interval_secs", "must be greater than zero"));
    }
    if config.pexels.average_clip_secs == 0 {
        return Err(invalid("pexels.average_clip_secs", "must be greater than zero"));
    }
    if config.pexels.min_width == 0 || config.pexels.min_height == 0 {
        return Err(invalid("pexels.min_width/min_height", "must be greater than zero"));
    }
    if config.pipeline.event_buffer == 0 {
        return Err(invalid("pipeline.event_buffer", "must be greater than zero"));
    }
    if config.pipeline.run_retention_secs == 0 {
        return Err(invalid("pipeline.run_retention_secs", "must be greater than zero"));
    }
    Ok(())
}
