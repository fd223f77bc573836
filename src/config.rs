//! Application configuration
//!
//! Defaults are embedded from `config.toml`; selected values can be
//! overridden from the environment or a `.env` file.

use crate::error::AppError;
use crate::generation::SessionOptions;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;
use url::Url;

const CONFIG_TOML: &str = include_str!("../config.toml");

const ENDPOINT_ENV: &str = "AI_VIDEO_TOOLS_ENDPOINT";
const REQUEST_TIMEOUT_ENV: &str = "AI_VIDEO_TOOLS_REQUEST_TIMEOUT_SECS";
const LOG_ENV: &str = "AI_VIDEO_TOOLS_LOG";

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Config {
    pub(crate) completion: CompletionConfig,
    pub(crate) generation: GenerationConfig,
    pub(crate) logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CompletionConfig {
    pub(crate) endpoint: String,
    pub(crate) connect_timeout_secs: u64,
    /// Limit for a whole generation; absent means no limit
    pub(crate) request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GenerationConfig {
    pub(crate) initial_temperature: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoggingConfig {
    pub(crate) level: String,
}

impl Config {
    /// Parse configuration from TOML text
    pub(crate) fn from_toml(text: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply an override looked up by environment variable name
    pub(crate) fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), AppError> {
        if let Some(endpoint) = lookup(ENDPOINT_ENV) {
            self.completion.endpoint = endpoint;
        }
        if let Some(raw) = lookup(REQUEST_TIMEOUT_ENV) {
            let secs = raw.trim().parse::<u64>().map_err(|e| {
                AppError::Config(format!("{} must be a number of seconds: {}", REQUEST_TIMEOUT_ENV, e))
            })?;
            // 0 turns the limit off
            self.completion.request_timeout_secs = (secs > 0).then_some(secs);
        }
        if let Some(level) = lookup(LOG_ENV) {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Parsed completion endpoint
    pub(crate) fn endpoint(&self) -> Result<Url, AppError> {
        let url = Url::parse(&self.completion.endpoint)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(AppError::Config(format!(
                "Completion endpoint must use http or https, got {}",
                other
            ))),
        }
    }

    pub(crate) fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.completion.connect_timeout_secs)
    }

    pub(crate) fn session_options(&self) -> SessionOptions {
        SessionOptions {
            initial_temperature: self.generation.initial_temperature,
            request_timeout: self.completion.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Load the embedded configuration with environment overrides applied
pub(crate) fn load_config() -> Result<Config, AppError> {
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded environment from {:?}", path);
    }

    let mut config = Config::from_toml(CONFIG_TOML)?;
    config.apply_overrides(|name| std::env::var(name).ok())?;
    // Fail early on a bad endpoint
    config.endpoint()?;
    Ok(config)
}
