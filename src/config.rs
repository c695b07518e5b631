//! Configuration management for ollama-relay
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Every section has defaults, so an empty file (or no file at all) yields a
//! working configuration.

use crate::error::{AppError, AppResult};
use crate::session::StreamOverride;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

// The port ollama clients probe by default
fn default_port() -> u16 {
    11434
}

/// Upstream service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default = "default_request_timeout")]
    request_timeout_seconds: u64,
    #[serde(default = "default_pool_max_idle")]
    pool_max_idle_per_host: usize,
    /// Open a pooled connection in the background before the first request
    #[serde(default = "default_prewarm")]
    prewarm: bool,
}

impl UpstreamConfig {
    /// Create an upstream configuration (used by tests pointing at a mock server)
    pub fn new(base_url: impl Into<String>, request_timeout_seconds: u64) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout_seconds,
            pool_max_idle_per_host: default_pool_max_idle(),
            prewarm: false,
        }
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn request_timeout_seconds(&self) -> u64 {
        self.request_timeout_seconds
    }

    pub fn pool_max_idle_per_host(&self) -> usize {
        self.pool_max_idle_per_host
    }

    pub fn prewarm(&self) -> bool {
        self.prewarm
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
            pool_max_idle_per_host: default_pool_max_idle(),
            prewarm: default_prewarm(),
        }
    }
}

fn default_base_url() -> String {
    "https://pfuner.xyz".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_pool_max_idle() -> usize {
    10
}

fn default_prewarm() -> bool {
    true
}

/// Per-route character budgets
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct LimitsConfig {
    /// Aggregate budget for the high-capability chat route
    #[serde(default = "default_chat_max")]
    pub chat_max_chars: usize,
    /// Aggregate budget for the fallback legacy chat route
    #[serde(default = "default_legacy_chat_max")]
    pub legacy_chat_max_chars: usize,
    /// Last-message cap for both image routes
    #[serde(default = "default_image_max")]
    pub image_max_chars: usize,
    /// Last-message cap for the speech route
    #[serde(default = "default_speech_max")]
    pub speech_max_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            chat_max_chars: default_chat_max(),
            legacy_chat_max_chars: default_legacy_chat_max(),
            image_max_chars: default_image_max(),
            speech_max_chars: default_speech_max(),
        }
    }
}

fn default_chat_max() -> usize {
    8000
}

fn default_legacy_chat_max() -> usize {
    2000
}

fn default_image_max() -> usize {
    1000
}

fn default_speech_max() -> usize {
    500
}

/// Streamed reply framing
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct StreamingConfig {
    /// Characters per content frame
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,
    /// Pause between frames, for clients that choke on bursts
    #[serde(default = "default_frame_delay_ms")]
    pub frame_delay_ms: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_chars: default_chunk_chars(),
            frame_delay_ms: default_frame_delay_ms(),
        }
    }
}

fn default_chunk_chars() -> usize {
    10
}

fn default_frame_delay_ms() -> u64 {
    10
}

/// Session toggles fixed in the config file
///
/// Anything left unset here (and not given on the command line) is asked
/// interactively at startup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<StreamOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<bool>,
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// Called automatically by `from_file()` and `from_str()`.
    pub fn validate(&self) -> AppResult<()> {
        let base_url = &self.upstream.base_url;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "upstream.base_url '{}' must start with 'http://' or 'https://'",
                base_url
            )));
        }

        let timeout = self.upstream.request_timeout_seconds;
        if timeout == 0 || timeout > 300 {
            return Err(AppError::Config(format!(
                "upstream.request_timeout_seconds must be in (0, 300], got {}",
                timeout
            )));
        }

        for (name, value) in [
            ("limits.chat_max_chars", self.limits.chat_max_chars),
            (
                "limits.legacy_chat_max_chars",
                self.limits.legacy_chat_max_chars,
            ),
            ("limits.image_max_chars", self.limits.image_max_chars),
            ("limits.speech_max_chars", self.limits.speech_max_chars),
            ("streaming.chunk_chars", self.streaming.chunk_chars),
        ] {
            if value == 0 {
                return Err(AppError::Config(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if self.streaming.frame_delay_ms > 1000 {
            return Err(AppError::Config(format!(
                "streaming.frame_delay_ms cannot exceed 1000, got {}",
                self.streaming.frame_delay_ms
            )));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(s).map_err(|source| AppError::ConfigParseFailed {
            path: "<string>".to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }
}
