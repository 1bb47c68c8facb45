use std::path::{Path, PathBuf};
use std::time::Duration;

use confyg::{env, Confygery};
use quiver_core::VectorizerConfig;
use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

const DEFAULT_SERVICE_URL: &str = "http://localhost:8080";
const DEFAULT_VECTORIZER_MODULE: &str = "text2vec-ollama";
const DEFAULT_VECTORIZER_ENDPOINT: &str = "http://localhost:11434";
const DEFAULT_VECTORIZER_MODEL: &str = "bge-m3";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 15;

/// Errors raised while loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A URL setting could not be parsed or uses an unsupported scheme.
    #[error("invalid URL for {key}: {value:?} ({message})")]
    InvalidUrl {
        key: &'static str,
        value: String,
        message: String,
    },

    /// A timeout setting is zero.
    #[error("{key} must be greater than zero")]
    InvalidTimeout { key: &'static str },

    /// A required setting is empty.
    #[error("{key} must not be empty")]
    Empty { key: &'static str },

    /// The config file or environment could not be read.
    #[error("failed to load configuration: {0}")]
    Load(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for quiver.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (QUIVER_* prefix)
/// 3. Config file (~/.config/quiver/config.toml)
/// 4. Built-in defaults (lowest priority)
///
/// A `Config` is a plain value: build one with [`Config::load`] or
/// [`Config::default`] and hand it to [`crate::Client::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the vector store service.
    ///
    /// Can be set via:
    /// - CLI: --url http://host:8080
    /// - ENV: QUIVER_SERVICE_URL
    /// - Config: service_url = "..."
    /// - Default: http://localhost:8080
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Service module that vectorizes new collections.
    ///
    /// Can be set via:
    /// - ENV: QUIVER_VECTORIZER_MODULE
    /// - Config: vectorizer_module = "..."
    /// - Default: text2vec-ollama
    #[serde(default = "default_vectorizer_module")]
    pub vectorizer_module: String,

    /// Endpoint of the embedding backend, as seen from the service.
    ///
    /// Can be set via:
    /// - ENV: QUIVER_VECTORIZER_ENDPOINT
    /// - Config: vectorizer_endpoint = "..."
    /// - Default: http://localhost:11434
    #[serde(default = "default_vectorizer_endpoint")]
    pub vectorizer_endpoint: String,

    /// Embedding model identifier.
    ///
    /// Can be set via:
    /// - ENV: QUIVER_VECTORIZER_MODEL
    /// - Config: vectorizer_model = "..."
    /// - Default: bge-m3
    #[serde(default = "default_vectorizer_model")]
    pub vectorizer_model: String,

    /// Connect timeout in seconds.
    #[serde(
        default = "default_connect_timeout_secs",
        deserialize_with = "number_or_string"
    )]
    pub connect_timeout_secs: u64,

    /// Read timeout in seconds.
    #[serde(
        default = "default_read_timeout_secs",
        deserialize_with = "number_or_string"
    )]
    pub read_timeout_secs: u64,
}

/// Resolved connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl ConnectionParams {
    /// The (connect, read) timeout pair.
    pub fn timeouts(&self) -> (Duration, Duration) {
        (self.connect_timeout, self.read_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            vectorizer_module: default_vectorizer_module(),
            vectorizer_endpoint: default_vectorizer_endpoint(),
            vectorizer_model: default_vectorizer_model(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/quiver/config.toml
    /// Reads environment variables with QUIVER_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific file plus the environment.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        let mut builder = Confygery::new()
            .map_err(|e| ConfigError::Load(format!("failed to create config builder: {e}")))?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| ConfigError::Load("config path contains invalid UTF-8".into()))?;
            builder
                .add_file(path_str)
                .map_err(|e| ConfigError::Load(format!("failed to load config file: {e}")))?;
        }

        let env_opts = env::Options::with_top_level("quiver");
        builder
            .add_env(env_opts)
            .map_err(|e| ConfigError::Load(format!("failed to load environment: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| ConfigError::Load(format!("failed to build configuration: {e}")))?;

        log::debug!("Loaded configuration for {}", config.service_url);
        Ok(config)
    }

    /// Override the service URL (used by the `--url` CLI flag).
    #[must_use]
    pub fn with_service_url(mut self, url: impl Into<String>) -> Self {
        self.service_url = url.into();
        self
    }

    /// Resolve the base URL and per-request timeouts.
    ///
    /// # Errors
    /// Returns [`ConfigError`] for a malformed or non-HTTP URL, or a zero
    /// timeout.
    pub fn connection_params(&self) -> Result<ConnectionParams, ConfigError> {
        let base_url = parse_http_url("service_url", &self.service_url)?;

        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                key: "connect_timeout_secs",
            });
        }
        if self.read_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                key: "read_timeout_secs",
            });
        }

        Ok(ConnectionParams {
            base_url,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
        })
    }

    /// Resolve the embedding backend new collections are created with.
    ///
    /// # Errors
    /// Returns [`ConfigError`] for a malformed endpoint or an empty module or
    /// model name.
    pub fn vectorizer_config(&self) -> Result<VectorizerConfig, ConfigError> {
        parse_http_url("vectorizer_endpoint", &self.vectorizer_endpoint)?;
        if self.vectorizer_module.trim().is_empty() {
            return Err(ConfigError::Empty {
                key: "vectorizer_module",
            });
        }
        if self.vectorizer_model.trim().is_empty() {
            return Err(ConfigError::Empty {
                key: "vectorizer_model",
            });
        }

        Ok(VectorizerConfig::new(
            self.vectorizer_module.trim(),
            self.vectorizer_model.trim(),
            self.vectorizer_endpoint.trim(),
        ))
    }
}

fn parse_http_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidUrl {
        key,
        value: value.to_string(),
        message,
    };

    let url = Url::parse(value.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme {other}"))),
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Timeouts arrive as strings from the environment and as integers from
/// the config file.
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_vectorizer_module() -> String {
    DEFAULT_VECTORIZER_MODULE.to_string()
}

fn default_vectorizer_endpoint() -> String {
    DEFAULT_VECTORIZER_ENDPOINT.to_string()
}

fn default_vectorizer_model() -> String {
    DEFAULT_VECTORIZER_MODEL.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_read_timeout_secs() -> u64 {
    DEFAULT_READ_TIMEOUT_SECS
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/quiver/config.toml
/// - macOS: ~/Library/Application Support/quiver/config.toml
/// - Windows: %APPDATA%\quiver\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quiver")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Quiver Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (QUIVER_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Base URL of the vector store service
#
# Can also be set via:
# - CLI: quiver --url http://host:8080 schema list
# - Environment: QUIVER_SERVICE_URL=http://host:8080
service_url = "http://localhost:8080"

# Embedding backend used when creating collections
#
# The endpoint is contacted by the service, not by quiver, so it must be
# reachable from wherever the service runs.
#
# Can also be set via:
# - Environment: QUIVER_VECTORIZER_MODULE, QUIVER_VECTORIZER_ENDPOINT,
#   QUIVER_VECTORIZER_MODEL
vectorizer_module = "text2vec-ollama"
vectorizer_endpoint = "http://localhost:11434"
vectorizer_model = "bge-m3"

# Per-request timeouts in seconds
#
# Can also be set via:
# - Environment: QUIVER_CONNECT_TIMEOUT_SECS, QUIVER_READ_TIMEOUT_SECS
connect_timeout_secs = 5
read_timeout_secs = 15
"#
}

/// Create the default config file at `config_path` if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file_at(config_path: &Path) -> Result<bool, ConfigError> {
    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(config_path, example_config())?;
    Ok(true)
}

/// Create the default config file if it doesn't exist.
pub fn ensure_config_file() -> Result<bool, ConfigError> {
    ensure_config_file_at(&config_file_path())
}
