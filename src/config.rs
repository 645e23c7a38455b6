//! Application configuration.

use std::path::Path;

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString};
use tracing::{debug, info, instrument};

use crate::KeySpace;

/// Which key-value backend holds user records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, StrumDisplay, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Backend {
    /// Process-local store; data is lost on exit.
    Memory,
    /// Redis server at [`AppConfig::redis_url`].
    Redis,
}

/// Top-level configuration, read from TOML and overridable from the
/// environment.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the liveness server binds to.
    #[serde(default = "default_host")]
    host: String,

    /// Port the liveness server binds to.
    #[serde(default = "default_port")]
    port: u16,

    /// Backing store selection.
    #[serde(default = "default_backend")]
    backend: Backend,

    /// Redis connection URL, used when `backend = "redis"`.
    #[serde(default = "default_redis_url")]
    redis_url: String,

    /// Key naming scheme.
    #[serde(default)]
    keys: KeySpace,
}

#[instrument]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[instrument]
fn default_port() -> u16 {
    3000
}

#[instrument]
fn default_backend() -> Backend {
    Backend::Redis
}

#[instrument]
fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backend: default_backend(),
            redis_url: default_redis_url(),
            keys: KeySpace::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(backend = %config.backend, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but is invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            info!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Applies overrides from the process environment.
    ///
    /// See [`AppConfig::with_overrides`] for the variables read.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a port or backend variable does not parse.
    #[instrument(skip(self))]
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides from `lookup`, which maps variable names to values.
    ///
    /// Reads `LEADERBOARD_HOST`, `LEADERBOARD_PORT`, `LEADERBOARD_BACKEND`,
    /// `REDIS_URL`, `LEADERBOARD_KEY_PREFIX` and `LEADERBOARD_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a port or backend value does not parse.
    #[instrument(skip(self, lookup))]
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup("LEADERBOARD_HOST") {
            debug!(host = %host, "Overriding host");
            self.host = host;
        }
        if let Some(port) = lookup("LEADERBOARD_PORT") {
            self.port = port
                .parse()
                .map_err(|e| ConfigError::new(format!("Invalid LEADERBOARD_PORT '{}': {}", port, e)))?;
            debug!(port = self.port, "Overriding port");
        }
        if let Some(backend) = lookup("LEADERBOARD_BACKEND") {
            self.backend = backend.parse().map_err(|e| {
                ConfigError::new(format!("Invalid LEADERBOARD_BACKEND '{}': {}", backend, e))
            })?;
            debug!(backend = %self.backend, "Overriding backend");
        }
        if let Some(url) = lookup("REDIS_URL") {
            debug!("Overriding Redis URL");
            self.redis_url = url;
        }
        let prefix = lookup("LEADERBOARD_KEY_PREFIX");
        let leaderboard = lookup("LEADERBOARD_KEY");
        if prefix.is_some() || leaderboard.is_some() {
            self.keys = KeySpace::new(
                prefix.unwrap_or_else(|| self.keys.prefix().clone()),
                leaderboard.unwrap_or_else(|| self.keys.leaderboard().clone()),
            );
            debug!(keys = ?self.keys, "Overriding key space");
        }
        Ok(self)
    }

    /// Replaces the bind address.
    pub fn with_listen(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
