//! Server configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use strictly_words::TimeoutPolicy;
use tracing::{debug, info, instrument};

/// Settings for the game server.
///
/// Every field has a default, so an empty TOML file is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind to.
    #[serde(default = "default_port")]
    port: u16,

    /// Word list, one word per line.
    #[serde(default = "default_dictionary_path")]
    dictionary_path: PathBuf,

    /// Seconds a player has to finish a turn.
    #[serde(default = "default_turn_seconds")]
    turn_seconds: u64,

    /// Seconds a whole game may last.
    #[serde(default = "default_game_seconds")]
    game_seconds: u64,

    /// What happens when a turn runs out.
    #[serde(default)]
    timeout_policy: TimeoutPolicy,

    /// Upper bound on a single dictionary lookup.
    #[serde(default = "default_lookup_timeout_ms")]
    lookup_timeout_ms: u64,

    /// Fixed seed for tile draws. Random when absent.
    #[serde(default)]
    #[setters(strip_option)]
    rng_seed: Option<u64>,

    /// Capacity of each game's event channel.
    #[serde(default = "default_event_buffer")]
    event_buffer: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_dictionary_path() -> PathBuf {
    PathBuf::from("words.txt")
}

fn default_turn_seconds() -> u64 {
    150
}

fn default_game_seconds() -> u64 {
    1800
}

fn default_lookup_timeout_ms() -> u64 {
    2000
}

fn default_event_buffer() -> usize {
    64
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dictionary_path: default_dictionary_path(),
            turn_seconds: default_turn_seconds(),
            game_seconds: default_game_seconds(),
            timeout_policy: TimeoutPolicy::default(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
            rng_seed: None,
            event_buffer: default_event_buffer(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.turn_seconds == 0 {
            return Err(ConfigError::new("turn_seconds must be positive".to_string()));
        }
        if self.game_seconds == 0 {
            return Err(ConfigError::new("game_seconds must be positive".to_string()));
        }
        if self.lookup_timeout_ms == 0 {
            return Err(ConfigError::new("lookup_timeout_ms must be positive".to_string()));
        }
        if self.event_buffer == 0 {
            return Err(ConfigError::new("event_buffer must be positive".to_string()));
        }
        Ok(())
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Turn duration.
    pub fn turn_duration(&self) -> Duration {
        Duration::from_secs(self.turn_seconds)
    }

    /// Game duration.
    pub fn game_duration(&self) -> Duration {
        Duration::from_secs(self.game_seconds)
    }

    /// Dictionary lookup bound.
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
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
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
