//! # Configuration Management
//!
//! Centralized configuration for the batching queue, the transport and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-specific overrides via `from_env()`
//!
//! ## Defaults
//! - Combined frames use packet type `0xFF`
//! - Pending packets flush once they reach 512 KiB, or on every 50 ms tick
//! - An empty cipher key sends frames unmasked

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Packet type reserved for combined frames unless configured otherwise
pub const DEFAULT_COMBINED_PACKET_TYPE: u8 = 0xFF;

/// Summed pending size that forces an immediate flush (512 KiB)
pub const MAX_UNCOMBINED_BYTES: usize = 512 * 1024;

/// Default interval between periodic flushes
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(50);

/// Max allowed frame size on stream transports (16 MB)
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Default timeout for establishing a transport connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct NetworkConfig {
    /// Batching queue configuration
    #[serde(default)]
    pub batch: BatchConfig,

    /// Transport configuration
    #[serde(default)]
    pub transport: TransportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NetworkConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("NETFRAME_COMBINED_PACKET_TYPE") {
            config.batch.combined_packet_type = value.parse::<u8>().map_err(|e| {
                ProtocolError::ConfigError(format!("Invalid NETFRAME_COMBINED_PACKET_TYPE: {e}"))
            })?;
        }

        if let Ok(key) = std::env::var("NETFRAME_CIPHER_KEY") {
            config.batch.cipher_key = key;
        }

        if let Ok(interval) = std::env::var("NETFRAME_FLUSH_INTERVAL_MS") {
            if let Ok(val) = interval.parse::<u64>() {
                config.batch.flush_interval = Duration::from_millis(val);
            }
        }

        if let Ok(limit) = std::env::var("NETFRAME_MAX_UNCOMBINED_BYTES") {
            if let Ok(val) = limit.parse::<usize>() {
                config.batch.max_uncombined_bytes = val;
            }
        }

        if let Ok(addr) = std::env::var("NETFRAME_SERVER_ADDRESS") {
            config.transport.address = addr;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.batch.validate());
        errors.extend(self.transport.validate());
        errors.extend(self.logging.validate());

        // Each queued packet is one frame when it flushes alone
        if self.batch.max_uncombined_bytes > self.transport.max_frame_size {
            errors.push(format!(
                "Max uncombined bytes ({}) exceeds transport max frame size ({})",
                self.batch.max_uncombined_bytes, self.transport.max_frame_size
            ));
        }
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Batching queue configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Packet type reserved for frames that carry several packets
    pub combined_packet_type: u8,

    /// Repeating key used to mask outbound frames (empty = unmasked)
    pub cipher_key: String,

    /// Summed pending size that triggers an immediate flush
    pub max_uncombined_bytes: usize,

    /// Interval for periodic flushes
    #[serde(with = "duration_serde")]
    pub flush_interval: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            combined_packet_type: DEFAULT_COMBINED_PACKET_TYPE,
            cipher_key: String::new(),
            max_uncombined_bytes: MAX_UNCOMBINED_BYTES,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

impl BatchConfig {
    /// Validate batching configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_uncombined_bytes == 0 {
            errors.push("Max uncombined bytes must be greater than 0".to_string());
        } else if self.max_uncombined_bytes > MAX_FRAME_SIZE {
            errors.push(format!(
                "Max uncombined bytes too large: {} (maximum: {} bytes)",
                self.max_uncombined_bytes, MAX_FRAME_SIZE
            ));
        }

        if self.flush_interval.as_millis() < 1 {
            errors.push("Flush interval too short (minimum: 1ms)".to_string());
        } else if self.flush_interval.as_secs() > 10 {
            errors.push("Flush interval too long (maximum: 10s)".to_string());
        }

        if self.cipher_key.as_bytes().contains(&0) {
            errors.push("Cipher key must not contain NUL bytes".to_string());
        }

        errors
    }
}

/// Transport configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
    /// Server address for stream transports (e.g., "127.0.0.1:7777")
    pub address: String,

    /// Maximum accepted frame size in bytes
    pub max_frame_size: usize,

    /// Timeout for connection attempts
    #[serde(with = "duration_serde")]
    pub connection_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            address: String::from("127.0.0.1:7777"),
            max_frame_size: MAX_FRAME_SIZE,
            connection_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Validate transport configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.address.is_empty() {
            errors.push("Transport address cannot be empty".to_string());
        } else if self.address.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "Invalid transport address format: '{}' (expected format: '127.0.0.1:7777')",
                self.address
            ));
        }

        if self.max_frame_size < 1024 {
            errors.push("Max frame size too small (minimum: 1 KB)".to_string());
        } else if self.max_frame_size > 100 * 1024 * 1024 {
            errors.push(format!(
                "Max frame size too large: {} bytes (maximum recommended: 100 MB)",
                self.max_frame_size
            ));
        }

        if self.connection_timeout.as_millis() < 100 {
            errors.push("Connection timeout too short (minimum: 100ms)".to_string());
        } else if self.connection_timeout.as_secs() > 300 {
            errors.push("Connection timeout too long (maximum: 300s)".to_string());
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("netframe"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
