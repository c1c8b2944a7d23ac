//! Dump tool configuration.
//!
//! Configuration can be loaded from:
//! - Environment variables (TETHER_*)
//! - TOML configuration file
//! - `--config` on the command line

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tether_transport::{DEFAULT_QUEUE_CAPACITY, DEFAULT_READ_CHUNK_SIZE};

/// Tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the byte stream comes from.
    #[serde(default = "default_source")]
    pub source: SourceConfig,

    /// Framer tuning.
    #[serde(default)]
    pub framer: FramerConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Byte source selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Read standard input.
    Stdin,
    /// Read a file from start to end.
    File {
        /// File path.
        path: PathBuf,
    },
    /// Connect to a TCP peer and read until it closes.
    Tcp {
        /// `host:port` to connect to.
        addr: String,
    },
}

/// Framer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FramerConfig {
    /// Frame queue capacity.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Bytes requested per read.
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable the Prometheus exporter.
    #[serde(default)]
    pub enabled: bool,

    /// Metrics port.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl FromStr for SourceConfig {
    type Err = anyhow::Error;

    /// Parse `stdin`, `file:<path>` or `tcp:<host:port>`.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            None if s == "stdin" || s == "-" => Ok(SourceConfig::Stdin),
            Some(("file", path)) if !path.is_empty() => Ok(SourceConfig::File {
                path: PathBuf::from(path),
            }),
            Some(("tcp", addr)) if !addr.is_empty() => Ok(SourceConfig::Tcp {
                addr: addr.to_string(),
            }),
            _ => bail!("invalid source {s:?}, expected stdin, file:<path> or tcp:<host:port>"),
        }
    }
}

impl fmt::Display for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceConfig::Stdin => write!(f, "stdin"),
            SourceConfig::File { path } => write!(f, "file:{}", path.display()),
            SourceConfig::Tcp { addr } => write!(f, "tcp:{addr}"),
        }
    }
}

// Default value functions
fn default_source() -> SourceConfig {
    std::env::var("TETHER_SOURCE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(SourceConfig::Stdin)
}

fn default_queue_capacity() -> usize {
    std::env::var("TETHER_QUEUE_CAPACITY")
        .ok()
        .and_then(|c| c.parse().ok())
        .filter(|&c| c > 0)
        .unwrap_or(DEFAULT_QUEUE_CAPACITY)
}

fn default_read_chunk_size() -> usize {
    DEFAULT_READ_CHUNK_SIZE
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: default_source(),
            framer: FramerConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            read_chunk_size: default_read_chunk_size(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, the default paths, or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed, or if an
    /// explicit path does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let config_paths = [
            "tether.toml",
            "/etc/tether/tether.toml",
            "~/.config/tether/tether.toml",
        ];

        for path in &config_paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::from_file(expanded.as_ref());
            }
        }

        // Fall back to defaults with environment overrides
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the framer cannot run with.
    ///
    /// # Errors
    ///
    /// Returns an error on a zero queue capacity or read chunk size.
    pub fn validate(&self) -> Result<()> {
        if self.framer.queue_capacity == 0 {
            bail!("framer.queue_capacity must be greater than zero");
        }
        if self.framer.read_chunk_size == 0 {
            bail!("framer.read_chunk_size must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.framer.read_chunk_size, 1024);
        assert!(!config.metrics.enabled);
        assert_eq!(config.metrics.port, 9090);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [source]
            kind = "tcp"
            addr = "127.0.0.1:4000"

            [framer]
            queue_capacity = 32
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.source,
            SourceConfig::Tcp {
                addr: "127.0.0.1:4000".to_string()
            }
        );
        assert_eq!(config.framer.queue_capacity, 32);
        assert_eq!(config.framer.read_chunk_size, 1024);
    }

    #[test]
    fn test_file_source_from_toml() {
        let toml_str = r#"
            source = { kind = "file", path = "/tmp/capture.bin" }
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.source.to_string(), "file:/tmp/capture.bin");
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let toml_str = r#"
            [framer]
            queue_capacity = 0
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_source_parsing() {
        assert_eq!("stdin".parse::<SourceConfig>().unwrap(), SourceConfig::Stdin);
        assert_eq!("-".parse::<SourceConfig>().unwrap(), SourceConfig::Stdin);
        assert_eq!(
            "tcp:localhost:9000".parse::<SourceConfig>().unwrap(),
            SourceConfig::Tcp {
                addr: "localhost:9000".to_string()
            }
        );
        assert_eq!(
            "file:./dump.bin".parse::<SourceConfig>().unwrap(),
            SourceConfig::File {
                path: PathBuf::from("./dump.bin")
            }
        );
        assert!("udp:1.2.3.4:5".parse::<SourceConfig>().is_err());
        assert!("file:".parse::<SourceConfig>().is_err());
    }
}
