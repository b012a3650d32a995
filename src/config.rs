//! Configuration module for the reverb server.
//!
//! Supports both command-line arguments and TOML configuration file.
//! CLI arguments take precedence over config file values. The two
//! positional arguments (port, backlog) mirror the historical invocation
//! `reverb [port] [backlog]`.

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the echo server
#[derive(Parser, Debug)]
#[command(name = "reverb")]
#[command(author = "reverb authors")]
#[command(version = "0.1.0")]
#[command(about = "An HTTP/1.1 echo server", long_about = None)]
pub struct CliArgs {
    /// Port to listen on
    #[arg(value_name = "PORT")]
    pub port: Option<u16>,

    /// Listen backlog
    #[arg(value_name = "BACKLOG")]
    pub backlog: Option<i32>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Listen backlog
    #[serde(default = "default_backlog")]
    pub backlog: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backlog: default_backlog(),
        }
    }
}

/// Per-connection resource limits
#[derive(Debug, Deserialize)]
pub struct LimitsConfig {
    /// Maximum accumulated request size in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Read timeout in seconds (0 = no timeout)
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_size: default_max_message_size(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_backlog() -> i32 {
    5
}

fn default_max_message_size() -> usize {
    16 * 1024 * 1024 // 16 MB
}

fn default_read_timeout() -> u64 {
    30 // 30 seconds
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backlog: i32,
    pub max_message_size: usize,
    pub read_timeout_secs: u64,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = CliArgs::parse();

        // Load TOML config if specified
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        Ok(Self::resolve(cli, toml_config))
    }

    /// Merge CLI args with TOML config (CLI takes precedence)
    fn resolve(cli: CliArgs, toml_config: TomlConfig) -> Self {
        Config {
            host: toml_config.server.host,
            port: cli.port.unwrap_or(toml_config.server.port),
            backlog: cli.backlog.unwrap_or(toml_config.server.backlog),
            max_message_size: toml_config.limits.max_message_size,
            read_timeout_secs: toml_config.limits.read_timeout_secs,
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
        }
    }

    /// Read timeout as a duration, if enabled.
    pub fn read_timeout(&self) -> Option<Duration> {
        if self.read_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.read_timeout_secs))
        }
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TomlConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.backlog, 5);
        assert_eq!(config.limits.max_message_size, 16 * 1024 * 1024);
        assert_eq!(config.limits.read_timeout_secs, 30);
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
            [server]
            host = "127.0.0.1"
            port = 9090
            backlog = 128

            [limits]
            max_message_size = 1048576
            read_timeout_secs = 5

            [logging]
            level = "debug"
        "#;

        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.backlog, 128);
        assert_eq!(config.limits.max_message_size, 1048576);
        assert_eq!(config.limits.read_timeout_secs, 5);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_cli_positionals_take_precedence() {
        let cli = CliArgs::parse_from(["reverb", "9999", "64"]);
        let toml_config: TomlConfig = toml::from_str(
            r#"
            [server]
            port = 9090
            backlog = 128
            "#,
        )
        .unwrap();

        let config = Config::resolve(cli, toml_config);
        assert_eq!(config.port, 9999);
        assert_eq!(config.backlog, 64);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = CliArgs::parse_from(["reverb"]);
        let config = Config::resolve(cli, TomlConfig::default());
        assert_eq!(config.port, 8080);
        assert_eq!(config.backlog, 5);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_read_timeout_disabled() {
        let cli = CliArgs::parse_from(["reverb"]);
        let mut config = Config::resolve(cli, TomlConfig::default());
        assert_eq!(config.read_timeout(), Some(Duration::from_secs(30)));
        config.read_timeout_secs = 0;
        assert_eq!(config.read_timeout(), None);
    }
}
