//! # Configuration Management Module
//!
//! Runtime settings for the relay, loaded from a TOML file.
//!
//! ## Configuration Structure
//!
//! - [`ListenerConfig`] - where reader devices connect
//! - [`RelayConfig`] - where viewers subscribe to decoded reports
//! - [`ProtocolConfig`] - start marker and tag-report command byte
//! - [`LoggingConfig`] - log level and optional log file
//!
//! Every section is optional; missing sections fall back to defaults.
//!
//! ## Configuration File Format
//!
//! ```toml
//! [listener]
//! bind = "0.0.0.0"
//! port = 8081
//! read_buffer_size = 4096
//!
//! [relay]
//! enabled = true
//! bind = "0.0.0.0"
//! port = 8080
//! channel_capacity = 1024
//!
//! [protocol]
//! start_marker = 0xCF
//! report_command = 0x01
//!
//! [logging]
//! level = "info"
//! # file = "tagrelay.log"
//! ```
//!
//! CLI flags take precedence over the file, which takes precedence over defaults.

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub listener: ListenerConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    pub bind: String,
    pub port: u16,
    /// Size of the per-connection socket read buffer (bytes).
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,
}

fn default_read_buffer_size() -> usize {
    4096
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8081,
            read_buffer_size: default_read_buffer_size(),
        }
    }
}

impl ListenerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_relay_enabled")]
    pub enabled: bool,
    pub bind: String,
    pub port: u16,
    /// Reports buffered per viewer before a slow viewer starts skipping.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_relay_enabled() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    1024
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: default_relay_enabled(),
            bind: "0.0.0.0".to_string(),
            port: 8080,
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl RelayConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Wire constants for the one tag-report message shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    #[serde(default = "default_start_marker")]
    pub start_marker: u8,
    #[serde(default = "default_report_command")]
    pub report_command: u8,
}

fn default_start_marker() -> u8 {
    0xCF
}

fn default_report_command() -> u8 {
    0x01
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            start_marker: default_start_marker(),
            report_command: default_report_command(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parsed level; unknown names fall back to `Info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config = Self::from_toml(&content)
            .map_err(|e| anyhow!("Failed to load config file {}: {}", path, e))?;

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.listener.read_buffer_size == 0 {
            bail!("listener.read_buffer_size must be greater than 0");
        }
        if self.relay.channel_capacity == 0 {
            bail!("relay.channel_capacity must be greater than 0");
        }
        if self.relay.enabled
            && self.relay.port != 0
            && self.relay.port == self.listener.port
            && self.relay.bind == self.listener.bind
        {
            bail!(
                "relay and listener cannot share the same address {}",
                self.listener.addr()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reader_deployment() {
        let config = Config::default();
        assert_eq!(config.listener.addr(), "0.0.0.0:8081");
        assert_eq!(config.relay.addr(), "0.0.0.0:8080");
        assert!(config.relay.enabled);
        assert_eq!(config.protocol.start_marker, 0xCF);
        assert_eq!(config.protocol.report_command, 0x01);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.listener.port, 8081);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn hex_literals_for_protocol_bytes() {
        let config = Config::from_toml(
            r#"
            [protocol]
            start_marker = 0xBB
            report_command = 0x22
            "#,
        )
        .unwrap();
        assert_eq!(config.protocol.start_marker, 0xBB);
        assert_eq!(config.protocol.report_command, 0x22);
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let config = Config::from_toml(
            r#"
            [listener]
            bind = "127.0.0.1"
            port = 9000
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.read_buffer_size, 4096);
        assert_eq!(config.protocol, ProtocolConfig::default());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(Config::from_toml("[listener]\nbind = \"a\"\nport = 1\nread_buffer_size = 0").is_err());
        assert!(Config::from_toml("[relay]\nbind = \"a\"\nport = 1\nchannel_capacity = 0").is_err());
        assert!(Config::from_toml("[protocol]\nstart_marker = 300").is_err());
    }

    #[test]
    fn rejects_shared_endpoint() {
        let mut config = Config::default();
        config.relay.port = config.listener.port;
        assert!(config.validate().is_err());
        config.relay.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn level_filter_parsing() {
        let mut logging = LoggingConfig::default();
        logging.level = "debug".to_string();
        assert_eq!(logging.level_filter(), log::LevelFilter::Debug);
        logging.level = "loud".to_string();
        assert_eq!(logging.level_filter(), log::LevelFilter::Info);
    }
}
