//! Configuration loading and management.
//!
//! Split into logical submodules:
//! - [`class`]: connection-class profiles (password, host masks, policy)
//! - [`listen`]: inbound client listener address
//! - [`dcc`]: per-class DCC proxy options
//! - [`logging`]: process-wide log format
//! - [`validation`]: startup config sanity checks

mod class;
mod dcc;
mod defaults;
mod listen;
mod logging;
pub mod validation;

pub use class::{ClassConfig, ServerEntry};
pub use dcc::DccConfig;
pub use listen::ListenConfig;
pub use logging::{LogFormat, LoggingConfig};

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server identity, used only in numerics and logs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name presented to clients as the message prefix (e.g. "dircproxy-ng").
    pub name: String,
    /// Prometheus metrics HTTP port; 0 disables the endpoint.
    #[serde(default = "defaults::default_metrics_port")]
    pub metrics_port: u16,
    /// MOTD lines sent on `/DIRCPROXY MOTD` and on welcome.
    #[serde(default)]
    pub motd: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub listen: ListenConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Connection-class table, matched in declaration order.
    #[serde(rename = "class")]
    pub classes: Vec<ClassConfig>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = toml::from_str(&text)?;
        Ok(config)
    }

    /// Iterate classes whose password and host-mask both match, in
    /// declaration order (first match wins per §4.D).
    pub fn matching_classes<'a>(
        &'a self,
        password: &'a str,
        client_host: &'a str,
    ) -> impl Iterator<Item = &'a ClassConfig> + 'a {
        self.classes
            .iter()
            .filter(move |class| class.password_matches(password) && class.host_matches(client_host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        toml::from_str(
            r#"
            [server]
            name = "dircproxy-ng"

            [listen]
            address = "127.0.0.1:57000"

            [[class]]
            name = "default"
            password = "hunter2"
            servers = [{ host = "irc.example.net", port = 6667 }]
            "#,
        )
        .unwrap()
    }

    #[test]
    fn metrics_port_defaults_to_disabled() {
        assert_eq!(sample().server.metrics_port, 0);
    }

    #[test]
    fn matching_classes_requires_both_password_and_host() {
        let config = sample();
        assert_eq!(config.matching_classes("hunter2", "anyhost").count(), 1);
        assert_eq!(config.matching_classes("wrong", "anyhost").count(), 0);
    }
}
