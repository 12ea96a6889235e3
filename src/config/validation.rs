//! Configuration validation.
//!
//! Run once at startup; turns config mistakes into a fatal, logged exit
//! rather than a runtime panic deep in a session.

use super::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("at least one [[class]] block is required")]
    NoClasses,
    #[error("class '{0}' is defined more than once")]
    DuplicateClassName(String),
    #[error("class '{0}' has no servers")]
    ClassHasNoServers(String),
    #[error("class '{0}' dcc.port_range is empty or inverted ({1}-{2})")]
    InvalidPortRange(String, u16, u16),
    #[error("class '{0}' detach_nickname contains more than one '*' placeholder")]
    MultipleNicknamePlaceholders(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    if config.classes.is_empty() {
        errors.push(ValidationError::NoClasses);
    }

    let mut seen = std::collections::HashSet::new();
    for class in &config.classes {
        if !seen.insert(class.name.clone()) {
            errors.push(ValidationError::DuplicateClassName(class.name.clone()));
        }
        if class.servers.is_empty() {
            errors.push(ValidationError::ClassHasNoServers(class.name.clone()));
        }
        let (lo, hi) = class.dcc.port_range;
        if lo > hi {
            errors.push(ValidationError::InvalidPortRange(class.name.clone(), lo, hi));
        }
        if let Some(ref nick) = class.detach_nickname
            && nick.matches('*').count() > 1
        {
            errors.push(ValidationError::MultipleNicknamePlaceholders(class.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_valid_config() -> String {
        r#"
[server]
name = "dircproxy-ng"

[listen]
address = "127.0.0.1:57000"

[[class]]
name = "default"
password = "hunter2"
servers = [{ host = "irc.example.net", port = 6667 }]
"#
        .to_string()
    }

    #[test]
    fn valid_config_passes() {
        let config: Config = toml::from_str(&minimal_valid_config()).unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn empty_server_name_fails() {
        let mut config: Config = toml::from_str(&minimal_valid_config()).unwrap();
        config.server.name.clear();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingServerName)));
    }

    #[test]
    fn no_classes_fails() {
        let toml = r#"
[server]
name = "dircproxy-ng"

[listen]
address = "127.0.0.1:57000"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::NoClasses)));
    }

    #[test]
    fn duplicate_class_names_fail() {
        let toml = r#"
[server]
name = "dircproxy-ng"

[listen]
address = "127.0.0.1:57000"

[[class]]
name = "default"
password = "a"
servers = [{ host = "irc.example.net", port = 6667 }]

[[class]]
name = "default"
password = "b"
servers = [{ host = "irc.example.org", port = 6667 }]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateClassName(_))));
    }

    #[test]
    fn inverted_port_range_fails() {
        let toml = r#"
[server]
name = "dircproxy-ng"

[listen]
address = "127.0.0.1:57000"

[[class]]
name = "default"
password = "a"
servers = [{ host = "irc.example.net", port = 6667 }]

[class.dcc]
port_range = [40010, 40000]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidPortRange(..))));
    }
}
