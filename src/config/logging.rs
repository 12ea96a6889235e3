//! Process-wide logging configuration.

use serde::Deserialize;

/// Output encoding for `tracing-subscriber`.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_default_is_pretty() {
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
    }

    #[test]
    fn format_deserializes_from_toml() {
        let cfg: LoggingConfig = toml::from_str(r#"format = "json""#).unwrap();
        assert_eq!(cfg.format, LogFormat::Json);
    }
}
