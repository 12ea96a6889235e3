//! DCC proxy configuration (per connection-class).

use serde::Deserialize;

use super::defaults::{default_dcc_idle_timeout, default_dcc_port_range};

#[derive(Debug, Clone, Deserialize)]
pub struct DccConfig {
    /// Proxy outgoing DCC CHAT/SEND CTCP tokens, rewriting address/port.
    #[serde(default)]
    pub proxy_outgoing: bool,
    /// Use DCC SEND FAST (no periodic ack gating) instead of SEND SIMPLE.
    #[serde(default)]
    pub send_fast: bool,
    /// Local port range to allocate relay listeners from, inclusive.
    #[serde(default = "default_dcc_port_range")]
    pub port_range: (u16, u16),
    /// When set, all proxied connections are redirected through this local
    /// tunnel port instead of the address/port named in the CTCP token.
    #[serde(default)]
    pub tunnel_outgoing: Option<u16>,
    /// Send a `DCC REJECT` notice to the client when proxy setup fails.
    #[serde(default)]
    pub proxy_sendreject: bool,
    /// Seconds a relay may sit idle (no bytes either direction) before close.
    #[serde(default = "default_dcc_idle_timeout")]
    pub idle_timeout: u64,
}

impl Default for DccConfig {
    fn default() -> Self {
        Self {
            proxy_outgoing: false,
            send_fast: false,
            port_range: default_dcc_port_range(),
            tunnel_outgoing: None,
            proxy_sendreject: false,
            idle_timeout: default_dcc_idle_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let dcc = DccConfig::default();
        assert!(!dcc.proxy_outgoing);
        assert!(!dcc.send_fast);
        assert!(dcc.tunnel_outgoing.is_none());
    }

    #[test]
    fn deserialize_port_range() {
        let dcc: DccConfig = toml::from_str(
            r#"
            proxy_outgoing = true
            port_range = [40000, 40010]
            "#,
        )
        .unwrap();
        assert_eq!(dcc.port_range, (40000, 40010));
        assert!(dcc.proxy_outgoing);
    }
}
