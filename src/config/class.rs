//! Connection-class configuration: the `(password, host-mask)` profile a
//! client authenticates into, and the policy that session then runs under.

use serde::Deserialize;
use subtle::ConstantTimeEq;

use super::defaults::{default_client_timeout, default_true};
use super::dcc::DccConfig;

/// A server this class's session can connect (or jump) to.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerEntry {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub password: Option<String>,
}

/// One connection-class profile.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassConfig {
    /// Name, used only in logs and `/DIRCPROXY SERVERS` output.
    pub name: String,
    /// Password clients must send via `PASS`.
    pub password: String,
    /// Compare `password` in constant time (set when the deployment has a
    /// hashed-password backend in front of this field).
    #[serde(default)]
    pub password_hashed: bool,
    /// Shell-style host masks a client's resolved hostname must match.
    /// An empty list matches any host.
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Servers to connect to, tried in order; `/DIRCPROXY JUMP` moves the cursor.
    pub servers: Vec<ServerEntry>,

    #[serde(default)]
    pub detach_message: Option<String>,
    #[serde(default)]
    pub attach_message: Option<String>,
    #[serde(default)]
    pub away_message: Option<String>,
    #[serde(default)]
    pub quit_message: Option<String>,
    /// Nickname template used while detached; `*` is replaced by the live nick.
    #[serde(default)]
    pub detach_nickname: Option<String>,
    /// Modes dropped (via server `MODE nick -<modes>`) on detach.
    #[serde(default)]
    pub drop_modes: String,

    /// Seconds allowed between connect and a completed `PASS`/`NICK`/`USER`.
    #[serde(default = "default_client_timeout")]
    pub client_timeout: u64,
    /// Seconds allowed between login completion and the user picking a server
    /// manually, when `server_autoconnect` is false.
    #[serde(default = "default_client_timeout")]
    pub connect_timeout: u64,

    #[serde(default)]
    pub dcc: DccConfig,

    #[serde(default = "default_true")]
    pub allow_persist: bool,
    #[serde(default)]
    pub allow_die: bool,
    #[serde(default = "default_true")]
    pub allow_jump: bool,
    #[serde(default)]
    pub allow_jump_new: bool,
    #[serde(default)]
    pub allow_host: bool,
    #[serde(default)]
    pub disconnect_existing: bool,
    #[serde(default)]
    pub disconnect_on_detach: bool,
    #[serde(default = "default_true")]
    pub server_autoconnect: bool,
    #[serde(default)]
    pub channel_leave_on_detach: bool,
    #[serde(default = "default_true")]
    pub channel_rejoin_on_attach: bool,

    /// Log CTCP traffic (other than ACTION, which is always logged).
    #[serde(default)]
    pub log_ctcp: bool,
    /// Log client-originated events ("You disconnected", etc).
    #[serde(default = "default_true")]
    pub log_client: bool,
}

impl ClassConfig {
    /// Constant-time-or-plain password compare, per `password_hashed`.
    pub fn password_matches(&self, given: &str) -> bool {
        if self.password_hashed {
            let a = self.password.as_bytes();
            let b = given.as_bytes();
            a.len() == b.len() && bool::from(a.ct_eq(b))
        } else {
            self.password == given
        }
    }

    /// Whether `host` matches this class's mask list (empty list = any host).
    pub fn host_matches(&self, host: &str) -> bool {
        if self.hosts.is_empty() {
            return true;
        }
        let host_lower = host.to_ascii_lowercase();
        self.hosts.iter().any(|mask| {
            glob::Pattern::new(&mask.to_ascii_lowercase())
                .map(|p| p.matches(&host_lower))
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClassConfig {
        toml::from_str(
            r#"
            name = "default"
            password = "hunter2"
            hosts = ["*.example.com", "127.0.0.1"]
            servers = [{ host = "irc.example.net", port = 6667 }]
            "#,
        )
        .unwrap()
    }

    #[test]
    fn plaintext_password_matches_exactly() {
        let class = sample();
        assert!(class.password_matches("hunter2"));
        assert!(!class.password_matches("wrong"));
    }

    #[test]
    fn empty_host_list_matches_anything() {
        let mut class = sample();
        class.hosts.clear();
        assert!(class.host_matches("anything.at.all"));
    }

    #[test]
    fn glob_host_mask_is_case_insensitive() {
        let class = sample();
        assert!(class.host_matches("HOST.EXAMPLE.COM"));
        assert!(class.host_matches("127.0.0.1"));
        assert!(!class.host_matches("evil.net"));
    }

    #[test]
    fn defaults_match_spec_policy() {
        let class = sample();
        assert!(class.allow_persist);
        assert!(class.allow_jump);
        assert!(!class.allow_die);
        assert!(!class.allow_host);
        assert!(class.server_autoconnect);
        assert!(class.channel_rejoin_on_attach);
    }
}
