//! The proxy session: one per logical user, outliving any single client
//! connection (§3).

use std::time::Instant;

use super::channel::ChannelRecord;
use super::mode::ModeSet;
use crate::config::ClassConfig;

/// A minimal hand-rolled bitflags macro: the session's status gates are a
/// closed, small set and don't warrant pulling in the `bitflags` crate for
/// two five-bit enums.
macro_rules! bitflags_mod {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $ty:ty {
            $(const $flag:ident = $value:expr;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name($ty);

        impl $name {
            $(pub const $flag: $name = $name($value);)*

            pub const fn empty() -> Self {
                $name(0)
            }

            pub fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }

            pub fn remove(&mut self, other: Self) {
                self.0 &= !other.0;
            }
        }

        impl std::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                $name(self.0 | rhs.0)
            }
        }
    };
}
bitflags_mod! {
    /// Client-facing registration progress.
    pub struct ClientStatus: u8 {
        const CONNECTED   = 0b0000_0001;
        const AUTHED      = 0b0000_0010;
        const GOTNICK     = 0b0000_0100;
        const GOTUSER     = 0b0000_1000;
        const SENTWELCOME = 0b0001_0000;
    }
}

bitflags_mod! {
    /// Server-side connection progress.
    pub struct ServerStatus: u8 {
        const CREATED   = 0b0000_0001;
        const CONNECTED = 0b0000_0010;
        const ACTIVE    = 0b0000_0100;
    }
}

/// One logical user's proxy session.
pub struct ProxySession {
    pub nickname: String,
    pub username: Option<String>,
    pub realname: Option<String>,
    pub hostname: String,
    pub visible_hostname: String,

    pub client_status: ClientStatus,
    pub server_status: ServerStatus,

    pub modes: ModeSet,
    pub away_message: Option<String>,

    /// Close the client and tear the server down together (inetd-spawned,
    /// no persistence) rather than surviving client disconnect.
    pub die_on_close: bool,
    pub allow_motd: bool,
    pub allow_pong: bool,

    pub started_at: Instant,
    /// Set once `PASS` matches a class (§4.E Authentication); absent while
    /// a freshly accepted connection is still in regime 1.
    pub class: Option<ClassConfig>,
    pub channels: Vec<ChannelRecord>,
    /// Index into `class.servers`, moved by `/DIRCPROXY JUMP`/`CONNECT` and
    /// marked with `>` by `/DIRCPROXY SERVERS`.
    pub next_server: usize,
    /// Override for the server-side connection's local bind address, set by
    /// `/DIRCPROXY HOST`. `None` uses whatever the OS picks.
    pub local_address_override: Option<String>,
    /// Set by `/DIRCPROXY JUMP`/`CONNECT`/`HOST`; the session reactor
    /// observes this and tears down/reopens the server connection.
    pub reconnect_requested: bool,
    /// Set by `PassHandler` when `PASS` found a live-or-detached session
    /// already bound to the matched class: this task's client belongs to
    /// that session now, not this one (§4.E Authentication, reattach). The
    /// reactor observes this after dispatch and hands its socket off.
    pub attach_to: Option<String>,
}

impl ProxySession {
    /// A freshly accepted, not-yet-authenticated connection.
    pub fn new(hostname: String) -> Self {
        Self {
            nickname: String::new(),
            username: None,
            realname: None,
            visible_hostname: hostname.clone(),
            hostname,
            client_status: ClientStatus::empty(),
            server_status: ServerStatus::CREATED,
            modes: ModeSet::new(),
            away_message: None,
            die_on_close: false,
            allow_motd: false,
            allow_pong: false,
            started_at: Instant::now(),
            class: None,
            channels: Vec::new(),
            next_server: 0,
            local_address_override: None,
            reconnect_requested: false,
            attach_to: None,
        }
    }

    /// Bind a matched class after a successful `PASS` (§4.E, "bind fresh").
    pub fn bind_class(&mut self, class: ClassConfig) {
        self.class = Some(class);
    }

    pub fn class(&self) -> Option<&ClassConfig> {
        self.class.as_ref()
    }

    pub fn class_mut(&mut self) -> Option<&mut ClassConfig> {
        self.class.as_mut()
    }

    pub fn is_authed(&self) -> bool {
        self.client_status.contains(ClientStatus::AUTHED)
    }

    pub fn is_fully_registered(&self) -> bool {
        self.client_status.contains(ClientStatus::GOTNICK | ClientStatus::GOTUSER)
    }

    pub fn sent_welcome(&self) -> bool {
        self.client_status.contains(ClientStatus::SENTWELCOME)
    }

    pub fn server_active(&self) -> bool {
        self.server_status.contains(ServerStatus::ACTIVE)
    }

    /// §3 invariant 1: `SENTWELCOME ⇒ GOTNICK ∧ GOTUSER ∧ AUTHED ∧ server.ACTIVE`.
    pub fn welcome_invariant_holds(&self) -> bool {
        !self.sent_welcome()
            || (self.is_fully_registered() && self.is_authed() && self.server_active())
    }

    pub fn find_channel_mut(&mut self, name: &str) -> Option<&mut ChannelRecord> {
        self.channels.iter_mut().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_class() -> ClassConfig {
        toml::from_str(
            r#"
            name = "default"
            password = "hunter2"
            servers = [{ host = "irc.example.net", port = 6667 }]
            "#,
        )
        .unwrap()
    }

    #[test]
    fn fresh_session_starts_unauthed_and_unwelcomed() {
        let session = ProxySession::new("client.example.com".into());
        assert!(session.class().is_none());
        assert!(!session.is_authed());
        assert!(!session.sent_welcome());
        assert!(session.welcome_invariant_holds());
    }

    #[test]
    fn binding_a_class_after_pass_makes_it_visible() {
        let mut session = ProxySession::new("client.example.com".into());
        session.bind_class(test_class());
        assert_eq!(session.class().unwrap().name, "default");
    }

    #[test]
    fn welcome_invariant_catches_a_premature_flag() {
        let mut session = ProxySession::new("client.example.com".into());
        session.client_status.insert(ClientStatus::SENTWELCOME);
        assert!(!session.welcome_invariant_holds());
    }

    #[test]
    fn status_bits_combine_and_check() {
        let mut status = ClientStatus::empty();
        status.insert(ClientStatus::AUTHED);
        status.insert(ClientStatus::GOTNICK);
        assert!(status.contains(ClientStatus::AUTHED));
        assert!(!status.contains(ClientStatus::GOTUSER));
        status.remove(ClientStatus::AUTHED);
        assert!(!status.contains(ClientStatus::AUTHED));
    }
}
