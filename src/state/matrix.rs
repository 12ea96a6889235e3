//! The Matrix: process-global shared state threaded through every session
//! task, mirroring the teacher's central-registry pattern but scoped to
//! what this proxy actually needs — the class table, live session handles
//! keyed by class name (so `/DIRCPROXY` auth can find an existing session
//! to reattach to), and the DCC port-in-use bitmap (§5: "process-global,
//! safe because every session mutates it from its own task behind a
//! concurrent map rather than a single reactor thread").

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use dashmap::DashMap;
use slirc_proto::transport::Transport;
use tokio::sync::{broadcast, mpsc};

use crate::config::Config;
use crate::metrics::Counters;

/// A new client socket handed to an existing session's task in place of
/// starting a fresh one (§4.E Authentication, reattach): the task transplants
/// it in, evicting whatever client it currently holds first.
pub struct AttachHandoff {
    pub client: Transport,
    pub hostname: String,
    /// Set if the new connection already had `NICK` before `PASS`; applied
    /// against the session being reattached into if it differs.
    pub requested_nick: Option<String>,
}

/// A handle to a live session's task, held by the Matrix so a second
/// authentication against the same class can find it — whether or not it
/// currently has a client attached (§4.D `fetchclass` finds detached
/// sessions too).
pub struct SessionHandle {
    /// Whether this session currently has a client socket attached, kept in
    /// sync by the owning task. Lets `PassHandler` decide refuse-or-reattach
    /// without round-tripping into the task itself.
    pub connected: Arc<AtomicBool>,
    /// Hands a new client socket to this session's task.
    pub attach: mpsc::Sender<AttachHandoff>,
}

pub struct Matrix {
    pub config: Config,
    /// Live sessions, keyed by connection-class name (§4.D `fetchclass`).
    pub sessions: DashMap<String, SessionHandle>,
    /// Ports currently bound by an open DCC relay listener, shared across
    /// all sessions within a class's configured range.
    pub dcc_ports_in_use: DashMap<u16, ()>,
    pub shutdown: broadcast::Sender<()>,
    pub metrics: Counters,
}

impl Matrix {
    pub fn new(config: Config) -> Arc<Self> {
        let (shutdown, _) = broadcast::channel(1);
        Arc::new(Self {
            config,
            sessions: DashMap::new(),
            dcc_ports_in_use: DashMap::new(),
            shutdown,
            metrics: Counters::default(),
        })
    }

    /// §4.D `fetchclass`: any live session already bound to this class.
    pub fn fetch_class(&self, class_name: &str) -> Option<dashmap::mapref::one::Ref<'_, String, SessionHandle>> {
        self.sessions.get(class_name)
    }

    /// Registers this session's handle as the live occupant of `class_name`,
    /// called once `PASS` has bound a class (§4.D).
    pub fn register_session(&self, class_name: String, handle: SessionHandle) {
        self.sessions.insert(class_name, handle);
    }

    /// Clears the occupant entry on session teardown, but only if it's
    /// still this session (a session that was reattached into keeps its
    /// entry; only the task whose handle is still registered can clear it).
    pub fn unregister_session(&self, class_name: &str, connected: &Arc<AtomicBool>) {
        self.sessions.remove_if(class_name, |_, handle| Arc::ptr_eq(&handle.connected, connected));
    }

    /// Allocate the first free port in `range`, marking it in use.
    /// Returns `None` if the whole range is occupied (§4.H, §7 "resource").
    pub fn allocate_dcc_port(&self, range: (u16, u16)) -> Option<u16> {
        for port in range.0..=range.1 {
            if self.dcc_ports_in_use.insert(port, ()).is_none() {
                return Some(port);
            }
            // Someone already held it; undo the redundant insert and keep scanning.
            self.dcc_ports_in_use.remove(&port);
        }
        None
    }

    pub fn release_dcc_port(&self, port: u16) {
        self.dcc_ports_in_use.remove(&port);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
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
    fn allocate_dcc_port_picks_first_free_and_then_exhausts() {
        let matrix = Matrix::new(test_config());
        let first = matrix.allocate_dcc_port((40000, 40001)).unwrap();
        assert_eq!(first, 40000);
        let second = matrix.allocate_dcc_port((40000, 40001)).unwrap();
        assert_eq!(second, 40001);
        assert!(matrix.allocate_dcc_port((40000, 40001)).is_none());
    }

    #[test]
    fn release_dcc_port_frees_it_for_reuse() {
        let matrix = Matrix::new(test_config());
        let port = matrix.allocate_dcc_port((40000, 40000)).unwrap();
        matrix.release_dcc_port(port);
        assert_eq!(matrix.allocate_dcc_port((40000, 40000)), Some(40000));
    }
}
