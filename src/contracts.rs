//! Collaborator contracts the state machine consumes but does not own the
//! implementation of (§6 "Collaborator contracts the core consumes").
//!
//! These exist so `/DIRCPROXY RECALL` and friends have something concrete to
//! call; the only implementation shipped here is [`TracingLog`], which
//! satisfies [`SessionLog`] by writing to the process's own tracing
//! subscriber rather than per-session log files. A deployment wanting real
//! on-disk per-session logs implements [`SessionLog`] itself.

use async_trait::async_trait;

/// One recalled log line.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub text: String,
}

/// The log component (§6): per-session transcripts, consulted by
/// `/DIRCPROXY RECALL`.
#[async_trait]
pub trait SessionLog: Send + Sync {
    async fn msg(&self, session: &str, target: &str, source: &str, text: &str);
    async fn notice(&self, session: &str, target: &str, source: &str, text: &str);
    async fn ctcp(&self, session: &str, target: &str, source: &str, text: &str, is_action: bool);

    /// `src` names a channel/nick filter or `None` for the whole session
    /// log; `start`/`lines` bound the window, `None` lines means "every
    /// line" (the `RECALL … ALL` form).
    async fn recall(&self, session: &str, src: Option<&str>, start: u64, lines: Option<u64>) -> Vec<LogLine>;

    async fn autorecall(&self, session: &str, name: &str) -> Vec<LogLine>;
}

/// Forwards everything to `tracing` at debug level and never has anything to
/// recall. Stands in until a deployment wires up real per-session log files.
pub struct TracingLog;

#[async_trait]
impl SessionLog for TracingLog {
    async fn msg(&self, session: &str, target: &str, source: &str, text: &str) {
        tracing::debug!(session, target, source, text, "log: msg");
    }

    async fn notice(&self, session: &str, target: &str, source: &str, text: &str) {
        tracing::debug!(session, target, source, text, "log: notice");
    }

    async fn ctcp(&self, session: &str, target: &str, source: &str, text: &str, is_action: bool) {
        tracing::debug!(session, target, source, text, is_action, "log: ctcp");
    }

    async fn recall(&self, _session: &str, _src: Option<&str>, _start: u64, _lines: Option<u64>) -> Vec<LogLine> {
        Vec::new()
    }

    async fn autorecall(&self, _session: &str, _name: &str) -> Vec<LogLine> {
        Vec::new()
    }
}
