//! Minimal counters exposed in Prometheus text-exposition format, without
//! pulling the `prometheus`/`axum` stack back in for a handful of gauges
//! (the drop is recorded in `DESIGN.md`). Disabled entirely when
//! `server.metrics_port` is `0`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

use crate::state::Matrix;

#[derive(Default)]
pub struct Counters {
    pub sessions_created: AtomicU64,
    pub sessions_attached: AtomicU64,
    pub sessions_detached: AtomicU64,
    pub dcc_relays_opened: AtomicU64,
    pub dcc_relays_closed: AtomicU64,
    pub commands_dispatched: AtomicU64,
}

impl Counters {
    fn render(&self) -> String {
        format!(
            "# TYPE dircproxy_sessions_created_total counter\n\
             dircproxy_sessions_created_total {}\n\
             # TYPE dircproxy_sessions_attached_total counter\n\
             dircproxy_sessions_attached_total {}\n\
             # TYPE dircproxy_sessions_detached_total counter\n\
             dircproxy_sessions_detached_total {}\n\
             # TYPE dircproxy_dcc_relays_opened_total counter\n\
             dircproxy_dcc_relays_opened_total {}\n\
             # TYPE dircproxy_dcc_relays_closed_total counter\n\
             dircproxy_dcc_relays_closed_total {}\n\
             # TYPE dircproxy_commands_dispatched_total counter\n\
             dircproxy_commands_dispatched_total {}\n",
            self.sessions_created.load(Ordering::Relaxed),
            self.sessions_attached.load(Ordering::Relaxed),
            self.sessions_detached.load(Ordering::Relaxed),
            self.dcc_relays_opened.load(Ordering::Relaxed),
            self.dcc_relays_closed.load(Ordering::Relaxed),
            self.commands_dispatched.load(Ordering::Relaxed),
        )
    }
}

/// No-op placeholder for parity with the startup sequence of a process that
/// registers a global metrics registry; this crate keeps counters on
/// [`Matrix`] instead, so there is nothing to register up front.
pub fn init() {}

pub async fn run_http_server(port: u16, matrix: Arc<Matrix>) {
    let addr = (std::net::Ipv4Addr::UNSPECIFIED, port);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(port, %error, "failed to bind metrics listener");
            return;
        }
    };

    loop {
        let (mut stream, _) = match listener.accept().await {
            Ok(pair) => pair,
            Err(error) => {
                tracing::warn!(%error, "metrics accept failed");
                continue;
            }
        };
        let body = matrix.metrics.render();
        tokio::spawn(async move {
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain; version=0.0.4\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        });
    }
}
