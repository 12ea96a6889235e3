//! Bidirectional DCC relay (§4.H).
//!
//! A relay listener accepts exactly one peer connection, then pipes bytes
//! between that peer and the real remote endpoint named in the original
//! (unrewritten) CTCP token. `DCC CHAT` is symmetric text; `DCC SEND` is a
//! one-way file transfer from the proxy's point of view, but the byte
//! stream is identical whether the endpoints are running FAST (no acks) or
//! SIMPLE (periodic 4-byte acks written back by the receiver) — the proxy
//! forwards both directions regardless, since pacing is a matter between
//! the two real endpoints, not something this relay interprets.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::state::Matrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayKind {
    Chat,
    SendSimple,
    SendFast,
}

/// Run a `DCC CHAT` relay to completion, releasing `listen_port` on exit.
pub async fn run_chat_relay(listener: TcpListener, remote: SocketAddr, idle_timeout: Duration, matrix: Arc<Matrix>, listen_port: u16) {
    run_relay(listener, remote, RelayKind::Chat, idle_timeout, matrix, listen_port).await;
}

/// Run a `DCC SEND` relay to completion, releasing `listen_port` on exit.
pub async fn run_send_relay(listener: TcpListener, remote: SocketAddr, fast: bool, idle_timeout: Duration, matrix: Arc<Matrix>, listen_port: u16) {
    let kind = if fast { RelayKind::SendFast } else { RelayKind::SendSimple };
    run_relay(listener, remote, kind, idle_timeout, matrix, listen_port).await;
}

async fn run_relay(listener: TcpListener, remote: SocketAddr, kind: RelayKind, idle_timeout: Duration, matrix: Arc<Matrix>, listen_port: u16) {
    match relay_once(listener, remote, idle_timeout).await {
        Ok((to_remote, to_client)) => {
            tracing::debug!(?kind, listen_port, to_remote, to_client, "dcc relay closed");
        }
        Err(error) => {
            tracing::warn!(?kind, listen_port, %error, "dcc relay failed");
        }
    }
    matrix.metrics.dcc_relays_closed.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    matrix.release_dcc_port(listen_port);
}

async fn relay_once(listener: TcpListener, remote: SocketAddr, idle_timeout: Duration) -> io::Result<(u64, u64)> {
    // Only one peer is ever expected; the listener is dropped right after
    // accepting so a second connection attempt gets a clean refusal.
    let (mut client, _peer) = listener.accept().await?;
    let mut upstream = TcpStream::connect(remote).await?;

    let (mut client_rd, mut client_wr) = client.split();
    let (mut upstream_rd, mut upstream_wr) = upstream.split();

    tokio::try_join!(
        pump(&mut client_rd, &mut upstream_wr, idle_timeout),
        pump(&mut upstream_rd, &mut client_wr, idle_timeout),
    )
}

async fn pump<R, W>(reader: &mut R, writer: &mut W, idle_timeout: Duration) -> io::Result<u64>
where
    R: tokio::io::AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut buf = [0u8; 8192];
    let mut total = 0u64;
    loop {
        let read = tokio::time::timeout(idle_timeout, reader.read(&mut buf))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "dcc relay idle timeout"))??;
        if read == 0 {
            break;
        }
        writer.write_all(&buf[..read]).await?;
        total += read as u64;
    }
    let _ = writer.shutdown().await;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener as TokioListener;

    #[tokio::test]
    async fn relay_forwards_bytes_in_both_directions() {
        let upstream_listener = TokioListener::bind("127.0.0.1:0").await.unwrap();
        let upstream_addr = upstream_listener.local_addr().unwrap();
        let upstream_task = tokio::spawn(async move {
            let (mut sock, _) = upstream_listener.accept().await.unwrap();
            let mut buf = [0u8; 5];
            sock.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf, b"hello");
            sock.write_all(b"world").await.unwrap();
        });

        let relay_listener = TokioListener::bind("127.0.0.1:0").await.unwrap();
        let relay_addr = relay_listener.local_addr().unwrap();
        let relay_task = tokio::spawn(async move { relay_once(relay_listener, upstream_addr, Duration::from_secs(5)).await });

        let mut client = TcpStream::connect(relay_addr).await.unwrap();
        client.write_all(b"hello").await.unwrap();
        let mut reply = [0u8; 5];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(&reply, b"world");

        drop(client);
        upstream_task.await.unwrap();
        relay_task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn idle_timeout_closes_a_silent_relay() {
        let upstream_listener = TokioListener::bind("127.0.0.1:0").await.unwrap();
        let upstream_addr = upstream_listener.local_addr().unwrap();
        let _upstream_task = tokio::spawn(async move {
            let (sock, _) = upstream_listener.accept().await.unwrap();
            // Hold the connection open but send nothing.
            tokio::time::sleep(Duration::from_secs(3600)).await;
            drop(sock);
        });

        let relay_listener = TokioListener::bind("127.0.0.1:0").await.unwrap();
        let relay_addr = relay_listener.local_addr().unwrap();
        let relay_task = tokio::spawn(async move { relay_once(relay_listener, upstream_addr, Duration::from_millis(50)).await });

        let client = TcpStream::connect(relay_addr).await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;

        let result = relay_task.await.unwrap();
        assert!(result.is_err());
        drop(client);
    }
}
