//! A minimal fake upstream IRC server, standing in for the real network the
//! proxy connects out to. Replies to registration with `001`-`004` and
//! otherwise just keeps the connection open so relay behaviour can be
//! observed from the client side of the proxy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

pub struct FakeUpstream {
    pub port: u16,
    /// Bumped once per accepted connection, so a test can assert the proxy
    /// dialed out only once across a detach/reattach pair rather than
    /// opening a fresh server connection on the second login.
    pub connections: Arc<AtomicUsize>,
}

impl FakeUpstream {
    /// Binds an ephemeral port and accepts connections forever in the
    /// background, replying to the first `NICK`/`USER` pair with a welcome
    /// burst and echoing anything it receives after that back as a `NOTICE`
    /// (so a test can confirm a line reached the real network unmodified).
    pub async fn spawn() -> anyhow::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let port = listener.local_addr()?.port();
        let connections = Arc::new(AtomicUsize::new(0));

        let counter = connections.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else { return };
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve_one(stream));
            }
        });

        Ok(Self { port, connections })
    }
}

async fn serve_one(stream: tokio::net::TcpStream) {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();
    let mut nick = "*".to_string();
    let mut registered = false;

    while let Ok(Some(line)) = lines.next_line().await {
        if !registered {
            if let Some(rest) = line.strip_prefix("NICK ") {
                nick = rest.trim().to_string();
            }
            if line.starts_with("USER ") {
                registered = true;
                let burst = format!(
                    ":upstream.test 001 {nick} :Welcome\r\n:upstream.test 002 {nick} :Your host\r\n:upstream.test 003 {nick} :Created\r\n:upstream.test 004 {nick} upstream.test fake\r\n"
                );
                if write_half.write_all(burst.as_bytes()).await.is_err() {
                    return;
                }
            }
            continue;
        }

        if write_half.write_all(format!(":upstream.test NOTICE {nick} :echo {line}\r\n").as_bytes()).await.is_err() {
            return;
        }
    }
}
