//! A raw test IRC client for driving a proxy instance over TCP.

use std::time::Duration;

use slirc_proto::{Command, Message};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

impl TestClient {
    pub async fn connect(address: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(address).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self { reader: BufReader::new(read_half), writer: BufWriter::new(write_half) })
    }

    pub async fn send_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        if !line.ends_with("\r\n") {
            self.writer.write_all(b"\r\n").await?;
        }
        self.writer.flush().await?;
        Ok(())
    }

    #[allow(dead_code)]
    pub async fn send(&mut self, cmd: Command) -> anyhow::Result<()> {
        let msg = Message { tags: None, prefix: None, command: cmd };
        self.send_raw(&msg.to_string()).await
    }

    pub async fn recv(&mut self) -> anyhow::Result<Message> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<Message> {
        let mut line = String::new();
        timeout(dur, self.reader.read_line(&mut line)).await??;
        line.trim_end().parse::<Message>().map_err(|error| anyhow::anyhow!("parse error: {error}"))
    }

    /// Receive messages until `predicate` matches one, returning everything
    /// seen along the way (inclusive of the match).
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<Vec<Message>>
    where
        F: FnMut(&Message) -> bool,
    {
        let mut messages = Vec::new();
        loop {
            let msg = self.recv().await?;
            let done = predicate(&msg);
            messages.push(msg);
            if done {
                break;
            }
        }
        Ok(messages)
    }

    /// `PASS`, `NICK`, `USER`, then wait for the welcome numeric (`001`).
    pub async fn login(&mut self, password: &str, nick: &str) -> anyhow::Result<()> {
        self.send_raw(&format!("PASS {password}")).await?;
        self.send_raw(&format!("NICK {nick}")).await?;
        self.send_raw(&format!("USER {nick} 0 * :Test User")).await?;
        self.recv_until(|msg| matches!(&msg.command, Command::Response(resp, _) if resp.code() == 1)).await?;
        Ok(())
    }
}
