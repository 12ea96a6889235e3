//! Test server management.
//!
//! Spawns and manages `dircproxyd` instances for integration testing.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::Duration;

use tokio::time::sleep;

/// A running proxy instance, pointed at a given upstream address.
pub struct TestServer {
    child: Child,
    port: u16,
    data_dir: PathBuf,
}

impl TestServer {
    /// Spawn a proxy listening on an ephemeral port, with one connection
    /// class (`password`) whose sole server entry is `upstream_addr`.
    pub async fn spawn(password: &str, upstream_port: u16) -> anyhow::Result<Self> {
        let data_dir = std::env::temp_dir().join(format!("dircproxy-test-{}-{}", std::process::id(), upstream_port));
        std::fs::create_dir_all(&data_dir)?;

        let port = pick_free_port().await?;
        let config_path = data_dir.join("config.toml");
        let config_content = format!(
            r#"
[server]
name = "test.proxy"
metrics_port = 0

[listen]
address = "127.0.0.1:{port}"

[[class]]
name = "default"
password = "{password}"
servers = [{{ host = "127.0.0.1", port = {upstream_port} }}]
server_autoconnect = true
"#
        );
        std::fs::write(&config_path, config_content)?;

        let cargo_manifest_dir = env!("CARGO_MANIFEST_DIR");
        let binary_path = PathBuf::from(cargo_manifest_dir).join("target/debug/dircproxyd");

        let child = Command::new(&binary_path).arg(config_path.to_str().unwrap()).spawn()?;

        let server = Self { child, port, data_dir };
        server.wait_until_ready().await?;
        Ok(server)
    }

    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..30 {
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port)).await.is_ok() {
                return Ok(());
            }
            sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("proxy failed to start within 3 seconds")
    }

    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    pub async fn connect(&self) -> anyhow::Result<super::client::TestClient> {
        super::client::TestClient::connect(&self.address()).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

async fn pick_free_port() -> anyhow::Result<u16> {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await?;
    Ok(listener.local_addr()?.port())
}
