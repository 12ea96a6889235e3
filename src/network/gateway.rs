//! Gateway - TCP listener that accepts incoming connections and spawns a
//! [`SessionTask`] per client (§4.A).

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::dns::Resolver;
use crate::network::SessionTask;
use crate::state::Matrix;

pub struct Gateway {
    listener: TcpListener,
    matrix: Arc<Matrix>,
    resolver: Resolver,
}

impl Gateway {
    pub async fn bind(addr: SocketAddr, matrix: Arc<Matrix>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let resolver = Resolver::from_system_config()?;
        info!(%addr, "Gateway listening");
        Ok(Self { listener, matrix, resolver })
    }

    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> std::io::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!(%addr, "connection accepted");
                    let matrix = Arc::clone(&self.matrix);
                    let resolver = self.resolver.clone();
                    SessionTask::spawn(stream, addr, matrix, resolver).await;
                }
                Err(error) => {
                    error!(%error, "failed to accept connection");
                }
            }
        }
    }
}
