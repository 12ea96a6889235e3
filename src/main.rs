//! dircproxy-ng - a persistent IRC bouncer/proxy.

mod config;
mod contracts;
mod ctcp;
mod dcc;
mod detach;
mod dns;
mod error;
mod handlers;
mod metrics;
mod network;
mod state;
mod timer;
mod welcome;

use std::sync::Arc;

use tracing::{error, info};

use crate::config::{Config, LogFormat};
use crate::network::Gateway;
use crate::state::Matrix;

fn resolve_config_path() -> String {
    let mut args = std::env::args().skip(1);

    match args.next() {
        Some(flag) if flag == "-c" || flag == "--config" => args.next().unwrap_or_else(|| {
            eprintln!("Missing path after {flag}");
            std::process::exit(1);
        }),
        Some(path) => path,
        None => "config.toml".to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = resolve_config_path();

    let config = Config::load(&config_path).map_err(|error| {
        eprintln!("ERROR: failed to load config from {config_path}: {error}");
        error
    })?;

    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::fmt().with_env_filter(env_filter).with_target(true).json().init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_env_filter(env_filter).with_target(true).init();
        }
    }

    if let Err(errors) = crate::config::validation::validate(&config) {
        for err in &errors {
            error!(error = %err, "configuration validation failed");
        }
        return Err(anyhow::anyhow!("configuration validation failed with {} error(s)", errors.len()));
    }

    info!(server = %config.server.name, classes = config.classes.len(), "starting dircproxy-ng");

    let listen_addr = config.listen.address;
    let metrics_port = config.server.metrics_port;
    let matrix = Matrix::new(config);

    if metrics_port == 0 {
        info!("metrics disabled");
    } else {
        metrics::init();
        let matrix_for_metrics = Arc::clone(&matrix);
        tokio::spawn(async move {
            metrics::run_http_server(metrics_port, matrix_for_metrics).await;
        });
        info!(port = metrics_port, "metrics http server started");
    }

    {
        let shutdown = matrix.shutdown.clone();
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
            let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = sigint.recv() => info!("received SIGINT, shutting down"),
                _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
            }
            let _ = shutdown.send(());
        });
    }

    let gateway = Gateway::bind(listen_addr, matrix).await?;
    gateway.run().await?;

    info!("gateway stopped");
    Ok(())
}
