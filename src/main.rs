use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use resec_registrar::config::{DEFAULT_BASE_PATH, DEFAULT_REDIS_PORT};
use resec_registrar::coordination::{CoordinationClient, ZkCoordinator};
use resec_registrar::lifecycle::{Component, ShutdownCoordinator};
use resec_registrar::{Event, EventWriter, RegistrarConfig, RegistrationManager};

#[derive(Parser)]
#[command(name = "resec-registrar")]
#[command(about = "Publishes the elected Redis master into a coordination service")]
struct Cli {
    /// ZooKeeper servers (`host:port,...[/chroot]`). Registration is
    /// disabled when unset.
    #[arg(long, env = "ZOOKEEPER_SERVERS")]
    zookeeper: Option<String>,

    /// ZooKeeper session timeout in seconds.
    #[arg(long, env = "ZOOKEEPER_SESSION_TIMEOUT", default_value = "10")]
    zookeeper_session_timeout: u64,

    #[arg(long, env = "REGISTRATION_BASE_PATH", default_value = DEFAULT_BASE_PATH)]
    base_path: String,

    #[arg(long, env = "REDIS_HOST", default_value = "127.0.0.1")]
    redis_host: String,

    #[arg(long, env = "REDIS_PORT", default_value_t = DEFAULT_REDIS_PORT)]
    redis_port: u16,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Seconds to wait for the final deregistration on shutdown.
    #[arg(long, env, default_value = "10")]
    shutdown_timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(&cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    let config = RegistrarConfig::new(cli.base_path, cli.redis_host, Some(cli.redis_port));

    let client: Option<Arc<dyn CoordinationClient>> = match &cli.zookeeper {
        Some(servers) => {
            let session_timeout = Duration::from_secs(cli.zookeeper_session_timeout);
            Some(Arc::new(ZkCoordinator::connect(servers, session_timeout).await?))
        }
        None => {
            tracing::info!("No coordination service configured, registration disabled");
            None
        }
    };

    let manager = Arc::new(RegistrationManager::start(&config, client)?);
    let shutdown = ShutdownCoordinator::new();
    shutdown.register(manager.clone()).await;

    tracing::info!(
        base_path = %config.base_path,
        endpoint = %manager.registrar().endpoint(),
        "Registrar started, reading election events from stdin"
    );

    #[cfg(unix)]
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    let shutdown_reason: &str;

    tokio::select! {
        _ = feed_events(manager.event_writer()) => {
            tracing::info!("Event feed closed");
            shutdown_reason = "eof";
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down gracefully... (SIGINT)");
            shutdown_reason = "sigint";
        },
        _ = async {
            #[cfg(unix)]
            {
                terminate.recv().await;
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            tracing::info!("Shutting down gracefully... (SIGTERM)");
            shutdown_reason = "sigterm";
        }
    }

    tracing::info!(reason = shutdown_reason, "Initiating graceful shutdown...");

    let results = shutdown
        .shutdown(Duration::from_secs(cli.shutdown_timeout))
        .await;
    for (name, result) in results {
        tracing::info!(name, ?result, "Component stopped");
    }

    tracing::info!(health = ?manager.health().await.status, "Shutdown complete");
    Ok(())
}

/// Forward line-delimited JSON election events from stdin until EOF.
async fn feed_events(writer: EventWriter) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => {
                tracing::error!("Failed to read event feed: {}", e);
                return;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Event>(line) {
            Ok(event) => {
                if let Err(e) = writer.send(event) {
                    tracing::error!("{}", e);
                    return;
                }
            }
            Err(e) => tracing::warn!(line, error = %e, "Skipping malformed event"),
        }
    }
}
