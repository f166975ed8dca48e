mod config;
mod ingest;

use clap::{Parser, Subcommand};
use config::Config;
use packio_core::{LifecycleManager, Packager, SqliteRepository, StorageMode, StoreBuilder};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "packio")]
#[command(about = "Packaging and storage pipeline for licensed publications")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the packaging server
    Server {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.yaml")]
        config: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "packio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Server { config } => {
            tracing::info!("Starting Packio server with config: {}", config);

            let cfg = match Config::from_file(&config) {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!("Failed to load config: {}", e);
                    std::process::exit(1);
                }
            };

            if let Err(e) = run_server(cfg).await {
                tracing::error!("Server error: {}", e);
                std::process::exit(1);
            }

            // The drain outcome never changes the exit status.
            std::process::exit(0);
        }
    }
}

async fn run_server(cfg: Config) -> anyhow::Result<()> {
    // The storage layout is owned by the bootstrap, not by the store itself.
    if cfg.storage.mode == StorageMode::Filesystem {
        if let Some(filesystem) = &cfg.storage.filesystem {
            std::fs::create_dir_all(&filesystem.directory)?;
        }
    }
    if let Some(parent) = cfg.database.path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let store = StoreBuilder::from_config(&cfg.storage).build()?;
    let repository = Arc::new(SqliteRepository::new(&cfg.database.path)?);

    let packager = Packager::with_queue_capacity(
        store,
        repository,
        cfg.packager.workers,
        cfg.packager.queue_capacity,
    );
    let lifecycle = LifecycleManager::new(packager, cfg.packager.drain_timeout());

    if let Some(ingest) = cfg.ingest.clone() {
        std::fs::create_dir_all(&ingest.directory)?;
        tracing::info!("Watching ingest directory {:?}", ingest.directory);

        let source = lifecycle.source();
        tokio::spawn(async move {
            ingest::ingest_loop(source, ingest).await;
        });
    }

    tracing::info!(
        "Packager running with {} workers, queue capacity {}, drain budget {}s",
        cfg.packager.workers,
        cfg.packager.queue_capacity,
        cfg.packager.drain_timeout_secs
    );

    let outcome = lifecycle.run(shutdown_signal()).await;
    tracing::info!("Server shut down ({:?})", outcome);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Termination signal received");
}
