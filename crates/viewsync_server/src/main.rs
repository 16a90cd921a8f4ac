//! Exchange server binary.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use viewsync_server::{router, ReplicaStore, ServerConfig, ServerError};

#[derive(Parser, Debug)]
#[command(name = "viewsync_server", about = "Exchange server for viewsync replicas")]
struct Args {
    /// Address to bind to.
    #[arg(long, default_value = "127.0.0.1:8181")]
    bind: SocketAddr,

    /// Replica data file.
    #[arg(long, default_value = "viewsync.json")]
    data_file: PathBuf,

    /// Seconds between autosaves of the replica.
    #[arg(long, default_value_t = 60)]
    autosave_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "viewsync_server=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = ServerConfig::new(args.bind)
        .with_data_file(&args.data_file)
        .with_autosave_period(Duration::from_secs(args.autosave_secs.max(1)));

    let data_file = args.data_file;
    let store = Arc::new(ReplicaStore::load(&data_file)?);
    info!(path = %data_file.display(), keys = store.len(), "replica loaded");

    spawn_autosave(Arc::clone(&store), data_file.clone(), config.autosave_period);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "exchange server listening");

    axum::serve(listener, router(Arc::clone(&store)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Final save so nothing pushed since the last autosave is lost.
    store.save(&data_file)?;
    info!(path = %data_file.display(), "replica saved on shutdown");
    Ok(())
}

fn spawn_autosave(store: Arc<ReplicaStore>, path: PathBuf, period: Duration) {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            timer.tick().await;
            if let Err(err) = store.save(&path) {
                error!(%err, "autosave failed");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to listen for shutdown signal");
    }
}
