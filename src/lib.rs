use log::{error, info};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::broadcast::SubscriberRegistry;
use crate::config::Config;
use crate::reader::{ClusterReader, KubeReader};
use crate::state::AppState;
use crate::sync::{PollScheduler, SnapshotCache};

pub mod actions;
pub mod broadcast;
pub mod client;
pub mod config;
pub mod describe;
pub mod error;
pub mod models;
pub mod reader;
pub mod server;
pub mod shutdown;
pub mod state;
pub mod sync;
pub mod utils;
mod commands {
    pub mod cluster;
    pub mod resources;
}

pub use error::{Error, Result};

/// Start the poll loop and the HTTP server; return after Ctrl-C once both have stopped.
pub async fn run() -> Result<()> {
    let loaded = Config::load().await;
    if let Some(path) = utils::logging::init_logger(loaded.config.log_dir.as_deref())? {
        info!("Logging to {:?}", path);
    }
    loaded.log_diagnostics();
    let config = loaded.config;

    let client = client::create_client(&config).await?;
    match &config.namespace {
        Some(ns) => info!("Watching namespace {}", ns),
        None => info!("Watching all namespaces"),
    }
    let reader: Arc<dyn ClusterReader> = Arc::new(KubeReader::new(client, config.namespace.clone()));
    let cache = Arc::new(SnapshotCache::new());
    let registry = Arc::new(SubscriberRegistry::new());
    let (trigger, shutdown) = shutdown::channel();

    let mut scheduler = PollScheduler::new(reader.clone(), cache.clone(), registry.clone(), config.poll_intervals());
    let poll_shutdown = shutdown.clone();
    let poller = tokio::spawn(async move { scheduler.run(poll_shutdown).await });

    let state = AppState::new(reader, cache, registry, config.cluster_name.clone(), shutdown)
        .with_namespace(config.namespace.clone());
    let listener = TcpListener::bind(&config.listen_addr).await?;

    // Dropping the trigger (server exited on its own) also stops the poll loop
    let signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
        info!("Shutdown requested");
        trigger.trigger();
    };

    let served = server::serve(listener, state, signal).await;
    if let Err(e) = poller.await {
        error!("Poll loop task failed: {}", e);
    }
    served?;
    info!("Stopped");
    Ok(())
}
