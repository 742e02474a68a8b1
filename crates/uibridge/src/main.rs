//! # uibridge
//!
//! UI command bridge server binary — wires the catalog, dispatcher, delivery
//! worker, and HTTP/WebSocket server together.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use uibridge_core::logging::init_subscriber;
use uibridge_rpc::actions::register_all;
use uibridge_rpc::catalog::ActionCatalog;
use uibridge_rpc::dispatcher::Dispatcher;
use uibridge_rpc::resource::ServerIdentity;
use uibridge_server::config::BridgeConfig;
use uibridge_server::metrics::install_recorder;
use uibridge_server::server::BridgeServer;
use uibridge_server::ws::delivery::CommandBridge;

/// UI command bridge server.
#[derive(Parser, Debug)]
#[command(name = "uibridge", about = "UI command bridge server")]
struct Cli {
    /// Host to bind (overrides config if specified).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides config if specified).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pending queue capacity (overrides config if specified).
    #[arg(long)]
    queue_capacity: Option<usize>,
}

impl Cli {
    fn default_config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home).join(".uibridge").join("config.json")
    }
}

/// Merge CLI flag overrides into a loaded config.
fn apply_cli_overrides(config: &mut BridgeConfig, cli: &Cli) {
    if let Some(ref host) = cli.host {
        config.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(capacity) = cli.queue_capacity {
        config.queue_capacity = capacity;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let config_path = args.config.clone().unwrap_or_else(Cli::default_config_path);
    let mut config =
        BridgeConfig::load_from_path(&config_path).context("Failed to load config")?;
    apply_cli_overrides(&mut config, &args);

    init_subscriber(&config.log_level);
    let prometheus = install_recorder();

    // Delivery worker: owns the registry and pending queue.
    let (bridge, worker) = CommandBridge::spawn(config.queue_capacity);

    // Action catalog, emitting commands through the delivery worker.
    let mut catalog = ActionCatalog::new();
    register_all(&mut catalog, Arc::new(bridge.clone()));
    let action_count = catalog.len();

    let identity = ServerIdentity::new(&config.server_name, config.debug, &config.log_level);
    let dispatcher = Dispatcher::new(identity, Arc::new(catalog));

    let server = BridgeServer::new(config, bridge, dispatcher, Some(prometheus));
    let (addr, serve_handle) = server.listen().await.context("Failed to bind server")?;

    tracing::info!("uibridge listening on http://{addr} ({action_count} actions registered)");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    let shutdown = Arc::clone(server.shutdown());
    // The worker exits once the server (the last handle holder) is gone.
    drop(server);
    shutdown.graceful_shutdown(vec![serve_handle, worker], None).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
