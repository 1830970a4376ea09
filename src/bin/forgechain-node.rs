#![forbid(unsafe_code)]
//! Network node for forgechain

use clap::Parser;
use forgechain::api::run_api_server;
use forgechain::config::load_config;
use forgechain::node::NodeContext;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "forgechain-node", about = "Run a forgechain ledger node")]
struct Args {
    /// Port for the HTTP API (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = load_config(Some(&args.config))?;
    let port = args.port.unwrap_or(config.network.api_port);

    let node = Arc::new(NodeContext::new(&config)?);
    info!(node_id = %node.node_id, "starting forgechain node");

    if !config.network.bootstrap_peers.is_empty() {
        let mut peers = node.peers.write().await;
        for address in &config.network.bootstrap_peers {
            match peers.register(address) {
                Ok(location) => info!(peer = %location, "registered bootstrap peer"),
                Err(e) => warn!(peer = %address, error = %e, "skipping bootstrap peer"),
            }
        }
    }

    let addr: SocketAddr = format!("{}:{}", config.network.bind_addr, port).parse()?;
    run_api_server(node, addr).await
}
