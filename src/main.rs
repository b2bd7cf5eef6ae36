//! relayd - minimal IRC-style chat relay daemon.

use relayd::config::Config;
use relayd::network::Gateway;
use relayd::state::Relay;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Exactly one argument: the listening port.
    let port: u16 = match std::env::args().nth(1).and_then(|p| p.parse::<u16>().ok()) {
        Some(port) => port,
        None => {
            eprintln!("usage: relayd <tcp port>");
            std::process::exit(2);
        }
    };

    let config = Config::default();
    info!(port, max_clients = config.max_clients, "starting relayd");

    let relay = Arc::new(Relay::new(config));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let gateway = Gateway::bind(addr, relay).await?;
    gateway.run().await
}
