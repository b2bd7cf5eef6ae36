//! Test server management.
//!
//! Runs the gateway in-process on an ephemeral port so tests need no
//! external binary or config file.

use relayd::config::Config;
use relayd::network::Gateway;
use relayd::state::Relay;
use std::net::SocketAddr;
use std::sync::Arc;

/// Spawn a relay with the given configuration, returning its address
/// and shared state.
pub async fn spawn_relay(config: Config) -> anyhow::Result<(SocketAddr, Arc<Relay>)> {
    let relay = Arc::new(Relay::new(config));
    let gateway = Gateway::bind("127.0.0.1:0".parse()?, Arc::clone(&relay)).await?;
    let addr = gateway.local_addr()?;

    tokio::spawn(async move {
        let _ = gateway.run().await;
    });

    Ok((addr, relay))
}
