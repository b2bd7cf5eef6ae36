//! Gateway - TCP listener that accepts incoming connections.
//!
//! Binds the listening socket and spawns one Connection task per
//! incoming client.

use crate::network::Connection;
use crate::state::Relay;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Accepts incoming TCP connections and spawns session tasks.
pub struct Gateway {
    listener: TcpListener,
    relay: Arc<Relay>,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(addr: SocketAddr, relay: Arc<Relay>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "listener bound");
        Ok(Self { listener, relay })
    }

    /// Address actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the gateway, accepting connections forever.
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let relay = Arc::clone(&self.relay);
                    let id = relay.next_session_id();
                    info!(session = id, %addr, "connection accepted");

                    tokio::spawn(async move {
                        let connection = Connection::new(id, addr, relay);
                        if let Err(e) = connection.run(stream).await {
                            error!(session = id, %addr, error = %e, "connection error");
                        }
                        info!(session = id, %addr, "connection closed");
                    });
                }
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                }
            }
        }
    }
}
