//! Networking: listener and per-connection session loops.

mod connection;
mod gateway;

pub use connection::Connection;
pub use gateway::Gateway;
