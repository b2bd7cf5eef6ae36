//! relayd - minimal IRC-style chat relay.
//!
//! Clients register with a nickname over a line-oriented TCP protocol
//! and exchange directed messages through a shared append-only log that
//! every session scans with its own forward-only cursor.

pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod log;
pub mod network;
pub mod replies;
pub mod session;
pub mod state;
