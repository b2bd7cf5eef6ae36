//! Integration test common infrastructure.
//!
//! Provides an in-process relay spawner and a line-oriented test client.

pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::spawn_relay;
