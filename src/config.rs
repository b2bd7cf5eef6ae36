//! Runtime tunables for the relay.
//!
//! There is no config file: the process takes exactly one argument (the
//! listening port) and everything else uses the defaults below. Tests
//! construct a `Config` directly to shorten the timeouts.

use std::time::Duration;

/// Limits and timeouts for the relay.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum concurrently-open connections before admission is refused.
    pub max_clients: usize,
    /// Maximum entries the shared message log will hold.
    pub log_capacity: usize,
    /// Maximum length of a single input line; excess bytes are dropped.
    pub max_line_len: usize,
    /// Maximum nickname length accepted by NICK.
    pub max_nick_len: usize,
    /// Idle timeout before registration completes.
    pub unregistered_timeout: Duration,
    /// Idle timeout once registered.
    pub registered_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_clients: 1000,
            log_capacity: 8192,
            max_line_len: 1024,
            max_nick_len: 32,
            unregistered_timeout: Duration::from_secs(5),
            registered_timeout: Duration::from_secs(60),
        }
    }
}
