//! Process-wide shared state.
//!
//! The `Relay` is an injected service object passed to every session as
//! an `Arc` rather than ambient globals: it owns the message log, the
//! open-connection counter, the session-id generator, and the live
//! nickname registry. It is the only state shared across sessions.

use crate::config::Config;
use crate::log::MessageLog;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Shared relay state, one per process.
pub struct Relay {
    pub config: Config,
    pub log: MessageLog,
    connections: AtomicUsize,
    next_session_id: AtomicU64,
    /// Lowercased nickname -> owning session id, for live sessions only.
    nicks: DashMap<String, u64>,
}

impl Relay {
    pub fn new(config: Config) -> Self {
        let log = MessageLog::new(config.log_capacity);
        Self {
            config,
            log,
            connections: AtomicUsize::new(0),
            next_session_id: AtomicU64::new(1),
            nicks: DashMap::new(),
        }
    }

    /// Number of currently-open connections.
    pub fn connections_open(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn next_session_id(&self) -> u64 {
        self.next_session_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Claim `nick` for `session_id`.
    ///
    /// Succeeds if the nickname is unclaimed or already owned by this
    /// session. Comparison is case-insensitive.
    pub fn claim_nick(&self, nick: &str, session_id: u64) -> bool {
        use dashmap::mapref::entry::Entry;
        let key = nick.to_ascii_lowercase();
        match self.nicks.entry(key) {
            Entry::Occupied(e) => *e.get() == session_id,
            Entry::Vacant(e) => {
                e.insert(session_id);
                true
            }
        }
    }

    /// Release a claim, but only if this session still owns it.
    pub fn release_nick(&self, nick: &str, session_id: u64) {
        if nick.is_empty() {
            return;
        }
        let key = nick.to_ascii_lowercase();
        self.nicks.remove_if(&key, |_, owner| *owner == session_id);
    }
}

/// Counts one open connection for as long as it is alive.
///
/// Incrementing on accept and decrementing on drop keeps the counter
/// correct on every exit path (QUIT, timeout, transport error,
/// admission refusal).
pub struct ConnectionGuard {
    relay: Arc<Relay>,
}

impl ConnectionGuard {
    pub fn open(relay: &Arc<Relay>) -> Self {
        relay.connections.fetch_add(1, Ordering::SeqCst);
        Self {
            relay: Arc::clone(relay),
        }
    }

    /// True when this connection pushed the count past the limit and
    /// must be refused.
    pub fn over_limit(&self) -> bool {
        self.relay.connections_open() > self.relay.config.max_clients
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.relay.connections.fetch_sub(1, Ordering::SeqCst);
    }
}
