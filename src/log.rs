//! Shared message log.
//!
//! A process-wide, append-only sequence of relayed messages. One writer
//! appends at a time under the write lock; every session scans it
//! concurrently under read locks, each keeping its own forward-only
//! cursor. A watch channel carries the current length so sessions can
//! wake on append instead of polling.

use crate::error::LogError;
use parking_lot::RwLock;
use tokio::sync::watch;

/// One relayed message, immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Index of this entry in the log; never changes.
    pub pos: usize,
    /// Sender identity, `nick!user@host` form.
    pub sender: String,
    /// Recipient nickname as the sender spelled it.
    pub recipient: String,
    /// Message body.
    pub body: String,
}

/// Append-only, capacity-bounded message log.
pub struct MessageLog {
    entries: RwLock<Vec<LogEntry>>,
    capacity: usize,
    len_tx: watch::Sender<usize>,
}

impl MessageLog {
    pub fn new(capacity: usize) -> Self {
        let (len_tx, _) = watch::channel(0);
        Self {
            entries: RwLock::new(Vec::new()),
            capacity,
            len_tx,
        }
    }

    /// Current number of entries. New sessions start their cursor here.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append one entry, returning its position.
    ///
    /// Fails without side effects once the log is at capacity.
    pub fn append(
        &self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<usize, LogError> {
        let mut entries = self.entries.write();
        if entries.len() >= self.capacity {
            return Err(LogError::Full);
        }
        let pos = entries.len();
        entries.push(LogEntry {
            pos,
            sender: sender.into(),
            recipient: recipient.into(),
            body: body.into(),
        });
        let len = entries.len();
        drop(entries);
        // Wake sessions blocked on `changed()`.
        let _ = self.len_tx.send(len);
        Ok(pos)
    }

    /// Entries at or past `cursor` addressed to `recipient`
    /// (case-insensitive), in append order.
    ///
    /// The returned cursor is always the current log length, so a caller
    /// never rescans entries it has already inspected even when none
    /// matched. An empty `recipient` matches nothing.
    pub fn entries_since(&self, cursor: usize, recipient: &str) -> (Vec<LogEntry>, usize) {
        let entries = self.entries.read();
        let new_cursor = entries.len();
        if recipient.is_empty() || cursor >= new_cursor {
            return (Vec::new(), new_cursor);
        }
        let matched = entries[cursor..]
            .iter()
            .filter(|e| e.recipient.eq_ignore_ascii_case(recipient))
            .cloned()
            .collect();
        (matched, new_cursor)
    }

    /// Receiver that observes the log length after each append.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.len_tx.subscribe()
    }
}
