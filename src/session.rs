//! Per-session protocol state machine.
//!
//! A `Session` holds the registration state for one connection and
//! interprets complete lines against it. Interpretation is pure with
//! respect to the transport: it returns the reply lines to write and a
//! terminate signal, which keeps every command case testable without a
//! socket.
//!
//! Registration moves Unregistered -> Registered exactly once (nickname
//! set AND a USER command seen, in either order) and never back.

use crate::command::Command;
use crate::config::Config;
use crate::error::{CommandError, ParseError};
use crate::replies;
use crate::state::Relay;
use std::time::Duration;
use tracing::{debug, info};

/// Whether the connection loop should keep running after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Close the transport; the closing notice is already in `replies`.
    Quit,
}

/// Result of interpreting one line.
#[derive(Debug)]
pub struct LineOutcome {
    pub replies: Vec<String>,
    pub flow: Flow,
}

/// State for one client connection.
pub struct Session {
    id: u64,
    nickname: String,
    user_command_seen: bool,
    registered: bool,
    /// Next log position this session has not yet scanned.
    pub cursor: usize,
    /// Current idle timeout; widens once registered.
    pub idle_timeout: Duration,
}

impl Session {
    pub fn new(id: u64, cursor: usize, config: &Config) -> Self {
        Self {
            id,
            nickname: String::new(),
            user_command_seen: false,
            registered: false,
            cursor,
            idle_timeout: config.unregistered_timeout,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Interpret one complete line.
    pub fn handle_line(&mut self, line: &str, relay: &Relay) -> LineOutcome {
        let mut replies = Vec::new();
        let flow = match Command::parse(line) {
            Ok(cmd) => self.apply(cmd, relay, &mut replies),
            Err(ParseError::MalformedPrivmsg) => {
                // Registration state takes precedence over the parse
                // failure, matching the reference behavior.
                let err = if self.registered {
                    CommandError::Malformed("PRIVMSG")
                } else {
                    CommandError::NotRegistered("PRIVMSG")
                };
                self.reject(err, &mut replies);
                Flow::Continue
            }
        };
        LineOutcome { replies, flow }
    }

    fn apply(&mut self, cmd: Command, relay: &Relay, replies: &mut Vec<String>) -> Flow {
        match cmd {
            Command::Quit => {
                replies.push(replies::closing_quit());
                Flow::Quit
            }
            Command::Join(_) => {
                if !self.registered {
                    self.reject(CommandError::NotRegistered("JOIN"), replies);
                }
                // Accepted silently: no channel semantics.
                Flow::Continue
            }
            Command::Privmsg { recipient, body } => {
                if !self.registered {
                    self.reject(CommandError::NotRegistered("PRIVMSG"), replies);
                    return Flow::Continue;
                }
                let sender = replies::sender_identity(&self.nickname);
                match relay.log.append(sender, &recipient, &body) {
                    Ok(pos) => {
                        debug!(session = self.id, pos, recipient = %recipient, "message appended");
                    }
                    Err(e) => self.reject(e.into(), replies),
                }
                Flow::Continue
            }
            Command::Nick(name) => {
                self.handle_nick(name, relay, replies);
                Flow::Continue
            }
            Command::User(_) => {
                self.user_command_seen = true;
                self.registration_check(relay, replies);
                Flow::Continue
            }
            Command::Unknown => Flow::Continue,
        }
    }

    fn handle_nick(&mut self, name: String, relay: &Relay, replies: &mut Vec<String>) {
        if self.registered {
            // Renaming a registered session is refused; the reference
            // allowed it by accident.
            self.reject(CommandError::AlreadyRegistered, replies);
            return;
        }
        if name.len() > relay.config.max_nick_len {
            self.reject(CommandError::NicknameTooLong, replies);
            return;
        }
        if !relay.claim_nick(&name, self.id) {
            self.reject(CommandError::NicknameInUse(name), replies);
            return;
        }
        if !self.nickname.eq_ignore_ascii_case(&name) {
            relay.release_nick(&self.nickname, self.id);
        }
        self.nickname = name;
        self.registration_check(relay, replies);
    }

    fn registration_check(&mut self, relay: &Relay, replies: &mut Vec<String>) {
        if self.registered || !self.user_command_seen || self.nickname.is_empty() {
            return;
        }
        self.registered = true;
        self.idle_timeout = relay.config.registered_timeout;
        let connections = relay.connections_open();
        info!(session = self.id, nick = %self.nickname, connections, "session registered");
        replies.extend(replies::welcome(&self.nickname, connections));
    }

    fn reject(&self, err: CommandError, replies: &mut Vec<String>) {
        debug!(session = self.id, code = err.error_code(), "command rejected");
        replies.push(err.to_reply(&self.nickname));
    }
}
