//! Unified error handling for relayd.
//!
//! Domain errors carry enough context to produce the wire-format reply
//! the client sees; none of them are fatal to anything beyond the one
//! operation (or, for transport failures, the one session).

use crate::replies::{SERVER_NAME, target};
use thiserror::Error;

/// Errors from the shared message log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LogError {
    #[error("message log full")]
    Full,
}

/// Errors from parsing a raw command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed PRIVMSG")]
    MalformedPrivmsg,
}

/// Errors raised while interpreting a command against session state.
///
/// All of these are protocol-level: the session replies and continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("{0} command sent before registration")]
    NotRegistered(&'static str),

    #[error("malformed command: {0}")]
    Malformed(&'static str),

    #[error("nickname too long")]
    NicknameTooLong,

    #[error("nickname in use: {0}")]
    NicknameInUse(String),

    #[error("already registered")]
    AlreadyRegistered,

    #[error("message log full")]
    LogFull,
}

impl CommandError {
    /// Static code for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotRegistered(_) => "not_registered",
            Self::Malformed(_) => "malformed",
            Self::NicknameTooLong => "nickname_too_long",
            Self::NicknameInUse(_) => "nickname_in_use",
            Self::AlreadyRegistered => "already_registered",
            Self::LogFull => "log_full",
        }
    }

    /// Convert to the numeric reply line sent to the client.
    ///
    /// `nick` is the session's current nickname (may be empty, in which
    /// case the reply targets `*`).
    pub fn to_reply(&self, nick: &str) -> String {
        let target = target(nick);
        match self {
            Self::NotRegistered(cmd) => {
                format!(":{SERVER_NAME} 241 {target} : {cmd} command sent before registration")
            }
            Self::Malformed(cmd) => {
                format!(":{SERVER_NAME} 461 {target} : {cmd} command malformed")
            }
            Self::NicknameTooLong => {
                format!(":{SERVER_NAME} 432 {target} : Nickname too long")
            }
            Self::NicknameInUse(_) => {
                format!(":{SERVER_NAME} 433 {target} : Nickname is already in use")
            }
            Self::AlreadyRegistered => {
                format!(":{SERVER_NAME} 462 {target} : You may not reregister")
            }
            Self::LogFull => {
                format!(":{SERVER_NAME} 500 {target} : Message log is full")
            }
        }
    }
}

impl From<LogError> for CommandError {
    fn from(_: LogError) -> Self {
        CommandError::LogFull
    }
}
