//! Client command parsing.
//!
//! A dedicated parse step turns a raw line into a tagged variant, so the
//! interpreter is a single exhaustive match with no ordering-sensitive
//! prefix checks. The command word is matched case-insensitively;
//! NICK/USER/JOIN without an argument are ignored, like the reference
//! behavior.

use crate::error::ParseError;

/// A parsed client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Join(String),
    Privmsg { recipient: String, body: String },
    Nick(String),
    User(String),
    /// Anything unrecognized, including known commands missing a
    /// required token. Ignored silently.
    Unknown,
}

impl Command {
    /// Parse one complete line.
    ///
    /// Only PRIVMSG can fail: a missing recipient or missing `:` body is
    /// a parse error so the interpreter can reply with the malformed
    /// numeric (or the before-registration numeric, which takes
    /// precedence for unregistered sessions).
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut tokens = line.split_whitespace();
        let Some(word) = tokens.next() else {
            return Ok(Command::Unknown);
        };

        match word.to_ascii_uppercase().as_str() {
            "QUIT" => Ok(Command::Quit),
            "JOIN" => Ok(match tokens.next() {
                Some(arg) => Command::Join(arg.to_string()),
                None => Command::Unknown,
            }),
            "NICK" => Ok(match tokens.next() {
                Some(name) => Command::Nick(name.to_string()),
                None => Command::Unknown,
            }),
            "USER" => Ok(match tokens.next() {
                Some(arg) => Command::User(arg.to_string()),
                None => Command::Unknown,
            }),
            "PRIVMSG" => {
                let recipient = tokens.next().ok_or(ParseError::MalformedPrivmsg)?;
                if recipient.starts_with(':') {
                    return Err(ParseError::MalformedPrivmsg);
                }
                // Body is everything after the first ':' in the line.
                let body = line
                    .split_once(':')
                    .map(|(_, body)| body)
                    .ok_or(ParseError::MalformedPrivmsg)?;
                Ok(Command::Privmsg {
                    recipient: recipient.to_string(),
                    body: body.to_string(),
                })
            }
            _ => Ok(Command::Unknown),
        }
    }
}
