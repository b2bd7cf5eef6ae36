//! Fixed wire-format reply lines.
//!
//! Every server-to-client line lives here so the exact numeric codes and
//! wording stay in one place. Lines are written without a trailing
//! newline; the codec appends it.

use crate::log::LogEntry;

/// Server identity token used as the prefix of every numeric reply.
pub const SERVER_NAME: &str = "ircserver.com";

/// Suffix appended to a nickname to form the sender identity of a
/// relayed message.
pub const IDENT_SUFFIX: &str = "user@ircserver.com";

/// Display target for replies: `*` until a nickname is set.
pub fn target(nick: &str) -> &str {
    if nick.is_empty() { "*" } else { nick }
}

/// Greeting sent immediately after a connection is admitted.
pub fn greeting() -> String {
    format!(":{SERVER_NAME} 020 * :gday m8")
}

/// Welcome sequence emitted when registration completes.
///
/// `connections` is the number of sessions open at that moment.
pub fn welcome(nick: &str, connections: usize) -> Vec<String> {
    vec![
        format!(":{SERVER_NAME} 001 {nick} : Gday"),
        format!(":{SERVER_NAME} 002 {nick} : mate."),
        format!(":{SERVER_NAME} 003 {nick} : Welcome"),
        format!(":{SERVER_NAME} 004 {nick} : to {SERVER_NAME}."),
        format!(":{SERVER_NAME} 251 {nick} : There are {connections} connections open"),
        format!(":{SERVER_NAME} 253 {nick} : Enjoy"),
        format!(":{SERVER_NAME} 254 {nick} : your"),
        format!(":{SERVER_NAME} 255 {nick} : stay."),
    ]
}

/// A relayed message as delivered to a recipient session.
pub fn delivery(entry: &LogEntry) -> String {
    format!(
        ":{} PRIVMSG {} :{}",
        entry.sender, entry.recipient, entry.body
    )
}

/// Sender identity recorded in the log for a registered nickname.
pub fn sender_identity(nick: &str) -> String {
    format!("{nick}!{IDENT_SUFFIX}")
}

/// Closing notice for a client QUIT.
pub fn closing_quit() -> String {
    "ERROR :Closing Link: Connection timed out (bye bye)".to_string()
}

/// Closing notice for an idle timeout.
pub fn closing_timeout() -> String {
    "ERROR :Closing Link: Connection timed out length=0".to_string()
}

/// Closing notice when the connection limit is exceeded.
pub fn closing_full() -> String {
    "ERROR :Closing Link: Client count too great".to_string()
}
