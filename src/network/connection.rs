//! Per-connection session loop.
//!
//! Each accepted connection runs on its own task: admission check,
//! greeting, then a select loop over the framed line stream, log-append
//! wakeups, and the idle deadline. Queued deliveries are flushed at the
//! top of every iteration, before blocking, so a quiet client still
//! receives messages promptly.

use crate::codec::LineCodec;
use crate::replies;
use crate::session::{Flow, Session};
use crate::state::{ConnectionGuard, Relay};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

/// Stream wrapper that records the instant of the last non-empty read.
///
/// The idle clock resets on byte arrival, not on complete lines, so a
/// client trickling one long unterminated line still counts as active.
struct TrackedStream {
    inner: TcpStream,
    last_read: Arc<Mutex<Instant>>,
}

impl TrackedStream {
    fn new(inner: TcpStream, last_read: Arc<Mutex<Instant>>) -> Self {
        Self { inner, last_read }
    }
}

impl AsyncRead for TrackedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let filled_before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll
            && buf.filled().len() > filled_before
        {
            *this.last_read.lock() = Instant::now();
        }
        poll
    }
}

impl AsyncWrite for TrackedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

/// One client connection.
pub struct Connection {
    id: u64,
    addr: SocketAddr,
    relay: Arc<Relay>,
}

impl Connection {
    pub fn new(id: u64, addr: SocketAddr, relay: Arc<Relay>) -> Self {
        Self { id, addr, relay }
    }

    /// Drive the connection to completion.
    ///
    /// Session failures never propagate beyond this task; the returned
    /// error covers transport write failures only.
    pub async fn run(self, stream: TcpStream) -> anyhow::Result<()> {
        let guard = ConnectionGuard::open(&self.relay);
        let last_read = Arc::new(Mutex::new(Instant::now()));
        let stream = TrackedStream::new(stream, Arc::clone(&last_read));
        let mut framed = Framed::new(stream, LineCodec::new(self.relay.config.max_line_len));

        if guard.over_limit() {
            warn!(session = self.id, addr = %self.addr, "connection limit exceeded");
            let _ = framed.send(replies::closing_full()).await;
            return Ok(());
        }

        framed.send(replies::greeting()).await?;

        let mut session = Session::new(self.id, self.relay.log.len(), &self.relay.config);
        let result = self.serve(&mut framed, &mut session, &last_read).await;

        self.relay.release_nick(session.nickname(), self.id);
        drop(guard);
        result
    }

    async fn serve(
        &self,
        framed: &mut Framed<TrackedStream, LineCodec>,
        session: &mut Session,
        last_read: &Mutex<Instant>,
    ) -> anyhow::Result<()> {
        let mut log_len = self.relay.log.subscribe();

        loop {
            // Mark the wakeup seen before scanning: an append racing
            // with the delivery writes below re-arms `changed()` for
            // the next iteration instead of being lost.
            log_len.borrow_and_update();

            // Deliver queued messages before waiting on anything else.
            let (entries, cursor) = self
                .relay
                .log
                .entries_since(session.cursor, session.nickname());
            session.cursor = cursor;
            for entry in &entries {
                framed.send(replies::delivery(entry)).await?;
            }

            let idle_deadline = *last_read.lock() + session.idle_timeout;

            tokio::select! {
                line = framed.next() => match line {
                    Some(Ok(line)) => {
                        let outcome = session.handle_line(&line, &self.relay);
                        for reply in outcome.replies {
                            framed.send(reply).await?;
                        }
                        if outcome.flow == Flow::Quit {
                            info!(session = self.id, nick = %session.nickname(), "client quit");
                            return Ok(());
                        }
                    }
                    Some(Err(e)) => {
                        warn!(session = self.id, error = %e, "read error");
                        return Ok(());
                    }
                    None => {
                        debug!(session = self.id, "end of stream");
                        return Ok(());
                    }
                },

                changed = log_len.changed() => {
                    // New log entries; the top of the loop delivers them.
                    if changed.is_err() {
                        return Ok(());
                    }
                }

                _ = tokio::time::sleep_until(idle_deadline) => {
                    // Bytes may have trickled in without completing a
                    // line; the deadline we slept on is then stale.
                    if Instant::now() < *last_read.lock() + session.idle_timeout {
                        continue;
                    }
                    info!(
                        session = self.id,
                        nick = %session.nickname(),
                        idle_secs = session.idle_timeout.as_secs(),
                        "idle timeout"
                    );
                    let _ = framed.send(replies::closing_timeout()).await;
                    return Ok(());
                }
            }
        }
    }
}
