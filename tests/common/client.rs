//! Test client.
//!
//! A raw line-oriented client that can send commands and assert on the
//! exact reply lines the relay produces.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

/// A raw test client.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

impl TestClient {
    /// Connect to a relay.
    pub async fn connect(addr: SocketAddr) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
        })
    }

    /// Send one raw line.
    pub async fn send(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        if !line.ends_with('\n') {
            self.writer.write_all(b"\n").await?;
        }
        self.writer.flush().await?;
        Ok(())
    }

    /// Send raw bytes exactly as given, no newline appended.
    pub async fn send_bytes(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive one line (trailing newline stripped), failing on EOF.
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive one line with a custom timeout.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(dur, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("connection closed by server");
        }
        Ok(line.trim_end().to_string())
    }

    /// Receive lines until the predicate matches, returning all of them.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<Vec<String>>
    where
        F: FnMut(&str) -> bool,
    {
        let mut lines = Vec::new();
        loop {
            let line = self.recv().await?;
            let done = predicate(&line);
            lines.push(line);
            if done {
                break;
            }
        }
        Ok(lines)
    }

    /// Assert the server closes the stream within `dur`.
    pub async fn expect_closed(&mut self, dur: Duration) -> anyhow::Result<()> {
        let mut line = String::new();
        let n = timeout(dur, self.reader.read_line(&mut line)).await??;
        if n != 0 {
            anyhow::bail!("expected close, got line: {line:?}");
        }
        Ok(())
    }

    /// Consume the connection greeting.
    pub async fn expect_greeting(&mut self) -> anyhow::Result<()> {
        let line = self.recv().await?;
        anyhow::ensure!(
            line == ":ircserver.com 020 * :gday m8",
            "unexpected greeting: {line:?}"
        );
        Ok(())
    }

    /// Register with NICK + USER and drain the welcome sequence.
    pub async fn register(&mut self, nick: &str) -> anyhow::Result<Vec<String>> {
        self.send(&format!("NICK {nick}")).await?;
        self.send(&format!("USER {nick}")).await?;
        // 255 is the last line of the welcome sequence.
        self.recv_until(|line| line.contains(" 255 ")).await
    }
}
