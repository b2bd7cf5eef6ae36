//! Line reassembly codec.
//!
//! Converts arbitrarily-chunked socket bytes into complete lines. Either
//! `\n` or `\r` terminates a line; empty lines are skipped. Lines are
//! capped at a fixed maximum: bytes past the cap are silently dropped
//! rather than buffered or treated as an error, so a misbehaving client
//! cannot grow the accumulator without bound. Invalid UTF-8 is replaced
//! lossily.
//!
//! Framing is strict terminator-only while the stream is open; a
//! non-empty unterminated trailing line is dispatched once at
//! end-of-stream.

use bytes::BytesMut;
use std::io;
use tokio_util::codec::{Decoder, Encoder};

/// Newline-or-carriage-return terminated line codec.
pub struct LineCodec {
    /// Index of next byte to check for a terminator.
    next_index: usize,
    /// Maximum emitted line length in bytes.
    max_len: usize,
}

impl LineCodec {
    pub fn new(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }

    fn emit(&self, bytes: &[u8]) -> String {
        let capped = &bytes[..bytes.len().min(self.max_len)];
        String::from_utf8_lossy(capped).into_owned()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<String>> {
        loop {
            // Look for a terminator starting from where we left off.
            let found = src[self.next_index..]
                .iter()
                .position(|b| *b == b'\n' || *b == b'\r');

            match found {
                Some(offset) => {
                    let line = src.split_to(self.next_index + offset + 1);
                    self.next_index = 0;
                    let content = &line[..line.len() - 1];
                    if content.is_empty() {
                        // Bare terminator (or the second half of \r\n).
                        continue;
                    }
                    return Ok(Some(self.emit(content)));
                }
                None => {
                    // No complete line yet. Keep at most max_len pending
                    // bytes; anything past that is dropped.
                    if src.len() > self.max_len {
                        src.truncate(self.max_len);
                    }
                    self.next_index = src.len();
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> io::Result<Option<String>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }
        // Stream ended with an unterminated line: dispatch it once.
        let content = src.split_to(src.len());
        self.next_index = 0;
        Ok(Some(self.emit(&content)))
    }
}

impl Encoder<String> for LineCodec {
    type Error = io::Error;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> io::Result<()> {
        dst.extend_from_slice(line.as_bytes());
        if !line.ends_with('\n') {
            dst.extend_from_slice(b"\n");
        }
        Ok(())
    }
}
