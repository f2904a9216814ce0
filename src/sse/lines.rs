//! Line splitting over a fragmented byte stream.

use futures::{Stream, StreamExt};

/// Longest line kept by default (16 MiB).
pub const DEFAULT_MAX_LINE_LEN: usize = 16 * 1024 * 1024;

/// Turns a stream of byte chunks into text lines.
///
/// Chunk boundaries carry no meaning: bytes are buffered until a `\n` is
/// seen, so a line (or a multi-byte UTF-8 character) split across reads is
/// reassembled before it is decoded. A trailing `\r` is stripped. Invalid
/// UTF-8 is replaced rather than rejected.
///
/// A line longer than the maximum is cut to its first `max_line_len` bytes
/// and the rest is discarded up to the next `\n`.
#[derive(Debug)]
pub struct LineReader<S> {
    inner: S,
    buf: Vec<u8>,
    /// Prefix of `buf` already known to hold no `\n`.
    scanned: usize,
    max_line_len: usize,
    /// Dropping the tail of an over-long line.
    overflow: bool,
    eof: bool,
}

impl<S, B, E> LineReader<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    pub fn new(inner: S) -> Self {
        Self::with_max_line_len(inner, DEFAULT_MAX_LINE_LEN)
    }

    pub fn with_max_line_len(inner: S, max_line_len: usize) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            scanned: 0,
            max_line_len: max_line_len.max(1),
            overflow: false,
            eof: false,
        }
    }

    /// Next complete line.
    ///
    /// Returns `None` at end of input, after any unterminated trailing line
    /// has been yielded. Transport errors are passed through unchanged; the
    /// reader stays usable afterwards but callers normally stop.
    pub async fn next_line(&mut self) -> Option<Result<String, E>> {
        loop {
            if let Some(offset) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
                let pos = self.scanned + offset;
                let rest = self.buf.split_off(pos + 1);
                let mut line = std::mem::replace(&mut self.buf, rest);
                line.pop();
                line.truncate(self.max_line_len);
                self.scanned = 0;
                return Some(Ok(decode_line(line)));
            }
            self.scanned = self.buf.len();

            if self.eof {
                if self.buf.is_empty() {
                    return None;
                }
                let line = std::mem::take(&mut self.buf);
                self.scanned = 0;
                return Some(Ok(decode_line(line)));
            }

            match self.inner.next().await {
                Some(Ok(chunk)) => self.push_chunk(chunk.as_ref()),
                Some(Err(e)) => return Some(Err(e)),
                None => {
                    self.eof = true;
                    self.overflow = false;
                }
            }
        }
    }

    fn push_chunk(&mut self, chunk: &[u8]) {
        if self.overflow {
            match chunk.iter().position(|b| *b == b'\n') {
                Some(pos) => {
                    self.overflow = false;
                    self.buf.extend_from_slice(&chunk[pos..]);
                }
                None => return,
            }
        } else {
            self.buf.extend_from_slice(chunk);
        }

        if self.buf.len() > self.max_line_len && !self.buf[self.scanned..].contains(&b'\n') {
            tracing::warn!(
                "SSE line longer than {} bytes, truncating",
                self.max_line_len
            );
            self.buf.truncate(self.max_line_len);
            self.scanned = self.scanned.min(self.buf.len());
            self.overflow = true;
        }
    }
}

fn decode_line(mut line: Vec<u8>) -> String {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    match String::from_utf8(line) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}
