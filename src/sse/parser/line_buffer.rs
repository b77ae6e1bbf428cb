//! Byte line buffer that survives arbitrary chunk boundaries.
//!
//! Bytes are buffered rather than decoded per chunk, so a multi-byte UTF-8
//! character split across two reads is reassembled before decoding.
//! Consumed lines are skipped with a read cursor and compacted away on the
//! next push, so a chunk holding many lines is split in linear time.

/// Accumulates body chunks and hands out complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
    /// Start of the first unconsumed byte
    start: usize,
    /// Bytes before this offset are known to hold no newline
    scanned: usize,
    closed: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk read from the body.
    pub fn push(&mut self, chunk: &[u8]) {
        if self.start > 0 {
            self.buf.drain(..self.start);
            self.scanned -= self.start;
            self.start = 0;
        }
        self.buf.extend_from_slice(chunk);
    }

    /// Mark end of input. The unterminated tail, if any, becomes the last line.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Next complete line without its `\n` / `\r\n` terminator.
    pub fn next_line(&mut self) -> Option<String> {
        if let Some(offset) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
            let end = self.scanned + offset;
            let line = decode_line(&self.buf[self.start..end]);
            self.start = end + 1;
            self.scanned = self.start;
            return Some(line);
        }
        self.scanned = self.buf.len();

        if self.closed && self.start < self.buf.len() {
            let line = decode_line(&self.buf[self.start..]);
            self.start = self.buf.len();
            return Some(line);
        }

        None
    }

    /// Bytes held back waiting for a newline.
    pub fn pending_len(&self) -> usize {
        self.buf.len() - self.start
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.start = 0;
        self.scanned = 0;
        self.closed = false;
    }
}

fn decode_line(line: &[u8]) -> String {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}
