use std::fmt::{self, Display};

use super::Chunks;

#[derive(Debug, PartialEq, Eq)]
pub enum SseError {
    /// The body stream broke before it was complete.
    Read(String),
    /// A line is not valid UTF-8.
    InvalidUtf8,
}

impl Display for SseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SseError::Read(reason) => write!(f, "error reading stream: {reason}"),
            SseError::InvalidUtf8 => f.write_str("stream is not valid UTF-8"),
        }
    }
}

/// Reads the `data` of server-sent events from a chunk stream.
///
/// Lines may end with LF, CRLF or CR. Comment lines and fields other than
/// `data` are skipped, several `data` lines of one event are joined with
/// LF. An event still open when the stream ends is dropped.
pub struct Sse {
    chunks: Chunks,
    // Bytes not yet split into lines. A multi-byte character may be cut
    // between two chunks, so decoding waits for a whole line.
    buf: Vec<u8>,
    data: Option<String>,
    ended: bool,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            chunks,
            buf: Vec::new(),
            data: None,
            ended: false,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<String>, SseError> {
        loop {
            while let Some(line) = self.take_line()? {
                if let Some(event) = self.process_line(&line) {
                    return Ok(Some(event));
                }
            }

            if self.ended {
                if self.data.take().is_some() || !self.buf.is_empty() {
                    debug!("stream ended in the middle of an event");
                    self.buf.clear();
                }
                return Ok(None);
            }
            match self.chunks.next_chunk().await? {
                Some(bytes) => self.buf.extend_from_slice(&bytes),
                None => self.ended = true,
            }
        }
    }

    fn take_line(&mut self) -> Result<Option<String>, SseError> {
        let Some(idx) = self.buf.iter().position(|&b| b == b'\n' || b == b'\r')
        else {
            return Ok(None);
        };
        let mut consumed = idx + 1;
        if self.buf[idx] == b'\r' {
            match self.buf.get(idx + 1) {
                Some(b'\n') => consumed += 1,
                // The LF of a CRLF may arrive with the next chunk.
                None if !self.ended => return Ok(None),
                _ => {}
            }
        }

        let line = str::from_utf8(&self.buf[..idx])
            .map_err(|_| SseError::InvalidUtf8)?
            .to_owned();
        self.buf.drain(..consumed);
        Ok(Some(line))
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.data.take();
        }
        if line.starts_with(':') {
            trace!("sse comment: {line}");
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => {
                (field, value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line, ""),
        };
        if field != "data" {
            trace!("ignoring sse field {field:?}");
            return None;
        }
        match &mut self.data {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => self.data = Some(value.to_owned()),
        }
        None
    }
}
