//! Incremental HTTP/1.1 request framing.
//!
//! Assembles exactly one request from a stream of byte chunks arriving with
//! arbitrary boundaries, possibly one byte at a time. The header section ends
//! at the first `\r\n\r\n`; the body length is dictated by the Content-Length
//! header (absent or unparsable means an empty body).
//!
//! The framer is a small state machine. Once the header terminator is found
//! its offset is cached, and the terminator search itself resumes where the
//! previous call left off, so no byte is scanned twice.

use bytes::{Bytes, BytesMut};

use super::request::{Request, RequestLine};

/// Length of the `\r\n\r\n` header terminator.
const TERMINATOR_LEN: usize = 4;

/// Framing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    /// Searching for the header terminator.
    ReadingHeaders,
    /// Terminator located; waiting for the declared body length.
    ReadingBody,
    /// A complete request has been extracted.
    Complete,
}

/// Result of feeding a chunk.
#[derive(Debug)]
pub enum FrameResult {
    /// The full message has arrived.
    Complete(Request),
    /// Need more data; the caller should read again.
    NeedData,
}

/// Framing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The accumulated message exceeded the configured cap.
    MessageTooLarge { limit: usize },
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::MessageTooLarge { limit } => {
                write!(f, "Message exceeds maximum size of {} bytes", limit)
            }
        }
    }
}

impl std::error::Error for FrameError {}

/// Incremental framer for a single request.
///
/// Owns the accumulation buffer for the message currently being assembled.
/// One framer serves one connection and is discarded with it.
pub struct Framer {
    buffer: BytesMut,
    state: FrameState,
    /// Byte offset of `\r\n\r\n` once located.
    header_end: usize,
    /// Declared Content-Length; 0 if absent or unparsable.
    content_length: usize,
    /// High-water mark of the terminator search.
    scanned: usize,
    max_message_size: usize,
}

impl Framer {
    /// Create a framer with the given total-size cap.
    pub fn new(max_message_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            state: FrameState::ReadingHeaders,
            header_end: 0,
            content_length: 0,
            scanned: 0,
            max_message_size,
        }
    }

    /// Append a chunk and try to advance framing.
    ///
    /// Returns `NeedData` until the header terminator and the declared body
    /// length have both arrived, then `Complete` with the extracted request.
    /// Chunk boundaries never affect the result.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<FrameResult, FrameError> {
        debug_assert!(
            self.state != FrameState::Complete,
            "feed after completion"
        );

        if self.buffer.len() + chunk.len() > self.max_message_size {
            return Err(FrameError::MessageTooLarge {
                limit: self.max_message_size,
            });
        }
        self.buffer.extend_from_slice(chunk);

        if self.state == FrameState::ReadingHeaders {
            match self.find_terminator() {
                Some(pos) => {
                    self.header_end = pos;
                    self.content_length = parse_content_length(&self.buffer[..pos]);
                    self.state = FrameState::ReadingBody;
                }
                None => return Ok(FrameResult::NeedData),
            }
        }

        let total_needed = self.header_end + TERMINATOR_LEN + self.content_length;
        if self.buffer.len() < total_needed {
            return Ok(FrameResult::NeedData);
        }

        self.state = FrameState::Complete;
        let body_len = self.content_length;
        Ok(FrameResult::Complete(self.extract(body_len)))
    }

    /// Salvage whatever arrived before the stream ended.
    ///
    /// If the header terminator was seen, returns a request whose body is
    /// clipped to the bytes actually present. If the terminator never
    /// arrived the message is unrecoverable and `None` is returned.
    pub fn take_partial(self) -> Option<Request> {
        match self.state {
            FrameState::ReadingBody => {
                let have = self.buffer.len() - self.header_end - TERMINATOR_LEN;
                let body_len = have.min(self.content_length);
                Some(self.extract(body_len))
            }
            FrameState::ReadingHeaders | FrameState::Complete => None,
        }
    }

    /// Search for `\r\n\r\n`, resuming just before the previously scanned
    /// end so a terminator straddling two chunks is still found.
    fn find_terminator(&mut self) -> Option<usize> {
        let buf = &self.buffer[..];
        let start = self.scanned.saturating_sub(TERMINATOR_LEN - 1);
        let end = buf.len().saturating_sub(TERMINATOR_LEN - 1);
        let found = (start..end).find(|&i| &buf[i..i + TERMINATOR_LEN] == b"\r\n\r\n");
        if found.is_none() {
            self.scanned = buf.len();
        }
        found
    }

    /// Build the request from the buffered message.
    fn extract(&self, body_len: usize) -> Request {
        let block = &self.buffer[..self.header_end];
        let (line, rest) = split_header_block(block);
        let line = RequestLine::parse(line);
        let headers = String::from_utf8_lossy(rest).into_owned();

        let body_start = self.header_end + TERMINATOR_LEN;
        let body = Bytes::copy_from_slice(&self.buffer[body_start..body_start + body_len]);

        Request {
            line,
            headers,
            body,
        }
    }
}

/// Split the header block into the request line and the remaining header
/// lines. The line ends at the first `\r\n`, falling back to a bare `\n`
/// for degraded input, falling back to the whole block.
fn split_header_block(block: &[u8]) -> (&[u8], &[u8]) {
    if let Some(pos) = find_crlf(block) {
        (&block[..pos], &block[pos + 2..])
    } else if let Some(pos) = block.iter().position(|&b| b == b'\n') {
        (&block[..pos], &block[pos + 1..])
    } else {
        (block, &[][..])
    }
}

/// Extract the declared Content-Length from a header block.
///
/// The block is scanned top-down and the first field whose name matches
/// `content-length` (case-insensitive) wins. The value is horizontal
/// whitespace followed by consecutive decimal digits; parsing stops at the
/// first non-digit. A matching field with no digits yields 0, as does a
/// missing field.
fn parse_content_length(block: &[u8]) -> usize {
    for line in block.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let Some(colon) = line.iter().position(|&b| b == b':') else {
            continue;
        };
        if !line[..colon].eq_ignore_ascii_case(b"content-length") {
            continue;
        }

        let mut length: usize = 0;
        let mut seen_digit = false;
        for &b in line[colon + 1..]
            .iter()
            .skip_while(|&&b| b == b' ' || b == b'\t')
        {
            if !b.is_ascii_digit() {
                break;
            }
            seen_digit = true;
            length = length
                .saturating_mul(10)
                .saturating_add((b - b'0') as usize);
        }

        return if seen_digit { length } else { 0 };
    }
    0
}

/// Find \r\n in buffer, returning the position of \r.
fn find_crlf(buffer: &[u8]) -> Option<usize> {
    (0..buffer.len().saturating_sub(1)).find(|&i| buffer[i] == b'\r' && buffer[i + 1] == b'\n')
}
