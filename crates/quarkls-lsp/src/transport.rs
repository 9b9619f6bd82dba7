//! `Content-Length` framing over any buffered reader and writer.
//!
//! Each message is prefixed by a header block:
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <payload>
//! ```

use std::io::{self, BufRead, Read, Write};

use thiserror::Error;

/// Largest payload accepted from a client, in bytes.
pub const MAX_MESSAGE_BYTES: usize = 64 * 1024 * 1024;

/// Errors raised while reading or writing framed messages.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying stream failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),
    /// A header block ended without `Content-Length`.
    #[error("message header is missing Content-Length")]
    MissingContentLength,
    /// A `Content-Length` value was not a number.
    #[error("invalid Content-Length header: {value}")]
    InvalidHeader {
        /// Raw header value.
        value: String,
    },
    /// A header announced a payload above [`MAX_MESSAGE_BYTES`].
    ///
    /// The payload has been skipped, so the stream stays aligned on the next
    /// message.
    #[error("message of {length} bytes exceeds the {limit} byte limit")]
    MessageTooLarge {
        /// Announced payload length.
        length: usize,
        /// Enforced limit.
        limit: usize,
    },
}

/// Reads and writes framed messages.
#[derive(Debug)]
pub struct FramedTransport<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> FramedTransport<R, W> {
    /// Wraps a reader and writer.
    #[must_use]
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Writes one framed message and flushes.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if writing fails.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        write!(self.writer, "Content-Length: {}\r\n\r\n", payload.len())?;
        self.writer.write_all(payload)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Reads one framed message, blocking until it is complete.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly between messages.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::MissingContentLength`] or
    /// [`TransportError::InvalidHeader`] for malformed headers,
    /// [`TransportError::MessageTooLarge`] for oversized payloads and
    /// [`TransportError::Io`] if the stream fails or ends mid-message.
    pub fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let Some(content_length) = self.read_headers()? else {
            return Ok(None);
        };
        if content_length > MAX_MESSAGE_BYTES {
            self.skip(content_length)?;
            return Err(TransportError::MessageTooLarge {
                length: content_length,
                limit: MAX_MESSAGE_BYTES,
            });
        }
        let mut content = vec![0_u8; content_length];
        self.reader.read_exact(&mut content)?;
        Ok(Some(content))
    }

    /// Consumes the transport, returning the writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn skip(&mut self, length: usize) -> io::Result<()> {
        let length = u64::try_from(length).unwrap_or(u64::MAX);
        io::copy(&mut (&mut self.reader).take(length), &mut io::sink())?;
        Ok(())
    }

    fn read_headers(&mut self) -> Result<Option<usize>, TransportError> {
        let mut content_length = None;
        let mut seen_header = false;

        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                if seen_header {
                    return Err(TransportError::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed while reading headers",
                    )));
                }
                return Ok(None);
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                if seen_header {
                    break;
                }
                continue;
            }
            seen_header = true;

            if let Some((name, value)) = trimmed.split_once(':')
                && name.trim().eq_ignore_ascii_case("content-length")
            {
                let value = value.trim();
                content_length = Some(value.parse().map_err(|_| TransportError::InvalidHeader {
                    value: value.to_owned(),
                })?);
            }
            // Other headers (e.g. Content-Type) are ignored.
        }

        content_length
            .map(Some)
            .ok_or(TransportError::MissingContentLength)
    }
}
