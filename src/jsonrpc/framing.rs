//! LSP message framing layer
//!
//! Handles LSP-specific message framing using Content-Length headers
//! as specified in the Language Server Protocol specification.
//!
//! LSP message framing format:
//! Content-Length: <length>\r\n\r\n<content>
//!
//! The stream is generic over any async byte reader/writer pair, so the
//! server can run over stdio in production and in-memory pipes in tests.

use std::io;
use std::num::ParseIntError;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::trace;

/// Header carrying the body length
const CONTENT_LENGTH_HEADER: &str = "Content-Length:";

/// Maximum message size to prevent memory exhaustion
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024; // 16MB

/// Initial body buffer; larger bodies grow as bytes arrive
const INITIAL_BODY_CAPACITY: usize = 64 * 1024;

/// Error types for LSP framing
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    #[error("could not read the message: {0}")]
    Read(#[source] io::Error),

    #[error("no Content-Length header found")]
    MissingContentLength,

    #[error("could not parse content length: {source}")]
    UnparsableContentLength {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("invalid content length: {0}")]
    InvalidContentLength(i64),

    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("could not read the message body: {0}")]
    TruncatedBody(#[source] io::Error),

    #[error("could not write message: {0}")]
    Write(#[source] io::Error),
}

/// Content-Length framed message stream over a duplex byte stream
pub struct MessageStream<R, W> {
    /// Buffered inbound half
    reader: BufReader<R>,

    /// Outbound half
    writer: W,
}

impl<R, W> MessageStream<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Get a reference to the outbound half
    #[allow(dead_code)]
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Get a mutable reference to the outbound half
    #[allow(dead_code)]
    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Read the next message body
    ///
    /// Returns `Ok(None)` when the stream ends cleanly between messages.
    /// Ending anywhere inside a message is an error.
    pub async fn read_message(&mut self) -> Result<Option<Vec<u8>>, FramingError> {
        let mut content_length = None;
        let mut line = Vec::new();
        let mut at_message_start = true;

        loop {
            line.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut line)
                .await
                .map_err(FramingError::Read)?;

            if read == 0 {
                if at_message_start {
                    trace!("MessageStream: end of stream");
                    return Ok(None);
                }

                return Err(FramingError::Read(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream ended inside the header block",
                )));
            }
            at_message_start = false;

            let header = String::from_utf8_lossy(&line);
            let header = header.trim();

            if header.is_empty() {
                break;
            }

            if let Some(value) = header.strip_prefix(CONTENT_LENGTH_HEADER) {
                content_length = Some(Self::parse_content_length(value.trim())?);
            }
        }

        let content_length = content_length.ok_or(FramingError::MissingContentLength)?;
        if content_length > MAX_MESSAGE_SIZE {
            return Err(FramingError::MessageTooLarge {
                size: content_length,
                max: MAX_MESSAGE_SIZE,
            });
        }

        let mut body = Vec::with_capacity(content_length.min(INITIAL_BODY_CAPACITY));
        let read = (&mut self.reader)
            .take(content_length as u64)
            .read_to_end(&mut body)
            .await
            .map_err(FramingError::TruncatedBody)?;

        if read < content_length {
            return Err(FramingError::TruncatedBody(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {content_length} bytes, got {read}"),
            )));
        }

        trace!("MessageStream: Read message ({} bytes)", content_length);
        Ok(Some(body))
    }

    /// Frame and write a message body
    ///
    /// Header and body go out in a single write followed by a flush.
    pub async fn write_message(&mut self, body: &[u8]) -> Result<(), FramingError> {
        let header = format!("{} {}\r\n\r\n", CONTENT_LENGTH_HEADER, body.len());

        let mut frame = Vec::with_capacity(header.len() + body.len());
        frame.extend_from_slice(header.as_bytes());
        frame.extend_from_slice(body);

        self.writer
            .write_all(&frame)
            .await
            .map_err(FramingError::Write)?;
        self.writer.flush().await.map_err(FramingError::Write)?;

        trace!("MessageStream: Wrote message ({} bytes)", body.len());
        Ok(())
    }

    fn parse_content_length(value: &str) -> Result<usize, FramingError> {
        let length = value
            .parse::<i64>()
            .map_err(|source| FramingError::UnparsableContentLength {
                value: value.to_string(),
                source,
            })?;

        usize::try_from(length).map_err(|_| FramingError::InvalidContentLength(length))
    }
}
