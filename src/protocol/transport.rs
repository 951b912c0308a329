//! Newline-delimited JSON framing over a byte stream.
//!
//! Inbound bytes are split into lines by [`FrameCodec`], which turns the
//! recoverable line-level failures into frames so the read loop can answer
//! them and keep going. Outbound messages go through a single [`OutputSink`]
//! whose async mutex serializes responses and server-initiated
//! notifications.

use bytes::BytesMut;
use futures::SinkExt;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio_util::codec::{Decoder, FramedRead, FramedWrite, LinesCodec, LinesCodecError};

/// Default maximum size of one inbound line (10 MiB).
pub const DEFAULT_MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

/// One inbound unit produced by [`FrameCodec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete line, without its terminator.
    Line(String),
    /// A line longer than the configured limit was discarded.
    Oversized,
    /// A line that was not valid UTF-8 was discarded.
    Malformed,
}

/// Errors raised by the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading from or writing to the stream failed.
    #[error("transport I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// An outbound message could not be serialized.
    #[error("failed to encode outbound message: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<LinesCodecError> for TransportError {
    fn from(err: LinesCodecError) -> Self {
        match err {
            LinesCodecError::Io(io) => Self::Io(io),
            LinesCodecError::MaxLineLengthExceeded => {
                Self::Io(std::io::Error::other("line length limit exceeded"))
            }
        }
    }
}

/// Line decoder that reports oversized and non-UTF-8 lines as frames.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    lines: LinesCodec,
    max_line_bytes: usize,
}

impl FrameCodec {
    /// Creates a codec that discards lines longer than `max_line_bytes`.
    #[must_use]
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_line_bytes),
            max_line_bytes,
        }
    }

    /// Returns the configured line limit.
    #[must_use]
    pub const fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }

    fn classify(
        outcome: Result<Option<String>, LinesCodecError>,
    ) -> Result<Option<Frame>, TransportError> {
        match outcome {
            Ok(line) => Ok(line.map(Frame::Line)),
            Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(Frame::Oversized)),
            Err(LinesCodecError::Io(err)) if err.kind() == std::io::ErrorKind::InvalidData => {
                Ok(Some(Frame::Malformed))
            }
            Err(LinesCodecError::Io(err)) => Err(err.into()),
        }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_BYTES)
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = TransportError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, TransportError> {
        Self::classify(self.lines.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, TransportError> {
        Self::classify(self.lines.decode_eof(buf))
    }
}

/// Stream of inbound frames.
pub type FrameReader<R> = FramedRead<R, FrameCodec>;

/// Wraps `reader` in a framed stream with the given line limit.
pub fn frame_reader<R: AsyncRead>(reader: R, max_line_bytes: usize) -> FrameReader<R> {
    FramedRead::new(reader, FrameCodec::new(max_line_bytes))
}

/// Serialized writer shared by every outbound path.
#[derive(Debug)]
pub struct OutputSink<W> {
    writer: Mutex<FramedWrite<W, LinesCodec>>,
}

impl<W> OutputSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Wraps `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(FramedWrite::new(writer, LinesCodec::new())),
        }
    }

    /// Serializes `message` as one line and flushes it.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Encode`] when serialization fails or
    /// [`TransportError::Io`] when the stream rejects the write.
    pub async fn send<T: Serialize + Sync>(&self, message: &T) -> Result<(), TransportError> {
        let line = serde_json::to_string(message)?;
        let mut writer = self.writer.lock().await;
        writer.send(line).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use rstest::rstest;
    use serde_json::json;
    use tokio::io::{AsyncBufReadExt, BufReader};

    async fn collect_frames(input: &[u8], limit: usize) -> Vec<Frame> {
        frame_reader(input, limit)
            .map(|frame| frame.expect("frame decodes"))
            .collect()
            .await
    }

    #[rstest]
    #[tokio::test]
    async fn splits_lines_and_strips_carriage_returns() {
        let frames = collect_frames(b"{\"a\":1}\r\n{\"b\":2}\n", 64).await;

        assert_eq!(
            frames,
            [
                Frame::Line("{\"a\":1}".to_owned()),
                Frame::Line("{\"b\":2}".to_owned())
            ]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn oversized_line_is_reported_then_skipped() {
        let mut input = vec![b'x'; 32];
        input.extend_from_slice(b"\n{}\n");

        let frames = collect_frames(&input, 8).await;

        assert_eq!(frames, [Frame::Oversized, Frame::Line("{}".to_owned())]);
    }

    #[rstest]
    #[tokio::test]
    async fn invalid_utf8_is_reported_then_skipped() {
        let frames = collect_frames(b"\xff\xfe\n{}\n", 64).await;

        assert_eq!(frames, [Frame::Malformed, Frame::Line("{}".to_owned())]);
    }

    #[rstest]
    #[tokio::test]
    async fn unterminated_final_line_is_delivered() {
        let frames = collect_frames(b"{\"last\":true}", 64).await;

        assert_eq!(frames, [Frame::Line("{\"last\":true}".to_owned())]);
    }

    #[rstest]
    #[tokio::test]
    async fn sink_writes_one_line_per_message() {
        let (client, server) = tokio::io::duplex(1024);
        let sink = OutputSink::new(server);

        sink.send(&json!({"first": 1})).await.expect("write");
        sink.send(&json!({"second": 2})).await.expect("write");
        drop(sink);

        let mut lines = BufReader::new(client).lines();
        assert_eq!(
            lines.next_line().await.expect("read"),
            Some("{\"first\":1}".to_owned())
        );
        assert_eq!(
            lines.next_line().await.expect("read"),
            Some("{\"second\":2}".to_owned())
        );
    }
}
