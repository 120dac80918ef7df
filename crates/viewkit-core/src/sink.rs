//! Append-and-flush outputs for the SSE writer
//!
//! The writer only needs three capabilities from its output: accept response
//! header directives, append text, and flush. [`EventSink`] captures that;
//! the implementations here cover a hyper streaming body ([`ChannelSink`]),
//! any tokio [`AsyncWrite`] ([`WriterSink`]), and an in-memory recorder
//! ([`MemorySink`]).

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// Output stream the SSE writer appends to
#[async_trait]
pub trait EventSink: Send {
    /// Record a response header directive
    ///
    /// Called before the first append. Sinks without a header section
    /// ignore it.
    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        let _ = (name, value);
    }

    /// Append text to the output; it may stay buffered until [`flush`](Self::flush)
    async fn append(&mut self, text: &str) -> io::Result<()>;

    /// Make everything appended so far visible to the receiver
    async fn flush(&mut self) -> io::Result<()>;
}

/// Sink feeding a channel of body chunks, one chunk per flush
///
/// Used by [`Sse`](crate::sse::Sse) to drive a streaming HTTP body. When the
/// receiver is gone (client disconnected) `flush` fails with
/// [`io::ErrorKind::BrokenPipe`].
#[derive(Debug)]
pub struct ChannelSink {
    pending: BytesMut,
    tx: mpsc::Sender<Bytes>,
}

impl ChannelSink {
    /// Create a sink and the receiver for its chunks
    ///
    /// `capacity` bounds how many flushed chunks may wait for the receiver
    /// before `flush` waits.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                pending: BytesMut::new(),
                tx,
            },
            rx,
        )
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn append(&mut self, text: &str) -> io::Result<()> {
        if self.tx.is_closed() {
            return Err(receiver_closed());
        }
        self.pending.extend_from_slice(text.as_bytes());
        Ok(())
    }

    async fn flush(&mut self) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let chunk = self.pending.split().freeze();
        self.tx.send(chunk).await.map_err(|_| receiver_closed())
    }
}

fn receiver_closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "event stream receiver closed")
}

/// Sink over any tokio [`AsyncWrite`]; header directives are ignored
#[derive(Debug)]
pub struct WriterSink<W> {
    inner: W,
}

impl<W> WriterSink<W> {
    /// Wrap a writer
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Get the wrapped writer back
    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[async_trait]
impl<W> EventSink for WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn append(&mut self, text: &str) -> io::Result<()> {
        self.inner.write_all(text.as_bytes()).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().await
    }
}

/// In-memory sink recording headers, bytes, and flushes
///
/// Useful for tests and for rendering an event stream to a string.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    headers: HeaderMap,
    output: String,
    flushed_len: usize,
    flushes: usize,
    appends_before_headers: usize,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything appended so far
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Everything appended up to the last flush
    pub fn flushed(&self) -> &str {
        &self.output[..self.flushed_len]
    }

    /// Number of flushes issued
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Headers recorded through [`EventSink::set_header`]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Whether any text was appended while no header had been set
    pub fn wrote_before_headers(&self) -> bool {
        self.appends_before_headers > 0
    }
}

#[async_trait]
impl EventSink for MemorySink {
    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    async fn append(&mut self, text: &str) -> io::Result<()> {
        if self.headers.is_empty() {
            self.appends_before_headers += 1;
        }
        self.output.push_str(text);
        Ok(())
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        self.flushed_len = self.output.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_sink_one_chunk_per_flush() {
        let (mut sink, mut rx) = ChannelSink::channel(4);
        sink.append("event: a\n").await.unwrap();
        sink.append("data: 1\n\n").await.unwrap();
        sink.flush().await.unwrap();
        // Nothing pending, nothing sent
        sink.flush().await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), Bytes::from("event: a\ndata: 1\n\n"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_channel_sink_closed_receiver() {
        let (mut sink, rx) = ChannelSink::channel(1);
        drop(rx);
        let err = sink.append("data: x\n").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn test_writer_sink_writes_through() {
        let mut sink = WriterSink::new(Vec::new());
        sink.append("data: hi\n\n").await.unwrap();
        sink.flush().await.unwrap();
        assert_eq!(sink.into_inner(), b"data: hi\n\n");
    }

    #[tokio::test]
    async fn test_memory_sink_tracks_flushes() {
        let mut sink = MemorySink::new();
        sink.append("one").await.unwrap();
        sink.flush().await.unwrap();
        sink.append("two").await.unwrap();

        assert_eq!(sink.output(), "onetwo");
        assert_eq!(sink.flushed(), "one");
        assert_eq!(sink.flush_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_sink_detects_body_before_headers() {
        let mut sink = MemorySink::new();
        sink.append("data: early\n\n").await.unwrap();
        assert!(sink.wrote_before_headers());

        let mut sink = MemorySink::new();
        sink.set_header(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/event-stream"),
        );
        sink.append("data: late\n\n").await.unwrap();
        assert!(!sink.wrote_before_headers());
    }
}
