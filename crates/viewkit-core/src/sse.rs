//! Server-Sent Events for viewkit
//!
//! This module serializes named events into the `text/event-stream` wire
//! format and writes them to an [`EventSink`] as they become available:
//!
//! ```text
//! event: <name>
//! data: <chunk 1>
//! data: <chunk 2>
//!
//! ```
//!
//! Every event is flushed on its own, right after its terminating blank line.
//!
//! # Example
//!
//! ```rust,ignore
//! use viewkit_core::sse::{Sse, SseEvent};
//! use viewkit_core::bridge::{Notifier, PushSourceExt};
//! use futures_util::StreamExt;
//!
//! async fn events(notifier: Notifier<String>) -> impl IntoResponse {
//!     let stream = notifier
//!         .into_stream(CancellationToken::new())
//!         .map(|item| item.map(|html| SseEvent::html("updated", html)));
//!     Sse::new(stream)
//! }
//! ```

use crate::error::StreamError;
use crate::response::{IntoResponse, Response};
use crate::sink::{ChannelSink, EventSink};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use http::{header, HeaderName, HeaderValue, StatusCode};
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use serde::Serialize;
use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Content type of an event stream
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Flushed chunks allowed to queue between the writer task and hyper
const RESPONSE_CHANNEL_CAPACITY: usize = 16;

/// The three response directives every event stream carries
pub fn sse_headers() -> [(HeaderName, HeaderValue); 3] {
    [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static(EVENT_STREAM_CONTENT_TYPE),
        ),
        (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        (header::CONNECTION, HeaderValue::from_static("keep-alive")),
    ]
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}

/// Remove every line-break character from `text`
///
/// Raw newlines inside a field would end the field early and corrupt the
/// framing. Borrows when there is nothing to strip.
pub fn strip_line_breaks(text: &str) -> Cow<'_, str> {
    if text.contains(is_line_break) {
        Cow::Owned(text.chars().filter(|c| !is_line_break(*c)).collect())
    } else {
        Cow::Borrowed(text)
    }
}

type LazyChunks = Arc<dyn Fn() -> Vec<String> + Send + Sync>;

#[derive(Clone)]
enum EventData {
    Single(String),
    Chunks(Vec<String>),
    Lazy(LazyChunks),
}

/// A named Server-Sent Event
///
/// The payload is either a single string (one `data:` line), an explicit
/// list of chunks (one `data:` line each, in order), or a closure producing
/// the chunks when the event is written.
#[derive(Clone)]
pub struct SseEvent {
    name: String,
    data: EventData,
    id: Option<String>,
    retry: Option<u64>,
}

impl SseEvent {
    /// Create an event with a single data payload
    pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self::with_data(name, EventData::Single(data.into()))
    }

    fn with_data(name: impl Into<String>, data: EventData) -> Self {
        Self {
            name: name.into(),
            data,
            id: None,
            retry: None,
        }
    }

    /// Create an event whose chunks are produced when it is written
    pub fn data<F, I>(name: impl Into<String>, chunks: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let lazy: LazyChunks = Arc::new(move || chunks().into_iter().map(Into::into).collect());
        Self::with_data(name, EventData::Lazy(lazy))
    }

    /// Create an event carrying one rendered HTML fragment
    pub fn html(name: impl Into<String>, html: impl Into<String>) -> Self {
        Self::new(name, html)
    }

    /// Create an event carrying several HTML fragments, one data line each
    pub fn html_chunks<I>(name: impl Into<String>, chunks: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let chunks = chunks.into_iter().map(Into::into).collect();
        Self::with_data(name, EventData::Chunks(chunks))
    }

    /// Create an event carrying `value` serialized as JSON
    pub fn json<T: Serialize + ?Sized>(
        name: impl Into<String>,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(name, serde_json::to_string(value)?))
    }

    /// Create an event carrying one JSON document per item
    pub fn json_chunks<'a, T, I>(
        name: impl Into<String>,
        values: I,
    ) -> Result<Self, serde_json::Error>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let chunks = values
            .into_iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_data(name, EventData::Chunks(chunks)))
    }

    /// Set the event ID
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the reconnection time in milliseconds
    pub fn retry(mut self, retry: u64) -> Self {
        self.retry = Some(retry);
        self
    }

    /// The event name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The data chunks, evaluating a lazy payload
    pub fn chunks(&self) -> Vec<Cow<'_, str>> {
        match &self.data {
            EventData::Single(data) => vec![Cow::Borrowed(data.as_str())],
            EventData::Chunks(chunks) => chunks.iter().map(|c| Cow::Borrowed(c.as_str())).collect(),
            EventData::Lazy(produce) => produce().into_iter().map(Cow::Owned).collect(),
        }
    }

    /// The lines of this event in write order, terminating blank line included
    fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(4);
        lines.push(format!("event: {}\n", strip_line_breaks(&self.name)));
        if let Some(ref id) = self.id {
            lines.push(format!("id: {}\n", strip_line_breaks(id)));
        }
        if let Some(retry) = self.retry {
            lines.push(format!("retry: {}\n", retry));
        }
        for chunk in self.chunks() {
            lines.push(format!("data: {}\n", strip_line_breaks(&chunk)));
        }
        lines.push("\n".to_string());
        lines
    }

    /// Format the event as it appears on the wire
    pub fn to_sse_string(&self) -> String {
        self.lines().concat()
    }
}

impl fmt::Debug for SseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data: &dyn fmt::Debug = match &self.data {
            EventData::Single(data) => data,
            EventData::Chunks(chunks) => chunks,
            EventData::Lazy(_) => &"<lazy>",
        };
        f.debug_struct("SseEvent")
            .field("name", &self.name)
            .field("data", data)
            .field("id", &self.id)
            .field("retry", &self.retry)
            .finish()
    }
}

/// How a call to [`SseWriter::stream`] ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The event sequence ended
    Completed,
    /// The cancellation token fired
    Cancelled,
}

/// Writes events to an [`EventSink`] in the SSE wire format
///
/// # Example
///
/// ```rust,ignore
/// use viewkit_core::sink::WriterSink;
/// use viewkit_core::sse::{SseEvent, SseWriter};
///
/// let mut writer = SseWriter::new(WriterSink::new(tokio::io::stdout()));
/// writer.write_event(&SseEvent::new("created", "A")).await?;
/// ```
pub struct SseWriter<W> {
    sink: W,
    keep_alive: Option<Duration>,
    headers_set: bool,
    events_written: u64,
}

impl<W: EventSink> SseWriter<W> {
    /// Create a writer over `sink`
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            keep_alive: None,
            headers_set: false,
            events_written: 0,
        }
    }

    /// Send a `:keep-alive` comment whenever `interval` passes without an event
    pub fn keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = Some(interval);
        self
    }

    /// Number of events written and flushed so far
    pub fn events_written(&self) -> u64 {
        self.events_written
    }

    /// Borrow the sink
    pub fn sink(&self) -> &W {
        &self.sink
    }

    /// Get the sink back
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn ensure_headers(&mut self) {
        if !self.headers_set {
            for (name, value) in sse_headers() {
                self.sink.set_header(name, value);
            }
            self.headers_set = true;
        }
    }

    /// Write one event and flush it
    pub async fn write_event(&mut self, event: &SseEvent) -> io::Result<()> {
        self.ensure_headers();
        for line in event.lines() {
            self.sink.append(&line).await?;
        }
        self.sink.flush().await?;
        self.events_written += 1;
        tracing::trace!(event = event.name(), "sse event flushed");
        Ok(())
    }

    async fn write_keep_alive(&mut self) -> io::Result<()> {
        self.ensure_headers();
        self.sink.append(":keep-alive\n\n").await?;
        self.sink.flush().await
    }

    /// Write every event from `events` until it ends, fails, or `cancel` fires
    ///
    /// Cancellation stops writing and drops `events`; it is reported as
    /// [`StreamOutcome::Cancelled`], not as an error. A failure item ends the
    /// stream with [`StreamError::Source`]; events already flushed stand.
    pub async fn stream<S, E>(
        &mut self,
        events: S,
        cancel: &CancellationToken,
    ) -> Result<StreamOutcome, StreamError<E>>
    where
        S: Stream<Item = Result<SseEvent, E>>,
    {
        self.ensure_headers();
        let mut events = std::pin::pin!(events);
        let mut ticker = self.keep_alive.map(|interval| {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(StreamOutcome::Cancelled),
                next = events.next() => next,
                _ = tick(&mut ticker) => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Ok(StreamOutcome::Cancelled),
                        written = self.write_keep_alive() => written?,
                    }
                    continue;
                }
            };

            let event = match next {
                None => return Ok(StreamOutcome::Completed),
                Some(Err(err)) => return Err(StreamError::Source(err)),
                Some(Ok(event)) => event,
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(StreamOutcome::Cancelled),
                written = self.write_event(&event) => written?,
            }

            if let Some(ticker) = ticker.as_mut() {
                ticker.reset();
            }
        }
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Server-Sent Events response
///
/// Wraps a stream of `Result<SseEvent, E>` and turns it into a streaming
/// `text/event-stream` response. Converting into a response spawns the writer
/// on the current tokio runtime; it stops when the stream ends, the source
/// fails, the cancellation token fires, or the client disconnects. In every
/// case the event stream is dropped, which releases a bridged subscription.
///
/// Outside a tokio runtime the conversion logs an error and returns
/// `500 Internal Server Error`; the stream is dropped unpolled.
pub struct Sse<S> {
    stream: S,
    keep_alive: Option<Duration>,
    cancel: CancellationToken,
}

impl<S> Sse<S> {
    /// Create a new SSE response from a stream
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            keep_alive: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Set the keep-alive interval
    pub fn keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = Some(interval);
        self
    }

    /// Stop streaming when `cancel` fires
    pub fn cancel_on(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl<S, E> IntoResponse for Sse<S>
where
    S: Stream<Item = Result<SseEvent, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    fn into_response(self) -> Response {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!("SSE response needs a tokio runtime: {}", err);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        let (sink, mut rx) = ChannelSink::channel(RESPONSE_CHANNEL_CAPACITY);
        let mut writer = SseWriter::new(sink);
        if let Some(interval) = self.keep_alive {
            writer = writer.keep_alive(interval);
        }
        let stream = self.stream;
        let cancel = self.cancel;

        runtime.spawn(async move {
            match writer.stream(stream, &cancel).await {
                Ok(outcome) => tracing::debug!(
                    ?outcome,
                    events = writer.events_written(),
                    "event stream ended"
                ),
                Err(StreamError::Io(err)) => tracing::debug!(
                    events = writer.events_written(),
                    "event stream client went away: {}",
                    err
                ),
                Err(StreamError::Source(err)) => tracing::warn!(
                    events = writer.events_written(),
                    "event source failed: {}",
                    err
                ),
            }
        });

        let frames = futures_util::stream::poll_fn(move |cx| {
            rx.poll_recv(cx)
                .map(|chunk| chunk.map(|bytes: Bytes| Ok::<_, Infallible>(Frame::data(bytes))))
        });

        let mut response = http::Response::new(StreamBody::new(frames).boxed_unsync());
        *response.status_mut() = StatusCode::OK;
        response.headers_mut().extend(sse_headers());
        response
    }
}

/// Helper function to create an SSE response from a fixed set of events
pub fn sse_from_iter<I>(
    events: I,
) -> Sse<futures_util::stream::Iter<std::vec::IntoIter<Result<SseEvent, Infallible>>>>
where
    I: IntoIterator<Item = SseEvent>,
{
    let events: Vec<_> = events.into_iter().map(Ok).collect();
    Sse::new(futures_util::stream::iter(events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use proptest::prelude::*;

    #[test]
    fn test_response_outside_runtime_is_500() {
        let response = sse_from_iter([SseEvent::new("tick", "1")]).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_single_payload_event() {
        let event = SseEvent::new("created", "A");
        assert_eq!(event.to_sse_string(), "event: created\ndata: A\n\n");
    }

    #[test]
    fn test_embedded_newlines_are_stripped() {
        let event = SseEvent::html("updated", "line1\nline2");
        assert_eq!(event.to_sse_string(), "event: updated\ndata: line1line2\n\n");

        let event = SseEvent::new("updated", "a\r\nb\u{2028}c");
        assert_eq!(event.to_sse_string(), "event: updated\ndata: abc\n\n");
    }

    #[test]
    fn test_chunk_list_one_line_each() {
        let event = SseEvent::html_chunks("list", ["A", "B"]);
        assert_eq!(event.to_sse_string(), "event: list\ndata: A\ndata: B\n\n");
    }

    #[test]
    fn test_lazy_data_evaluated_on_write() {
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = counter.clone();
        let event = SseEvent::data("tick", move || {
            let n = seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            vec![format!("n={}", n)]
        });

        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(event.to_sse_string(), "event: tick\ndata: n=0\n\n");
        assert_eq!(event.to_sse_string(), "event: tick\ndata: n=1\n\n");
    }

    #[test]
    fn test_json_events() {
        #[derive(Serialize)]
        struct Item {
            id: u32,
        }

        let event = SseEvent::json("item", &Item { id: 1 }).unwrap();
        assert_eq!(event.to_sse_string(), "event: item\ndata: {\"id\":1}\n\n");

        let items = vec![Item { id: 1 }, Item { id: 2 }];
        let event = SseEvent::json_chunks("items", &items).unwrap();
        assert_eq!(
            event.to_sse_string(),
            "event: items\ndata: {\"id\":1}\ndata: {\"id\":2}\n\n"
        );
    }

    #[test]
    fn test_id_and_retry_lines() {
        let event = SseEvent::new("message", "Hello").id("1").retry(3000);
        assert_eq!(
            event.to_sse_string(),
            "event: message\nid: 1\nretry: 3000\ndata: Hello\n\n"
        );
    }

    #[test]
    fn test_name_line_breaks_stripped() {
        let event = SseEvent::new("bad\nname", "x");
        assert_eq!(event.to_sse_string(), "event: badname\ndata: x\n\n");
    }

    #[test]
    fn test_strip_line_breaks_borrows_clean_text() {
        assert!(matches!(strip_line_breaks("clean"), Cow::Borrowed("clean")));
        assert_eq!(strip_line_breaks("a\nb"), "ab");
    }

    #[tokio::test]
    async fn test_writer_flushes_each_event() {
        let mut writer = SseWriter::new(MemorySink::new());
        writer.write_event(&SseEvent::new("created", "A")).await.unwrap();
        assert_eq!(writer.sink().flush_count(), 1);
        writer.write_event(&SseEvent::new("updated", "B")).await.unwrap();

        let sink = writer.into_inner();
        assert_eq!(sink.flush_count(), 2);
        assert_eq!(
            sink.flushed(),
            "event: created\ndata: A\n\nevent: updated\ndata: B\n\n"
        );
        assert_eq!(sink.headers()[header::CONTENT_TYPE], "text/event-stream");
        assert!(!sink.wrote_before_headers());
    }

    #[tokio::test]
    async fn test_sse_response_headers_and_body() {
        use http_body_util::BodyExt;

        let response = sse_from_iter(vec![
            SseEvent::new("created", "A"),
            SseEvent::new("updated", "B"),
        ])
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-cache"
        );
        assert_eq!(
            response.headers().get(header::CONNECTION).unwrap(),
            "keep-alive"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(
            body,
            Bytes::from("event: created\ndata: A\n\nevent: updated\ndata: B\n\n")
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_event_framing(
            name in "[a-zA-Z][a-zA-Z0-9_\n]{0,20}",
            chunks in proptest::collection::vec("[a-zA-Z0-9 \r\n]{0,30}", 1..5),
        ) {
            let event = SseEvent::html_chunks(name, chunks.clone());
            let wire = event.to_sse_string();

            // Exactly one blank line, at the very end
            prop_assert!(wire.ends_with("\n\n"));
            prop_assert_eq!(wire.matches("\n\n").count(), 1);

            let lines: Vec<&str> = wire.trim_end_matches('\n').split('\n').collect();
            prop_assert!(lines[0].starts_with("event: "));
            prop_assert_eq!(lines.len(), chunks.len() + 1);
            for (line, chunk) in lines[1..].iter().zip(&chunks) {
                let expected = format!("data: {}", chunk.replace(['\r', '\n'], ""));
                prop_assert_eq!(*line, expected.as_str());
            }
        }
    }
}
