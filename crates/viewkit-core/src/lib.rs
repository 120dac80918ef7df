//! # viewkit core
//!
//! Foundational pieces for hypermedia-style servers that render HTML on the
//! server and push updates over Server-Sent Events:
//!
//! - [`bridge`]: turn a push source (callbacks) into a pull [`Stream`](futures_util::Stream)
//! - [`sse`]: write named events in the SSE wire format, one flush per event
//! - [`sink`]: the append-and-flush outputs the SSE writer targets
//! - [`json`]: serde converters that accept stringified booleans and integers
//! - [`response`]: `IntoResponse` glue for hyper services
//!
//! This crate is not meant to be used directly. Use `viewkit` instead.

pub mod bridge;
mod error;
pub mod json;
pub mod response;
pub mod sink;
pub mod sse;

// Public API
pub use bridge::{BufferPolicy, Notifier, Observer, PushSource, PushSourceExt, Subscription};
pub use error::StreamError;
pub use json::{LenientBool, LenientInt};
pub use response::{Body, Html, IntoResponse, Response};
pub use sink::{ChannelSink, EventSink, MemorySink, WriterSink};
pub use sse::{Sse, SseEvent, SseWriter, StreamOutcome};

// Re-exported so callers share the bridge's token type
pub use tokio_util::sync::CancellationToken;
