//! Error types for viewkit-core

use thiserror::Error;

/// Error returned when streaming events to a sink stops abnormally
///
/// Cancellation is not an error: a cancelled stream returns
/// [`StreamOutcome::Cancelled`](crate::sse::StreamOutcome::Cancelled).
#[derive(Error, Debug)]
pub enum StreamError<E> {
    /// The event source signalled a failure. Output already flushed stands.
    #[error("event source failed: {0}")]
    Source(E),

    /// Writing to or flushing the sink failed (e.g. the client went away)
    #[error("failed to write event stream: {0}")]
    Io(#[from] std::io::Error),
}

impl<E> StreamError<E> {
    /// Returns the source failure, if this error carries one
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::Source(err) => Some(err),
            Self::Io(_) => None,
        }
    }

    /// Check whether the sink side failed rather than the source
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
