//! Streaming types and cancellation support.

use std::pin::Pin;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::types::Slide;

/// A finite stream of generated slides.
///
/// Yields slides in deck order and ends after the first error. Slides are
/// produced lazily, so dropping the stream abandons any remaining work.
pub type SlideStream = Pin<Box<dyn Stream<Item = Result<Slide>> + Send>>;

/// Handle for cancelling an in-flight slide stream.
///
/// Cloning is cheap; all clones observe the same cancellation state, so the
/// handle can be kept on one task while the stream is consumed on another.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Create a fresh handle.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once the handle is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

/// Wrap a slide stream so it ends as soon as `handle` is cancelled.
///
/// Cancellation wins over a pending item, so a stream blocked on a slow
/// LLM call terminates without waiting for the call to finish.
pub(crate) fn make_cancellable(inner: SlideStream, handle: CancelHandle) -> SlideStream {
    let stream = async_stream::stream! {
        let mut inner = inner;
        loop {
            tokio::select! {
                biased;
                _ = handle.cancelled() => break,
                item = inner.next() => {
                    match item {
                        Some(item) => yield item,
                        None => break,
                    }
                }
            }
        }
    };
    Box::pin(stream)
}
