//! Cancellation utilities
//!
//! Provides cancellation handles for fragment streams. Cancelling a handle stops
//! consumption as soon as possible; dropping the cancelled stream closes the
//! underlying HTTP connection so the service stops generating.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{AssistError, Result};
use crate::transport::FragmentStream;

/// A handle that can be used to request cancellation.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Create a new cancel handle.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A future that resolves when cancellation is requested.
    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Drive `fut` to completion unless cancellation is requested first.
    ///
    /// Returns `AssistError::Cancelled` when the handle wins; `fut` is dropped
    /// without being polled again.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(AssistError::Cancelled(
                "cancelled before the stream opened".to_string(),
            )),
            out = fut => out,
        }
    }

    /// A handle cancelled together with this one, but cancellable on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }
}

/// Make a fragment stream cancellable and return its cancel handle.
///
/// The returned stream simply ends once the handle is cancelled.
pub fn make_cancellable_stream(stream: FragmentStream) -> (FragmentStream, CancelHandle) {
    let handle = CancelHandle::new();
    let token = handle.token.clone();
    let mut inner = stream;
    let s = async_stream::stream! {
        use futures::StreamExt;
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                item = inner.next() => {
                    let Some(item) = item else { break };
                    yield item;
                }
            }
        }
    };
    (Box::pin(s), handle)
}
