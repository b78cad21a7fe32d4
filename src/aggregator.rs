//! Stream aggregation
//!
//! Folds a [`FragmentStream`] into a model [`ConversationTurn`]: each text
//! fragment is appended verbatim, the snippet is re-extracted from the whole
//! content, and the updated turn is published to the caller. The first
//! terminal signal, transport error, end of stream or cancellation finalizes
//! the turn.
//!
//! One send is one attempt; nothing here retries. Only one aggregation may run
//! per turn at a time, which `&mut ConversationTurn` already enforces.

use std::future::Future;

use futures_util::StreamExt;

use crate::cancel::CancelHandle;
use crate::config::AssistConfig;
use crate::error::{AssistError, Result};
use crate::extract::SnippetExtractor;
use crate::terminal::{Terminal, TerminalKind};
use crate::transport::FragmentStream;
use crate::turn::ConversationTurn;

/// Caller-facing warning raised alongside a safety stop.
pub const SAFETY_WARNING: &str = "The response was blocked due to safety settings.";

/// Note appended to a turn whose stream was cancelled.
pub const CANCELLED_NOTE: &str = "\n\n*(Stream cancelled)*";

/// Note appended for safety and other non-clean stops.
pub fn diagnostic_note(terminal: &Terminal) -> String {
    format!("\n\n*(Stream finished: {})*", terminal.reason())
}

/// Content put in place of a turn whose remote call failed.
pub fn error_placeholder(error: &AssistError) -> String {
    format!("*(Error: {})*", error.user_message())
}

/// How a stream ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    /// Normal stop, length limit, or the stream ended without a terminal.
    Completed { terminal: Option<Terminal> },
    /// Halted by safety filtering; a diagnostic note was appended.
    Blocked { terminal: Terminal },
    /// Stopped for another reported reason; a diagnostic note was appended.
    Stopped { terminal: Terminal },
    /// The cancel handle fired.
    Cancelled,
    /// Opening or continuing the stream failed.
    Failed { error: AssistError },
}

/// Result of one aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamReport {
    pub outcome: StreamOutcome,
    /// Fragments consumed, including the terminal one.
    pub fragments: usize,
}

impl StreamReport {
    /// Whether the caller should surface the dedicated blocked warning.
    pub fn is_blocked(&self) -> bool {
        matches!(self.outcome, StreamOutcome::Blocked { .. })
    }

    /// The blocked warning, if any.
    pub fn warning(&self) -> Option<&'static str> {
        self.is_blocked().then_some(SAFETY_WARNING)
    }

    pub fn error(&self) -> Option<&AssistError> {
        match &self.outcome {
            StreamOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, StreamOutcome::Completed { .. })
    }
}

/// Folds fragments into turns.
#[derive(Debug, Clone, Default)]
pub struct StreamAggregator {
    extractor: SnippetExtractor,
}

impl StreamAggregator {
    pub fn new(extractor: SnippetExtractor) -> Self {
        Self { extractor }
    }

    /// Aggregator using the configured snippet whitelist.
    pub fn from_config(config: &AssistConfig) -> Result<Self> {
        Ok(Self::new(config.snippet_extractor()?))
    }

    pub fn extractor(&self) -> &SnippetExtractor {
        &self.extractor
    }

    /// Consume `stream` into `turn`, calling `on_update` after every change.
    ///
    /// Errors are folded into the returned report; this never fails.
    pub async fn aggregate<F>(
        &self,
        turn: &mut ConversationTurn,
        mut stream: FragmentStream,
        cancel: &CancelHandle,
        mut on_update: F,
    ) -> StreamReport
    where
        F: FnMut(&ConversationTurn),
    {
        let mut fragments = 0usize;
        loop {
            if cancel.is_cancelled() {
                return self.cancelled(turn, fragments, &mut on_update);
            }

            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                item = stream.next() => Some(item),
            };
            let Some(item) = next else {
                return self.cancelled(turn, fragments, &mut on_update);
            };

            let fragment = match item {
                Some(Ok(fragment)) => fragment,
                Some(Err(error)) => {
                    let mut report = self.fail(turn, error, &mut on_update);
                    report.fragments = fragments;
                    return report;
                }
                None => {
                    tracing::debug!(turn = %turn.id(), fragments, "stream ended without terminal signal");
                    turn.finalize();
                    on_update(turn);
                    return StreamReport {
                        outcome: StreamOutcome::Completed { terminal: None },
                        fragments,
                    };
                }
            };
            fragments += 1;

            if let Some(text) = fragment.text.as_deref().filter(|t| !t.is_empty()) {
                turn.append(text, &self.extractor);
                on_update(turn);
            }

            if let Some(terminal) = fragment.terminal {
                return self.finish(turn, terminal, fragments, &mut on_update);
            }
        }
    }

    /// Open a stream with `open` and aggregate it into `turn`.
    ///
    /// The open itself races the cancel handle, so a request that never
    /// receives response headers still ends as `Cancelled`.
    pub async fn open_and_aggregate<O, F>(
        &self,
        turn: &mut ConversationTurn,
        open: O,
        cancel: &CancelHandle,
        mut on_update: F,
    ) -> StreamReport
    where
        O: Future<Output = Result<FragmentStream>>,
        F: FnMut(&ConversationTurn),
    {
        match cancel.run(open).await {
            Ok(stream) => self.aggregate(turn, stream, cancel, on_update).await,
            Err(AssistError::Cancelled(_)) => self.cancelled(turn, 0, &mut on_update),
            Err(error) => self.fail(turn, error, &mut on_update),
        }
    }

    /// Mark `turn` as failed without consuming anything.
    ///
    /// Used when the stream could not be opened at all.
    pub fn fail<F>(
        &self,
        turn: &mut ConversationTurn,
        error: AssistError,
        on_update: &mut F,
    ) -> StreamReport
    where
        F: FnMut(&ConversationTurn),
    {
        tracing::warn!(turn = %turn.id(), error = %error, "stream failed");
        turn.mark_errored(error_placeholder(&error), &self.extractor);
        on_update(turn);
        StreamReport {
            outcome: StreamOutcome::Failed { error },
            fragments: 0,
        }
    }

    fn finish<F>(
        &self,
        turn: &mut ConversationTurn,
        terminal: Terminal,
        fragments: usize,
        on_update: &mut F,
    ) -> StreamReport
    where
        F: FnMut(&ConversationTurn),
    {
        let outcome = match terminal.kind {
            TerminalKind::Stop | TerminalKind::LengthLimit => {
                tracing::debug!(turn = %turn.id(), reason = %terminal.reason(), "stream finished");
                StreamOutcome::Completed {
                    terminal: Some(terminal),
                }
            }
            TerminalKind::Safety => {
                tracing::warn!(turn = %turn.id(), reason = %terminal.reason(), "stream blocked by safety settings");
                turn.append(&diagnostic_note(&terminal), &self.extractor);
                turn.mark_blocked();
                StreamOutcome::Blocked { terminal }
            }
            TerminalKind::Other => {
                tracing::info!(turn = %turn.id(), reason = %terminal.reason(), "stream stopped");
                turn.append(&diagnostic_note(&terminal), &self.extractor);
                StreamOutcome::Stopped { terminal }
            }
        };
        turn.finalize();
        on_update(turn);
        StreamReport { outcome, fragments }
    }

    fn cancelled<F>(
        &self,
        turn: &mut ConversationTurn,
        fragments: usize,
        on_update: &mut F,
    ) -> StreamReport
    where
        F: FnMut(&ConversationTurn),
    {
        tracing::info!(turn = %turn.id(), fragments, "stream cancelled");
        turn.mark_cancelled(CANCELLED_NOTE, &self.extractor);
        on_update(turn);
        StreamReport {
            outcome: StreamOutcome::Cancelled,
            fragments,
        }
    }
}
