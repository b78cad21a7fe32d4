//! Conversion of `streamGenerateContent?alt=sse` chunks into fragments.

use super::types::GenerateContentResponse;
use crate::error::{AssistError, Result};
use crate::terminal::TerminalPolicy;
use crate::transport::Fragment;

/// Parse one SSE `data:` payload.
pub fn parse_chunk(data: &str) -> Result<GenerateContentResponse> {
    serde_json::from_str(data)
        .map_err(|e| AssistError::ParseError(format!("Failed to parse SSE JSON (gemini): {e}")))
}

/// Turn a streamed chunk into a fragment.
///
/// The text comes from the first candidate. A finish reason, or a prompt-level
/// block reason when no candidate was produced, becomes the terminal signal.
pub fn chunk_to_fragment(chunk: &GenerateContentResponse, policy: &TerminalPolicy) -> Fragment {
    let text = chunk.text().filter(|t| !t.is_empty());
    let terminal = chunk
        .finish_reason()
        .or_else(|| chunk.block_reason())
        .map(|reason| policy.classify(reason));
    Fragment { text, terminal }
}
