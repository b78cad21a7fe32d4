//! Terminal signals that end a streamed response.
//!
//! The remote service reports why it stopped with a vendor-defined string
//! (`STOP`, `MAX_TOKENS`, `SAFETY`, ...). The full set belongs to the service,
//! so the mapping from those strings to the few kinds the aggregator acts on is
//! a [`TerminalPolicy`] that callers can extend.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// What a terminal signal means for the turn being streamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalKind {
    /// The model completed normally.
    Stop,
    /// The model hit its output token limit.
    LengthLimit,
    /// The response was halted by safety filtering.
    Safety,
    /// Any other reported reason.
    Other,
}

impl TerminalKind {
    /// Whether the turn is finalized as-is, without a diagnostic note.
    pub const fn is_clean(self) -> bool {
        matches!(self, Self::Stop | Self::LengthLimit)
    }
}

impl fmt::Display for TerminalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stop => "stop",
            Self::LengthLimit => "length-limit",
            Self::Safety => "safety",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// A terminal signal as delivered with the last fragment of a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminal {
    pub kind: TerminalKind,
    /// Vendor reason string, e.g. `"RECITATION"`.
    pub detail: Option<String>,
}

impl Terminal {
    pub fn new(kind: TerminalKind) -> Self {
        Self { kind, detail: None }
    }

    pub fn with_detail(kind: TerminalKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
        }
    }

    pub fn stop() -> Self {
        Self::with_detail(TerminalKind::Stop, "STOP")
    }

    pub fn length_limit() -> Self {
        Self::with_detail(TerminalKind::LengthLimit, "MAX_TOKENS")
    }

    pub fn safety() -> Self {
        Self::with_detail(TerminalKind::Safety, "SAFETY")
    }

    pub fn other(detail: impl Into<String>) -> Self {
        Self::with_detail(TerminalKind::Other, detail)
    }

    /// The name used in diagnostic notes: the vendor detail when present.
    pub fn reason(&self) -> String {
        match &self.detail {
            Some(d) => d.clone(),
            None => self.kind.to_string().to_ascii_uppercase(),
        }
    }
}

/// Maps vendor finish-reason strings to [`TerminalKind`].
///
/// Unknown strings map to [`TerminalKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalPolicy {
    reasons: HashMap<String, TerminalKind>,
}

impl Default for TerminalPolicy {
    fn default() -> Self {
        Self::empty()
            .with_reason("STOP", TerminalKind::Stop)
            .with_reason("MAX_TOKENS", TerminalKind::LengthLimit)
            .with_reason("SAFETY", TerminalKind::Safety)
    }
}

impl TerminalPolicy {
    /// A policy that maps every reason to [`TerminalKind::Other`].
    pub fn empty() -> Self {
        Self {
            reasons: HashMap::new(),
        }
    }

    /// Add or replace the mapping for one vendor reason (case-insensitive).
    pub fn with_reason(mut self, reason: impl AsRef<str>, kind: TerminalKind) -> Self {
        self.reasons
            .insert(reason.as_ref().to_ascii_uppercase(), kind);
        self
    }

    pub fn kind_of(&self, reason: &str) -> TerminalKind {
        self.reasons
            .get(&reason.trim().to_ascii_uppercase())
            .copied()
            .unwrap_or(TerminalKind::Other)
    }

    /// Build the terminal signal for a vendor reason string.
    pub fn classify(&self, reason: &str) -> Terminal {
        Terminal::with_detail(self.kind_of(reason), reason.trim())
    }
}
