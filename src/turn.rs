//! Conversation turns and their render projection.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extract::SnippetExtractor;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Role name on the Gemini wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// Opaque turn identifier, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(Uuid);

impl TurnId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// Model turn still receiving fragments.
    Streaming,
    /// Complete. User turns start here.
    Finalized,
    /// The remote call failed; content holds the error placeholder.
    Errored,
    /// The caller aborted the stream.
    Cancelled,
}

/// One message in a conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationTurn {
    id: TurnId,
    role: Role,
    content: String,
    extracted_snippet: Option<String>,
    show_preview: bool,
    blocked: bool,
    error_placeholder: Option<String>,
    status: TurnStatus,
    created_at: DateTime<Utc>,
}

impl ConversationTurn {
    /// A finalized user turn. Its content never changes.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with(Role::User, content.into(), TurnStatus::Finalized)
    }

    /// An empty model turn ready to receive fragments.
    pub fn model() -> Self {
        Self::with(Role::Model, String::new(), TurnStatus::Streaming)
    }

    /// A model turn whose content starts with `prefix`.
    pub fn model_seeded(prefix: impl Into<String>) -> Self {
        Self::with(Role::Model, prefix.into(), TurnStatus::Streaming)
    }

    fn with(role: Role, content: String, status: TurnStatus) -> Self {
        Self {
            id: TurnId::new(),
            role,
            content,
            extracted_snippet: None,
            show_preview: false,
            blocked: false,
            error_placeholder: None,
            status,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> TurnId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn extracted_snippet(&self) -> Option<&str> {
        self.extracted_snippet.as_deref()
    }

    pub fn show_preview(&self) -> bool {
        self.show_preview
    }

    pub fn blocked(&self) -> bool {
        self.blocked
    }

    pub fn error_placeholder(&self) -> Option<&str> {
        self.error_placeholder.as_deref()
    }

    pub fn status(&self) -> TurnStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Append fragment text and recompute the snippet from the whole content.
    pub(crate) fn append(&mut self, text: &str, extractor: &SnippetExtractor) {
        debug_assert_eq!(self.role, Role::Model, "user turns are immutable");
        self.content.push_str(text);
        self.refresh_snippet(extractor);
    }

    pub(crate) fn finalize(&mut self) {
        self.status = TurnStatus::Finalized;
    }

    pub(crate) fn mark_blocked(&mut self) {
        self.blocked = true;
    }

    pub(crate) fn mark_cancelled(&mut self, note: &str, extractor: &SnippetExtractor) {
        self.content.push_str(note);
        self.refresh_snippet(extractor);
        self.status = TurnStatus::Cancelled;
    }

    /// Replace the content with an error placeholder.
    pub(crate) fn mark_errored(&mut self, placeholder: String, extractor: &SnippetExtractor) {
        self.content = placeholder.clone();
        self.error_placeholder = Some(placeholder);
        self.refresh_snippet(extractor);
        self.status = TurnStatus::Errored;
    }

    fn refresh_snippet(&mut self, extractor: &SnippetExtractor) {
        self.extracted_snippet = extractor.extract(&self.content);
    }

    /// Flip between raw and preview display. Returns the new flag.
    ///
    /// Turning preview on without a snippet is a no-op; turning it off always
    /// succeeds, so two toggles restore the original selection.
    pub fn toggle_preview(&mut self) -> bool {
        if self.show_preview || self.extracted_snippet.is_some() {
            self.show_preview = !self.show_preview;
        }
        self.show_preview
    }

    /// What the rendering collaborator should display.
    pub fn view(&self) -> TurnView<'_> {
        match (&self.extracted_snippet, self.show_preview) {
            (Some(snippet), true) => TurnView::Preview(snippet),
            _ => TurnView::Raw(&self.content),
        }
    }

    /// Snapshot handed to the rendering collaborator.
    pub fn render_state(&self) -> RenderState {
        RenderState {
            id: self.id,
            role: self.role,
            content: self.content.clone(),
            extracted_snippet: self.extracted_snippet.clone(),
            show_preview: self.show_preview,
            blocked: self.blocked,
            errored_placeholder: self.error_placeholder.clone(),
            status: self.status,
        }
    }
}

/// One of the two renderable views of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnView<'a> {
    /// The accumulated Markdown text.
    Raw(&'a str),
    /// The extracted component snippet.
    Preview(&'a str),
}

impl TurnView<'_> {
    pub fn is_preview(&self) -> bool {
        matches!(self, Self::Preview(_))
    }
}

/// Per-turn render payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderState {
    pub id: TurnId,
    pub role: Role,
    pub content: String,
    pub extracted_snippet: Option<String>,
    pub show_preview: bool,
    pub blocked: bool,
    pub errored_placeholder: Option<String>,
    pub status: TurnStatus,
}
