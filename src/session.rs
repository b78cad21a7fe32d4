//! Chat sessions
//!
//! A [`ChatSession`] is one open conversation: an ordered list of turns plus
//! the transport handle it was opened with. Sends go through `&mut self`, so
//! at most one stream is in flight per session.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::aggregator::{StreamAggregator, StreamReport};
use crate::cancel::CancelHandle;
use crate::config::{AssistConfig, KeyStatus};
use crate::error::{AssistError, Result};
use crate::transport::{ChatMessage, ChatRequest, Transport};
use crate::turn::{ConversationTurn, Role, TurnId, TurnStatus};

/// Outcome of one [`ChatSession::send`].
#[derive(Debug, Clone, PartialEq)]
pub struct SendReport {
    pub user_turn: TurnId,
    pub model_turn: TurnId,
    pub report: StreamReport,
}

/// One open multi-turn conversation.
pub struct ChatSession {
    id: Uuid,
    transport: Arc<dyn Transport>,
    aggregator: StreamAggregator,
    system_instruction: Option<String>,
    model: Option<String>,
    turns: Vec<ConversationTurn>,
    created_at: DateTime<Utc>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("turns", &self.turns.len())
            .field("model", &self.model)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl ChatSession {
    /// Open a session. Fails with `ConfigurationError` when the transport has
    /// no key.
    pub fn new(
        transport: Arc<dyn Transport>,
        aggregator: StreamAggregator,
        system_instruction: impl Into<String>,
    ) -> Result<Self> {
        transport.ensure_configured()?;
        let system_instruction = system_instruction.into();
        let session = Self {
            id: Uuid::new_v4(),
            transport,
            aggregator,
            system_instruction: (!system_instruction.trim().is_empty())
                .then_some(system_instruction),
            model: None,
            turns: Vec::new(),
            created_at: Utc::now(),
        };
        tracing::info!(session = %session.id, "chat session started");
        Ok(session)
    }

    /// Open a session using the configured system instruction and snippet tags.
    pub fn from_config(transport: Arc<dyn Transport>, config: &AssistConfig) -> Result<Self> {
        let aggregator = StreamAggregator::from_config(config)?;
        Self::new(transport, aggregator, config.system_instruction.clone())
    }

    /// Use `model` instead of the transport's default.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn system_instruction(&self) -> Option<&str> {
        self.system_instruction.as_deref()
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn turn(&self, id: TurnId) -> Option<&ConversationTurn> {
        self.turns.iter().find(|t| t.id() == id)
    }

    pub fn last_model_turn(&self) -> Option<&ConversationTurn> {
        self.turns.iter().rev().find(|t| t.role() == Role::Model)
    }

    /// Toggle the preview flag of one turn. `None` if the id is unknown.
    pub fn toggle_preview(&mut self, id: TurnId) -> Option<bool> {
        self.turns
            .iter_mut()
            .find(|t| t.id() == id)
            .map(ConversationTurn::toggle_preview)
    }

    /// Drop every turn, keeping the session open.
    pub fn clear(&mut self) {
        tracing::debug!(session = %self.id, turns = self.turns.len(), "chat history cleared");
        self.turns.clear();
    }

    /// Exchanges the remote side should see as context.
    ///
    /// Only pairs whose model turn finalized cleanly are replayed; errored,
    /// cancelled and blocked exchanges stay visible locally but are not sent.
    fn history(&self) -> Vec<ChatMessage> {
        self.turns
            .chunks_exact(2)
            .filter(|pair| {
                let model = &pair[1];
                model.status() == TurnStatus::Finalized && !model.blocked()
            })
            .flat_map(|pair| {
                [
                    ChatMessage::user(pair[0].content()),
                    ChatMessage::model(pair[1].content()),
                ]
            })
            .collect()
    }

    /// Send `message` and stream the answer into a new model turn.
    ///
    /// Blank messages and missing keys are rejected before any turn is
    /// appended. Transport failures do not return `Err`; they end up in the
    /// model turn and in [`SendReport::report`].
    pub async fn send<F>(
        &mut self,
        message: &str,
        cancel: &CancelHandle,
        mut on_update: F,
    ) -> Result<SendReport>
    where
        F: FnMut(&ConversationTurn),
    {
        if message.trim().is_empty() {
            return Err(AssistError::InvalidInput(
                "Please enter a message to send.".to_string(),
            ));
        }
        self.transport.ensure_configured()?;

        let mut messages = self.history();
        messages.push(ChatMessage::user(message));
        let request = ChatRequest {
            model: self.model.clone(),
            system_instruction: self.system_instruction.clone(),
            messages,
        };

        let user = ConversationTurn::user(message);
        let model = ConversationTurn::model();
        let (user_turn, model_turn) = (user.id(), model.id());
        on_update(&user);
        self.turns.push(user);
        self.turns.push(model);
        let idx = self.turns.len() - 1;
        tracing::debug!(session = %self.id, turn = %model_turn, history = request.messages.len(), "sending chat message");

        let transport = Arc::clone(&self.transport);
        let report = self
            .aggregator
            .open_and_aggregate(
                &mut self.turns[idx],
                transport.stream(request),
                cancel,
                &mut on_update,
            )
            .await;

        Ok(SendReport {
            user_turn,
            model_turn,
            report,
        })
    }
}
