//! Code assistant operations
//!
//! One-shot review, component preview and code generation, the streamed
//! refactor, image generation and chat sessions, all over one shared
//! transport handle.

use std::sync::Arc;

use futures_util::TryFutureExt;

use crate::aggregator::{StreamAggregator, StreamReport};
use crate::cancel::CancelHandle;
use crate::config::{AssistConfig, KeyStatus};
use crate::error::{AssistError, Result};
use crate::prompts;
use crate::session::ChatSession;
use crate::transport::{ChatRequest, GeneratedImage, ImageRequest, Transport};
use crate::turn::ConversationTurn;

/// A finished streamed refactor.
#[derive(Debug, Clone)]
pub struct RefactorResult {
    pub turn: ConversationTurn,
    pub report: StreamReport,
}

/// Entry point for every assistant operation.
#[derive(Clone)]
pub struct CodeAssistant {
    transport: Arc<dyn Transport>,
    config: AssistConfig,
    aggregator: StreamAggregator,
}

impl std::fmt::Debug for CodeAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeAssistant")
            .field("config", &self.config)
            .field("key_configured", &self.transport.is_key_configured())
            .finish()
    }
}

impl CodeAssistant {
    pub fn new(transport: Arc<dyn Transport>, config: AssistConfig) -> Result<Self> {
        let aggregator = StreamAggregator::from_config(&config)?;
        Ok(Self {
            transport,
            config,
            aggregator,
        })
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn config(&self) -> &AssistConfig {
        &self.config
    }

    /// Markdown review of `code`.
    pub async fn review_code(&self, code: &str) -> Result<String> {
        require_input(code, "Please enter some code to review.")?;
        self.one_shot("review", prompts::review_prompt(code)).await
    }

    /// Markdown description of what a component does.
    pub async fn preview_component(&self, code: &str) -> Result<String> {
        require_input(code, "Please enter some code to preview.")?;
        self.one_shot("component preview", prompts::component_preview_prompt(code))
            .await
    }

    /// Code for a natural-language description.
    pub async fn generate_code(&self, description: &str) -> Result<String> {
        require_input(
            description,
            "Please enter a description to generate code based on.",
        )?;
        self.one_shot("code generation", prompts::generate_code_prompt(description))
            .await
    }

    /// Free-form generation with the prompt sent as-is.
    pub async fn generate_content(&self, prompt: &str) -> Result<String> {
        require_input(prompt, "Please enter a prompt to generate content.")?;
        self.one_shot("content generation", prompt.to_string()).await
    }

    async fn one_shot(&self, operation: &str, prompt: String) -> Result<String> {
        self.transport.ensure_configured()?;
        tracing::debug!(operation, "one-shot request");
        match self.transport.generate(ChatRequest::prompt(prompt)).await {
            Ok(text) => Ok(text),
            Err(AssistError::EmptyResponse(_)) => Err(AssistError::EmptyResponse(format!(
                "Received an empty {operation} from the API."
            ))),
            Err(e) => {
                tracing::warn!(operation, error = %e, "one-shot request failed");
                Err(e.in_operation(operation))
            }
        }
    }

    /// Stream a refactor of `code` into a turn seeded with the result heading.
    ///
    /// Like chat, transport failures end up in the turn and the report rather
    /// than in `Err`.
    pub async fn refactor_code<F>(
        &self,
        code: &str,
        cancel: &CancelHandle,
        mut on_update: F,
    ) -> Result<RefactorResult>
    where
        F: FnMut(&ConversationTurn),
    {
        require_input(code, "Please enter some code to refactor.")?;
        self.transport.ensure_configured()?;

        let mut turn = ConversationTurn::model_seeded(prompts::REFACTOR_RESULT_HEADING);
        on_update(&turn);
        let request = ChatRequest::prompt(prompts::refactor_prompt(code));
        let open = self
            .transport
            .stream(request)
            .map_err(|e| e.in_operation("refactor stream"));
        let report = self
            .aggregator
            .open_and_aggregate(&mut turn, open, cancel, &mut on_update)
            .await;
        Ok(RefactorResult { turn, report })
    }

    /// Generate `count` images for `prompt`.
    pub async fn generate_image(&self, prompt: &str, count: u32) -> Result<Vec<GeneratedImage>> {
        require_input(prompt, "Please enter a prompt to generate an image.")?;
        self.transport.ensure_configured()?;
        let request = ImageRequest {
            count: count.max(1),
            ..ImageRequest::new(prompt)
        };
        self.transport
            .generate_images(request)
            .await
            .map_err(|e| e.in_operation("image generation"))
    }

    /// Open a chat session with the configured system instruction.
    pub fn start_chat(&self) -> Result<ChatSession> {
        ChatSession::new(
            Arc::clone(&self.transport),
            self.aggregator.clone(),
            self.config.system_instruction.clone(),
        )
    }
}

fn require_input(input: &str, message: &str) -> Result<()> {
    if input.trim().is_empty() {
        Err(AssistError::InvalidInput(message.to_string()))
    } else {
        Ok(())
    }
}
