//! Transport boundary
//!
//! The core never talks to the network directly. It goes through a
//! [`Transport`], which yields [`Fragment`]s for streamed calls and plain text
//! for one-shot calls. [`GeminiTransport`] is the production implementation;
//! tests substitute scripted transports.

mod gemini;
mod headers;

pub use gemini::GeminiTransport;
pub use headers::build_gemini_headers;

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::config::{AssistConfig, KeyStatus};
use crate::error::Result;
use crate::terminal::Terminal;
use crate::turn::Role;

/// One incremental piece of a streamed response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Fragment {
    pub text: Option<String>,
    pub terminal: Option<Terminal>,
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            terminal: None,
        }
    }

    pub fn terminal(terminal: Terminal) -> Self {
        Self {
            text: None,
            terminal: Some(terminal),
        }
    }

    pub fn with_terminal(mut self, terminal: Terminal) -> Self {
        self.terminal = Some(terminal);
        self
    }
}

/// Ordered fragments of one response. An `Err` item ends the stream.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Fragment>> + Send>>;

/// A message in an outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// A text generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatRequest {
    /// Overrides the configured model.
    pub model: Option<String>,
    pub system_instruction: Option<String>,
    /// Conversation, oldest first; the last message is the new prompt.
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Single user prompt, no history.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(text)],
            ..Default::default()
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }
}

/// An image generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub count: u32,
    /// e.g. `"1:1"`, `"16:9"`.
    pub aspect_ratio: Option<String>,
    /// Overrides the configured image model.
    pub model: Option<String>,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            count: 1,
            aspect_ratio: None,
            model: None,
        }
    }
}

/// A decoded generated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Remote generative service.
///
/// Every method must fail with `ConfigurationError`, without network I/O, when
/// [`KeyStatus::is_key_configured`] is false.
#[async_trait]
pub trait Transport: KeyStatus + Send + Sync {
    /// One-shot generation returning the full text.
    async fn generate(&self, request: ChatRequest) -> Result<String>;

    /// Streamed generation. Errors opening the stream are returned directly;
    /// errors while streaming arrive as `Err` items.
    async fn stream(&self, request: ChatRequest) -> Result<FragmentStream>;

    async fn generate_images(&self, request: ImageRequest) -> Result<Vec<GeneratedImage>>;
}

/// Builds the shared transport handle from a configuration.
pub trait TransportFactory: Send + Sync {
    fn build(&self, config: &AssistConfig) -> Result<Arc<dyn Transport>>;
}

/// Factory producing [`GeminiTransport`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiTransportFactory;

impl TransportFactory for GeminiTransportFactory {
    fn build(&self, config: &AssistConfig) -> Result<Arc<dyn Transport>> {
        Ok(Arc::new(GeminiTransport::new(config.clone())?))
    }
}
