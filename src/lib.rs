//! # WesAI - Gemini code assistant core
//!
//! Streams answers from Google Gemini into conversation turns, extracts
//! embedded UI-component snippets as the text grows, and keeps the small
//! amount of state a code-assistant front end needs: the API key and its
//! source, a login gate, the theme and one chat session.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wesai::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut workspace = Workspace::open_default(MemoryStore::new())?;
//!     workspace.login()?;
//!     workspace.save_api_key("your-api-key")?;
//!
//!     let session = workspace.chat_session()?;
//!     let sent = session
//!         .send("Write a React counter", &CancelHandle::new(), |turn| {
//!             println!("{}", turn.content());
//!         })
//!         .await?;
//!     if let Some(warning) = sent.report.warning() {
//!         eprintln!("{warning}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Layout
//!
//! - [`aggregator`]: folds fragment streams into turns
//! - [`extract`]: the snippet extractor, a pure function of the turn text
//! - [`turn`]: turns and their raw/preview projection
//! - [`transport`]: the remote boundary and the Gemini implementation
//! - [`session`], [`assistant`], [`workspace`]: the operations built on top

#![deny(unsafe_code)]

pub mod aggregator;
pub mod assistant;
pub mod cancel;
pub mod config;
pub mod error;
pub mod extract;
pub mod prompts;
pub mod protocol;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod terminal;
pub mod transport;
pub mod turn;
pub mod workspace;

pub use error::{AssistError, Result};

/// Commonly used types.
pub mod prelude {
    pub use crate::aggregator::{StreamAggregator, StreamOutcome, StreamReport};
    pub use crate::assistant::{CodeAssistant, RefactorResult};
    pub use crate::cancel::{CancelHandle, make_cancellable_stream};
    pub use crate::config::{ApiKeySource, AssistConfig, Credentials, KeyStatus};
    pub use crate::error::{AssistError, ErrorCategory, Result};
    pub use crate::extract::SnippetExtractor;
    pub use crate::session::{ChatSession, SendReport};
    pub use crate::store::{JsonFileStore, KeyValueStore, MemoryStore};
    pub use crate::terminal::{Terminal, TerminalKind, TerminalPolicy};
    pub use crate::transport::{
        ChatMessage, ChatRequest, Fragment, FragmentStream, GeminiTransport,
        GeminiTransportFactory, GeneratedImage, ImageRequest, Transport, TransportFactory,
    };
    pub use crate::turn::{ConversationTurn, RenderState, Role, TurnId, TurnStatus, TurnView};
    pub use crate::workspace::{Theme, Workspace};
}
