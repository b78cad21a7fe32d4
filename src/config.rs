//! Assistant configuration and credentials.
//!
//! [`AssistConfig`] is an owned value handed to whatever opens remote calls.
//! Reconfiguring means building a new config and a new transport from it; the
//! previous transport keeps serving any stream it already opened.

use std::collections::HashMap;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{AssistError, Result};
use crate::extract::{DEFAULT_SNIPPET_TAGS, SnippetExtractor};
use crate::prompts::CHAT_SYSTEM_INSTRUCTION;
use crate::terminal::TerminalPolicy;

/// Default chat/text model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-04-17";
/// Default Imagen model.
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";
/// Default Gemini REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Environment variables consulted for a default key, in order.
pub const API_KEY_ENV_VARS: &[&str] = &["API_KEY", "GEMINI_API_KEY"];

const NO_KEY_MESSAGE: &str =
    "Gemini API key is not configured. Please set it in the API Key Management section.";

/// Where the active API key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeySource {
    /// Entered by the user and kept in the key-value store.
    Ui,
    /// Taken from the process environment.
    Env,
    /// No key available.
    #[default]
    None,
}

/// Answers whether remote calls may be attempted.
pub trait KeyStatus {
    fn is_key_configured(&self) -> bool;

    /// Message surfaced as a `ConfigurationError` when no key is configured.
    fn config_error_message(&self) -> String {
        NO_KEY_MESSAGE.to_string()
    }

    /// `ConfigurationError` unless a key is configured.
    fn ensure_configured(&self) -> Result<()> {
        if self.is_key_configured() {
            Ok(())
        } else {
            Err(AssistError::ConfigurationError(self.config_error_message()))
        }
    }
}

/// The API key together with its provenance.
#[derive(Clone, Default)]
pub struct Credentials {
    api_key: Option<SecretString>,
    source: ApiKeySource,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key_present", &self.api_key.is_some())
            .field("source", &self.source)
            .finish()
    }
}

impl Credentials {
    /// No key.
    pub fn none() -> Self {
        Self::default()
    }

    /// A key entered by the user. Blank keys count as absent.
    pub fn from_user(key: impl Into<String>) -> Self {
        Self::with_source(key.into(), ApiKeySource::Ui)
    }

    /// A key taken from the environment. Blank keys count as absent.
    pub fn from_env_value(key: impl Into<String>) -> Self {
        Self::with_source(key.into(), ApiKeySource::Env)
    }

    fn with_source(key: String, source: ApiKeySource) -> Self {
        if key.trim().is_empty() {
            return Self::none();
        }
        Self {
            api_key: Some(SecretString::from(key)),
            source,
        }
    }

    /// Resolve from a stored key, then an environment default.
    pub fn resolve(stored: Option<&str>, env: Option<&str>) -> Self {
        let from_store = stored.map(Self::from_user).filter(|c| c.is_key_configured());
        let from_env = || env.map(Self::from_env_value).filter(|c| c.is_key_configured());
        from_store.or_else(from_env).unwrap_or_default()
    }

    /// First non-blank value of [`API_KEY_ENV_VARS`].
    pub fn env_default() -> Option<String> {
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|v| !v.trim().is_empty())
    }

    pub fn source(&self) -> ApiKeySource {
        self.source
    }

    pub fn api_key(&self) -> Option<&SecretString> {
        self.api_key.as_ref()
    }

    /// The key, or `ConfigurationError` when absent.
    pub fn require(&self) -> Result<&str> {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret())
            .ok_or_else(|| AssistError::ConfigurationError(self.config_error_message()))
    }
}

impl KeyStatus for Credentials {
    fn is_key_configured(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }
}

/// Sampling options forwarded as `generationConfig`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SamplingParams {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub max_output_tokens: Option<u32>,
}

/// Configuration of the assistant core.
#[derive(Debug, Clone)]
pub struct AssistConfig {
    /// Text/chat model.
    pub model: String,
    /// Imagen model.
    pub image_model: String,
    /// REST base URL without trailing slash.
    pub base_url: String,
    /// Whole-request timeout for one-shot calls.
    pub timeout: Option<Duration>,
    /// Connection timeout for every call.
    pub connect_timeout: Option<Duration>,
    /// Longest wait between two streamed fragments.
    pub stream_idle_timeout: Option<Duration>,
    /// Extra HTTP headers; they win over built-in ones.
    pub http_headers: HashMap<String, String>,
    /// Fence tags the snippet extractor accepts.
    pub snippet_tags: Vec<String>,
    /// Finish-reason classification.
    pub terminal_policy: TerminalPolicy,
    /// System instruction for chat sessions.
    pub system_instruction: String,
    pub sampling: SamplingParams,
    pub credentials: Credentials,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            stream_idle_timeout: None,
            http_headers: HashMap::new(),
            snippet_tags: DEFAULT_SNIPPET_TAGS.iter().map(|t| t.to_string()).collect(),
            terminal_policy: TerminalPolicy::default(),
            system_instruction: CHAT_SYSTEM_INSTRUCTION.to_string(),
            sampling: SamplingParams::default(),
            credentials: Credentials::none(),
        }
    }
}

impl AssistConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with credentials taken from the environment.
    pub fn from_env() -> Self {
        let env = Credentials::env_default();
        Self::default().with_credentials(Credentials::resolve(None, env.as_deref()))
    }

    pub fn with_api_key(self, key: impl Into<String>) -> Self {
        self.with_credentials(Credentials::from_user(key))
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_stream_idle_timeout(mut self, timeout: Duration) -> Self {
        self.stream_idle_timeout = Some(timeout);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.http_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_snippet_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.snippet_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_terminal_policy(mut self, policy: TerminalPolicy) -> Self {
        self.terminal_policy = policy;
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.sampling.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.sampling.max_output_tokens = Some(max);
        self
    }

    /// Build the snippet extractor for the configured whitelist.
    pub fn snippet_extractor(&self) -> Result<SnippetExtractor> {
        SnippetExtractor::new(&self.snippet_tags)
    }

    /// Check the parts of the configuration that do not depend on the key.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(AssistError::ConfigurationError(
                "model name must not be empty".to_string(),
            ));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AssistError::ConfigurationError(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }
        self.snippet_extractor().map(|_| ())
    }
}

impl KeyStatus for AssistConfig {
    fn is_key_configured(&self) -> bool {
        self.credentials.is_key_configured()
    }
}
