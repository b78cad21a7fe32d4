//! Workspace state
//!
//! Owns the key-value store, the login gate, the theme, the shared transport
//! handle and the single chat session. The transport is rebuilt wholesale
//! whenever the effective key changes; the chat session is dropped with it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assistant::CodeAssistant;
use crate::config::{ApiKeySource, AssistConfig, Credentials, KeyStatus};
use crate::error::{AssistError, Result};
use crate::session::ChatSession;
use crate::store::KeyValueStore;
use crate::transport::{GeminiTransportFactory, Transport, TransportFactory};

/// Store key holding the user-entered API key.
pub const API_KEY_STORE_KEY: &str = "geminiApiKey";
/// Store key holding the login flag (`"true"` when logged in).
pub const LOGIN_STORE_KEY: &str = "isWesAiUserLoggedIn";
/// Store key holding the theme.
pub const THEME_STORE_KEY: &str = "theme";

/// Colour theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Parse a stored value; anything unknown is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Application state behind the login gate.
pub struct Workspace<S: KeyValueStore> {
    store: S,
    base_config: AssistConfig,
    env_credentials: Credentials,
    factory: Arc<dyn TransportFactory>,
    logged_in: bool,
    theme: Theme,
    credentials: Credentials,
    client: Option<Arc<dyn Transport>>,
    session: Option<ChatSession>,
}

impl<S: KeyValueStore> std::fmt::Debug for Workspace<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("logged_in", &self.logged_in)
            .field("theme", &self.theme)
            .field("credentials", &self.credentials)
            .field("client", &self.client.is_some())
            .field("session", &self.session.as_ref().map(ChatSession::id))
            .finish()
    }
}

impl<S: KeyValueStore> Workspace<S> {
    /// Restore a workspace from `store`.
    ///
    /// Environment credentials in `config` act as the fallback when no key
    /// is stored; any other credentials in `config` are ignored.
    pub fn open(
        store: S,
        config: AssistConfig,
        factory: Arc<dyn TransportFactory>,
    ) -> Result<Self> {
        config.validate()?;
        let theme = store
            .get(THEME_STORE_KEY)?
            .as_deref()
            .and_then(Theme::parse)
            .unwrap_or_default();
        let logged_in = store.get(LOGIN_STORE_KEY)?.as_deref() == Some("true");
        let env_credentials = if config.credentials.source() == ApiKeySource::Env {
            config.credentials.clone()
        } else {
            Credentials::none()
        };

        let mut workspace = Self {
            store,
            base_config: config.with_credentials(Credentials::none()),
            env_credentials,
            factory,
            logged_in,
            theme,
            credentials: Credentials::none(),
            client: None,
            session: None,
        };
        if workspace.logged_in {
            workspace.refresh_client()?;
        }
        tracing::debug!(logged_in, theme = theme.as_str(), "workspace opened");
        Ok(workspace)
    }

    /// Open with environment credentials and the Gemini transport.
    pub fn open_default(store: S) -> Result<Self> {
        Self::open(store, AssistConfig::from_env(), Arc::new(GeminiTransportFactory))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Flip and persist the theme.
    pub fn toggle_theme(&mut self) -> Result<Theme> {
        let next = self.theme.toggled();
        self.store.set(THEME_STORE_KEY, next.as_str())?;
        self.theme = next;
        Ok(next)
    }

    pub fn login(&mut self) -> Result<()> {
        self.store.set(LOGIN_STORE_KEY, "true")?;
        self.logged_in = true;
        tracing::info!("user logged in");
        self.refresh_client()
    }

    /// Log out, forgetting the stored key, the client and the chat session.
    pub fn logout(&mut self) -> Result<()> {
        self.store.remove(LOGIN_STORE_KEY)?;
        self.store.remove(API_KEY_STORE_KEY)?;
        self.logged_in = false;
        self.credentials = Credentials::none();
        self.client = None;
        self.session = None;
        tracing::info!("user logged out");
        Ok(())
    }

    /// Persist a user-entered key and rebuild the client from it.
    pub fn save_api_key(&mut self, key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AssistError::InvalidInput(
                "API key cannot be empty.".to_string(),
            ));
        }
        self.store.set(API_KEY_STORE_KEY, key)?;
        tracing::info!("API key saved");
        self.refresh_client()
    }

    /// Forget the stored key, falling back to the environment default.
    pub fn remove_api_key(&mut self) -> Result<()> {
        self.store.remove(API_KEY_STORE_KEY)?;
        tracing::info!("API key removed");
        self.refresh_client()
    }

    pub fn api_key_source(&self) -> ApiKeySource {
        self.credentials.source()
    }

    /// Configuration currently in effect, credentials included.
    pub fn config(&self) -> AssistConfig {
        self.base_config
            .clone()
            .with_credentials(self.credentials.clone())
    }

    /// The shared transport handle.
    pub fn client(&self) -> Result<Arc<dyn Transport>> {
        if !self.logged_in {
            return Err(AssistError::ConfigurationError(
                "Please log in to use the assistant.".to_string(),
            ));
        }
        self.client
            .clone()
            .ok_or_else(|| AssistError::ConfigurationError(self.credentials.config_error_message()))
    }

    pub fn assistant(&self) -> Result<CodeAssistant> {
        CodeAssistant::new(self.client()?, self.config())
    }

    /// The open chat session, created on first use.
    pub fn chat_session(&mut self) -> Result<&mut ChatSession> {
        let session = match self.session.take() {
            Some(session) => session,
            None => ChatSession::from_config(self.client()?, &self.config())?,
        };
        Ok(self.session.insert(session))
    }

    /// The open chat session, if any.
    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    /// Drop the chat session; the next [`chat_session`](Self::chat_session)
    /// starts a fresh one.
    pub fn reset_session(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::debug!(session = %session.id(), "chat session reset");
        }
    }

    fn resolve_credentials(&self) -> Result<Credentials> {
        let stored = self
            .store
            .get(API_KEY_STORE_KEY)?
            .map(Credentials::from_user)
            .filter(|c| c.is_key_configured());
        Ok(stored.unwrap_or_else(|| self.env_credentials.clone()))
    }

    /// Rebuild the client from the current credentials and drop the session.
    fn refresh_client(&mut self) -> Result<()> {
        self.session = None;
        if !self.logged_in {
            self.credentials = Credentials::none();
            self.client = None;
            return Ok(());
        }
        self.credentials = self.resolve_credentials()?;
        self.client = if self.credentials.is_key_configured() {
            Some(self.factory.build(&self.config())?)
        } else {
            None
        };
        tracing::debug!(source = ?self.credentials.source(), "client rebuilt");
        Ok(())
    }
}

impl<S: KeyValueStore> KeyStatus for Workspace<S> {
    fn is_key_configured(&self) -> bool {
        self.logged_in && self.client.is_some()
    }
}
