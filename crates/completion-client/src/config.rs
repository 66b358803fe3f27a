//! Completion service configuration
//!
//! A [`CompletionConfig`] is passed explicitly into every completion call.
//! There is no process-wide client or credential.

use std::time::Duration;

/// Default OpenAI-compatible endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default per-call timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for the completion service
#[derive(Clone, PartialEq, Eq)]
pub struct CompletionConfig {
    /// Bearer token
    pub api_key: String,
    /// Model identifier sent with every request
    pub model: String,
    /// Base URL; `/chat/completions` is appended
    pub base_url: String,
    /// Per-call timeout (`None` disables it)
    pub timeout: Option<Duration>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        let timeout_secs = std::env::var("PEPCHECK_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        CompletionConfig {
            api_key: std::env::var("PEPCHECK_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .unwrap_or_default(),
            model: std::env::var("PEPCHECK_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: std::env::var("PEPCHECK_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout: Some(Duration::from_secs(timeout_secs)),
        }
    }
}

impl CompletionConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific key and model against the default endpoint
    pub fn new(api_key: &str, model: &str) -> Self {
        CompletionConfig {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = api_key.to_string();
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Set the base URL (trailing slashes are ignored)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Set or clear the per-call timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full chat-completions URL
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Whether an API key is present
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_key", &if self.has_api_key() { "[REDACTED]" } else { "" })
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
