//! Completion-Client: the remote text-generation contract used by pepcheck
//!
//! This crate defines what the compliance reviewer and the plain-language
//! summarizer need from a large-language-model completion service:
//! a prompt pair goes in, text (or a JSON object) comes out, and failures are
//! reported through [`CompletionError`].
//!
//! ## Layout
//!
//! - [`CompletionService`] — async trait every backend implements
//! - [`HttpCompletionClient`] — OpenAI-compatible chat-completions backend
//! - [`fakes`] — scripted in-memory services for tests

pub mod config;
pub mod error;
pub mod fakes;
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use config::{CompletionConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
pub use error::CompletionError;
pub use http::HttpCompletionClient;

/// Result type for completion calls
pub type Result<T> = std::result::Result<T, CompletionError>;

/// Shape of the output requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Free text
    #[default]
    Text,
    /// A single JSON object
    JsonObject,
}

/// One completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    /// Sampling temperature, always within `[0, 1]`.
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

impl CompletionRequest {
    /// Build a free-text request. Temperature is clamped to `[0, 1]`.
    pub fn new(
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            max_tokens,
            temperature: clamp_temperature(temperature),
            response_format: ResponseFormat::Text,
        }
    }

    /// Ask for a JSON-object response.
    pub fn json(mut self) -> Self {
        self.response_format = ResponseFormat::JsonObject;
        self
    }
}

fn clamp_temperature(t: f32) -> f32 {
    if t.is_nan() {
        0.0
    } else {
        t.clamp(0.0, 1.0)
    }
}

/// Text returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
}

impl CompletionResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// A remote completion capability.
///
/// Implementations must not retry internally; callers own retry policy.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        config: &CompletionConfig,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse>;
}
