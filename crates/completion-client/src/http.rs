//! OpenAI-compatible chat-completions client
//!
//! Speaks the `/chat/completions` wire format used by OpenAI and most
//! self-hosted gateways. Status codes are mapped onto [`CompletionError`] so
//! callers can tell credential problems from throttling from bad payloads.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::CompletionConfig;
use crate::error::CompletionError;
use crate::{CompletionRequest, CompletionResponse, CompletionService, ResponseFormat, Result};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormatBody {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatBody>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Build the JSON request body for a chat-completions call.
pub fn build_request_body(
    config: &CompletionConfig,
    request: &CompletionRequest,
) -> Result<serde_json::Value> {
    let body = ChatRequestBody {
        model: &config.model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: &request.system_prompt,
            },
            ChatMessage {
                role: "user",
                content: &request.user_prompt,
            },
        ],
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        response_format: match request.response_format {
            ResponseFormat::JsonObject => Some(ResponseFormatBody {
                kind: "json_object",
            }),
            ResponseFormat::Text => None,
        },
    };
    Ok(serde_json::to_value(&body)?)
}

/// Map a non-success HTTP status to an error. Returns `None` for 2xx.
pub fn classify_status(
    status: u16,
    retry_after: Option<&str>,
    body: &str,
) -> Option<CompletionError> {
    match status {
        200..=299 => None,
        401 | 403 => Some(CompletionError::Authentication(truncate_body(body))),
        429 => Some(CompletionError::RateLimited {
            retry_after_secs: retry_after.and_then(|v| v.trim().parse::<u64>().ok()),
        }),
        _ => Some(CompletionError::Http {
            status,
            body: truncate_body(body),
        }),
    }
}

/// Extract `choices[0].message.content` from a response body.
pub fn parse_response_body(body: &str) -> Result<CompletionResponse> {
    let parsed: ChatResponseBody = serde_json::from_str(body)?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| {
            CompletionError::MalformedResponse("response has no choices[0].message.content".into())
        })?;
    Ok(CompletionResponse { content })
}

fn truncate_body(body: &str) -> String {
    const LIMIT: usize = 512;
    if body.chars().count() <= LIMIT {
        body.to_string()
    } else {
        let mut s: String = body.chars().take(LIMIT).collect();
        s.push_str("...");
        s
    }
}

/// HTTP completion backend.
///
/// Holds only a connection pool; credentials and model come from the
/// [`CompletionConfig`] passed to each call.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    http_client: reqwest::Client,
}

impl HttpCompletionClient {
    /// Create a new client
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("pepcheck-completion-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CompletionError::InvalidRequest(e.to_string()))?;
        Ok(Self { http_client })
    }

    /// Wrap an existing reqwest client
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    fn map_send_error(config: &CompletionConfig, err: reqwest::Error) -> CompletionError {
        if err.is_timeout() {
            CompletionError::Timeout(config.timeout.unwrap_or_default())
        } else {
            CompletionError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl CompletionService for HttpCompletionClient {
    #[instrument(skip_all, fields(model = %config.model, format = ?request.response_format))]
    async fn complete(
        &self,
        config: &CompletionConfig,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse> {
        if !config.has_api_key() {
            return Err(CompletionError::Authentication(
                "no API key configured".to_string(),
            ));
        }

        let body = build_request_body(config, request)?;
        let mut builder = self
            .http_client
            .post(config.completions_url())
            .bearer_auth(&config.api_key)
            .json(&body);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_send_error(config, e))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response
            .text()
            .await
            .map_err(|e| Self::map_send_error(config, e))?;

        if let Some(err) = classify_status(status, retry_after.as_deref(), &text) {
            warn!(status, error = %err, "completion request failed");
            return Err(err);
        }

        debug!(status, bytes = text.len(), "completion response received");
        parse_response_body(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> CompletionConfig {
        CompletionConfig::new("sk-test", "gpt-4o-mini")
    }

    #[test]
    fn json_request_carries_response_format() {
        let req = CompletionRequest::new("rubric", "content", 2000, 0.1).json();
        let body = build_request_body(&config(), &req).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "rubric");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "content");
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn text_request_omits_response_format() {
        let req = CompletionRequest::new("rubric", "content", 300, 0.5);
        let body = build_request_body(&config(), &req).unwrap();
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn status_classification() {
        assert!(classify_status(200, None, "").is_none());
        assert!(matches!(
            classify_status(401, None, "invalid key"),
            Some(CompletionError::Authentication(_))
        ));
        assert!(matches!(
            classify_status(403, None, ""),
            Some(CompletionError::Authentication(_))
        ));
        assert_eq!(
            classify_status(429, Some("12"), ""),
            Some(CompletionError::RateLimited {
                retry_after_secs: Some(12)
            })
        );
        assert_eq!(
            classify_status(429, Some("Wed, 21 Oct 2026 07:28:00 GMT"), ""),
            Some(CompletionError::RateLimited {
                retry_after_secs: None
            })
        );
        assert!(matches!(
            classify_status(500, None, "boom"),
            Some(CompletionError::Http { status: 500, .. })
        ));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(2000);
        match classify_status(502, None, &body) {
            Some(CompletionError::Http { body, .. }) => {
                assert!(body.len() < 600);
                assert!(body.ends_with("..."));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn parses_first_choice_content() {
        let body = r#"{"id":"c1","choices":[{"index":0,"message":{"role":"assistant","content":"Hello"}}]}"#;
        assert_eq!(parse_response_body(body).unwrap().content, "Hello");
    }

    #[test]
    fn missing_choices_is_malformed() {
        assert!(matches!(
            parse_response_body(r#"{"choices":[]}"#),
            Err(CompletionError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response_body("<html>gateway</html>"),
            Err(CompletionError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response_body(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(CompletionError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_network() {
        let client = HttpCompletionClient::new().unwrap();
        let config = CompletionConfig::new("", "gpt-4o-mini")
            .with_base_url("http://127.0.0.1:9")
            .with_timeout(Some(Duration::from_millis(50)));
        let err = client
            .complete(&config, &CompletionRequest::new("s", "u", 10, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Authentication(_)));
    }
}
