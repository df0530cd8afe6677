//! Anthropic messages transport

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::openai::MAX_TOKENS;
use super::types::{ChatMessage, ChatRole, ChatTransport};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic transport
pub struct AnthropicTransport {
    client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for AnthropicTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicTransport")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AnthropicTransport {
    pub fn new(api_key: String, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// System messages move into the top-level `system` field; the rest keep
    /// their order.
    fn to_anthropic_request<'a>(
        model: &'a str,
        messages: &'a [ChatMessage],
    ) -> AnthropicRequest<'a> {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .collect();

        let messages = messages
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .map(|m| AnthropicMessage {
                role: match m.role {
                    ChatRole::Assistant => "assistant",
                    _ => "user",
                },
                content: &m.content,
            })
            .collect();

        AnthropicRequest {
            model,
            max_tokens: MAX_TOKENS,
            system: if system.is_empty() {
                None
            } else {
                Some(system.join("\n\n"))
            },
            messages,
        }
    }

    fn from_anthropic_response(resp: AnthropicApiResponse) -> Result<String> {
        let text = resp
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicBlock::Text { text } => Some(text),
                AnthropicBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(anyhow!("Anthropic response had no text content"));
        }
        Ok(text)
    }
}

#[async_trait]
impl ChatTransport for AnthropicTransport {
    fn vendor(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = Self::to_anthropic_request(model, messages);

        debug!(
            "Anthropic request: model={}, messages={}",
            model,
            body.messages.len()
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Anthropic API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(
                "Anthropic API request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let api_response: AnthropicApiResponse = response
            .json()
            .await
            .context("Failed to parse Anthropic API response")?;

        debug!(
            "Anthropic response: blocks={}, stop_reason={:?}",
            api_response.content.len(),
            api_response.stop_reason
        );

        Self::from_anthropic_response(api_response)
    }
}

// ── Anthropic wire types ──

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicApiResponse {
    content: Vec<AnthropicBlock>,
    stop_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_request_lifts_system_messages() {
        let msgs = vec![
            ChatMessage::system("rule one"),
            ChatMessage::user("hello"),
            ChatMessage::system("rule two"),
            ChatMessage::assistant("hi"),
        ];
        let req = AnthropicTransport::to_anthropic_request("claude", &msgs);
        assert_eq!(req.system.as_deref(), Some("rule one\n\nrule two"));
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, "user");
        assert_eq!(req.messages[1].role, "assistant");
    }

    #[test]
    fn test_request_without_system_omits_field() {
        let msgs = vec![ChatMessage::user("hello")];
        let req = AnthropicTransport::to_anthropic_request("claude", &msgs);
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["max_tokens"], 512);
    }

    #[test]
    fn test_response_skips_non_text_blocks() {
        let resp: AnthropicApiResponse = serde_json::from_value(json!({
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "Hello"},
                {"type": "text", "text": " world"}
            ],
            "stop_reason": "end_turn"
        }))
        .unwrap();
        assert_eq!(
            AnthropicTransport::from_anthropic_response(resp).unwrap(),
            "Hello world"
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let transport =
            AnthropicTransport::new("sk-ant-secret".to_string(), "https://api.anthropic.com")
                .unwrap();
        assert!(!format!("{:?}", transport).contains("sk-ant-secret"));
    }

    #[tokio::test]
    async fn test_complete_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(json!({"model": "claude-3-5-sonnet-20241022", "system": "sys"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "type": "message",
                "content": [{"type": "text", "text": "{\"a\":1}"}],
                "stop_reason": "end_turn"
            })))
            .mount(&server)
            .await;

        let transport = AnthropicTransport::new("test-key".to_string(), &server.uri()).unwrap();
        let text = transport
            .complete(
                "claude-3-5-sonnet-20241022",
                &[ChatMessage::system("sys"), ChatMessage::user("hi")],
            )
            .await
            .unwrap();
        assert_eq!(text, "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_complete_surfaces_overloaded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_json(json!({
                "type": "error",
                "error": {"type": "overloaded_error", "message": "Overloaded"}
            })))
            .mount(&server)
            .await;

        let transport = AnthropicTransport::new("k".to_string(), &server.uri()).unwrap();
        let err = transport
            .complete("claude", &[ChatMessage::user("hi")])
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("529"));
        assert!(err.contains("Overloaded"));
    }
}
