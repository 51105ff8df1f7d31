//! Implements the CompletionClient trait for OpenAI-compatible APIs
use async_trait::async_trait;
use log::*;
use reqwest::{Client, StatusCode, Url};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::{
    completion::{
        config::{
            CompletionConfig, CompletionMode, DEFAULT_MAX_TOKENS,
            DEFAULT_TEMPERATURE,
        },
        request::{ChatMessage, CompletionRequest},
        traits::CompletionClient,
    },
    error::{AutoshipError, Result},
    http,
};

const SERVICE: &str = "completion";
const ACTION: &str = "generate commit message";

#[derive(Debug, Serialize)]
struct ChatPayload<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Serialize)]
struct LegacyPayload<'a> {
    model: &'a str,
    prompt: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Payload<'a> {
    Chat(ChatPayload<'a>),
    Legacy(LegacyPayload<'a>),
}

pub struct OpenAi {
    base_url: Url,
    client: Client,
    model: String,
    mode: CompletionMode,
}

impl OpenAi {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let key = config.api_key.expose_secret();

        if key.is_empty() {
            return Err(AutoshipError::invalid_config(
                "OpenAI API key is not set: use --openai-api-key or OPENAI_API_KEY",
            ));
        }

        let client =
            http::build_client(&format!("Bearer {key}"), None, config.timeout)?;

        Ok(Self {
            base_url: config.api_url.clone(),
            client,
            model: config.model.clone(),
            mode: config.mode,
        })
    }

    /// Endpoint and body for `req` in the configured mode.
    fn request_parts<'a>(
        &'a self,
        req: &'a CompletionRequest,
    ) -> Result<(Url, Payload<'a>)> {
        match self.mode {
            CompletionMode::Chat => Ok((
                http::endpoint(&self.base_url, &["chat", "completions"])?,
                Payload::Chat(ChatPayload {
                    model: &self.model,
                    messages: &req.messages,
                }),
            )),
            CompletionMode::Legacy => Ok((
                http::endpoint(&self.base_url, &["completions"])?,
                Payload::Legacy(LegacyPayload {
                    model: &self.model,
                    prompt: req.to_prompt(),
                    max_tokens: DEFAULT_MAX_TOKENS,
                    temperature: DEFAULT_TEMPERATURE,
                }),
            )),
        }
    }
}

/// Check the status and pull the completion text out of a response body.
fn completion_result(status: StatusCode, body: String) -> Result<String> {
    let body = http::check_status(SERVICE, ACTION, status, body)?;
    let value: serde_json::Value =
        http::parse_body(SERVICE, ACTION, status, body.clone())?;

    extract_completion(&value).ok_or_else(|| {
        AutoshipError::upstream(
            SERVICE,
            Some(status.as_u16()),
            "no completion found in the response",
            body,
        )
    })
}

/// Pull the first choice out of a chat (`message.content`) or legacy
/// (`text`) completion response.
pub fn extract_completion(response: &serde_json::Value) -> Option<String> {
    let choice = response.get("choices")?.get(0)?;

    choice
        .pointer("/message/content")
        .and_then(|v| v.as_str())
        .or_else(|| choice.get("text").and_then(|v| v.as_str()))
        .map(str::to_string)
}

#[async_trait]
impl CompletionClient for OpenAi {
    async fn complete(&self, req: CompletionRequest) -> Result<String> {
        let (url, payload) = self.request_parts(&req)?;

        debug!("requesting completion from model {}: {url}", self.model);

        let response = self.client.post(url).json(&payload).send().await?;
        let status = response.status();
        let body = response.text().await?;

        completion_result(status, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::config::{
        DEFAULT_COMPLETION_API_URL, DEFAULT_MODEL,
    };
    use secrecy::SecretString;
    use serde_json::json;

    fn config(key: &str) -> CompletionConfig {
        CompletionConfig {
            api_url: Url::parse(DEFAULT_COMPLETION_API_URL).unwrap(),
            api_key: SecretString::from(key.to_string()),
            model: DEFAULT_MODEL.into(),
            mode: CompletionMode::Chat,
            timeout: http::DEFAULT_HTTP_TIMEOUT,
        }
    }

    fn client(mode: CompletionMode) -> OpenAi {
        OpenAi::new(&CompletionConfig {
            mode,
            ..config("sk-test")
        })
        .unwrap()
    }

    fn conversation() -> CompletionRequest {
        CompletionRequest {
            messages: vec![
                ChatMessage::system("You write commit messages."),
                ChatMessage::user("a.py"),
            ],
        }
    }

    #[test]
    fn missing_key_is_config_error() {
        let err = OpenAi::new(&config("")).err().unwrap();
        assert!(matches!(err, AutoshipError::InvalidConfig(_)));
        assert!(OpenAi::new(&config("sk-test")).is_ok());
    }

    #[test]
    fn extracts_chat_completion() {
        let response = json!({
            "choices": [{ "message": { "role": "assistant", "content": "Fix bug in a" } }]
        });
        assert_eq!(extract_completion(&response).unwrap(), "Fix bug in a");
    }

    #[test]
    fn extracts_legacy_completion() {
        let response = json!({ "choices": [{ "text": "\nFix bug in a" }] });
        assert_eq!(extract_completion(&response).unwrap(), "\nFix bug in a");
    }

    #[test]
    fn missing_completion_field_is_none() {
        for response in [
            json!({}),
            json!({ "choices": [] }),
            json!({ "choices": [{ "finish_reason": "length" }] }),
            json!({ "error": { "message": "quota exceeded" } }),
        ] {
            assert!(extract_completion(&response).is_none());
        }
    }

    #[test]
    fn chat_payload_shape() {
        let messages = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let payload = serde_json::to_value(ChatPayload {
            model: "gpt-3.5-turbo",
            messages: &messages,
        })
        .unwrap();

        assert_eq!(
            payload,
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    { "role": "system", "content": "s" },
                    { "role": "user", "content": "u" }
                ]
            })
        );
    }

    #[test]
    fn chat_mode_posts_messages_to_chat_completions() {
        let openai = client(CompletionMode::Chat);
        let req = conversation();

        let (url, payload) = openai.request_parts(&req).unwrap();

        assert_eq!(url.as_str(), "https://api.openai.com/v1/chat/completions");
        assert_eq!(
            serde_json::to_value(payload).unwrap(),
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    { "role": "system", "content": "You write commit messages." },
                    { "role": "user", "content": "a.py" }
                ]
            })
        );
    }

    #[test]
    fn legacy_mode_posts_flattened_prompt_to_completions() {
        let openai = client(CompletionMode::Legacy);
        let req = conversation();

        let (url, payload) = openai.request_parts(&req).unwrap();

        assert_eq!(url.as_str(), "https://api.openai.com/v1/completions");
        assert_eq!(
            serde_json::to_value(payload).unwrap(),
            json!({
                "model": "gpt-3.5-turbo",
                "prompt": "You write commit messages.\n\na.py",
                "max_tokens": 256,
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn non_success_status_is_upstream_error() {
        let err = completion_result(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"rate limited"}}"#.to_string(),
        )
        .unwrap_err();

        assert!(!err.is_recoverable());
        assert!(matches!(
            err,
            AutoshipError::Upstream {
                status: Some(429),
                ..
            }
        ));
    }

    #[test]
    fn success_without_choices_is_upstream_error() {
        let err = completion_result(StatusCode::OK, "{}".to_string())
            .unwrap_err();
        assert!(matches!(err, AutoshipError::Upstream { .. }));
    }

    #[test]
    fn success_returns_first_choice() {
        let body = r#"{"choices":[{"message":{"content":"Fix bug in a"}}]}"#;
        let text = completion_result(StatusCode::OK, body.to_string()).unwrap();
        assert_eq!(text, "Fix bug in a");
    }
}
