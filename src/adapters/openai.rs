use crate::adapters::http::{build_client, join_url, send_json};
use crate::config::{HttpSettings, LlmSettings};
use crate::domain::model::{Prompt, PromptStyle};
use crate::domain::ports::FormulaAdvisor;
use crate::utils::error::{PredictionError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "OpenAI";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Chat completions client.
pub struct OpenAiClient {
    client: Client,
    settings: LlmSettings,
    http: HttpSettings,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(settings: LlmSettings, http: HttpSettings, api_key: String) -> Result<Self> {
        Ok(Self {
            client: build_client(&http)?,
            settings,
            http,
            api_key,
        })
    }
}

#[async_trait]
impl FormulaAdvisor for OpenAiClient {
    fn name(&self) -> &str {
        SERVICE
    }

    fn prompt_style(&self) -> PromptStyle {
        PromptStyle::Chat
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &prompt.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &prompt.user,
        });
        let body = ChatRequest {
            model: &self.settings.model,
            messages,
        };

        let url = join_url(&self.settings.endpoint, "chat/completions");
        tracing::debug!("POST {} (model {})", url, self.settings.model);

        let response: ChatResponse = send_json(SERVICE, &self.http, || {
            self.client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
        })
        .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PredictionError::ResponseFormatError {
                service: SERVICE.to_string(),
                message: "response contained no message content".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new(
            LlmSettings {
                endpoint: server.url("/v1"),
                model: "gpt-4o".to_string(),
            },
            HttpSettings {
                timeout_seconds: 5,
                retry_attempts: 1,
                retry_delay_seconds: 0,
            },
            "sk-test".to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_complete_sends_system_and_user_messages() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk-test")
                .json_body(json!({
                    "model": "gpt-4o",
                    "messages": [
                        {"role": "system", "content": "be brief"},
                        {"role": "user", "content": "hello"}
                    ]
                }));
            then.status(200).json_body(json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "['ZnO']"}}]
            }));
        });

        let reply = client(&server)
            .complete(&Prompt::with_system("be brief", "hello"))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(reply, "['ZnO']");
    }

    #[tokio::test]
    async fn test_missing_content_is_format_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(json!({"choices": []}));
        });

        let err = client(&server)
            .complete(&Prompt::user("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, PredictionError::ResponseFormatError { .. }));
    }

    #[tokio::test]
    async fn test_unauthorized_surfaces_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(401)
                .json_body(json!({"error": {"message": "Incorrect API key provided"}}));
        });

        let err = client(&server)
            .complete(&Prompt::user("hello"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PredictionError::ApiStatusError { status: 401, .. }
        ));
    }
}
