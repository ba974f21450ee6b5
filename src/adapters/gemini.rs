use crate::adapters::http::{build_client, join_url, send_json};
use crate::config::{HttpSettings, LlmSettings};
use crate::domain::model::{Prompt, PromptStyle};
use crate::domain::ports::FormulaAdvisor;
use crate::utils::error::{PredictionError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "Gemini";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// generateContent client for Google Gemini models.
pub struct GeminiClient {
    client: Client,
    settings: LlmSettings,
    http: HttpSettings,
    api_key: String,
}

impl GeminiClient {
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
impl FormulaAdvisor for GeminiClient {
    fn name(&self) -> &str {
        SERVICE
    }

    fn prompt_style(&self) -> PromptStyle {
        PromptStyle::SingleTurn
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        // No separate system role here; the instruction leads the user text.
        let text = match &prompt.system {
            Some(system) => format!("{}\n\n{}", system, prompt.user),
            None => prompt.user.clone(),
        };
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: &text }],
            }],
        };

        let url = join_url(
            &self.settings.endpoint,
            &format!("models/{}:generateContent", self.settings.model),
        );
        tracing::debug!("POST {}", url);

        let response: GenerateResponse = send_json(SERVICE, &self.http, || {
            self.client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
        })
        .await?;

        let reply: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        if reply.is_empty() {
            return Err(PredictionError::ResponseFormatError {
                service: SERVICE.to_string(),
                message: "response contained no text parts".to_string(),
            });
        }
        Ok(reply)
    }
}
