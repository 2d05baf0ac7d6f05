use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse};
use crate::ai::ChatService;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<ChatGenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

pub struct GeminiChatClient {
    http: GeminiHttpClient,
}

impl GeminiChatClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(120),
                client,
            ),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl ChatService for GeminiChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!(
            "Sending {} char prompt to Gemini model {}",
            prompt.len(),
            self.http.model()
        );

        let request = ChatRequest {
            contents: vec![Content::user_text(prompt.to_string())],
            generation_config: Some(ChatGenerationConfig {
                max_output_tokens: Some(8192),
            }),
        };

        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        response.first_text().ok_or_else(|| {
            let reason = response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .unwrap_or("none");
            Error::EmptyResponse(format!(
                "No text in Gemini chat response (finish reason: {})",
                reason
            ))
        })
    }
}
