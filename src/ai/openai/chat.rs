use super::client::OpenAiHttpClient;
use super::types::{ChatCompletionRequest, ChatMessage};
use crate::ai::ChatService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

pub struct OpenAiChatClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, Duration::from_secs(120), client),
            model,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl ChatService for OpenAiChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!(
            "Sending {} char prompt to OpenAI model {}",
            prompt.len(),
            self.model
        );

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
            max_completion_tokens: 8000,
        };

        let response = self.http.chat_completion(request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmptyResponse("No choices in OpenAI chat response".to_string()))?;

        if choice.finish_reason.as_deref() == Some("length") {
            tracing::warn!("OpenAI completion was truncated at the token limit");
        }

        choice
            .message
            .content
            .ok_or_else(|| Error::EmptyResponse("No content in OpenAI chat response".to_string()))
    }
}
