use super::client::OpenAiHttpClient;
use super::types::{ImageGenerationRequest, ImageGenerationResponse};
use crate::ai::ImageGenerationService;
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use std::time::Duration;

pub struct OpenAiImageClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiImageClient {
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
impl ImageGenerationService for OpenAiImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>> {
        let request = ImageGenerationRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: "1024x1024".to_string(),
        };

        let response: ImageGenerationResponse =
            self.http.post("/v1/images/generations", &request).await?;

        let image_data = response
            .data
            .first()
            .ok_or_else(|| Error::EmptyResponse("No image data in OpenAI response".to_string()))?;

        let image_bytes = if let Some(b64_json) = &image_data.b64_json {
            base64::engine::general_purpose::STANDARD
                .decode(b64_json)
                .map_err(|e| Error::AiProvider(format!("Failed to decode base64 image: {}", e)))?
        } else if let Some(url) = &image_data.url {
            self.http.download(url).await?
        } else {
            return Err(Error::EmptyResponse(
                "No image data (neither base64 nor URL) in response".to_string(),
            ));
        };

        if image_bytes.is_empty() {
            return Err(Error::EmptyResponse(
                "OpenAI returned an empty image".to_string(),
            ));
        }

        Ok(image_bytes)
    }
}
