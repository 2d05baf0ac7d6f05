use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse};
use crate::ai::ImageGenerationService;
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ASPECT_RATIO: &str = "1:1";

// Imagen models are served from `:predict`; native Gemini image models
// answer through `:generateContent`.

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: String,
    output_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: ImageGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageGenerationConfig {
    response_modalities: Vec<String>,
    image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

pub struct GeminiImageClient {
    http: GeminiHttpClient,
}

impl GeminiImageClient {
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

    fn uses_predict_endpoint(&self) -> bool {
        self.http.model().starts_with("imagen")
    }

    async fn generate_with_imagen(&self, prompt: &str) -> Result<String> {
        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: ASPECT_RATIO.to_string(),
                output_mime_type: "image/jpeg".to_string(),
            },
        };

        let response: PredictResponse = self.http.predict(&request).await?;

        let prediction = response
            .predictions
            .into_iter()
            .find(|p| p.bytes_base64_encoded.is_some())
            .ok_or_else(|| {
                Error::EmptyResponse("No image data in Imagen response".to_string())
            })?;

        tracing::debug!(
            "Imagen returned image with mime_type: {}",
            prediction.mime_type.as_deref().unwrap_or("unknown")
        );

        prediction
            .bytes_base64_encoded
            .ok_or_else(|| Error::EmptyResponse("No image data in Imagen response".to_string()))
    }

    async fn generate_with_gemini(&self, prompt: &str) -> Result<String> {
        let request = ImageRequest {
            contents: vec![Content::user_text(prompt.to_string())],
            generation_config: ImageGenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
                image_config: ImageConfig {
                    aspect_ratio: ASPECT_RATIO.to_string(),
                },
            },
        };

        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        let image_data = response.first_inline_data().ok_or_else(|| {
            Error::EmptyResponse("No image data in Gemini response".to_string())
        })?;

        tracing::debug!(
            "Gemini returned image with mime_type: {}",
            image_data.mime_type
        );

        Ok(image_data.data.clone())
    }
}

#[async_trait]
impl ImageGenerationService for GeminiImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>> {
        let encoded = if self.uses_predict_endpoint() {
            self.generate_with_imagen(prompt).await?
        } else {
            self.generate_with_gemini(prompt).await?
        };

        if encoded.is_empty() {
            return Err(Error::EmptyResponse(
                "Gemini returned an empty image payload".to_string(),
            ));
        }

        base64::engine::general_purpose::STANDARD
            .decode(&encoded)
            .map_err(|e| Error::AiProvider(format!("Failed to decode Gemini base64 image: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::test_support;
    use wiremock::matchers::body_string_contains;
    use wiremock::{MockServer, ResponseTemplate};

    const IMAGEN_MODEL: &str = "imagen-4.0-generate-001";
    const NATIVE_MODEL: &str = "gemini-2.5-flash-image";

    fn make_client(server: &MockServer, model: &str) -> GeminiImageClient {
        GeminiImageClient::new("key".to_string(), model.to_string()).with_base_url(server.uri())
    }

    fn b64(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[tokio::test]
    async fn test_imagen_requests_one_square_image() {
        let server = MockServer::start().await;
        let fake_image = vec![0xFF, 0xD8, 0xFF, 0xE0];

        test_support::post_path_regex(test_support::PREDICT_PATH_REGEX)
            .and(body_string_contains("\"sampleCount\":1"))
            .and(body_string_contains("\"aspectRatio\":\"1:1\""))
            .and(body_string_contains("dominoes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "predictions": [{
                    "bytesBase64Encoded": b64(&fake_image),
                    "mimeType": "image/jpeg"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, IMAGEN_MODEL);

        let result = client.generate_image("dominoes").await.unwrap();
        assert_eq!(result, fake_image);
    }

    #[tokio::test]
    async fn test_imagen_without_predictions_is_empty_response() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::PREDICT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = make_client(&server, IMAGEN_MODEL);
        let err = client.generate_image("a bridge").await.unwrap_err();
        assert!(matches!(err, Error::EmptyResponse(_)));
    }

    #[tokio::test]
    async fn test_native_model_parses_inline_data() {
        let server = MockServer::start().await;
        let fake_image = vec![0x89, 0x50, 0x4E, 0x47];

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .and(body_string_contains("\"responseModalities\":[\"IMAGE\"]"))
            .and(body_string_contains("\"aspectRatio\":\"1:1\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {
                        "parts": [{
                            "inlineData": { "mimeType": "image/png", "data": b64(&fake_image) }
                        }]
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, NATIVE_MODEL);

        let result = client.generate_image("a seedling").await.unwrap();
        assert_eq!(result, fake_image);
    }

    #[tokio::test]
    async fn test_native_model_without_inline_data_is_empty_response() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::GENERATE_CONTENT_PATH_REGEX)
            .respond_with(
                ResponseTemplate::new(200).set_body_json(test_support::text_response("no image")),
            )
            .mount(&server)
            .await;

        let client = make_client(&server, NATIVE_MODEL);
        let err = client.generate_image("a seedling").await.unwrap_err();
        assert!(matches!(err, Error::EmptyResponse(_)));
    }

    #[tokio::test]
    async fn test_api_error_returns_ai_provider_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::PREDICT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let client = make_client(&server, IMAGEN_MODEL);

        let err = client.generate_image("a chess piece").await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(ref m) if m.contains("429")));
    }

    #[tokio::test]
    async fn test_invalid_base64_returns_ai_provider_error() {
        let server = MockServer::start().await;

        test_support::post_path_regex(test_support::PREDICT_PATH_REGEX)
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "predictions": [{ "bytesBase64Encoded": "!!!invalid-base64!!!" }]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, IMAGEN_MODEL);
        let err = client.generate_image("a lightbulb").await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }
}
