//! AI service integration for post and image generation
//!
//! Provider adapters (Gemini, OpenAI) implement the low-level chat and image
//! traits; [`GenerationClient`] composes them into the three operations the
//! workflow needs.

pub mod gemini;
pub mod generator;
pub mod mime;
pub mod mock;
pub mod openai;

pub use gemini::{GeminiChatClient, GeminiImageClient};
pub use generator::GenerationClient;
pub use mock::{MockChatClient, MockGenerationClient, MockImageGenerationClient};
pub use openai::{OpenAiChatClient, OpenAiImageClient};

use crate::Result;
use async_trait::async_trait;

/// A single-turn text completion.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Synthesizes exactly one square image and returns its raw bytes.
#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>>;
}

/// The remote operations consumed by the workflow.
///
/// Implementations are stateless; every call is a fresh request and may be
/// retried with the same input.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn suggest_topic(&self) -> Result<String>;
    async fn generate_post_text(&self, topic: &str) -> Result<String>;
    /// Returns the image as a `data:<mime>;base64,<payload>` URI.
    async fn generate_image(&self, post_text: &str) -> Result<String>;
}
