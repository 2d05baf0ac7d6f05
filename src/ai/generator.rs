//! The three remote operations behind the post workflow.

use super::mime::{detect_image_mime, to_data_uri};
use super::{ChatService, GenerationService, ImageGenerationService};
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use tracing::{debug, info};

const QUOTE_PAIRS: [(char, char); 3] = [('"', '"'), ('“', '”'), ('«', '»')];

/// Trim a suggested topic and drop one pair of wrapping quotes.
pub fn clean_topic(raw: &str) -> String {
    let trimmed = raw.trim();
    for (open, close) in QUOTE_PAIRS {
        if let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner.trim().to_string();
        }
    }
    trimmed
        .trim_start_matches('"')
        .trim_end_matches('"')
        .trim()
        .to_string()
}

/// Composes provider chat and image clients into the workflow operations.
///
/// Topic suggestion, post writing and image-prompt derivation may each use a
/// different model, so each has its own chat client.
pub struct GenerationClient {
    topic_chat: Box<dyn ChatService>,
    post_chat: Box<dyn ChatService>,
    image_prompt_chat: Box<dyn ChatService>,
    image_gen: Box<dyn ImageGenerationService>,
}

impl GenerationClient {
    pub fn new(
        topic_chat: Box<dyn ChatService>,
        post_chat: Box<dyn ChatService>,
        image_prompt_chat: Box<dyn ChatService>,
        image_gen: Box<dyn ImageGenerationService>,
    ) -> Self {
        Self {
            topic_chat,
            post_chat,
            image_prompt_chat,
            image_gen,
        }
    }

    /// First half of `generate_image`: ask a text model for an image prompt.
    pub async fn derive_image_prompt(&self, post_text: &str) -> Result<String> {
        let request = prompts::build_image_prompt_request(post_text);
        let image_prompt = self.image_prompt_chat.complete(&request).await?;
        let image_prompt = image_prompt.trim();

        if image_prompt.is_empty() {
            return Err(Error::EmptyResponse(
                "The model returned no image prompt".to_string(),
            ));
        }

        Ok(image_prompt.to_string())
    }
}

#[async_trait]
impl GenerationService for GenerationClient {
    async fn suggest_topic(&self) -> Result<String> {
        let raw = self
            .topic_chat
            .complete(&prompts::build_topic_suggestion_prompt())
            .await?;
        let topic = clean_topic(&raw);

        if topic.is_empty() {
            return Err(Error::EmptyResponse(
                "The model returned no topic".to_string(),
            ));
        }

        info!("Suggested topic: {}", topic);
        Ok(topic)
    }

    async fn generate_post_text(&self, topic: &str) -> Result<String> {
        let raw = self
            .post_chat
            .complete(&prompts::build_post_prompt(topic))
            .await?;
        let post = raw.trim();

        if post.is_empty() {
            return Err(Error::EmptyResponse(
                "The model returned no post content".to_string(),
            ));
        }

        info!("Generated post ({} chars)", post.chars().count());
        Ok(post.to_string())
    }

    async fn generate_image(&self, post_text: &str) -> Result<String> {
        let image_prompt = self.derive_image_prompt(post_text).await?;
        debug!("Derived image prompt: {}", image_prompt);

        let bytes = self.image_gen.generate_image(&image_prompt).await?;
        if bytes.is_empty() {
            return Err(Error::EmptyResponse(
                "The image model returned no image".to_string(),
            ));
        }

        info!(
            "Generated image ({} bytes, {})",
            bytes.len(),
            detect_image_mime(&bytes)
        );
        Ok(to_data_uri(&bytes))
    }
}
