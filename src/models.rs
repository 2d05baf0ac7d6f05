//! Data models and configuration
//!
//! Defines the generation session data (state, post artifact, error record)
//! and the environment-driven configuration for the AI providers.

use crate::error::ErrorKind;
use crate::{Error, Result};
use serde::Serialize;
use std::path::PathBuf;

pub const DEFAULT_TOPIC: &str =
    "Las 5 mejores herramientas de IA para aumentar la productividad";
pub const DEFAULT_SHARE_URL: &str = "https://www.linkedin.com/feed/";

/// Phase of the generation workflow. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    Idle,
    SuggestingTopic,
    GeneratingPost,
    GeneratingImage,
    Done,
    Failed,
}

impl WorkflowState {
    /// True while a remote call owned by the workflow is outstanding.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            WorkflowState::SuggestingTopic
                | WorkflowState::GeneratingPost
                | WorkflowState::GeneratingImage
        )
    }

    /// States from which a new generation cycle may start.
    pub fn accepts_submission(self) -> bool {
        matches!(
            self,
            WorkflowState::Idle | WorkflowState::Done | WorkflowState::Failed
        )
    }

    pub fn progress_message(self) -> Option<&'static str> {
        match self {
            WorkflowState::SuggestingTopic => Some("Looking for a post idea..."),
            WorkflowState::GeneratingPost => Some("Writing educational content for LinkedIn..."),
            WorkflowState::GeneratingImage => Some("Creating a professional visual for the post..."),
            _ => None,
        }
    }
}

/// A topic accepted for one generation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    topic: String,
}

impl GenerationRequest {
    /// Returns `Error::Validation` when the topic is blank after trimming.
    pub fn new(topic: &str) -> Result<Self> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(Error::Validation("topic is empty".to_string()));
        }
        Ok(Self {
            topic: topic.to_string(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// The generated post. `image_data` is a `data:` URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostArtifact {
    pub text: String,
    pub image_data: Option<String>,
}

impl PostArtifact {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.image_data.is_none()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Sharing needs both halves of the post.
    pub fn is_shareable(&self) -> bool {
        !self.text.is_empty() && self.image_data.is_some()
    }
}

/// Which step of the workflow produced a [`GenerationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Topic,
    Suggestion,
    Post,
    Image,
}

/// User-facing failure record for the latest attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationError {
    pub kind: ErrorKind,
    pub stage: Stage,
    pub user_message: String,
    pub cause: String,
}

impl GenerationError {
    pub fn new(stage: Stage, err: &Error) -> Self {
        let user_message = match stage {
            Stage::Topic => "Please enter a topic for the post.",
            Stage::Suggestion => "Could not suggest a post idea.",
            Stage::Post => "Could not generate the LinkedIn post.",
            Stage::Image => "Could not generate an image for the post.",
        };
        Self {
            kind: err.kind(),
            stage,
            user_message: user_message.to_string(),
            cause: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    Gemini,
    OpenAi,
}

impl AiProvider {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(AiProvider::Gemini),
            "openai" => Ok(AiProvider::OpenAi),
            other => Err(Error::Config(format!(
                "Unknown AI provider '{}'. Expected 'gemini' or 'openai'",
                other
            ))),
        }
    }

    fn default_topic_model(self) -> &'static str {
        match self {
            AiProvider::Gemini => "gemini-2.5-flash",
            AiProvider::OpenAi => "gpt-5-mini",
        }
    }

    fn default_post_model(self) -> &'static str {
        match self {
            AiProvider::Gemini => "gemini-2.5-pro",
            AiProvider::OpenAi => "gpt-5",
        }
    }

    fn default_image_model(self) -> &'static str {
        match self {
            AiProvider::Gemini => "imagen-4.0-generate-001",
            AiProvider::OpenAi => "gpt-image-1",
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub text_provider: AiProvider,
    pub image_provider: AiProvider,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub gemini_base_url: Option<String>,
    pub openai_base_url: Option<String>,
    pub topic_model: String,
    pub post_model: String,
    pub image_prompt_model: String,
    pub image_model: String,
    pub default_topic: String,
    pub share_url: String,
    pub output_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    ///
    /// A provider that is selected but has no API key is rejected here so the
    /// process fails at startup rather than on the first request.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let text_provider = match var("TEXT_PROVIDER") {
            Some(v) => AiProvider::parse(&v)?,
            None => AiProvider::Gemini,
        };
        let image_provider = match var("IMAGE_PROVIDER") {
            Some(v) => AiProvider::parse(&v)?,
            None => AiProvider::Gemini,
        };

        let gemini_api_key = var("GEMINI_API_KEY").or_else(|| var("API_KEY"));
        let openai_api_key = var("OPENAI_API_KEY");

        for provider in [text_provider, image_provider] {
            match provider {
                AiProvider::Gemini if gemini_api_key.is_none() => {
                    return Err(Error::Config("GEMINI_API_KEY not set".to_string()))
                }
                AiProvider::OpenAi if openai_api_key.is_none() => {
                    return Err(Error::Config("OPENAI_API_KEY not set".to_string()))
                }
                _ => {}
            }
        }

        Ok(Self {
            text_provider,
            image_provider,
            gemini_api_key,
            openai_api_key,
            gemini_base_url: var("GEMINI_BASE_URL"),
            openai_base_url: var("OPENAI_BASE_URL"),
            topic_model: var("TOPIC_MODEL")
                .unwrap_or_else(|| text_provider.default_topic_model().to_string()),
            post_model: var("POST_MODEL")
                .unwrap_or_else(|| text_provider.default_post_model().to_string()),
            image_prompt_model: var("IMAGE_PROMPT_MODEL")
                .unwrap_or_else(|| text_provider.default_topic_model().to_string()),
            image_model: var("IMAGE_MODEL")
                .unwrap_or_else(|| image_provider.default_image_model().to_string()),
            default_topic: var("DEFAULT_TOPIC").unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
            share_url: var("SHARE_URL").unwrap_or_else(|| DEFAULT_SHARE_URL.to_string()),
            output_dir: var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("output")),
        })
    }

    /// API key for a provider; presence is validated in [`Config::from_lookup`].
    pub fn api_key_for(&self, provider: AiProvider) -> Result<String> {
        let key = match provider {
            AiProvider::Gemini => self.gemini_api_key.as_ref(),
            AiProvider::OpenAi => self.openai_api_key.as_ref(),
        };
        key.cloned().ok_or_else(|| {
            Error::Config(format!("No API key configured for provider {:?}", provider))
        })
    }

    pub fn base_url_for(&self, provider: AiProvider) -> Option<String> {
        match provider {
            AiProvider::Gemini => self.gemini_base_url.clone(),
            AiProvider::OpenAi => self.openai_base_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults_to_gemini() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "g-key")])).unwrap();

        assert_eq!(config.text_provider, AiProvider::Gemini);
        assert_eq!(config.image_provider, AiProvider::Gemini);
        assert_eq!(config.topic_model, "gemini-2.5-flash");
        assert_eq!(config.post_model, "gemini-2.5-pro");
        assert_eq!(config.image_prompt_model, "gemini-2.5-flash");
        assert_eq!(config.image_model, "imagen-4.0-generate-001");
        assert_eq!(config.default_topic, DEFAULT_TOPIC);
        assert_eq!(config.share_url, DEFAULT_SHARE_URL);
        assert_eq!(config.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_config_accepts_legacy_api_key_name() {
        let config = Config::from_lookup(lookup(&[("API_KEY", "legacy")])).unwrap();
        assert_eq!(config.api_key_for(AiProvider::Gemini).unwrap(), "legacy");
    }

    #[test]
    fn test_config_missing_key_is_fatal() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("GEMINI_API_KEY")));

        let err = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "g-key"),
            ("IMAGE_PROVIDER", "openai"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("OPENAI_API_KEY")));
    }

    #[test]
    fn test_config_blank_key_counts_as_missing() {
        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "   ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_config_openai_defaults_and_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("TEXT_PROVIDER", "OpenAI"),
            ("IMAGE_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "o-key"),
            ("POST_MODEL", "gpt-custom"),
            ("OUTPUT_DIR", "/tmp/posts"),
        ]))
        .unwrap();

        assert_eq!(config.text_provider, AiProvider::OpenAi);
        assert_eq!(config.topic_model, "gpt-5-mini");
        assert_eq!(config.post_model, "gpt-custom");
        assert_eq!(config.image_model, "gpt-image-1");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/posts"));
        assert!(config.api_key_for(AiProvider::Gemini).is_err());
    }

    #[test]
    fn test_config_rejects_unknown_provider() {
        let err = Config::from_lookup(lookup(&[
            ("TEXT_PROVIDER", "llama"),
            ("GEMINI_API_KEY", "g-key"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("llama")));
    }

    #[test]
    fn test_generation_request_trims_and_validates() {
        let request = GenerationRequest::new("  AI agents  ").unwrap();
        assert_eq!(request.topic(), "AI agents");

        let err = GenerationRequest::new(" \t\n").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_post_artifact_helpers() {
        let mut post = PostArtifact::default();
        assert!(post.is_empty());
        assert!(!post.is_shareable());

        post.text = "¿Sabías?".to_string();
        assert_eq!(post.char_count(), 8);
        assert!(!post.is_shareable());

        post.image_data = Some("data:image/png;base64,AA==".to_string());
        assert!(post.is_shareable());
    }

    #[test]
    fn test_workflow_state_guards() {
        assert!(WorkflowState::GeneratingPost.is_busy());
        assert!(WorkflowState::SuggestingTopic.is_busy());
        assert!(!WorkflowState::Done.is_busy());
        assert!(WorkflowState::Failed.accepts_submission());
        assert!(!WorkflowState::GeneratingImage.accepts_submission());
        assert!(WorkflowState::Idle.progress_message().is_none());
        assert!(WorkflowState::GeneratingImage.progress_message().is_some());
    }

    #[test]
    fn test_generation_error_carries_kind_and_cause() {
        let err = GenerationError::new(
            Stage::Image,
            &Error::AiProvider("quota exceeded".to_string()),
        );
        assert_eq!(err.kind, ErrorKind::Provider);
        assert_eq!(err.user_message, "Could not generate an image for the post.");
        assert!(err.cause.contains("quota exceeded"));
    }
}
