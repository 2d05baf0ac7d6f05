//! Application wiring: configuration to provider clients to workflow.

use crate::ai::{
    ChatService, GeminiChatClient, GeminiImageClient, GenerationClient, GenerationService,
    ImageGenerationService, OpenAiChatClient, OpenAiImageClient,
};
use crate::models::{AiProvider, Config};
use crate::share::{Clipboard, LinkOpener, SystemClipboard, SystemLinkOpener};
use crate::workflow::Workflow;
use crate::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Owns the workflow plus the host services the presentation layer uses.
pub struct App {
    pub workflow: Arc<Workflow>,
    pub clipboard: Box<dyn Clipboard>,
    pub opener: Box<dyn LinkOpener>,
    pub share_url: String,
    pub output_dir: PathBuf,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub generation: Arc<dyn GenerationService>,
    pub clipboard: Box<dyn Clipboard>,
    pub opener: Box<dyn LinkOpener>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices, config: &Config) -> Self {
        Self {
            workflow: Arc::new(Workflow::new(
                services.generation,
                config.default_topic.clone(),
            )),
            clipboard: services.clipboard,
            opener: services.opener,
            share_url: config.share_url.clone(),
            output_dir: config.output_dir.clone(),
        }
    }

    /// Construct an app with real provider clients.
    pub fn new(config: &Config) -> Result<Self> {
        let generation = Self::build_generation_client(config)?;

        Ok(Self::with_services(
            AppServices {
                generation: Arc::new(generation),
                clipboard: Box::new(SystemClipboard),
                opener: Box::new(SystemLinkOpener),
            },
            config,
        ))
    }

    /// Build the remote generation client described by `config`.
    pub fn build_generation_client(config: &Config) -> Result<GenerationClient> {
        // Reuse one HTTP connection pool across provider clients.
        let http_client = reqwest::Client::new();

        let topic_chat = Self::build_chat(config, &config.topic_model, &http_client, "Topic")?;
        let post_chat = Self::build_chat(config, &config.post_model, &http_client, "Post")?;
        let image_prompt_chat = Self::build_chat(
            config,
            &config.image_prompt_model,
            &http_client,
            "Image prompt",
        )?;
        let image_gen = Self::build_image(config, &http_client)?;

        Ok(GenerationClient::new(
            topic_chat,
            post_chat,
            image_prompt_chat,
            image_gen,
        ))
    }

    fn build_ai_client<T, FOpenAi, FGemini>(
        provider: AiProvider,
        model: &str,
        api_key: String,
        http_client: reqwest::Client,
        capability: &str,
        openai_builder: FOpenAi,
        gemini_builder: FGemini,
    ) -> T
    where
        FOpenAi: FnOnce(String, String, reqwest::Client) -> T,
        FGemini: FnOnce(String, String, reqwest::Client) -> T,
    {
        match provider {
            AiProvider::OpenAi => {
                info!("{} provider: OpenAI (model: {})", capability, model);
                openai_builder(api_key, model.to_string(), http_client)
            }
            AiProvider::Gemini => {
                info!("{} provider: Gemini (model: {})", capability, model);
                gemini_builder(api_key, model.to_string(), http_client)
            }
        }
    }

    fn build_chat(
        config: &Config,
        model: &str,
        http_client: &reqwest::Client,
        capability: &str,
    ) -> Result<Box<dyn ChatService>> {
        let provider = config.text_provider;
        let base_url = config.base_url_for(provider);

        Ok(Self::build_ai_client(
            provider,
            model,
            config.api_key_for(provider)?,
            http_client.clone(),
            capability,
            |api_key, model, client| {
                let chat = OpenAiChatClient::new_with_client(api_key, model, client);
                match base_url.clone() {
                    Some(url) => Box::new(chat.with_base_url(url)) as Box<dyn ChatService>,
                    None => Box::new(chat) as Box<dyn ChatService>,
                }
            },
            |api_key, model, client| {
                let chat = GeminiChatClient::new_with_client(api_key, model, client);
                match base_url.clone() {
                    Some(url) => Box::new(chat.with_base_url(url)) as Box<dyn ChatService>,
                    None => Box::new(chat) as Box<dyn ChatService>,
                }
            },
        ))
    }

    fn build_image(
        config: &Config,
        http_client: &reqwest::Client,
    ) -> Result<Box<dyn ImageGenerationService>> {
        let provider = config.image_provider;
        let base_url = config.base_url_for(provider);

        Ok(Self::build_ai_client(
            provider,
            &config.image_model,
            config.api_key_for(provider)?,
            http_client.clone(),
            "Image",
            |api_key, model, client| {
                let image = OpenAiImageClient::new_with_client(api_key, model, client);
                match base_url.clone() {
                    Some(url) => {
                        Box::new(image.with_base_url(url)) as Box<dyn ImageGenerationService>
                    }
                    None => Box::new(image) as Box<dyn ImageGenerationService>,
                }
            },
            |api_key, model, client| {
                let image = GeminiImageClient::new_with_client(api_key, model, client);
                match base_url.clone() {
                    Some(url) => {
                        Box::new(image.with_base_url(url)) as Box<dyn ImageGenerationService>
                    }
                    None => Box::new(image) as Box<dyn ImageGenerationService>,
                }
            },
        ))
    }
}
