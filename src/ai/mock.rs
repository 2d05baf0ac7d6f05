use super::mime::to_data_uri;
use super::{ChatService, GenerationService, ImageGenerationService};
use crate::error::ErrorKind;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// 1x1 PNG used when no image response is scripted.
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44,
    0x41, // IDAT chunk
    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2, 0x25,
    0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, // IEND chunk
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[derive(Debug, Clone)]
enum Reply<T> {
    Ok(T),
    Fail(ErrorKind),
}

fn scripted_error(kind: ErrorKind) -> Error {
    match kind {
        ErrorKind::Validation => Error::Validation("mock validation failure".to_string()),
        ErrorKind::EmptyResponse => Error::EmptyResponse("mock empty response".to_string()),
        ErrorKind::Provider => Error::AiProvider("mock provider failure".to_string()),
    }
}

/// Scripted replies for one operation, cycled in order.
#[derive(Debug)]
struct Script<T> {
    replies: Vec<Reply<T>>,
    inputs: Vec<String>,
}

impl<T: Clone> Script<T> {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            inputs: Vec::new(),
        }
    }

    fn next(&mut self, input: &str) -> Option<Reply<T>> {
        self.inputs.push(input.to_string());
        if self.replies.is_empty() {
            return None;
        }
        let index = (self.inputs.len() - 1) % self.replies.len();
        Some(self.replies[index].clone())
    }
}

#[derive(Clone)]
pub struct MockChatClient {
    script: Arc<Mutex<Script<String>>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::new())),
        }
    }

    pub fn with_response(self, response: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .replies
            .push(Reply::Ok(response.to_string()));
        self
    }

    pub fn with_failure(self, kind: ErrorKind) -> Self {
        self.script.lock().unwrap().replies.push(Reply::Fail(kind));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.script.lock().unwrap().inputs.len()
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.script.lock().unwrap().inputs.clone()
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatService for MockChatClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let reply = self.script.lock().unwrap().next(prompt);
        match reply {
            Some(Reply::Ok(text)) => Ok(text),
            Some(Reply::Fail(kind)) => Err(scripted_error(kind)),
            None => Ok("Mock completion".to_string()),
        }
    }
}

#[derive(Clone)]
pub struct MockImageGenerationClient {
    script: Arc<Mutex<Script<Vec<u8>>>>,
}

impl MockImageGenerationClient {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script::new())),
        }
    }

    pub fn with_image_response(self, response: Vec<u8>) -> Self {
        self.script.lock().unwrap().replies.push(Reply::Ok(response));
        self
    }

    pub fn with_failure(self, kind: ErrorKind) -> Self {
        self.script.lock().unwrap().replies.push(Reply::Fail(kind));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.script.lock().unwrap().inputs.len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.script.lock().unwrap().inputs.clone()
    }
}

impl Default for MockImageGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerationService for MockImageGenerationClient {
    async fn generate_image(&self, prompt: &str) -> Result<Vec<u8>> {
        let reply = self.script.lock().unwrap().next(prompt);
        match reply {
            Some(Reply::Ok(bytes)) => Ok(bytes),
            Some(Reply::Fail(kind)) => Err(scripted_error(kind)),
            None => Ok(TINY_PNG.to_vec()),
        }
    }
}

/// Scripted stand-in for the whole remote generation client.
#[derive(Clone)]
pub struct MockGenerationClient {
    topics: Arc<Mutex<Script<String>>>,
    posts: Arc<Mutex<Script<String>>>,
    images: Arc<Mutex<Script<String>>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            topics: Arc::new(Mutex::new(Script::new())),
            posts: Arc::new(Mutex::new(Script::new())),
            images: Arc::new(Mutex::new(Script::new())),
        }
    }

    pub fn with_topic(self, topic: &str) -> Self {
        self.topics
            .lock()
            .unwrap()
            .replies
            .push(Reply::Ok(topic.to_string()));
        self
    }

    pub fn with_topic_failure(self, kind: ErrorKind) -> Self {
        self.topics.lock().unwrap().replies.push(Reply::Fail(kind));
        self
    }

    pub fn with_post(self, text: &str) -> Self {
        self.posts
            .lock()
            .unwrap()
            .replies
            .push(Reply::Ok(text.to_string()));
        self
    }

    pub fn with_post_failure(self, kind: ErrorKind) -> Self {
        self.posts.lock().unwrap().replies.push(Reply::Fail(kind));
        self
    }

    /// Scripts the data URI returned by `generate_image`.
    pub fn with_image(self, data_uri: &str) -> Self {
        self.images
            .lock()
            .unwrap()
            .replies
            .push(Reply::Ok(data_uri.to_string()));
        self
    }

    pub fn with_image_failure(self, kind: ErrorKind) -> Self {
        self.images.lock().unwrap().replies.push(Reply::Fail(kind));
        self
    }

    pub fn topic_calls(&self) -> usize {
        self.topics.lock().unwrap().inputs.len()
    }

    pub fn post_calls(&self) -> usize {
        self.posts.lock().unwrap().inputs.len()
    }

    pub fn image_calls(&self) -> usize {
        self.images.lock().unwrap().inputs.len()
    }

    pub fn get_call_count(&self) -> usize {
        self.topic_calls() + self.post_calls() + self.image_calls()
    }

    /// Topics passed to `generate_post_text`, oldest first.
    pub fn post_topics(&self) -> Vec<String> {
        self.posts.lock().unwrap().inputs.clone()
    }

    /// Post texts passed to `generate_image`, oldest first.
    pub fn image_inputs(&self) -> Vec<String> {
        self.images.lock().unwrap().inputs.clone()
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerationClient {
    async fn suggest_topic(&self) -> Result<String> {
        let reply = self.topics.lock().unwrap().next("");
        match reply {
            Some(Reply::Ok(topic)) => Ok(topic),
            Some(Reply::Fail(kind)) => Err(scripted_error(kind)),
            None => Ok("Cómo la IA cambia la forma de trabajar".to_string()),
        }
    }

    async fn generate_post_text(&self, topic: &str) -> Result<String> {
        let reply = self.posts.lock().unwrap().next(topic);
        match reply {
            Some(Reply::Ok(text)) => Ok(text),
            Some(Reply::Fail(kind)) => Err(scripted_error(kind)),
            None => Ok(format!("Post about {}", topic)),
        }
    }

    async fn generate_image(&self, post_text: &str) -> Result<String> {
        let reply = self.images.lock().unwrap().next(post_text);
        match reply {
            Some(Reply::Ok(uri)) => Ok(uri),
            Some(Reply::Fail(kind)) => Err(scripted_error(kind)),
            None => Ok(to_data_uri(TINY_PNG)),
        }
    }
}
