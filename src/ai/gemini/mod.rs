pub mod chat;
pub mod client;
pub mod image;
pub mod types;

pub use chat::GeminiChatClient;
pub use client::GeminiHttpClient;
pub use image::GeminiImageClient;
