//! AI collaborator: the text generation seam plus the workflows built on it.

mod gemini;
pub mod workflow;

use async_trait::async_trait;

pub use gemini::GeminiClient;

/// Anything that turns a prompt into generated text.
#[async_trait]
pub trait AiCollaborator: Send + Sync {
    async fn generate(&self, prompt: &str) -> tracker_core::Result<String>;
}
