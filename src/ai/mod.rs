//! Text-generation providers used by the external-model classifier

pub mod gemini;
pub mod openai;

use async_trait::async_trait;

use crate::errors::AlertError;

pub use gemini::{GeminiAuth, GeminiClient};
pub use openai::OpenAiClient;

/// A remote completion endpoint: prompt in, reply text out.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent, the provider answers
    /// with a non-2xx status, or the reply carries no text.
    async fn complete(&self, prompt: &str) -> Result<String, AlertError>;

    fn name(&self) -> &str;
}

#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4 + 1
}
