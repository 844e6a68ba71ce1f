pub mod openai;

use async_trait::async_trait;
use concept_core::{ChatMessage, ConceptResult};

/// Trait for chat-completion provider backends.
///
/// The HTTP backend implements it for real providers; tests and embedders can
/// supply their own to run without network access.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Non-streaming chat completion. Returns the assistant's text, trimmed.
    async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> ConceptResult<String>;
}
