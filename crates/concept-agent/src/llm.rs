use crate::backends::openai::OpenAiBackend;
use crate::backends::LlmBackend;
use crate::config::ModelConfig;
use concept_core::{ChatMessage, ConceptResult};

/// LLM client that dispatches to a provider backend.
///
/// Every configured provider speaks the OpenAI chat completions API, so
/// [`LlmClient::new`] always builds an [`OpenAiBackend`]; other backends come
/// in through [`LlmClient::from_backend`].
pub struct LlmClient {
    backend: Box<dyn LlmBackend>,
}

impl LlmClient {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            backend: Box::new(OpenAiBackend::new(config)),
        }
    }

    /// Create from a pre-built backend (for custom/external providers).
    pub fn from_backend(backend: Box<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// Non-streaming chat completion.
    pub async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> ConceptResult<String> {
        self.backend.chat(system_prompt, messages, max_tokens).await
    }
}
