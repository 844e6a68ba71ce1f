//! Language-model access for conceptd.
//!
//! [`LlmClient`] talks to any OpenAI-compatible chat completions endpoint and
//! [`ConceptGenerator`] builds the concept prompts on top of it.

#![allow(missing_docs)]

pub mod backends;
pub mod concept;
pub mod config;
pub mod llm;

pub use backends::LlmBackend;
pub use concept::{parse_concept_response, ConceptDraft, ConceptGenerator};
pub use config::{LlmProvider, ModelConfig};
pub use llm::LlmClient;
