//! Concept generation on top of [`LlmClient`].
//!
//! Every caller-supplied string that reaches a prompt goes through
//! [`sanitize_for_prompt`] first.

use crate::llm::LlmClient;
use concept_core::{ChatMessage, ConceptError, ConceptResult};
use concept_security::sanitize_for_prompt;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

const CONCEPT_SYSTEM_PROMPT: &str = "You are a helpful assistant who explains concepts clearly. \
Only respond with educational content about the requested topic.";

const SPECIFIC_SYSTEM_PROMPT: &str =
    "You are a helpful assistant who explains specific concepts clearly.";

const CONCEPT_MAX_TOKENS: u32 = 150;
const SPECIFIC_MAX_TOKENS: u32 = 300;

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in pattern must compile")
}

/// `Term: <term>` followed by the explanation on later lines.
static TERM_BLOCK: LazyLock<Regex> = LazyLock::new(|| compile(r"(?s)Term:\s*(.+?)\n+(.+)"));

/// `<term>: <explanation>`, optionally prefixed by `Term:`.
static TERM_INLINE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?s)^(Term:)?\s*(.+?)\s*:\s*(.+)"));

/// A named concept with its explanation, as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptDraft {
    pub term: String,
    pub explanation: String,
}

/// Generates concept explanations through a language model.
pub struct ConceptGenerator {
    client: LlmClient,
}

impl ConceptGenerator {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    /// A short, beginner-friendly explanation of some concept in `category`.
    pub async fn generate_concept(&self, category: &str) -> ConceptResult<String> {
        let safe_category = sanitize_for_prompt(category).map_err(|e| match e {
            ConceptError::InvalidInput(msg) => {
                ConceptError::InvalidInput(format!("Invalid category: {msg}"))
            }
            other => other,
        })?;

        info!(category = %safe_category, "Generating concept");
        let prompt = concept_prompt(&safe_category);
        self.client
            .chat(
                Some(CONCEPT_SYSTEM_PROMPT),
                &[ChatMessage::user(prompt)],
                CONCEPT_MAX_TOKENS,
            )
            .await
    }

    /// A specific term from `category` that is not among `seen_terms`, with
    /// its explanation.
    ///
    /// Seen terms that do not survive prompt sanitization are left out of the
    /// exclusion list.
    pub async fn generate_specific_concept(
        &self,
        category: &str,
        seen_terms: &[String],
    ) -> ConceptResult<ConceptDraft> {
        let safe_category = sanitize_for_prompt(category)?;
        let excluded: Vec<String> = seen_terms
            .iter()
            .filter_map(|term| match sanitize_for_prompt(term) {
                Ok(clean) => Some(clean),
                Err(e) => {
                    debug!(error = %e, "Dropping unusable seen term from prompt");
                    None
                }
            })
            .collect();

        info!(
            category = %safe_category,
            excluded = excluded.len(),
            "Generating specific concept"
        );
        let prompt = specific_concept_prompt(&safe_category, &excluded);
        let content = self
            .client
            .chat(
                Some(SPECIFIC_SYSTEM_PROMPT),
                &[ChatMessage::user(prompt)],
                SPECIFIC_MAX_TOKENS,
            )
            .await?;

        Ok(parse_concept_response(&content, &safe_category))
    }
}

fn concept_prompt(category: &str) -> String {
    format!(
        "Give me a short, clear explanation of an interesting concept in the field of {category}.\n\
         Do not start with the name of the concept. The paragraph should be direct and beginner-friendly."
    )
}

fn specific_concept_prompt(category: &str, excluded: &[String]) -> String {
    let blacklist = if excluded.is_empty() {
        "none".to_string()
    } else {
        excluded.join(", ")
    };
    format!(
        "Pick a specific, interesting technical term or key concept from the field of {category},\n\
         that is NOT one of the following: {blacklist}.\n\
         \n\
         Then write a short, clear explanation for it.\n\
         \n\
         Format your answer like this:\n\
         Term: <term>\n\
         <Explanation in 2-3 sentences>\n\
         \n\
         Avoid vague or generic answers. Avoid repeating general overviews of the field itself."
    )
}

/// Split a model reply into term and explanation.
///
/// Tries `Term: <term>` then newline(s) then the explanation, then a leading
/// `<term>: <explanation>`. If neither matches, the category stands in for the
/// term and the whole reply is the explanation.
pub fn parse_concept_response(content: &str, category: &str) -> ConceptDraft {
    let split = TERM_BLOCK
        .captures(content)
        .and_then(|caps| Some((caps.get(1)?.as_str().trim(), caps.get(2)?.as_str().trim())))
        .or_else(|| {
            TERM_INLINE
                .captures(content)
                .and_then(|caps| Some((caps.get(2)?.as_str().trim(), caps.get(3)?.as_str().trim())))
        })
        .filter(|(term, explanation)| !term.is_empty() && !explanation.is_empty());

    match split {
        Some((term, explanation)) => ConceptDraft {
            term: term.to_string(),
            explanation: explanation.to_string(),
        },
        None => {
            warn!("Model reply did not name a term; using the category");
            ConceptDraft {
                term: category.trim().to_string(),
                explanation: content.trim().to_string(),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_term_block() {
        let draft = parse_concept_response(
            "Term: Entropy\n\nA measure of disorder in a system.",
            "physics",
        );
        assert_eq!(draft.term, "Entropy");
        assert_eq!(draft.explanation, "A measure of disorder in a system.");
    }

    #[test]
    fn test_parse_term_block_after_preamble() {
        let draft = parse_concept_response(
            "Sure! Here you go.\nTerm: Big O notation\nDescribes how cost grows.\nIt is asymptotic.",
            "computer science",
        );
        assert_eq!(draft.term, "Big O notation");
        assert_eq!(
            draft.explanation,
            "Describes how cost grows.\nIt is asymptotic."
        );
    }

    #[test]
    fn test_parse_inline_form() {
        let draft = parse_concept_response("Photosynthesis: how plants make sugar.", "biology");
        assert_eq!(draft.term, "Photosynthesis");
        assert_eq!(draft.explanation, "how plants make sugar.");

        let prefixed = parse_concept_response("Term: Osmosis: water crossing a membrane", "biology");
        assert_eq!(prefixed.term, "Osmosis");
        assert_eq!(prefixed.explanation, "water crossing a membrane");
    }

    #[test]
    fn test_parse_falls_back_to_category() {
        let draft = parse_concept_response("Plants convert light into energy.", " biology ");
        assert_eq!(draft.term, "biology");
        assert_eq!(draft.explanation, "Plants convert light into energy.");
    }

    #[test]
    fn test_specific_prompt_lists_exclusions() {
        let none = specific_concept_prompt("physics", &[]);
        assert!(none.contains("NOT one of the following: none."));

        let some = specific_concept_prompt("physics", &["Entropy".into(), "Momentum".into()]);
        assert!(some.contains("NOT one of the following: Entropy, Momentum."));
        assert!(some.contains("Term: <term>"));
    }

    #[test]
    fn test_concept_prompt_mentions_category() {
        let prompt = concept_prompt("astronomy");
        assert!(prompt.contains("in the field of astronomy."));
        assert!(prompt.contains("Do not start with the name of the concept."));
    }
}
