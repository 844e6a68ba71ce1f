use thiserror::Error;

/// A convenience `Result` alias using [`ConceptError`].
pub type ConceptResult<T> = Result<T, ConceptError>;

/// Top-level error type for the conceptd workspace.
///
/// The first two variants are the rejections produced by the input
/// sanitizers; the HTTP layer turns them into `400` responses. The rest are
/// raised by collaborators (store, model client, auth).
#[derive(Error, Debug)]
pub enum ConceptError {
    /// A text field was not a string, was empty after cleaning, or was too long.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An identifier failed the length, charset or parse checks.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// The referenced document does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller is authenticated but may not touch this resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing, malformed or expired credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller exhausted its request window.
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// A uniqueness constraint was violated (e.g. duplicate email).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The document store failed.
    #[error("Store error: {0}")]
    Store(String),

    /// The language-model provider returned an unusable answer.
    #[error("LLM error: {0}")]
    Llm(String),

    /// An outbound HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Configuration is missing or invalid.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConceptError {
    /// Returns true for rejections caused by the caller's input.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ConceptError::InvalidInput(_) | ConceptError::InvalidIdentifier(_)
        )
    }
}
