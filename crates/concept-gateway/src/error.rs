use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use concept_core::ConceptError;
use tracing::{error, warn};

/// A [`ConceptError`] on its way out as an HTTP response.
///
/// Bodies are always `{"detail": "<message>"}`. Caller-facing failures carry
/// their message; provider and internal failures are logged and replaced by
/// a generic one.
#[derive(Debug)]
pub struct ApiError(pub ConceptError);

impl From<ConceptError> for ApiError {
    fn from(err: ConceptError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// Status code for the wrapped error.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ConceptError::InvalidInput(_)
            | ConceptError::InvalidIdentifier(_)
            | ConceptError::Conflict(_) => StatusCode::BAD_REQUEST,
            ConceptError::NotFound(_) => StatusCode::NOT_FOUND,
            ConceptError::Forbidden(_) => StatusCode::FORBIDDEN,
            ConceptError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ConceptError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ConceptError::Llm(_) | ConceptError::Http(_) => StatusCode::BAD_GATEWAY,
            ConceptError::Store(_)
            | ConceptError::Config(_)
            | ConceptError::Json(_)
            | ConceptError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match &self.0 {
            ConceptError::InvalidInput(msg)
            | ConceptError::InvalidIdentifier(msg)
            | ConceptError::Conflict(msg)
            | ConceptError::NotFound(msg)
            | ConceptError::Forbidden(msg)
            | ConceptError::Unauthorized(msg)
            | ConceptError::RateLimited(msg) => msg.clone(),
            ConceptError::Llm(_) | ConceptError::Http(_) => {
                "Failed to fetch concept from model".to_string()
            }
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self.0, "Request rejected");
        }

        let body = Json(serde_json::json!({ "detail": self.detail() }));
        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}
