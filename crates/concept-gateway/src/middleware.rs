use crate::error::ApiError;
use crate::server::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use concept_core::ConceptError;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tracing::warn;

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Auth middleware: requires a valid bearer token.
///
/// The verified [`concept_security::Claims`] are inserted into the request
/// extensions for handlers to compare against the resource they touch.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(&headers) else {
        return Err(ConceptError::Unauthorized("Not authenticated".to_string()).into());
    };

    match state.tokens.verify_token(token) {
        Some(claims) => {
            request.extensions_mut().insert(claims);
            Ok(next.run(request).await)
        }
        None => Err(ConceptError::Unauthorized("Invalid or expired token".to_string()).into()),
    }
}

/// Rate limiting middleware for public routes, keyed by client address.
///
/// Requests whose peer address is unknown share one bucket.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |ConnectInfo(addr)| addr.ip());

    let limiter = &state.public_limiter;
    if !limiter.check(client).await {
        warn!(client = %client, "Rate limited request");
        return Err(ConceptError::RateLimited(format!(
            "Rate limit exceeded: {} requests per {} seconds. Sign up for unlimited access!",
            limiter.max_requests(),
            limiter.window().as_secs()
        ))
        .into());
    }

    Ok(next.run(request).await)
}
