//! Security primitives for conceptd.
//!
//! The heart of this crate is [`sanitizer`]: the filters applied to untrusted
//! text before it reaches a store update, a prompt or an HTML response, and
//! the identifier validator that gates every document lookup. Around it sit
//! the request-level controls used by the gateway.
//!
//! # Main types
//!
//! - [`sanitize`], [`sanitize_html`], [`sanitize_for_prompt`], [`validate_identifier`]: the input filters.
//! - [`Field`]: Which filter and limit applies to which field.
//! - [`RateLimiter`]: Sliding-window limiter keyed by client address.
//! - [`TokenIssuer`]: HS256 access tokens.
//! - [`PasswordHasher`]: Salted PBKDF2 password hashing.

/// Salted password hashing.
pub mod password;
/// Sliding-window rate limiting.
pub mod rate_limit;
/// Input sanitizers and identifier validation.
pub mod sanitizer;
/// Signed access tokens.
pub mod token;

pub use password::PasswordHasher;
pub use rate_limit::RateLimiter;
pub use sanitizer::{
    expect_text, sanitize, sanitize_for_prompt, sanitize_html, validate_identifier,
    validate_identifier_value, Field,
};
pub use token::{Claims, TokenIssuer};
