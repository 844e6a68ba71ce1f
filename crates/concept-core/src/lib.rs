//! Core types and error definitions for conceptd.
//!
//! This crate provides the foundational types shared across the workspace:
//! the unified error type, the document identifier, user documents and the
//! chat message shape used when talking to a model provider.
//!
//! # Main types
//!
//! - [`ConceptError`]: Unified error enum for all conceptd subsystems.
//! - [`ConceptResult`]: Convenience alias for `Result<T, ConceptError>`.
//! - [`ObjectId`]: Twelve-byte document identifier with a 24-hex external form.
//! - [`User`]: A stored user with interests, per-category history and daily concepts.
//! - [`ChatMessage`]: One message in a chat-completions request.

/// Error types.
pub mod error;
/// Document identifiers.
pub mod id;
/// Chat message types.
pub mod message;
/// User documents and API payloads.
#[allow(missing_docs)]
pub mod user;

pub use error::{ConceptError, ConceptResult};
pub use id::{ObjectId, ObjectIdError};
pub use message::{ChatMessage, Role};
pub use user::{DailyConcept, LoginRequest, LoginResponse, NewUser, User, UserProfile};
