//! HTTP API for conceptd.
//!
//! Every handler sanitizes its inputs with [`concept_security`] before they
//! reach the store, a prompt or a response body.

#![allow(missing_docs)]

pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod service;

pub use error::ApiError;
pub use server::{AppState, GatewayServer};
