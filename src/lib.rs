//! Prompt orchestration backend for project briefs.
//!
//! Business-idea fields go in, a prompt template is rendered, one hosted
//! chat-completion call is made, and the JSON in the reply is reshaped into
//! endpoint-specific documents.

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod services;

pub use app::{create_app, AppState};
