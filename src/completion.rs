//! Commit message generation through a text-completion service.

/// Connection settings for the completion service.
pub mod config;

/// Prompt construction and response validation.
pub mod generator;

/// OpenAI-compatible client implemented with reqwest.
pub mod openai;

/// Request and message types.
pub mod request;

/// Common trait for completion service implementations.
pub mod traits;
