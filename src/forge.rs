//! Code host (GitHub-compatible REST API) access.
//!
//! Provides token-based authentication and the pull request operations the
//! push pipeline needs, behind the [`traits::Forge`] trait.

/// Connection settings for the code host API.
pub mod config;

/// GitHub REST client implemented with reqwest.
pub mod github;

/// Upsert logic and dry-run handling on top of a [`traits::Forge`].
pub mod manager;

/// Request and response types shared by forge implementations.
pub mod request;

/// Common trait for code host implementations.
pub mod traits;
