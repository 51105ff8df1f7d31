//! Container engine access: docker buildx and registry credentials.

/// Thin typed wrapper over `docker buildx` and `docker login`.
pub mod buildx;

/// Registry credential lookup from configuration and the Docker config file.
pub mod credentials;
