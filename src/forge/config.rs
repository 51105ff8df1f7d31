//! Configuration for code host connections.
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

/// Host used to recognise repository remotes.
pub const DEFAULT_GITHUB_HOST: &str = "github.com";
/// REST API root for github.com.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Connection configuration for the code host API.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// API root, e.g. `https://api.github.com` or an enterprise
    /// `https://ghe.example.com/api/v3`.
    pub api_url: Url,
    /// Access token for authentication.
    pub token: SecretString,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Log create/update requests instead of sending them.
    pub dry_run: bool,
}
