//! Configuration for the text-completion service.
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

/// API root for OpenAI.
pub const DEFAULT_COMPLETION_API_URL: &str = "https://api.openai.com/v1";
/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
/// Token budget for legacy completions.
pub const DEFAULT_MAX_TOKENS: u32 = 256;
/// Sampling temperature for legacy completions.
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Which request / response shape the service speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionMode {
    /// `POST /chat/completions` with `messages`.
    #[default]
    Chat,
    /// `POST /completions` with a flat `prompt`.
    Legacy,
}

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_url: Url,
    pub api_key: SecretString,
    pub model: String,
    pub mode: CompletionMode,
    pub timeout: Duration,
}
