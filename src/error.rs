//! Error taxonomy shared by the push and build pipelines.

use thiserror::Error;

/// Main error type for autoship operations.
#[derive(Error, Debug)]
pub enum AutoshipError {
    // Configuration errors: raised before any external call
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Required tool missing or repository in an unusable state
    #[error("Environment error: {0}")]
    Environment(String),

    #[error("{service} request failed ({status}): {message}\nResponse: {body}", status = display_status(.status))]
    Upstream {
        service: String,
        status: Option<u16>,
        message: String,
        body: String,
    },

    #[error("Pull request could not be created (422 Unprocessable Entity): {body}")]
    Conflict { body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Command `{command}` failed with exit code {code}: {stderr}", code = display_code(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Network request failed: {0}")]
    NetworkError(String),
}

/// Result type alias using AutoshipError
pub type Result<T> = std::result::Result<T, AutoshipError>;

fn display_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "no status".to_string(), |s| s.to_string())
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

impl AutoshipError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an environment error
    pub fn environment(msg: impl Into<String>) -> Self {
        Self::Environment(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an upstream error for a response that came back but could not
    /// be used.
    pub fn upstream(
        service: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            service: service.into(),
            status,
            message: message.into(),
            body: body.into(),
        }
    }

    /// Whether the pipeline may log this error and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

// Transport level failures only; status handling happens in the clients so
// the upstream body can be captured.
impl From<reqwest::Error> for AutoshipError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::NetworkError(format!("request timed out: {err}"))
        } else {
            Self::NetworkError(err.to_string())
        }
    }
}

impl From<reqwest::header::InvalidHeaderValue> for AutoshipError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        Self::InvalidConfig(format!("Invalid header value: {}", err))
    }
}
