//! Traits related to text-completion services
use async_trait::async_trait;

use crate::{completion::request::CompletionRequest, error::Result};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Return the raw completion text of the first choice.
    async fn complete(&self, req: CompletionRequest) -> Result<String>;
}
