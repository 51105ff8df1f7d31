//! Traits related to remote code hosts
use async_trait::async_trait;

use crate::{
    error::Result,
    forge::request::{
        CreatePrRequest, GetPrRequest, PullRequest, UpdatePrRequest,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Forge: Send + Sync {
    /// Open pull requests whose head is `owner:head_branch`, in the host's
    /// default order.
    async fn get_open_prs(&self, req: GetPrRequest) -> Result<Vec<PullRequest>>;
    /// Create a pull request. A 422 response maps to
    /// [`crate::error::AutoshipError::Conflict`].
    async fn create_pr(&self, req: CreatePrRequest) -> Result<PullRequest>;
    async fn update_pr(&self, req: UpdatePrRequest) -> Result<PullRequest>;
}
