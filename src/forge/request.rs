use crate::git::RepoRef;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Pull request information returned by the code host.
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub head_branch: String,
    pub base_branch: String,
    pub html_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to list open pull requests for a head branch.
pub struct GetPrRequest {
    pub repo: RepoRef,
    pub head_branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to create a new pull request.
pub struct CreatePrRequest {
    pub repo: RepoRef,
    pub head_branch: String,
    pub base_branch: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to update the title and body of an existing pull request.
pub struct UpdatePrRequest {
    pub repo: RepoRef,
    pub pr_number: u64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Create-or-update request keyed by head branch.
pub struct UpsertPrRequest {
    pub repo: RepoRef,
    pub head_branch: String,
    pub base_branch: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertedPr {
    pub action: PrAction,
    pub pull_request: PullRequest,
}
