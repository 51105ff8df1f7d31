use serde::{Deserialize, Serialize};

use crate::forge::request::PullRequest;

#[derive(Debug, Deserialize)]
pub struct PullRequestBranch {
    #[serde(rename = "ref")]
    pub ref_field: String,
}

#[derive(Debug, Deserialize)]
pub struct GithubPullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: String,
    pub head: PullRequestBranch,
    pub base: PullRequestBranch,
}

impl From<GithubPullRequest> for PullRequest {
    fn from(pr: GithubPullRequest) -> Self {
        Self {
            number: pr.number,
            title: pr.title,
            body: pr.body.unwrap_or_default(),
            head_branch: pr.head.ref_field,
            base_branch: pr.base.ref_field,
            html_url: pr.html_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatePull {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

#[derive(Debug, Serialize)]
pub struct UpdatePull {
    pub title: String,
    pub body: String,
}
