//! Implements the Forge trait for GitHub using the REST API
use async_trait::async_trait;
use log::*;
use reqwest::{Client, StatusCode, Url};
use secrecy::ExposeSecret;

use crate::{
    error::{AutoshipError, Result},
    forge::{
        config::RemoteConfig,
        request::{
            CreatePrRequest, GetPrRequest, PullRequest, UpdatePrRequest,
        },
        traits::Forge,
    },
    git::RepoRef,
    http,
};

mod types;

use types::{CreatePull, GithubPullRequest, UpdatePull};

const SERVICE: &str = "github";
const ACCEPT: &str = "application/vnd.github.v3+json";

/// GitHub forge implementation using reqwest for pull request calls.
pub struct Github {
    base_url: Url,
    client: Client,
}

impl Github {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let token = config.token.expose_secret();

        if token.is_empty() {
            return Err(AutoshipError::invalid_config(
                "GitHub token is not set: use --github-token or GITHUB_TOKEN",
            ));
        }

        let client = http::build_client(
            &format!("token {token}"),
            Some(ACCEPT),
            config.timeout,
        )?;

        Ok(Self {
            base_url: config.api_url.clone(),
            client,
        })
    }

    fn pulls_url(&self, repo: &RepoRef) -> Result<Url> {
        http::endpoint(
            &self.base_url,
            &["repos", repo.owner.as_str(), repo.repo.as_str(), "pulls"],
        )
    }

    fn pull_url(&self, repo: &RepoRef, number: u64) -> Result<Url> {
        let number = number.to_string();
        http::endpoint(
            &self.base_url,
            &[
                "repos",
                repo.owner.as_str(),
                repo.repo.as_str(),
                "pulls",
                number.as_str(),
            ],
        )
    }
}

/// `head` filter value GitHub expects when listing pull requests.
fn head_filter(repo: &RepoRef, branch: &str) -> String {
    format!("{}:{}", repo.owner, branch)
}

/// GitHub answers 422 when a pull request for the head already exists (or
/// the head has nothing to merge); every other non-2xx status is fatal.
fn create_result(status: StatusCode, body: String) -> Result<PullRequest> {
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        return Err(AutoshipError::Conflict { body });
    }

    const ACTION: &str = "create pull request";
    let body = http::check_status(SERVICE, ACTION, status, body)?;
    let pr: GithubPullRequest =
        http::parse_body(SERVICE, ACTION, status, body)?;

    Ok(pr.into())
}

#[async_trait]
impl Forge for Github {
    async fn get_open_prs(
        &self,
        req: GetPrRequest,
    ) -> Result<Vec<PullRequest>> {
        let mut url = self.pulls_url(&req.repo)?;
        url.query_pairs_mut()
            .append_pair("state", "open")
            .append_pair("head", &head_filter(&req.repo, &req.head_branch));

        debug!("listing pull requests: {url}");

        let response = self.client.get(url).send().await?;
        let prs: Vec<GithubPullRequest> =
            http::read_json(SERVICE, "list pull requests", response).await?;

        Ok(prs.into_iter().map(PullRequest::from).collect())
    }

    async fn create_pr(&self, req: CreatePrRequest) -> Result<PullRequest> {
        let url = self.pulls_url(&req.repo)?;
        let data = CreatePull {
            title: req.title,
            body: req.body,
            head: req.head_branch,
            base: req.base_branch,
        };

        let response = self.client.post(url).json(&data).send().await?;
        let status = response.status();
        let body = response.text().await?;

        create_result(status, body)
    }

    async fn update_pr(&self, req: UpdatePrRequest) -> Result<PullRequest> {
        let url = self.pull_url(&req.repo, req.pr_number)?;
        let data = UpdatePull {
            title: req.title,
            body: req.body,
        };

        let response = self.client.patch(url).json(&data).send().await?;
        let pr: GithubPullRequest =
            http::read_json(SERVICE, "update pull request", response).await?;

        Ok(pr.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config(token: &str) -> RemoteConfig {
        RemoteConfig {
            api_url: Url::parse("https://ghe.example.com/api/v3").unwrap(),
            token: SecretString::from(token.to_string()),
            timeout: http::DEFAULT_HTTP_TIMEOUT,
            dry_run: false,
        }
    }

    fn repo() -> RepoRef {
        RepoRef {
            owner: "octo".into(),
            repo: "widgets".into(),
        }
    }

    #[test]
    fn missing_token_is_config_error() {
        let err = Github::new(&config("")).err().unwrap();
        assert!(matches!(err, AutoshipError::InvalidConfig(_)));
    }

    #[test]
    fn builds_pull_request_urls() {
        let github = Github::new(&config("abc")).unwrap();

        assert_eq!(
            github.pulls_url(&repo()).unwrap().as_str(),
            "https://ghe.example.com/api/v3/repos/octo/widgets/pulls"
        );
        assert_eq!(
            github.pull_url(&repo(), 42).unwrap().as_str(),
            "https://ghe.example.com/api/v3/repos/octo/widgets/pulls/42"
        );
    }

    #[test]
    fn create_conflict_is_recoverable_and_keeps_body() {
        let body = r#"{"message":"Validation Failed"}"#.to_string();
        let err =
            create_result(StatusCode::UNPROCESSABLE_ENTITY, body.clone())
                .unwrap_err();

        assert!(err.is_recoverable());
        match err {
            AutoshipError::Conflict { body: kept } => assert_eq!(kept, body),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn create_server_error_is_fatal() {
        let err = create_result(
            StatusCode::INTERNAL_SERVER_ERROR,
            "boom".to_string(),
        )
        .unwrap_err();

        assert!(!err.is_recoverable());
        match err {
            AutoshipError::Upstream { status, body, .. } => {
                assert_eq!(status, Some(500));
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn create_forbidden_is_fatal() {
        let err = create_result(StatusCode::FORBIDDEN, String::new())
            .unwrap_err();
        assert!(matches!(
            err,
            AutoshipError::Upstream {
                status: Some(403),
                ..
            }
        ));
    }

    #[test]
    fn create_success_decodes_pull_request() {
        let body = r###"{
            "number": 7,
            "title": "Fix bug in a",
            "body": "## Changelog",
            "html_url": "https://github.com/octo/widgets/pull/7",
            "head": { "ref": "feature/x" },
            "base": { "ref": "main" }
        }"###;

        let pr = create_result(StatusCode::CREATED, body.to_string()).unwrap();

        assert_eq!(pr.number, 7);
        assert_eq!(pr.head_branch, "feature/x");
        assert_eq!(pr.base_branch, "main");
        assert_eq!(pr.html_url, "https://github.com/octo/widgets/pull/7");
    }

    #[test]
    fn create_success_with_malformed_body_is_upstream_error() {
        let err =
            create_result(StatusCode::CREATED, "<html>".to_string()).unwrap_err();
        assert!(matches!(err, AutoshipError::Upstream { .. }));
    }

    #[test]
    fn head_filter_is_owner_qualified() {
        assert_eq!(head_filter(&repo(), "feature/x"), "octo:feature/x");
    }
}
