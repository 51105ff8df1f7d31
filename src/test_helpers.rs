//! Common test helper functions shared across test modules.
//!
//! This module provides reusable fixtures, scripted command output and an
//! in-memory forge, reducing setup duplication across test suites.
use async_trait::async_trait;
use secrecy::SecretString;
use std::{
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};
use url::Url;

use crate::{
    completion::config::{CompletionConfig, CompletionMode},
    config::{BuildConfig, PushConfig},
    container::{buildx::DEFAULT_PLATFORMS, credentials::ExplicitCredentials},
    error::{AutoshipError, Result},
    forge::{
        config::RemoteConfig,
        request::{
            CreatePrRequest, GetPrRequest, PullRequest, UpdatePrRequest,
        },
        traits::Forge,
    },
    git::RepoRef,
    process::{CommandOutput, MockCommandRunner},
};

/// Successful command output.
pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        code: Some(0),
    }
}

/// Failed command output with the given exit code.
pub fn failed(code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        stdout: String::new(),
        stderr: stderr.to_string(),
        code: Some(code),
    }
}

/// Expect exactly one `program args...` invocation returning `output`.
pub fn expect_command(
    runner: &mut MockCommandRunner,
    program: &'static str,
    args: &'static [&'static str],
    output: CommandOutput,
) {
    runner
        .expect_run()
        .withf(move |spec| spec.is(program, args))
        .times(1)
        .returning(move |_| Ok(output.clone()));
}

/// Creates the `octo/widgets` repository reference.
pub fn test_repo() -> RepoRef {
    RepoRef {
        owner: "octo".into(),
        repo: "widgets".into(),
    }
}

/// Creates an open pull request against `main`.
pub fn test_pull_request(number: u64, head: &str, body: &str) -> PullRequest {
    PullRequest {
        number,
        title: "Fix bug in a".into(),
        body: body.into(),
        head_branch: head.into(),
        base_branch: "main".into(),
        html_url: format!("https://github.com/octo/widgets/pull/{number}"),
    }
}

/// Creates a PushConfig for `octo/widgets` with the changelog in `dir`.
pub fn create_test_push_config(dir: &Path) -> PushConfig {
    let timeout = Duration::from_secs(5);

    PushConfig {
        mainline: "main".into(),
        remote: "origin".into(),
        repository: None,
        github_host: "github.com".into(),
        forge: RemoteConfig {
            api_url: Url::parse("https://api.github.com").unwrap(),
            token: SecretString::from("test-token".to_string()),
            timeout,
            dry_run: false,
        },
        completion: CompletionConfig {
            api_url: Url::parse("https://api.openai.com/v1").unwrap(),
            api_key: SecretString::from("test-key".to_string()),
            model: "gpt-3.5-turbo".into(),
            mode: CompletionMode::Chat,
            timeout,
        },
        changelog_path: dir.join("CHANGELOG.md"),
        strip_prefixes: vec!["aider: ".into()],
        verbose: false,
        dry_run: false,
    }
}

/// Creates a BuildConfig for `ghcr.io/octo/app` with VERSION in `dir`.
pub fn create_test_build_config(dir: &Path) -> BuildConfig {
    BuildConfig {
        app_name: "app".into(),
        docker_repo: "ghcr.io/octo".into(),
        builder_name: "app".into(),
        platforms: DEFAULT_PLATFORMS.iter().map(|p| p.to_string()).collect(),
        version_file: dir.join("VERSION"),
        context: ".".into(),
        credentials: ExplicitCredentials::default(),
        docker_config: None,
        require_registry_auth: false,
        remove_builder: false,
        docker_bin: "docker".into(),
        dry_run: false,
    }
}

/// Forge that keeps pull requests in memory. Clones share state so a test
/// can inspect what a boxed copy recorded.
#[derive(Debug, Clone, Default)]
pub struct InMemoryForge {
    pull_requests: Arc<Mutex<Vec<PullRequest>>>,
}

impl InMemoryForge {
    pub fn pull_requests(&self) -> Vec<PullRequest> {
        self.pull_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Forge for InMemoryForge {
    async fn get_open_prs(&self, req: GetPrRequest) -> Result<Vec<PullRequest>> {
        Ok(self
            .pull_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|pr| pr.head_branch == req.head_branch)
            .cloned()
            .collect())
    }

    async fn create_pr(&self, req: CreatePrRequest) -> Result<PullRequest> {
        let mut prs = self.pull_requests.lock().unwrap();

        if prs.iter().any(|pr| pr.head_branch == req.head_branch) {
            return Err(AutoshipError::Conflict {
                body: format!(
                    "{{\"message\":\"A pull request already exists for {}:{}.\"}}",
                    req.repo.owner, req.head_branch
                ),
            });
        }

        let number = prs.len() as u64 + 1;
        let pr = PullRequest {
            number,
            title: req.title,
            body: req.body,
            head_branch: req.head_branch,
            base_branch: req.base_branch,
            html_url: format!("https://github.com/{}/pull/{number}", req.repo),
        };
        prs.push(pr.clone());

        Ok(pr)
    }

    async fn update_pr(&self, req: UpdatePrRequest) -> Result<PullRequest> {
        let mut prs = self.pull_requests.lock().unwrap();

        let pr = prs
            .iter_mut()
            .find(|pr| pr.number == req.pr_number)
            .ok_or_else(|| {
                AutoshipError::upstream(
                    "github",
                    Some(404),
                    "update pull request",
                    "{\"message\":\"Not Found\"}",
                )
            })?;
        pr.title = req.title;
        pr.body = req.body;

        Ok(pr.clone())
    }
}
