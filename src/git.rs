//! Local repository access through the `git` CLI.
//!
//! Read operations (branch, remote, diff, history) never touch the network.
//! The mutating verbs used by the push pipeline honour `dry_run`.
use log::*;
use regex::Regex;
use std::{collections::BTreeSet, fmt, path::PathBuf, str::FromStr};

use crate::{
    changelog::{self, ChangelogEntry, HISTORY_FORMAT},
    error::{AutoshipError, Result},
    process::{CommandOutput, CommandRunner, CommandSpec},
};

const GIT: &str = "git";

/// Owner / repository pair on the code host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoRef {
    type Err = AutoshipError;

    /// Parse an `owner/repo` identifier.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once('/') {
            Some((owner, repo))
                if !owner.is_empty()
                    && !repo.is_empty()
                    && !repo.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(AutoshipError::invalid_config(format!(
                "repository identifier \"{s}\" must look like owner/repo"
            ))),
        }
    }
}

/// Extract owner and repository from an https or scp-style ssh remote on
/// `host`.
pub fn parse_remote_url(url: &str, host: &str) -> Result<RepoRef> {
    let pattern = format!(
        r"^(?:https?://|git@){}[/:](?<owner>[^/]+)/(?<repo>[^/]+?)(?:\.git)?$",
        regex::escape(host)
    );
    let re = Regex::new(&pattern).map_err(|err| {
        AutoshipError::invalid_config(format!("invalid host {host:?}: {err}"))
    })?;

    let caps = re.captures(url.trim()).ok_or_else(|| {
        AutoshipError::invalid_config(format!(
            "remote url \"{}\" is not a {host} repository url",
            url.trim()
        ))
    })?;

    Ok(RepoRef {
        owner: caps["owner"].to_string(),
        repo: caps["repo"].to_string(),
    })
}

pub struct Git {
    runner: Box<dyn CommandRunner>,
    remote: String,
    dry_run: bool,
}

impl Git {
    pub fn new(
        runner: Box<dyn CommandRunner>,
        remote: impl Into<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            runner,
            remote: remote.into(),
            dry_run,
        }
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let spec = CommandSpec::new(GIT, args.iter().copied());
        self.runner.run(&spec).await?.check(&spec)
    }

    pub async fn current_branch(&self) -> Result<String> {
        let spec = CommandSpec::new(GIT, ["rev-parse", "--abbrev-ref", "HEAD"]);
        let output = self.runner.run(&spec).await?;

        if !output.success() {
            return Err(AutoshipError::environment(format!(
                "not inside a git repository: {}",
                output.stderr.trim()
            )));
        }

        let branch = output.stdout.trim().to_string();

        if branch.is_empty() || branch == "HEAD" {
            return Err(AutoshipError::environment(
                "HEAD is detached: check out a branch first",
            ));
        }

        Ok(branch)
    }

    pub async fn remote_url(&self) -> Result<String> {
        let key = format!("remote.{}.url", self.remote);
        let spec = CommandSpec::new(GIT, ["config", "--get", key.as_str()]);
        let output = self.runner.run(&spec).await?;
        let url = output.stdout.trim();

        if !output.success() || url.is_empty() {
            return Err(AutoshipError::invalid_config(format!(
                "could not determine the url of git remote \"{}\"",
                self.remote
            )));
        }

        Ok(url.to_string())
    }

    pub async fn remote_owner_and_repo(&self, host: &str) -> Result<RepoRef> {
        let url = self.remote_url().await?;
        parse_remote_url(&url, host)
    }

    pub async fn diff_names_against(
        &self,
        base: &str,
        branch: &str,
    ) -> Result<BTreeSet<PathBuf>> {
        let range = format!("{base}...{branch}");
        let output = self.run(&["diff", "--name-only", range.as_str()]).await?;

        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    pub async fn diff_against(&self, base: &str, branch: &str) -> Result<String> {
        let range = format!("{base}...{branch}");
        let output = self.run(&["diff", range.as_str()]).await?;
        Ok(output.stdout)
    }

    pub async fn history_entries(&self) -> Result<Vec<ChangelogEntry>> {
        let format = format!("--format={HISTORY_FORMAT}");
        let output = self
            .run(&["log", "--reverse", "--date=short", format.as_str()])
            .await?;
        changelog::parse_history(&output.stdout)
    }

    pub async fn has_tracked_changes(&self) -> Result<bool> {
        let output = self
            .run(&["status", "--porcelain", "--untracked-files=no"])
            .await?;
        Ok(!output.stdout.trim().is_empty())
    }

    pub async fn commit_all(&self, message: &str) -> Result<()> {
        if self.dry_run {
            warn!("dry_run: would commit tracked changes: {message:?}");
            return Ok(());
        }
        self.run(&["commit", "-am", message]).await?;
        Ok(())
    }

    pub async fn tag_annotated(&self, name: &str, message: &str) -> Result<()> {
        if self.dry_run {
            warn!("dry_run: would create tag {name}: {message:?}");
            return Ok(());
        }
        self.run(&["tag", "-a", name, "-m", message]).await?;
        Ok(())
    }

    pub async fn push(&self, branch: &str, tags: bool) -> Result<()> {
        let mut args = vec!["push", self.remote.as_str(), branch];
        if tags {
            args.push("--tags");
        }

        if self.dry_run {
            warn!("dry_run: would run: git {}", args.join(" "));
            return Ok(());
        }

        self.run(&args).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        process::MockCommandRunner,
        test_helpers::{expect_command, failed, ok},
    };

    fn git(runner: MockCommandRunner) -> Git {
        Git::new(Box::new(runner), "origin", false)
    }

    #[test]
    fn parses_https_and_ssh_remotes() {
        let expected = RepoRef {
            owner: "octo".into(),
            repo: "widgets".into(),
        };
        for url in [
            "https://github.com/octo/widgets.git",
            "https://github.com/octo/widgets",
            "http://github.com/octo/widgets",
            "git@github.com:octo/widgets.git",
            "git@github.com:octo/widgets\n",
        ] {
            assert_eq!(parse_remote_url(url, "github.com").unwrap(), expected);
        }
    }

    #[test]
    fn non_host_remote_is_config_error() {
        for url in [
            "myalias:octo/widgets.git",
            "ssh://git@github.com/octo/widgets.git",
            "https://gitlab.com/octo/widgets.git",
            "https://github.com/octo",
            "",
        ] {
            let err = parse_remote_url(url, "github.com").unwrap_err();
            assert!(
                matches!(err, AutoshipError::InvalidConfig(_)),
                "expected config error for {url:?}"
            );
        }
    }

    #[test]
    fn host_is_matched_literally() {
        assert!(parse_remote_url("git@githubXcom:o/r.git", "github.com").is_err());
        assert!(
            parse_remote_url("git@git.example.com:o/r.git", "git.example.com")
                .is_ok()
        );
    }

    #[test]
    fn repo_ref_from_str() {
        let repo: RepoRef = "octo/widgets".parse().unwrap();
        assert_eq!(repo.to_string(), "octo/widgets");
        assert!("octo".parse::<RepoRef>().is_err());
        assert!("/widgets".parse::<RepoRef>().is_err());
        assert!("a/b/c".parse::<RepoRef>().is_err());
    }

    #[tokio::test]
    async fn current_branch_outside_repo_is_environment_error() {
        let mut runner = MockCommandRunner::new();
        expect_command(
            &mut runner,
            "git",
            &["rev-parse", "--abbrev-ref", "HEAD"],
            failed(128, "fatal: not a git repository"),
        );

        let err = git(runner).current_branch().await.unwrap_err();
        assert!(matches!(err, AutoshipError::Environment(_)));
    }

    #[tokio::test]
    async fn current_branch_trims_output() {
        let mut runner = MockCommandRunner::new();
        expect_command(
            &mut runner,
            "git",
            &["rev-parse", "--abbrev-ref", "HEAD"],
            ok("feature/x\n"),
        );

        assert_eq!(git(runner).current_branch().await.unwrap(), "feature/x");
    }

    #[tokio::test]
    async fn remote_owner_and_repo_reads_configured_remote() {
        let mut runner = MockCommandRunner::new();
        expect_command(
            &mut runner,
            "git",
            &["config", "--get", "remote.origin.url"],
            ok("git@github.com:octo/widgets.git\n"),
        );

        let repo = git(runner)
            .remote_owner_and_repo("github.com")
            .await
            .unwrap();
        assert_eq!(repo.to_string(), "octo/widgets");
    }

    #[tokio::test]
    async fn missing_remote_is_config_error() {
        let mut runner = MockCommandRunner::new();
        expect_command(
            &mut runner,
            "git",
            &["config", "--get", "remote.origin.url"],
            failed(1, ""),
        );

        let err = git(runner)
            .remote_owner_and_repo("github.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AutoshipError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn diff_names_are_collected_into_a_set() {
        let mut runner = MockCommandRunner::new();
        expect_command(
            &mut runner,
            "git",
            &["diff", "--name-only", "main...feature/x"],
            ok("b.py\na.py\n\na.py\n"),
        );

        let names = git(runner)
            .diff_names_against("main", "feature/x")
            .await
            .unwrap();
        let names: Vec<_> = names.iter().map(|p| p.display().to_string()).collect();
        assert_eq!(names, vec!["a.py", "b.py"]);
    }

    #[tokio::test]
    async fn history_entries_uses_parseable_format() {
        let mut runner = MockCommandRunner::new();
        expect_command(
            &mut runner,
            "git",
            &["log", "--reverse", "--date=short", "--format=%ad %H %s (%an)"],
            ok("2024-03-01 abc123 Add a (alice)\n"),
        );

        let entries = git(runner).history_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "Add a");
    }

    #[tokio::test]
    async fn push_with_tags_appends_flag() {
        let mut runner = MockCommandRunner::new();
        expect_command(
            &mut runner,
            "git",
            &["push", "origin", "main", "--tags"],
            ok(""),
        );

        git(runner).push("main", true).await.unwrap();
    }

    #[tokio::test]
    async fn failed_push_is_command_failure() {
        let mut runner = MockCommandRunner::new();
        expect_command(
            &mut runner,
            "git",
            &["push", "origin", "feature/x"],
            failed(1, "! [rejected] feature/x -> feature/x (non-fast-forward)"),
        );

        let err = git(runner).push("feature/x", false).await.unwrap_err();
        assert!(matches!(err, AutoshipError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn dry_run_skips_mutating_commands() {
        // any call on the mock would panic
        let runner = MockCommandRunner::new();
        let git = Git::new(Box::new(runner), "origin", true);

        git.commit_all("msg").await.unwrap();
        git.tag_annotated("main", "Release main").await.unwrap();
        git.push("main", true).await.unwrap();
    }
}
