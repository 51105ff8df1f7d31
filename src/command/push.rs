//! Release pipeline for the `push` subcommand.
use log::*;

use crate::{
    changelog,
    cli::PushArgs,
    completion::{
        generator::{CommitMessage, MessageGenerator},
        openai::OpenAi,
    },
    config::{GlobalOptions, PushConfig},
    error::{AutoshipError, Result},
    forge::{
        github::Github,
        manager::ForgeManager,
        request::{PrAction, UpsertPrRequest, UpsertedPr},
    },
    git::{Git, RepoRef},
    process::SystemRunner,
};

/// What a push run ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Mainline run: the branch was tagged and pushed with tags.
    Tagged { tag: String },
    /// Branch run: the pull request was created or updated.
    PullRequest(UpsertedPr),
    /// Branch run: the code host refused to create the pull request.
    PullRequestConflict { body: String },
}

/// Body of the pull request opened for a branch.
pub fn pull_request_body(
    changelog: &str,
    message: &CommitMessage,
    branch: &str,
) -> String {
    format!(
        "## Changelog\n{changelog}\n\n## Commit Message\n{message}\n\n## Branch\n{branch}"
    )
}

pub struct ReleasePipeline<'a> {
    config: &'a PushConfig,
    git: Git,
    generator: MessageGenerator,
    forge: ForgeManager,
}

impl<'a> ReleasePipeline<'a> {
    pub fn new(
        config: &'a PushConfig,
        git: Git,
        generator: MessageGenerator,
        forge: ForgeManager,
    ) -> Self {
        Self {
            config,
            git,
            generator,
            forge,
        }
    }

    pub async fn run(&self) -> Result<PushOutcome> {
        let branch = self.git.current_branch().await?;
        info!("current branch: {branch}");

        if branch == self.config.mainline {
            self.release_mainline(&branch).await
        } else {
            self.release_branch(&branch).await
        }
    }

    /// Tag the mainline branch and push it together with its tags. A failed
    /// push leaves the local tag in place.
    async fn release_mainline(&self, branch: &str) -> Result<PushOutcome> {
        let message = format!("Release {branch}");

        info!("tagging {branch}: {message}");
        self.git.tag_annotated(branch, &message).await?;

        info!("pushing {branch} with tags to {}", self.git.remote());
        self.git.push(branch, true).await?;

        Ok(PushOutcome::Tagged {
            tag: branch.to_string(),
        })
    }

    async fn release_branch(&self, branch: &str) -> Result<PushOutcome> {
        let repo = self.resolve_repository().await?;
        info!("repository: {repo}");

        let mainline = self.config.mainline.as_str();
        let changed = self.git.diff_names_against(mainline, branch).await?;

        if changed.is_empty() {
            warn!("no files differ between {mainline} and {branch}");
        }

        if self.config.verbose {
            let diff = self.git.diff_against(mainline, branch).await?;
            info!("diff against {mainline}:\n{diff}");
        }

        let summary = changed
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        debug!("changed files:\n{summary}");

        let message = self.generator.generate(&summary).await?;
        info!("commit message: {}", message.title());

        let changelog = self.write_changelog().await?;

        if self.git.has_tracked_changes().await? {
            self.git.commit_all(message.as_str()).await?;
        } else {
            info!("no tracked changes to commit");
        }

        info!("pushing {branch} to {}", self.git.remote());
        self.git.push(branch, false).await?;

        let req = UpsertPrRequest {
            repo,
            head_branch: branch.to_string(),
            base_branch: mainline.to_string(),
            title: message.title().to_string(),
            body: pull_request_body(&changelog, &message, branch),
        };

        match self.forge.upsert_pr(req).await {
            Ok(upserted) => Ok(PushOutcome::PullRequest(upserted)),
            Err(AutoshipError::Conflict { body }) => {
                warn!("pull request was not created: {body}");
                Ok(PushOutcome::PullRequestConflict { body })
            }
            Err(err) => Err(err),
        }
    }

    async fn resolve_repository(&self) -> Result<RepoRef> {
        if let Some(repo) = &self.config.repository {
            return Ok(repo.clone());
        }

        self.git
            .remote_owner_and_repo(&self.config.github_host)
            .await
    }

    /// Render the full history and overwrite the changelog file.
    async fn write_changelog(&self) -> Result<String> {
        let mut entries = self.git.history_entries().await?;
        for entry in entries.iter_mut() {
            entry.strip_prefixes(&self.config.strip_prefixes);
        }

        let content = changelog::render(&entries);
        let path = &self.config.changelog_path;

        if self.config.dry_run {
            warn!(
                "dry_run: would write {} changelog entries to {}",
                entries.len(),
                path.display()
            );
            return Ok(content);
        }

        changelog::persist(&content, path).await?;
        info!("wrote {} entries to {}", entries.len(), path.display());

        Ok(content)
    }
}

/// Execute the push pipeline against the real git, code host and
/// completion service.
pub async fn execute(args: &PushArgs, global: GlobalOptions) -> Result<()> {
    let config = PushConfig::from_args(args, global)?;

    let generator =
        MessageGenerator::new(Box::new(OpenAi::new(&config.completion)?));
    let github = Github::new(&config.forge)?;
    let forge = ForgeManager::new(Box::new(github), config.dry_run);
    let git = Git::new(Box::new(SystemRunner), &config.remote, config.dry_run);

    let pipeline = ReleasePipeline::new(&config, git, generator, forge);

    match pipeline.run().await? {
        PushOutcome::Tagged { tag } => {
            info!("released {tag}");
        }
        PushOutcome::PullRequest(UpsertedPr {
            action,
            pull_request,
        }) => {
            let verb = match action {
                PrAction::Created => "created",
                PrAction::Updated => "updated",
            };
            info!(
                "{verb} pull request #{}: {}",
                pull_request.number, pull_request.html_url
            );
        }
        PushOutcome::PullRequestConflict { .. } => {
            info!("branch pushed without a pull request");
        }
    }

    Ok(())
}
