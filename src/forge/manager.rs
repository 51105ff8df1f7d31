//! Manager that wraps forge implementations
use log::*;

use crate::{
    error::Result,
    forge::{
        request::{
            CreatePrRequest, GetPrRequest, PrAction, PullRequest,
            UpdatePrRequest, UpsertPrRequest, UpsertedPr,
        },
        traits::Forge,
    },
};

pub struct ForgeManager {
    forge: Box<dyn Forge>,
    dry_run: bool,
}

impl ForgeManager {
    pub fn new(forge: Box<dyn Forge>, dry_run: bool) -> Self {
        Self { forge, dry_run }
    }

    pub async fn get_open_prs(
        &self,
        req: GetPrRequest,
    ) -> Result<Vec<PullRequest>> {
        self.forge.get_open_prs(req).await
    }

    pub async fn create_pr(&self, req: CreatePrRequest) -> Result<PullRequest> {
        if self.dry_run {
            warn!("dry_run: would create PR: req: {:#?}", req);
            return Ok(PullRequest {
                number: 0,
                title: req.title,
                body: req.body,
                head_branch: req.head_branch,
                base_branch: req.base_branch,
                html_url: "".into(),
            });
        }

        self.forge.create_pr(req).await
    }

    pub async fn update_pr(
        &self,
        req: UpdatePrRequest,
        existing: &PullRequest,
    ) -> Result<PullRequest> {
        if self.dry_run {
            warn!("dry_run: would update PR: req: {:#?}", req);
            return Ok(PullRequest {
                title: req.title,
                body: req.body,
                ..existing.clone()
            });
        }

        self.forge.update_pr(req).await
    }

    /// Update the first open pull request for the head branch, or create
    /// one when none is open. A 422 on create surfaces as
    /// [`crate::error::AutoshipError::Conflict`].
    pub async fn upsert_pr(&self, req: UpsertPrRequest) -> Result<UpsertedPr> {
        info!(
            "searching for open pull request for {}:{}",
            req.repo.owner, req.head_branch
        );

        let existing = self
            .get_open_prs(GetPrRequest {
                repo: req.repo.clone(),
                head_branch: req.head_branch.clone(),
            })
            .await?;

        if existing.len() > 1 {
            warn!(
                "found {} open pull requests for {}: updating #{}",
                existing.len(),
                req.head_branch,
                existing[0].number
            );
        }

        if let Some(pr) = existing.first() {
            let updated = self
                .update_pr(
                    UpdatePrRequest {
                        repo: req.repo,
                        pr_number: pr.number,
                        title: req.title,
                        body: req.body,
                    },
                    pr,
                )
                .await?;
            info!("updated existing pull request: #{}", updated.number);
            return Ok(UpsertedPr {
                action: PrAction::Updated,
                pull_request: updated,
            });
        }

        let created = self
            .create_pr(CreatePrRequest {
                repo: req.repo,
                head_branch: req.head_branch,
                base_branch: req.base_branch,
                title: req.title,
                body: req.body,
            })
            .await?;
        info!("created pull request: #{}", created.number);

        Ok(UpsertedPr {
            action: PrAction::Created,
            pull_request: created,
        })
    }
}
