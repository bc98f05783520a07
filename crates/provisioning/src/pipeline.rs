//! The repository bootstrap pipeline.
//!
//! Runs once per newly created assignment repository, triggered by the push
//! the automation identity makes when it generates the repository. The five
//! provisioning steps are explicitly ordered and stop at the first failure;
//! nothing here retries — the webhook delivery mechanism redelivers on a
//! non-2xx response, and steps already applied answer "already exists",
//! which the pipeline treats as success so a redelivery resumes from the
//! first unexecuted step.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use classroom::events::provisioned_branches;
use classroom::{
    ClassroomStore, PlatformClient, PlatformError, PushEvent, RepoPermission, StoreError,
    Username,
};

use crate::errors::{BootstrapError, BootstrapStep};

/// Why a push event did not trigger provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The push was not the first commit on a newly created repository.
    NotInitialCommit,
    /// The pushing actor was not the automation identity; humans pushing
    /// first commits must not trigger provisioning.
    ForeignPusher,
}

/// The result of handling one push event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// All five provisioning steps applied.
    Completed,
    /// The event did not qualify for provisioning; nothing was done.
    Skipped(SkipReason),
}

/// Webhook-triggered provisioning of new assignment repositories.
pub struct BootstrapPipeline {
    store: Arc<dyn ClassroomStore>,
    platform: Arc<dyn PlatformClient>,
    /// Login of the automation identity whose pushes trigger provisioning.
    bot_login: Username,
}

impl BootstrapPipeline {
    pub fn new(
        store: Arc<dyn ClassroomStore>,
        platform: Arc<dyn PlatformClient>,
        bot_login: Username,
    ) -> Self {
        Self {
            store,
            platform,
            bot_login,
        }
    }

    /// Handles one inbound push event.
    ///
    /// Provisioning runs only for an initial commit pushed by the automation
    /// identity. Steps, in order: deadline enforcement (when a deadline is
    /// known for the repository name), pull-request enforcement, branch
    /// creation, push-protection ruleset, student-team read access. Each is
    /// a separate network operation; the first failure aborts the remainder
    /// and surfaces, leaving earlier steps' external effects in place.
    #[instrument(skip(self, event), fields(org = %event.repo.organization, repo = %event.repo.name))]
    pub async fn handle_push(
        &self,
        event: &PushEvent,
    ) -> Result<BootstrapOutcome, BootstrapError> {
        if !event.is_initial_commit() {
            return Ok(BootstrapOutcome::Skipped(SkipReason::NotInitialCommit));
        }
        if event.pusher_name() != Some(self.bot_login.as_str()) {
            debug!(pusher = ?event.pusher_name(), "initial commit from foreign pusher; not provisioning");
            return Ok(BootstrapOutcome::Skipped(SkipReason::ForeignPusher));
        }

        let repo = &event.repo;

        // Step 1 — deadline enforcement. No deadline is not an error.
        match self.store.get_due_date_by_repo_name(&repo.name).await {
            Ok(Some(deadline)) => apply(
                BootstrapStep::DeadlineEnforcement,
                self.platform
                    .create_deadline_enforcement(&repo.organization, &repo.name, deadline)
                    .await,
            )?,
            Ok(None) => debug!("no deadline known for repository; skipping enforcement"),
            Err(source) => return Err(BootstrapError::Persistence { source }),
        }

        // Step 2 — pull-request enforcement, unconditionally.
        apply(
            BootstrapStep::PullRequestEnforcement,
            self.platform
                .create_pr_enforcement(&repo.organization, &repo.name)
                .await,
        )?;

        // Step 3 — working branches, forked from the default branch.
        for branch in provisioned_branches() {
            apply(
                BootstrapStep::BranchCreation,
                self.platform
                    .create_branch(&repo.organization, &repo.name, &repo.master_branch, &branch)
                    .await,
            )?;
        }

        // Step 4 — push protection.
        apply(
            BootstrapStep::PushRuleset,
            self.platform
                .create_push_ruleset(&repo.organization, &repo.name)
                .await,
        )?;

        // Step 5 — resolve the owning classroom through the assignment
        // outline and grant its student team read access.
        let outline = match self.store.get_assignment_by_base_repo(repo.id).await {
            Ok(outline) => outline,
            Err(StoreError::NotFound { .. }) => {
                return Err(BootstrapError::UnknownRepository { repo: repo.id })
            }
            Err(source) => return Err(BootstrapError::Persistence { source }),
        };
        let owning_classroom = self
            .store
            .get_classroom(outline.classroom_id)
            .await
            .map_err(|source| BootstrapError::Persistence { source })?;
        apply(
            BootstrapStep::TeamPermission,
            self.platform
                .update_team_repo_permissions(
                    &repo.organization,
                    &owning_classroom.student_team_slug,
                    &repo.organization,
                    &repo.name,
                    RepoPermission::Pull,
                )
                .await,
        )?;

        info!("repository bootstrap complete");
        Ok(BootstrapOutcome::Completed)
    }
}

/// Resolves one step's platform result.
///
/// "Already exists" means a previous delivery applied this step; the
/// redelivered pipeline continues instead of failing on completed work.
fn apply(step: BootstrapStep, result: Result<(), PlatformError>) -> Result<(), BootstrapError> {
    match result {
        Ok(()) => {
            info!(%step, "provisioning step applied");
            Ok(())
        }
        Err(PlatformError::AlreadyExists { resource }) => {
            debug!(%step, resource, "already applied by an earlier delivery");
            Ok(())
        }
        Err(source) => Err(BootstrapError::Step { step, source }),
    }
}
