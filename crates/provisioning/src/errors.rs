//! Bootstrap component errors.

use classroom::{PlatformError, RepoId, RetryPolicy, StoreError};
use thiserror::Error;

/// The ordered provisioning steps, named so a failure identifies exactly how
/// far the pipeline got. Steps are independent and not transactionally
/// linked; everything applied before the failing step stays applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStep {
    /// Install the deadline-enforcement rule (skipped when no deadline is
    /// known for the repository).
    DeadlineEnforcement,
    /// Install the pull-request enforcement rule.
    PullRequestEnforcement,
    /// Create the `development` and `feedback` branches.
    BranchCreation,
    /// Install the push-protection ruleset.
    PushRuleset,
    /// Grant the classroom's student team read access.
    TeamPermission,
}

impl std::fmt::Display for BootstrapStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BootstrapStep::DeadlineEnforcement => "deadline-enforcement",
            BootstrapStep::PullRequestEnforcement => "pull-request-enforcement",
            BootstrapStep::BranchCreation => "branch-creation",
            BootstrapStep::PushRuleset => "push-ruleset",
            BootstrapStep::TeamPermission => "team-permission",
        };
        write!(f, "{label}")
    }
}

/// Errors surfaced by the bootstrap pipeline.
///
/// The pipeline never retries internally: the first failing step aborts the
/// remainder, the error propagates to the webhook response, and the
/// platform's redelivery is the retry mechanism.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A provisioning step's platform call failed. Earlier steps' external
    /// effects remain in place.
    #[error("provisioning step {step} failed")]
    Step {
        /// The step that failed; later steps were not attempted.
        step: BootstrapStep,
        #[source]
        source: PlatformError,
    },

    /// No assignment outline references the pushed repository, so the owning
    /// classroom cannot be resolved.
    #[error("no assignment outline for repository {repo}")]
    UnknownRepository { repo: RepoId },

    /// The persistence gateway failed mid-pipeline.
    #[error("persistence failed during bootstrap")]
    Persistence {
        #[source]
        source: StoreError,
    },
}

impl BootstrapError {
    /// Classifies this failure for the redelivery decision.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            BootstrapError::Step { source, .. } => source.retry_policy(),
            BootstrapError::UnknownRepository { .. } => RetryPolicy::NonRetryable,
            BootstrapError::Persistence { .. } => RetryPolicy::NonRetryable,
        }
    }
}
