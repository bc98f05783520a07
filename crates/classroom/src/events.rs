//! Inbound webhook event payloads.
//!
//! The platform delivers events as an event-type label (carried in a header)
//! plus a JSON body. The listener crate deserializes bodies into these types
//! and routes a [`WebhookEvent`]; everything downstream of the transport sees
//! only this tagged union — unknown labels are an explicit variant, never an
//! open-ended lookup.

use serde::{Deserialize, Serialize};

use crate::identifiers::{BranchName, CommitSha, OrgName, RepoId, RepoName};

/// The all-zero commit hash the platform sends as a push event's `before`
/// value when the pushed branch did not previously exist.
pub const ZERO_SHA: &str = "0000000000000000000000000000000000000000";

/// Branches provisioned on every new assignment repository, forked from the
/// repository's default branch.
pub fn provisioned_branches() -> [BranchName; 2] {
    [
        BranchName("development".to_owned()),
        BranchName("feedback".to_owned()),
    ]
}

// ---------------------------------------------------------------------------
// Push events
// ---------------------------------------------------------------------------

/// The repository fields a push event carries.
///
/// All four fields are required: a push without them cannot be attributed to
/// a repository and is rejected as malformed at decode time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushRepository {
    /// Platform-assigned repository id (the assignment-outline join key).
    pub id: RepoId,
    pub name: RepoName,
    /// Login of the organization that owns the repository.
    pub organization: OrgName,
    /// The repository's default branch at push time.
    pub master_branch: BranchName,
}

/// The actor that performed a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pusher {
    pub name: Option<String>,
}

/// An inbound push event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "repository")]
    pub repo: PushRepository,
    /// Commit hash the pushed ref pointed at before the push; the all-zero
    /// sentinel when the ref is brand new.
    pub before: Option<CommitSha>,
    /// Whether this push created the ref.
    #[serde(default)]
    pub created: bool,
    pub pusher: Option<Pusher>,
    /// Base ref for merge-group pushes; absent for ordinary pushes.
    pub base_ref: Option<String>,
}

impl PushEvent {
    /// Returns `true` iff this push is the very first commit on a newly
    /// created repository: no base ref, the created flag set, and the
    /// before-hash equal to the all-zero sentinel.
    pub fn is_initial_commit(&self) -> bool {
        self.base_ref.is_none()
            && self.created
            && self.before.as_ref().map(CommitSha::as_str) == Some(ZERO_SHA)
    }

    /// Returns the pusher's login, if the payload carried one.
    pub fn pusher_name(&self) -> Option<&str> {
        self.pusher.as_ref().and_then(|p| p.name.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Review comment events
// ---------------------------------------------------------------------------

/// The comment fields a review-comment event carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewComment {
    /// The author's relationship to the repository (`"COLLABORATOR"`,
    /// `"MEMBER"`, …).
    pub author_association: Option<String>,
}

/// An inbound pull-request review-comment event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCommentEvent {
    pub comment: ReviewComment,
}

// ---------------------------------------------------------------------------
// The tagged union the dispatcher routes on
// ---------------------------------------------------------------------------

/// One decoded webhook delivery.
///
/// `PullRequest` and `ReviewThread` are recognized and acknowledged without
/// further processing; deliveries whose label matches none of the known kinds
/// never construct a `WebhookEvent` — the listener rejects them before
/// dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    Push(PushEvent),
    PullRequest,
    ReviewComment(ReviewCommentEvent),
    ReviewThread,
}

impl WebhookEvent {
    /// Returns the event-type label this event was delivered under.
    pub fn label(&self) -> &'static str {
        match self {
            WebhookEvent::Push(_) => "push",
            WebhookEvent::PullRequest => "pull_request",
            WebhookEvent::ReviewComment(_) => "pull_request_review_comment",
            WebhookEvent::ReviewThread => "pull_request_review_thread",
        }
    }
}
