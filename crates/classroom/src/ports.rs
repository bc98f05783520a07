//! Port trait definitions.
//!
//! The domain consumes two external collaborators: the hosting platform and
//! the persistence gateway. Both are defined here as async traits with
//! documented failure modes; infrastructure crates implement them and never
//! add domain rules.
//!
//! All traits are dyn-compatible (`async_trait`) so engines can hold
//! `Arc<dyn …>` handles and tests can substitute recording mocks.

use async_trait::async_trait;

use crate::errors::{PlatformError, StoreError};
use crate::identifiers::{
    AssignmentId, BranchName, ClassroomId, OrgName, RepoId, RepoName, TeamId, TeamSlug,
    TokenValue, UserId, Username,
};
use crate::models::{
    AssignmentOutline, Classroom, ClassroomUser, InvitationToken, NewAssignmentOutline,
    NewClassroom, Team,
};
use crate::types::{MembershipStatus, OrgMembership, OrgRole, RepoPermission, Role, Timestamp};

// ---------------------------------------------------------------------------
// Hosting platform — administrative credential
// ---------------------------------------------------------------------------

/// The capability set consumed from the hosting platform, performed with the
/// application's administrative credential.
///
/// Every method is a single network operation. None of them retry; callers
/// decide what a failure means (see [`PlatformError::retry_policy`]).
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Queries a user's membership in an organization.
    ///
    /// Fails with [`PlatformError::NotFound`] when the user is neither a
    /// member nor invited — the reconciliation engine treats that as the
    /// "absent" observation.
    async fn get_org_membership(
        &self,
        org: &OrgName,
        username: &Username,
    ) -> Result<OrgMembership, PlatformError>;

    /// Looks up a team by its slug within an organization.
    async fn get_team_by_name(
        &self,
        org: &OrgName,
        slug: &TeamSlug,
    ) -> Result<Team, PlatformError>;

    /// Creates a team, with the given users as maintainers.
    async fn create_team(
        &self,
        org: &OrgName,
        name: &str,
        description: Option<&str>,
        maintainers: &[Username],
    ) -> Result<Team, PlatformError>;

    /// Deletes a team.
    async fn delete_team(&self, team: TeamId) -> Result<(), PlatformError>;

    /// Adds a user to a team. For users not yet in the organization this
    /// sends an organization invitation as a side effect.
    async fn add_team_member(
        &self,
        team: TeamId,
        username: &Username,
    ) -> Result<(), PlatformError>;

    /// Removes a user from a team.
    async fn remove_team_member(
        &self,
        team: TeamId,
        username: &Username,
    ) -> Result<(), PlatformError>;

    /// Sets (or invites to) a user's organization membership at the given
    /// access level.
    async fn set_org_membership(
        &self,
        org: &OrgName,
        username: &Username,
        role: OrgRole,
    ) -> Result<(), PlatformError>;

    /// Creates `new_branch` pointing at the current head of `from_branch`.
    ///
    /// Fails with [`PlatformError::AlreadyExists`] when the ref is already
    /// present; redelivery-safe callers treat that as already-applied.
    async fn create_branch(
        &self,
        org: &OrgName,
        repo: &RepoName,
        from_branch: &BranchName,
        new_branch: &BranchName,
    ) -> Result<(), PlatformError>;

    /// Installs the deadline-enforcement rule for a repository.
    ///
    /// How the platform enforces the deadline is its concern; this call only
    /// installs the rule carrying it.
    async fn create_deadline_enforcement(
        &self,
        org: &OrgName,
        repo: &RepoName,
        deadline: Timestamp,
    ) -> Result<(), PlatformError>;

    /// Installs the pull-request enforcement rule on a repository.
    async fn create_pr_enforcement(
        &self,
        org: &OrgName,
        repo: &RepoName,
    ) -> Result<(), PlatformError>;

    /// Installs the push-protection ruleset on a repository.
    async fn create_push_ruleset(
        &self,
        org: &OrgName,
        repo: &RepoName,
    ) -> Result<(), PlatformError>;

    /// Grants a team the given permission on a repository.
    async fn update_team_repo_permissions(
        &self,
        org: &OrgName,
        team_slug: &TeamSlug,
        owner: &OrgName,
        repo: &RepoName,
        permission: RepoPermission,
    ) -> Result<(), PlatformError>;

    /// Cancels a user's pending organization invitation.
    async fn cancel_org_invitation(
        &self,
        org: &OrgName,
        username: &Username,
    ) -> Result<(), PlatformError>;
}

// ---------------------------------------------------------------------------
// Hosting platform — invitee's own credential
// ---------------------------------------------------------------------------

/// The one capability performed with the invitee's own authenticated
/// credential rather than the administrative one: organization invitations
/// can only be accepted by the invited user.
#[async_trait]
pub trait UserPlatformClient: Send + Sync {
    /// Accepts the caller's pending invitation to `org`.
    ///
    /// Precondition: an invitation is actually pending. Calling this without
    /// one is a caller error and is surfaced, not retried.
    async fn accept_org_invitation(&self, org: &OrgName) -> Result<(), PlatformError>;
}

// ---------------------------------------------------------------------------
// Persistence gateway
// ---------------------------------------------------------------------------

/// The durable-store capability set: classrooms, membership records,
/// invitation tokens, and assignment outlines.
///
/// Implementations must enforce two uniqueness constraints — active classroom
/// names, and at most one live permanent token per (classroom, role) — by
/// failing the losing write with [`StoreError::Conflict`].
#[async_trait]
pub trait ClassroomStore: Send + Sync {
    // -- classrooms --------------------------------------------------------

    async fn create_classroom(&self, classroom: NewClassroom)
        -> Result<Classroom, StoreError>;

    async fn get_classroom(&self, id: ClassroomId) -> Result<Classroom, StoreError>;

    async fn get_classroom_by_name(&self, name: &str) -> Result<Classroom, StoreError>;

    /// Updates a classroom's mutable fields (currently the display name).
    ///
    /// The organization identifier and the derived student team slug are
    /// immutable once set; an update that tries to change them fails with
    /// [`StoreError::Conflict`]. Name uniqueness is enforced as on create.
    async fn update_classroom(&self, classroom: Classroom) -> Result<Classroom, StoreError>;

    // -- membership records ------------------------------------------------

    /// Creates the (classroom, user) membership record.
    async fn add_user_to_classroom(
        &self,
        classroom: ClassroomId,
        user: UserId,
        username: &Username,
        role: Role,
        status: MembershipStatus,
    ) -> Result<ClassroomUser, StoreError>;

    async fn get_user_in_classroom(
        &self,
        classroom: ClassroomId,
        user: UserId,
    ) -> Result<ClassroomUser, StoreError>;

    async fn list_users_in_classroom(
        &self,
        classroom: ClassroomId,
    ) -> Result<Vec<ClassroomUser>, StoreError>;

    /// Persists a status computed by the reconciliation engine. No other
    /// component may call this.
    async fn set_user_status(
        &self,
        classroom: ClassroomId,
        user: UserId,
        status: MembershipStatus,
    ) -> Result<ClassroomUser, StoreError>;

    /// Persists a role change (explicit admin action or the monotone upgrade
    /// rule).
    async fn set_user_role(
        &self,
        classroom: ClassroomId,
        user: UserId,
        role: Role,
    ) -> Result<ClassroomUser, StoreError>;

    // -- invitation tokens -------------------------------------------------

    /// Persists a freshly minted token. Fails with [`StoreError::Conflict`]
    /// when the token is permanent and a live permanent token already exists
    /// for its (classroom, role) pair.
    async fn create_invitation_token(
        &self,
        token: InvitationToken,
    ) -> Result<InvitationToken, StoreError>;

    async fn get_invitation_token(
        &self,
        value: &TokenValue,
    ) -> Result<InvitationToken, StoreError>;

    /// Looks up the live permanent token for (classroom, role), if any.
    async fn get_permanent_token(
        &self,
        classroom: ClassroomId,
        role: Role,
    ) -> Result<InvitationToken, StoreError>;

    // -- assignment outlines -----------------------------------------------

    async fn create_assignment(
        &self,
        outline: NewAssignmentOutline,
    ) -> Result<AssignmentOutline, StoreError>;

    async fn get_assignment(&self, id: AssignmentId)
        -> Result<AssignmentOutline, StoreError>;

    /// Resolves the outline whose base repository has the given platform id
    /// (the bootstrap pipeline's join key).
    async fn get_assignment_by_base_repo(
        &self,
        repo: RepoId,
    ) -> Result<AssignmentOutline, StoreError>;

    /// Looks up an outline by name within a classroom.
    async fn get_assignment_by_name(
        &self,
        classroom: ClassroomId,
        name: &str,
    ) -> Result<AssignmentOutline, StoreError>;

    /// Resolves a due date for a repository by name.
    ///
    /// Returns `Ok(None)` when no assignment matches — a repository without
    /// a deadline is normal, not an error.
    async fn get_due_date_by_repo_name(
        &self,
        repo: &RepoName,
    ) -> Result<Option<Timestamp>, StoreError>;
}
