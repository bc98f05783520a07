//! Domain entity models.
//!
//! Plain data records as the persistence gateway stores them. Creation
//! variants (`New…`) carry the caller-supplied fields; the gateway assigns
//! identifiers.

use serde::{Deserialize, Serialize};

use crate::identifiers::{
    AssignmentId, ClassroomId, OrgName, RepoId, RubricId, TeamId, TeamSlug, TemplateId,
    TokenValue, UserId, Username,
};
use crate::types::{MembershipStatus, Role, Timestamp};

// ---------------------------------------------------------------------------
// Classroom
// ---------------------------------------------------------------------------

/// A classroom: one course offering backed by one platform organization.
///
/// The name is globally unique among active classrooms; the organization is
/// immutable once set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classroom {
    pub id: ClassroomId,
    /// Display name, e.g. `"Systems Fall 2026"`.
    pub name: String,
    /// The platform organization that owns this classroom's teams and
    /// repositories.
    pub org_name: OrgName,
    /// Slug of the organization team holding the classroom's students.
    pub student_team_slug: TeamSlug,
}

/// Fields required to create a classroom; the gateway assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClassroom {
    pub name: String,
    pub org_name: OrgName,
    pub student_team_slug: TeamSlug,
}

impl Classroom {
    /// Derives the student team slug for a classroom name: lowercased, spaces
    /// replaced with dashes, `-students` suffix.
    ///
    /// `"Systems Fall 2026"` → `"systems-fall-2026-students"`. The suffix
    /// guarantees the result is non-empty.
    pub fn derive_student_team_slug(name: &str) -> TeamSlug {
        let slug = format!("{}-students", name.to_lowercase().replace(' ', "-"));
        TeamSlug(slug)
    }
}

// ---------------------------------------------------------------------------
// Users and membership
// ---------------------------------------------------------------------------

/// A registered user, as authenticated by the surrounding application layer.
///
/// Engines receive users from callers; the membership subsystem never creates
/// or looks up accounts itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// The user's login on the hosting platform.
    pub username: Username,
}

/// The (classroom, user) membership record.
///
/// `status` is owned by the reconciliation engine; `role` changes only
/// through explicit admin action or the monotone upgrade rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassroomUser {
    pub classroom_id: ClassroomId,
    pub user_id: UserId,
    /// Platform login, carried on the record so external calls need no
    /// account lookup.
    pub username: Username,
    pub role: Role,
    pub status: MembershipStatus,
}

// ---------------------------------------------------------------------------
// Invitation tokens
// ---------------------------------------------------------------------------

/// A shareable invitation token granting a classroom role on redemption.
///
/// Immutable after creation; only its validity — computed from `expires_at`
/// at redemption time — changes. Redemption is not single-use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationToken {
    pub value: TokenValue,
    pub classroom_id: ClassroomId,
    /// The role granted to any user who redeems this token.
    pub role: Role,
    /// `None` for permanent tokens. Ephemeral tokens expire at issuance time
    /// plus the requested duration.
    pub expires_at: Option<Timestamp>,
}

impl InvitationToken {
    /// Returns `true` if this token never expires.
    pub fn is_permanent(&self) -> bool {
        self.expires_at.is_none()
    }

    /// Returns `true` if the expiry timestamp is strictly in the past.
    ///
    /// Expired tokens are inert, not deleted; this check is the only thing
    /// that invalidates them.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at < now,
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Assignment outlines
// ---------------------------------------------------------------------------

/// A published assignment: the template and rubric metadata plus the base
/// repository the bootstrap pipeline keys on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentOutline {
    pub id: AssignmentId,
    pub template_id: TemplateId,
    /// Platform id of the assignment's base repository — the join key used
    /// to resolve the owning classroom when a new repository is pushed.
    pub base_repo_id: RepoId,
    pub name: String,
    pub classroom_id: ClassroomId,
    pub rubric_id: Option<RubricId>,
    /// Whether students work in groups rather than individually.
    pub group_assignment: bool,
    /// Main submission deadline, when one is set.
    pub main_due_date: Option<Timestamp>,
}

/// Fields required to publish an assignment; the gateway assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAssignmentOutline {
    pub template_id: TemplateId,
    pub base_repo_id: RepoId,
    pub name: String,
    pub classroom_id: ClassroomId,
    pub rubric_id: Option<RubricId>,
    pub group_assignment: bool,
    pub main_due_date: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Platform-side entities
// ---------------------------------------------------------------------------

/// A team as reported by the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub slug: TeamSlug,
    pub name: String,
}
