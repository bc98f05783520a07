//! Shared value types for the classroom domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (the role order drives the monotone
//! upgrade rule, membership status transitions are computed by
//! [`crate::transitions`]) and participate in domain computations.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// A user's role within a classroom.
///
/// Roles are totally ordered: `Student < Ta < Professor`. The derived order
/// is load-bearing — invitation handling upgrades a stored role only when the
/// requested role is strictly higher, and never downgrades.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Course participant; receives assignment repositories.
    Student,
    /// Teaching assistant; may inspect classroom state.
    Ta,
    /// Course owner; may administer membership and tokens.
    Professor,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Role::Student => "student",
            Role::Ta => "ta",
            Role::Professor => "professor",
        };
        write!(f, "{label}")
    }
}

// ---------------------------------------------------------------------------
// Membership status
// ---------------------------------------------------------------------------

/// Internal record of where a classroom member stands with respect to the
/// external organization.
///
/// Owned exclusively by the reconciliation engine; no other component writes
/// it. `Removed` is terminal — see [`crate::transitions::next_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    /// Membership record exists but no organization invitation has been sent.
    Requested,
    /// An organization invitation is pending acceptance.
    OrgInvited,
    /// The user is an active organization member.
    Active,
    /// The user was observed absent from the organization (removed there, or
    /// declined the invitation).
    NotInOrg,
    /// The user was removed from the classroom. Terminal: reconciliation
    /// never transitions out of this status.
    Removed,
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MembershipStatus::Requested => "requested",
            MembershipStatus::OrgInvited => "org_invited",
            MembershipStatus::Active => "active",
            MembershipStatus::NotInOrg => "not_in_org",
            MembershipStatus::Removed => "removed",
        };
        write!(f, "{label}")
    }
}

// ---------------------------------------------------------------------------
// Externally observed organization state
// ---------------------------------------------------------------------------

/// The state of a user's organization membership as reported by the platform.
///
/// Absence (the user is not a member and has no pending invitation) is
/// represented as `None` at the reconciliation boundary, not as a variant —
/// the platform reports it as a lookup failure, not a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgMembershipState {
    /// The user is a member of the organization.
    Active,
    /// The user has been invited and has not yet accepted.
    Pending,
}

/// The access level a user holds (or is granted) in an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgRole {
    /// Ordinary organization member.
    Member,
    /// Organization administrator. Classroom creators must hold this level;
    /// TA and professor invitations grant it.
    Admin,
}

impl OrgRole {
    /// Returns the platform's wire label for this access level.
    pub fn as_str(self) -> &'static str {
        match self {
            OrgRole::Member => "member",
            OrgRole::Admin => "admin",
        }
    }
}

/// A freshly observed organization membership: state plus access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMembership {
    /// Whether the membership is live or still a pending invitation.
    pub state: OrgMembershipState,
    /// The access level attached to the membership.
    pub role: OrgRole,
}

// ---------------------------------------------------------------------------
// Repository permissions
// ---------------------------------------------------------------------------

/// Permission level a team can hold on a repository.
///
/// The bootstrap pipeline grants student teams [`RepoPermission::Pull`]
/// (read-only) on each new assignment repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoPermission {
    /// Read-only access.
    Pull,
    /// Issue/PR triage without code write access.
    Triage,
    /// Read and write access.
    Push,
    /// Write access plus repository settings short of admin.
    Maintain,
    /// Full administrative access.
    Admin,
}

impl RepoPermission {
    /// Returns the platform's wire label for this permission level.
    pub fn as_str(self) -> &'static str {
        match self {
            RepoPermission::Pull => "pull",
            RepoPermission::Triage => "triage",
            RepoPermission::Push => "push",
            RepoPermission::Maintain => "maintain",
            RepoPermission::Admin => "admin",
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns this timestamp shifted forward by `minutes`.
    ///
    /// Used to derive ephemeral token expiries from a requested duration.
    pub fn plus_minutes(self, minutes: u64) -> Self {
        Self(self.0 + Duration::minutes(minutes as i64))
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
