//! Membership component errors.

use classroom::{PlatformError, RetryPolicy, StoreError};
use thiserror::Error;

/// Errors surfaced by the membership engine and the token manager.
///
/// Port failures are wrapped, never masked: a provisioning failure carries
/// the [`PlatformError`] that caused it so callers can consult its
/// [`RetryPolicy`], and a persistence failure carries the [`StoreError`].
#[derive(Debug, Error)]
pub enum MembershipError {
    /// The looked-up entity has no record — reconciliation never creates
    /// membership, and tokens reference classrooms that must exist.
    #[error("{what} not found")]
    NotFound {
        /// What was looked up.
        what: String,
    },

    /// The membership was removed from the classroom. Terminal: no invite or
    /// reconciliation acts on a removed membership again.
    #[error("membership in this classroom has been revoked")]
    MembershipRevoked,

    /// The presented token value matches no stored token.
    #[error("invitation token not recognized")]
    InvalidToken,

    /// The token exists but its expiry is in the past.
    #[error("invitation token has expired")]
    ExpiredToken,

    /// The acting user does not hold the role (or organization access level)
    /// the operation requires.
    #[error("insufficient permissions for this operation")]
    InsufficientPermissions,

    /// A uniqueness invariant rejected the operation (e.g. duplicate active
    /// classroom name).
    #[error("{message}")]
    Conflict {
        /// Description of the conflicting state.
        message: String,
    },

    /// A platform call failed. The internal record keeps whatever the last
    /// successful write left; at-least-once retry by the caller converges.
    #[error("platform provisioning failed")]
    Provisioning {
        #[source]
        source: PlatformError,
    },

    /// The persistence gateway failed.
    #[error("persistence failed")]
    Persistence {
        #[source]
        source: StoreError,
    },
}

impl MembershipError {
    /// Maps a store failure onto the membership taxonomy, naming the entity
    /// for `NotFound`.
    pub(crate) fn from_store(err: StoreError, what: &str) -> Self {
        match err {
            StoreError::NotFound { .. } => MembershipError::NotFound {
                what: what.to_owned(),
            },
            StoreError::Conflict { constraint } => MembershipError::Conflict {
                message: format!("uniqueness conflict on {constraint}"),
            },
            err => MembershipError::Persistence { source: err },
        }
    }

    /// Classifies this failure for callers that retry.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            MembershipError::Provisioning { source } => source.retry_policy(),
            _ => RetryPolicy::NonRetryable,
        }
    }

    /// Returns `true` for failures that should surface as descriptive
    /// client errors; everything else collapses to a generic server error
    /// at the transport boundary.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            MembershipError::NotFound { .. }
                | MembershipError::MembershipRevoked
                | MembershipError::InvalidToken
                | MembershipError::ExpiredToken
                | MembershipError::InsufficientPermissions
                | MembershipError::Conflict { .. }
        )
    }
}
