//! Port error and retry-policy types.
//!
//! The two ports defined in [`crate::ports`] fail in documented ways:
//! [`PlatformError`] for the hosting platform, [`StoreError`] for the
//! persistence gateway. Component-level errors (membership, bootstrap,
//! listener) are defined in their respective crates and wrap these.
//!
//! [`RetryPolicy`] is a cross-cutting concern: any error type that
//! participates in retry decisions must be able to produce a [`RetryPolicy`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// Returned by infrastructure error types to let callers decide whether to
/// re-invoke an operation. Nothing in ClassHub retries internally — the
/// reconciliation engine surfaces provisioning failures for at-least-once
/// caller retry, and the bootstrap pipeline relies on webhook redelivery —
/// so this policy is advice to the caller, not a loop condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    ///
    /// `after` optionally specifies the minimum delay before retrying (e.g.
    /// derived from a rate-limit reset header).
    Retryable {
        /// Minimum back-off before the next attempt. `None` means retry
        /// immediately or apply the caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried; the condition is permanent until
    /// an operator or the user changes something.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Platform port failures
// ---------------------------------------------------------------------------

/// Failure modes of the hosting-platform client.
///
/// Adapters map transport- and API-level failures onto these variants; the
/// engines never see an HTTP status code or a socket error directly.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum PlatformError {
    /// The requested entity does not exist on the platform.
    ///
    /// For organization-membership queries this is the normal way the
    /// platform reports "not a member" — reconciliation treats it as an
    /// observation, not a fault.
    #[error("{resource} not found on the platform")]
    NotFound {
        /// Human-readable description of what was looked up.
        resource: String,
    },

    /// The entity to be created already exists.
    ///
    /// Produced when the platform rejects a creation call for an entity that
    /// is already in place (e.g. a branch ref). Redelivery-safe callers may
    /// treat this as already-applied.
    #[error("{resource} already exists on the platform")]
    AlreadyExists {
        /// Human-readable description of what was being created.
        resource: String,
    },

    /// The platform throttled the caller.
    #[error("platform rate limit exceeded")]
    RateLimited {
        /// Suggested back-off parsed from the response, when present.
        retry_after: Option<Duration>,
    },

    /// The platform answered with an error status not covered above.
    #[error("platform rejected the request (status {status}): {message}")]
    Api {
        /// HTTP status the platform answered with.
        status: u16,
        /// Response body, truncated to a loggable length.
        message: String,
    },

    /// The request never produced a platform answer (connect failure,
    /// timeout, malformed response body).
    #[error("transport failure talking to the platform: {message}")]
    Transport {
        /// Description of the underlying failure.
        message: String,
    },
}

impl PlatformError {
    /// Classifies this failure for callers that retry.
    ///
    /// Rate limits and transport failures are transient; everything else
    /// reflects a state the retry would re-observe.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            PlatformError::RateLimited { retry_after } => RetryPolicy::Retryable {
                after: *retry_after,
            },
            PlatformError::Transport { .. } => RetryPolicy::Retryable { after: None },
            PlatformError::Api { status, .. } if *status >= 500 => {
                RetryPolicy::Retryable { after: None }
            }
            _ => RetryPolicy::NonRetryable,
        }
    }
}

// ---------------------------------------------------------------------------
// Persistence port failures
// ---------------------------------------------------------------------------

/// Failure modes of the persistence gateway.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum StoreError {
    /// No record matched the lookup.
    #[error("{entity} not found")]
    NotFound {
        /// Human-readable description of what was looked up.
        entity: String,
    },

    /// A uniqueness constraint rejected the write.
    ///
    /// Carried by the permanent-token constraint on (classroom, role) and
    /// the active-classroom-name constraint; callers losing the race re-read
    /// the winner's row instead of failing.
    #[error("uniqueness conflict on {constraint}")]
    Conflict {
        /// The violated constraint, named for logs.
        constraint: String,
    },

    /// The store itself failed; surfaced, never masked.
    #[error("store backend failure: {message}")]
    Backend {
        /// Description of the underlying failure.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_retryable_with_backoff() {
        let err = PlatformError::RateLimited {
            retry_after: Some(Duration::from_secs(30)),
        };
        assert_eq!(
            err.retry_policy(),
            RetryPolicy::Retryable {
                after: Some(Duration::from_secs(30))
            }
        );
    }

    #[test]
    fn not_found_is_not_retryable() {
        let err = PlatformError::NotFound {
            resource: "org membership".to_owned(),
        };
        assert_eq!(err.retry_policy(), RetryPolicy::NonRetryable);
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = PlatformError::Api {
            status: 502,
            message: "bad gateway".to_owned(),
        };
        assert_eq!(err.retry_policy(), RetryPolicy::Retryable { after: None });
    }
}
