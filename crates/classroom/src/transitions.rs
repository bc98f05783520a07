//! The membership status transition table.
//!
//! Reconciliation is an explicit state machine: given the stored status and a
//! freshly observed external membership state, [`next_status`] computes the
//! status to persist. Keeping it a pure function makes the reconciliation
//! rules unit-testable without a store or a network.

use crate::types::{MembershipStatus, OrgMembershipState};

/// Computes the membership status implied by a fresh external observation.
///
/// `observed` is `None` when the organization reports no membership for the
/// user — either they were never invited, they declined, or they have been
/// removed there. Rules:
///
/// - `Removed` is absorbing: no observation changes it.
/// - A `Requested` user is expected to be absent externally (no invitation
///   has been sent yet), so absence preserves `Requested`.
/// - Absence otherwise means the user left or was removed: `NotInOrg`.
/// - An active external membership yields `Active`; a pending invitation
///   yields `OrgInvited`.
///
/// The function is idempotent in its second argument: feeding the same
/// observation twice yields the same status both times.
pub fn next_status(
    current: MembershipStatus,
    observed: Option<OrgMembershipState>,
) -> MembershipStatus {
    use MembershipStatus::*;

    match (current, observed) {
        (Removed, _) => Removed,
        (Requested, None) => Requested,
        (_, None) => NotInOrg,
        (_, Some(OrgMembershipState::Active)) => Active,
        (_, Some(OrgMembershipState::Pending)) => OrgInvited,
    }
}
