//! Invitation token issuance and redemption.

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::instrument;

use classroom::{
    Classroom, ClassroomId, ClassroomUser, InvitationToken, Role, StoreError, Timestamp,
    TokenValue, User, UserPlatformClient,
};

use crate::engine::MembershipEngine;
use crate::errors::MembershipError;

/// Issues and redeems classroom invitation tokens.
///
/// Tokens are immutable bearer values. Permanent tokens (no expiry) are
/// reused across issuance calls so a shared join link stays stable; ephemeral
/// tokens are minted fresh per request and become inert — not deleted — once
/// their expiry passes. Redemption is never single-use.
pub struct TokenManager {
    engine: MembershipEngine,
}

impl TokenManager {
    pub fn new(engine: MembershipEngine) -> Self {
        Self { engine }
    }

    /// Issues a token granting `role` in `classroom`.
    ///
    /// Without a duration this returns the existing permanent token for the
    /// (classroom, role) pair when one exists; otherwise a fresh 128-bit
    /// token is minted. Two concurrent first issuances can both observe "no
    /// permanent token" — the store's uniqueness constraint fails the losing
    /// insert, and the loser re-reads the winner's token.
    #[instrument(skip(self), fields(classroom = %classroom, role = %role))]
    pub async fn issue(
        &self,
        classroom: ClassroomId,
        role: Role,
        duration_minutes: Option<u64>,
    ) -> Result<InvitationToken, MembershipError> {
        let store = self.engine.store();

        if duration_minutes.is_none() {
            match store.get_permanent_token(classroom, role).await {
                Ok(existing) => return Ok(existing),
                Err(StoreError::NotFound { .. }) => {}
                Err(err) => return Err(MembershipError::Persistence { source: err }),
            }
        }

        let token = InvitationToken {
            value: mint_value(),
            classroom_id: classroom,
            role,
            expires_at: duration_minutes.map(|minutes| Timestamp::now().plus_minutes(minutes)),
        };

        match store.create_invitation_token(token).await {
            Ok(created) => Ok(created),
            Err(StoreError::Conflict { .. }) => {
                // Lost the permanent-token race; the winner's row is the
                // token this call should have returned.
                store
                    .get_permanent_token(classroom, role)
                    .await
                    .map_err(|e| MembershipError::from_store(e, "permanent token"))
            }
            Err(err) => Err(MembershipError::Persistence { source: err }),
        }
    }

    /// Redeems a token on behalf of `user`, joining them to the token's
    /// classroom at the token's role and accepting the resulting
    /// organization invitation with the user's own credential.
    ///
    /// An unknown value fails with [`MembershipError::InvalidToken`]; a
    /// time-expired token fails with [`MembershipError::ExpiredToken`] and
    /// is left in place.
    ///
    /// The token value is a bearer secret and is never recorded on spans.
    #[instrument(skip(self, value, user, user_client), fields(user = %user.id))]
    pub async fn redeem(
        &self,
        value: &TokenValue,
        user: &User,
        user_client: &dyn UserPlatformClient,
    ) -> Result<(Classroom, ClassroomUser), MembershipError> {
        let store = self.engine.store();

        let token = match store.get_invitation_token(value).await {
            Ok(token) => token,
            Err(StoreError::NotFound { .. }) => return Err(MembershipError::InvalidToken),
            Err(err) => return Err(MembershipError::Persistence { source: err }),
        };
        if token.is_expired(Timestamp::now()) {
            return Err(MembershipError::ExpiredToken);
        }

        let (classroom, _) = self
            .engine
            .invite_user(token.classroom_id, token.role, user)
            .await?;
        self.engine
            .accept_invitation(&classroom, user, user_client)
            .await?;

        let membership = store
            .get_user_in_classroom(classroom.id, user.id)
            .await
            .map_err(|e| MembershipError::from_store(e, "membership record"))?;
        Ok((classroom, membership))
    }
}

/// Mints a fresh token value from 128 bits of OS entropy.
fn mint_value() -> TokenValue {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    TokenValue::from_entropy(bytes)
}
