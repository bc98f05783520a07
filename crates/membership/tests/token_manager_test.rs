//! Integration tests for invitation token issuance and redemption.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use classroom::{
    Classroom, ClassroomId, ClassroomStore, InvitationToken, MembershipStatus, NewClassroom,
    OrgName, PlatformClient, Role, Timestamp, TokenValue, User, UserId, Username,
};
use membership::{MembershipEngine, MembershipError, TokenManager};
use store::MemoryStore;

use common::{MockPlatform, MockUserClient};

const ORG: &str = "course-org";
const TEAM_SLUG: &str = "systems-fall-2026-students";

struct Fixture {
    store: Arc<MemoryStore>,
    platform: Arc<MockPlatform>,
    tokens: TokenManager,
    classroom: Classroom,
}

async fn setup() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let platform = Arc::new(MockPlatform::new());
    let engine = MembershipEngine::new(
        store.clone() as Arc<dyn ClassroomStore>,
        platform.clone() as Arc<dyn PlatformClient>,
    );
    let classroom = store
        .create_classroom(NewClassroom {
            name: "Systems Fall 2026".to_owned(),
            org_name: OrgName::new(ORG).unwrap(),
            student_team_slug: Classroom::derive_student_team_slug("Systems Fall 2026"),
        })
        .await
        .unwrap();
    Fixture {
        store,
        platform,
        tokens: TokenManager::new(engine),
        classroom,
    }
}

fn joiner(id: u64, login: &str) -> User {
    User {
        id: UserId::new(id),
        username: Username::new(login).unwrap(),
    }
}

/// Inserts a token with a hand-picked expiry, bypassing issuance.
async fn seed_token(
    store: &MemoryStore,
    classroom: ClassroomId,
    value: &str,
    expires_at: Option<Timestamp>,
) {
    store
        .create_invitation_token(InvitationToken {
            value: TokenValue::new(value).unwrap(),
            classroom_id: classroom,
            role: Role::Student,
            expires_at,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn permanent_token_is_reused_across_issuances() {
    let fx = setup().await;

    let first = fx.tokens.issue(fx.classroom.id, Role::Student, None).await.unwrap();
    let second = fx.tokens.issue(fx.classroom.id, Role::Student, None).await.unwrap();

    assert!(first.is_permanent());
    assert_eq!(first.value, second.value);

    // A different role gets its own permanent token.
    let ta_token = fx.tokens.issue(fx.classroom.id, Role::Ta, None).await.unwrap();
    assert_ne!(ta_token.value, first.value);
}

#[tokio::test]
async fn ephemeral_tokens_are_minted_fresh_with_expiry() {
    let fx = setup().await;

    let first = fx.tokens.issue(fx.classroom.id, Role::Student, Some(30)).await.unwrap();
    let second = fx.tokens.issue(fx.classroom.id, Role::Student, Some(30)).await.unwrap();

    assert_ne!(first.value, second.value);
    assert!(first.expires_at.is_some());
    assert_eq!(first.value.as_str().len(), 32);
}

#[tokio::test]
async fn redeem_unknown_token_is_invalid() {
    let fx = setup().await;
    let user_client = MockUserClient::new();

    let err = fx
        .tokens
        .redeem(
            &TokenValue::new("does-not-exist").unwrap(),
            &joiner(7, "octocat"),
            &user_client,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, MembershipError::InvalidToken));
}

#[tokio::test]
async fn redeem_after_expiry_fails_but_token_survives() {
    let fx = setup().await;
    let expired_at = Timestamp::from_utc(Utc::now() - Duration::minutes(1));
    seed_token(&fx.store, fx.classroom.id, "expired-token", Some(expired_at)).await;
    let user_client = MockUserClient::new();

    let err = fx
        .tokens
        .redeem(
            &TokenValue::new("expired-token").unwrap(),
            &joiner(7, "octocat"),
            &user_client,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, MembershipError::ExpiredToken));

    // Expired tokens are inert, not deleted.
    assert!(fx
        .store
        .get_invitation_token(&TokenValue::new("expired-token").unwrap())
        .await
        .is_ok());
}

#[tokio::test]
async fn redeem_before_expiry_joins_and_activates() {
    let fx = setup().await;
    let expires_at = Timestamp::from_utc(Utc::now() + Duration::minutes(1));
    seed_token(&fx.store, fx.classroom.id, "live-token", Some(expires_at)).await;
    fx.platform.seed_team(ORG, TEAM_SLUG);
    let user_client = MockUserClient::new();
    let user = joiner(7, "octocat");

    let (classroom, membership) = fx
        .tokens
        .redeem(&TokenValue::new("live-token").unwrap(), &user, &user_client)
        .await
        .unwrap();

    assert_eq!(classroom.id, fx.classroom.id);
    assert_eq!(membership.status, MembershipStatus::Active);
    assert_eq!(membership.role, Role::Student);
    assert_eq!(user_client.accepted_orgs(), vec![ORG.to_owned()]);
}

#[tokio::test]
async fn tokens_are_multi_use() {
    let fx = setup().await;
    fx.platform.seed_team(ORG, TEAM_SLUG);
    let token = fx.tokens.issue(fx.classroom.id, Role::Student, None).await.unwrap();

    for (id, login) in [(1, "alice"), (2, "bob"), (3, "carol")] {
        let user = joiner(id, login);
        let user_client = MockUserClient::new();
        let (_, membership) = fx
            .tokens
            .redeem(&token.value, &user, &user_client)
            .await
            .unwrap();
        assert_eq!(membership.status, MembershipStatus::Active);
    }
}

#[tokio::test]
async fn redeem_refuses_revoked_membership() {
    let fx = setup().await;
    fx.platform.seed_team(ORG, TEAM_SLUG);
    let token = fx.tokens.issue(fx.classroom.id, Role::Student, None).await.unwrap();
    let user = joiner(7, "octocat");
    fx.store
        .add_user_to_classroom(
            fx.classroom.id,
            user.id,
            &user.username,
            Role::Student,
            MembershipStatus::Removed,
        )
        .await
        .unwrap();

    let err = fx
        .tokens
        .redeem(&token.value, &user, &MockUserClient::new())
        .await
        .unwrap_err();
    assert!(matches!(err, MembershipError::MembershipRevoked));
}
