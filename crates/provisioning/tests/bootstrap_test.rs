//! Integration tests for the repository bootstrap pipeline.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use classroom::{
    BranchName, Classroom, ClassroomStore, CommitSha, NewAssignmentOutline, NewClassroom,
    OrgName, PlatformClient, PushEvent, PushRepository, Pusher, RepoId, RepoName, TemplateId,
    Timestamp, Username, ZERO_SHA,
};
use provisioning::{BootstrapError, BootstrapOutcome, BootstrapPipeline, BootstrapStep, SkipReason};
use store::MemoryStore;

use common::{ScriptedFailure, ScriptedPlatform};

const ORG: &str = "course-org";
const BOT: &str = "classhub[bot]";
const REPO_ID: u64 = 500;

struct Fixture {
    platform: Arc<ScriptedPlatform>,
    pipeline: BootstrapPipeline,
}

/// Seeds a classroom plus an assignment outline named `hw3` whose base
/// repository is `REPO_ID`, optionally with a deadline.
async fn setup(with_deadline: bool) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let platform = Arc::new(ScriptedPlatform::new());

    let classroom = store
        .create_classroom(NewClassroom {
            name: "Systems Fall 2026".to_owned(),
            org_name: OrgName::new(ORG).unwrap(),
            student_team_slug: Classroom::derive_student_team_slug("Systems Fall 2026"),
        })
        .await
        .unwrap();
    store
        .create_assignment(NewAssignmentOutline {
            template_id: TemplateId::new(1),
            base_repo_id: RepoId::new(REPO_ID),
            name: "hw3".to_owned(),
            classroom_id: classroom.id,
            rubric_id: None,
            group_assignment: false,
            main_due_date: with_deadline
                .then(|| Timestamp::from_utc(Utc::now() + Duration::days(7))),
        })
        .await
        .unwrap();

    let pipeline = BootstrapPipeline::new(
        store.clone() as Arc<dyn ClassroomStore>,
        platform.clone() as Arc<dyn PlatformClient>,
        Username::new(BOT).unwrap(),
    );
    Fixture { platform, pipeline }
}

fn initial_push(pusher: &str) -> PushEvent {
    PushEvent {
        repo: PushRepository {
            id: RepoId::new(REPO_ID),
            name: RepoName::new("hw3").unwrap(),
            organization: OrgName::new(ORG).unwrap(),
            master_branch: BranchName::new("main").unwrap(),
        },
        before: CommitSha::new(ZERO_SHA),
        created: true,
        pusher: Some(Pusher {
            name: Some(pusher.to_owned()),
        }),
        base_ref: None,
    }
}

#[tokio::test]
async fn ordinary_pushes_are_skipped_without_platform_calls() {
    let fx = setup(true).await;
    let mut event = initial_push(BOT);
    event.created = false;

    let outcome = fx.pipeline.handle_push(&event).await.unwrap();
    assert_eq!(
        outcome,
        BootstrapOutcome::Skipped(SkipReason::NotInitialCommit)
    );
    assert!(fx.platform.calls().is_empty());
}

#[tokio::test]
async fn human_initial_commits_are_skipped() {
    let fx = setup(true).await;
    let event = initial_push("some-student");

    let outcome = fx.pipeline.handle_push(&event).await.unwrap();
    assert_eq!(outcome, BootstrapOutcome::Skipped(SkipReason::ForeignPusher));
    assert!(fx.platform.calls().is_empty());
}

#[tokio::test]
async fn full_bootstrap_applies_every_step_in_order() {
    let fx = setup(true).await;

    let outcome = fx.pipeline.handle_push(&initial_push(BOT)).await.unwrap();
    assert_eq!(outcome, BootstrapOutcome::Completed);

    let expected = vec![
        format!("create_deadline_enforcement({ORG},hw3)"),
        format!("create_pr_enforcement({ORG},hw3)"),
        format!("create_branch({ORG},hw3,main,development)"),
        format!("create_branch({ORG},hw3,main,feedback)"),
        format!("create_push_ruleset({ORG},hw3)"),
        format!("update_team_repo_permissions({ORG},systems-fall-2026-students,hw3,pull)"),
    ];
    assert_eq!(fx.platform.calls(), expected);
}

#[tokio::test]
async fn missing_deadline_skips_enforcement_but_not_the_rest() {
    let fx = setup(false).await;

    let outcome = fx.pipeline.handle_push(&initial_push(BOT)).await.unwrap();
    assert_eq!(outcome, BootstrapOutcome::Completed);
    assert_eq!(fx.platform.calls_to("create_deadline_enforcement"), 0);
    assert_eq!(fx.platform.calls_to("create_pr_enforcement"), 1);
    assert_eq!(fx.platform.calls_to("create_branch"), 2);
}

#[tokio::test]
async fn branch_failure_aborts_before_ruleset_and_permissions() {
    let fx = setup(true).await;
    fx.platform.fail_with("create_branch", ScriptedFailure::Api);

    let err = fx.pipeline.handle_push(&initial_push(BOT)).await.unwrap_err();
    assert!(matches!(
        err,
        BootstrapError::Step {
            step: BootstrapStep::BranchCreation,
            ..
        }
    ));

    // Earlier steps ran; later steps were never attempted.
    assert_eq!(fx.platform.calls_to("create_deadline_enforcement"), 1);
    assert_eq!(fx.platform.calls_to("create_pr_enforcement"), 1);
    assert_eq!(fx.platform.calls_to("create_push_ruleset"), 0);
    assert_eq!(fx.platform.calls_to("update_team_repo_permissions"), 0);
}

#[tokio::test]
async fn redelivery_resumes_past_already_applied_steps() {
    let fx = setup(true).await;
    // A previous delivery already created the branches; the platform answers
    // "already exists" for them on redelivery.
    fx.platform
        .fail_with("create_branch", ScriptedFailure::AlreadyExists);

    let outcome = fx.pipeline.handle_push(&initial_push(BOT)).await.unwrap();
    assert_eq!(outcome, BootstrapOutcome::Completed);
    assert_eq!(fx.platform.calls_to("create_push_ruleset"), 1);
    assert_eq!(fx.platform.calls_to("update_team_repo_permissions"), 1);
}

#[tokio::test]
async fn unknown_repository_surfaces_after_repo_level_steps() {
    let fx = setup(true).await;
    let mut event = initial_push(BOT);
    // A repository no assignment outline references.
    event.repo.id = RepoId::new(9999);
    event.repo.name = RepoName::new("unrelated").unwrap();

    let err = fx.pipeline.handle_push(&event).await.unwrap_err();
    assert!(matches!(
        err,
        BootstrapError::UnknownRepository { repo } if repo == RepoId::new(9999)
    ));
    // The repo-level steps ran; the team grant was never attempted.
    assert_eq!(fx.platform.calls_to("create_push_ruleset"), 1);
    assert_eq!(fx.platform.calls_to("update_team_repo_permissions"), 0);
}
