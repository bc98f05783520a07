//! Test doubles for the bootstrap suite.
//!
//! [`ScriptedPlatform`] records every platform call in order and lets tests
//! script individual methods to fail — either hard (API error) or softly
//! ("already exists", the answer a redelivered pipeline sees for steps a
//! previous delivery applied).

// Shared across test binaries; not every binary uses every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use classroom::{
    BranchName, OrgMembership, OrgName, PlatformClient, PlatformError, RepoName,
    RepoPermission, OrgRole, Team, TeamId, TeamSlug, Timestamp, Username,
};

/// How a scripted method should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFailure {
    /// Hard failure: a 500 from the platform.
    Api,
    /// Soft failure: the entity already exists.
    AlreadyExists,
}

pub struct ScriptedPlatform {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashMap<&'static str, ScriptedFailure>>,
}

impl ScriptedPlatform {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashMap::new()),
        }
    }

    pub fn fail_with(&self, method: &'static str, failure: ScriptedFailure) {
        self.failing.lock().unwrap().insert(method, failure);
    }

    /// The ordered log of calls, each as `method(detail)`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> usize {
        let prefix = format!("{method}(");
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(&prefix))
            .count()
    }

    fn record(&self, method: &'static str, detail: String) -> Result<(), PlatformError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{method}({detail})"));
        match self.failing.lock().unwrap().get(method) {
            Some(ScriptedFailure::Api) => Err(PlatformError::Api {
                status: 500,
                message: format!("scripted failure in {method}"),
            }),
            Some(ScriptedFailure::AlreadyExists) => Err(PlatformError::AlreadyExists {
                resource: detail,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PlatformClient for ScriptedPlatform {
    async fn get_org_membership(
        &self,
        org: &OrgName,
        username: &Username,
    ) -> Result<OrgMembership, PlatformError> {
        self.record("get_org_membership", format!("{org},{username}"))?;
        Err(PlatformError::NotFound {
            resource: format!("membership of {username} in {org}"),
        })
    }

    async fn get_team_by_name(
        &self,
        org: &OrgName,
        slug: &TeamSlug,
    ) -> Result<Team, PlatformError> {
        self.record("get_team_by_name", format!("{org},{slug}"))?;
        Err(PlatformError::NotFound {
            resource: format!("team {slug}"),
        })
    }

    async fn create_team(
        &self,
        org: &OrgName,
        name: &str,
        _description: Option<&str>,
        _maintainers: &[Username],
    ) -> Result<Team, PlatformError> {
        self.record("create_team", format!("{org},{name}"))?;
        Ok(Team {
            id: TeamId::new(1),
            slug: TeamSlug::new(name).unwrap(),
            name: name.to_owned(),
        })
    }

    async fn delete_team(&self, team: TeamId) -> Result<(), PlatformError> {
        self.record("delete_team", team.to_string())
    }

    async fn add_team_member(
        &self,
        team: TeamId,
        username: &Username,
    ) -> Result<(), PlatformError> {
        self.record("add_team_member", format!("{team},{username}"))
    }

    async fn remove_team_member(
        &self,
        team: TeamId,
        username: &Username,
    ) -> Result<(), PlatformError> {
        self.record("remove_team_member", format!("{team},{username}"))
    }

    async fn set_org_membership(
        &self,
        org: &OrgName,
        username: &Username,
        role: OrgRole,
    ) -> Result<(), PlatformError> {
        self.record(
            "set_org_membership",
            format!("{org},{username},{}", role.as_str()),
        )
    }

    async fn create_branch(
        &self,
        org: &OrgName,
        repo: &RepoName,
        from_branch: &BranchName,
        new_branch: &BranchName,
    ) -> Result<(), PlatformError> {
        self.record(
            "create_branch",
            format!("{org},{repo},{from_branch},{new_branch}"),
        )
    }

    async fn create_deadline_enforcement(
        &self,
        org: &OrgName,
        repo: &RepoName,
        _deadline: Timestamp,
    ) -> Result<(), PlatformError> {
        self.record("create_deadline_enforcement", format!("{org},{repo}"))
    }

    async fn create_pr_enforcement(
        &self,
        org: &OrgName,
        repo: &RepoName,
    ) -> Result<(), PlatformError> {
        self.record("create_pr_enforcement", format!("{org},{repo}"))
    }

    async fn create_push_ruleset(
        &self,
        org: &OrgName,
        repo: &RepoName,
    ) -> Result<(), PlatformError> {
        self.record("create_push_ruleset", format!("{org},{repo}"))
    }

    async fn update_team_repo_permissions(
        &self,
        org: &OrgName,
        team_slug: &TeamSlug,
        _owner: &OrgName,
        repo: &RepoName,
        permission: RepoPermission,
    ) -> Result<(), PlatformError> {
        self.record(
            "update_team_repo_permissions",
            format!("{org},{team_slug},{repo},{}", permission.as_str()),
        )
    }

    async fn cancel_org_invitation(
        &self,
        org: &OrgName,
        username: &Username,
    ) -> Result<(), PlatformError> {
        self.record("cancel_org_invitation", format!("{org},{username}"))
    }
}
