//! Shared test doubles for the membership suites.
//!
//! [`MockPlatform`] is a recording in-memory stand-in for the hosting
//! platform: tests seed org memberships and teams, script individual
//! methods to fail, and assert on the recorded call log afterwards.

// Shared across test binaries; not every binary uses every helper.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use classroom::{
    BranchName, OrgMembership, OrgName, PlatformError, PlatformClient, RepoName,
    RepoPermission, OrgRole, Team, TeamId, TeamSlug, Timestamp, UserPlatformClient, Username,
};

pub struct MockPlatform {
    memberships: Mutex<HashMap<(String, String), OrgMembership>>,
    teams: Mutex<HashMap<(String, String), Team>>,
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
    next_team_id: Mutex<u64>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            memberships: Mutex::new(HashMap::new()),
            teams: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            next_team_id: Mutex::new(100),
        }
    }

    /// Seeds an observed org membership for (org, username).
    pub fn set_membership(&self, org: &str, username: &str, membership: OrgMembership) {
        self.memberships
            .lock()
            .unwrap()
            .insert((org.to_owned(), username.to_owned()), membership);
    }

    /// Seeds a team for (org, slug) and returns it.
    pub fn seed_team(&self, org: &str, slug: &str) -> Team {
        let mut next = self.next_team_id.lock().unwrap();
        *next += 1;
        let team = Team {
            id: TeamId::new(*next),
            slug: TeamSlug::new(slug).unwrap(),
            name: slug.to_owned(),
        };
        self.teams
            .lock()
            .unwrap()
            .insert((org.to_owned(), slug.to_owned()), team.clone());
        team
    }

    /// Scripts the named method to fail with a 500 on every call.
    pub fn fail_on(&self, method: &'static str) {
        self.failing.lock().unwrap().insert(method);
    }

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
        self.calls.lock().unwrap().push(format!("{method}({detail})"));
        if self.failing.lock().unwrap().contains(method) {
            return Err(PlatformError::Api {
                status: 500,
                message: format!("scripted failure in {method}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PlatformClient for MockPlatform {
    async fn get_org_membership(
        &self,
        org: &OrgName,
        username: &Username,
    ) -> Result<OrgMembership, PlatformError> {
        self.record("get_org_membership", format!("{org},{username}"))?;
        self.memberships
            .lock()
            .unwrap()
            .get(&(org.as_str().to_owned(), username.as_str().to_owned()))
            .copied()
            .ok_or_else(|| PlatformError::NotFound {
                resource: format!("membership of {username} in {org}"),
            })
    }

    async fn get_team_by_name(
        &self,
        org: &OrgName,
        slug: &TeamSlug,
    ) -> Result<Team, PlatformError> {
        self.record("get_team_by_name", format!("{org},{slug}"))?;
        self.teams
            .lock()
            .unwrap()
            .get(&(org.as_str().to_owned(), slug.as_str().to_owned()))
            .cloned()
            .ok_or_else(|| PlatformError::NotFound {
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
        Ok(self.seed_team(org.as_str(), name))
    }

    async fn delete_team(&self, team: TeamId) -> Result<(), PlatformError> {
        self.record("delete_team", team.to_string())?;
        self.teams
            .lock()
            .unwrap()
            .retain(|_, existing| existing.id != team);
        Ok(())
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
        _from_branch: &BranchName,
        new_branch: &BranchName,
    ) -> Result<(), PlatformError> {
        self.record("create_branch", format!("{org},{repo},{new_branch}"))
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

/// Recording stand-in for the invitee's own platform capability.
pub struct MockUserClient {
    accepted: Mutex<Vec<String>>,
    fail: Mutex<bool>,
}

impl MockUserClient {
    pub fn new() -> Self {
        Self {
            accepted: Mutex::new(Vec::new()),
            fail: Mutex::new(false),
        }
    }

    pub fn fail_next(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn accepted_orgs(&self) -> Vec<String> {
        self.accepted.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserPlatformClient for MockUserClient {
    async fn accept_org_invitation(&self, org: &OrgName) -> Result<(), PlatformError> {
        if *self.fail.lock().unwrap() {
            return Err(PlatformError::Api {
                status: 404,
                message: "no pending invitation".to_owned(),
            });
        }
        self.accepted.lock().unwrap().push(org.as_str().to_owned());
        Ok(())
    }
}
