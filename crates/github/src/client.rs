//! REST clients for the two platform ports.
//!
//! [`GithubRestClient`] holds the application's administrative credential
//! and implements the full [`PlatformClient`] capability set;
//! [`GithubUserClient`] holds one user's own credential and implements only
//! invitation acceptance, which the platform refuses to perform for anyone
//! but the invitee.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION};
use reqwest::{Response, StatusCode};
use serde_json::json;
use tracing::debug;

use classroom::{
    BranchName, OrgMembership, OrgMembershipState, OrgName, PlatformClient, PlatformError,
    OrgRole, RepoName, RepoPermission, Team, TeamId, TeamSlug, Timestamp, UserPlatformClient,
    Username,
};

use crate::wire;

/// Public GitHub REST endpoint; override for GitHub Enterprise installs.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT_VALUE: &str = "classhub";
const BODY_SNIPPET_LEN: usize = 200;

fn transport(err: reqwest::Error) -> PlatformError {
    PlatformError::Transport {
        message: err.to_string(),
    }
}

fn malformed(what: &str) -> PlatformError {
    PlatformError::Transport {
        message: format!("malformed platform response: {what}"),
    }
}

/// Parses a `Retry-After` seconds header, when present.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Returns `true` when a 403 is a primary-rate-limit rejection rather than a
/// permission failure.
fn rate_limit_exhausted(headers: &HeaderMap) -> bool {
    headers
        .get("x-ratelimit-remaining")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|remaining| remaining == "0")
}

/// Maps a non-success response onto the platform error taxonomy.
///
/// GitHub reports both duplicate refs ("Reference already exists") and
/// duplicate ruleset names ("Name must be unique") as 422s; both collapse to
/// [`PlatformError::AlreadyExists`] so redelivery-safe callers can resume.
fn classify_failure(
    status: StatusCode,
    headers: &HeaderMap,
    message: String,
    resource: &str,
) -> PlatformError {
    match status {
        StatusCode::NOT_FOUND => PlatformError::NotFound {
            resource: resource.to_owned(),
        },
        StatusCode::UNPROCESSABLE_ENTITY
            if message.contains("already exists") || message.contains("must be unique") =>
        {
            PlatformError::AlreadyExists {
                resource: resource.to_owned(),
            }
        }
        StatusCode::TOO_MANY_REQUESTS => PlatformError::RateLimited {
            retry_after: parse_retry_after(headers),
        },
        StatusCode::FORBIDDEN if rate_limit_exhausted(headers) => PlatformError::RateLimited {
            retry_after: parse_retry_after(headers),
        },
        status => PlatformError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Consumes a response, returning it when successful and the classified
/// error otherwise.
async fn checked(response: Response, resource: &str) -> Result<Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let headers = response.headers().clone();
    let mut message = response.text().await.unwrap_or_default();
    message.truncate(BODY_SNIPPET_LEN);
    Err(classify_failure(status, &headers, message, resource))
}

// ---------------------------------------------------------------------------
// Administrative client
// ---------------------------------------------------------------------------

/// [`PlatformClient`] implementation over the GitHub REST API, authenticated
/// with the application's administrative token.
pub struct GithubRestClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl GithubRestClient {
    /// Creates a client against the public GitHub API.
    pub fn new(token: impl Into<String>) -> Result<Self, PlatformError> {
        Self::with_base_url(token, DEFAULT_API_URL)
    }

    /// Creates a client against a specific API root (GitHub Enterprise, or a
    /// test double).
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, PlatformError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT_VALUE)
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
    }

    async fn get(&self, path: &str, resource: &str) -> Result<Response, PlatformError> {
        debug!(path, "platform GET");
        let response = self
            .authed(self.http.get(self.url(path)))
            .send()
            .await
            .map_err(transport)?;
        checked(response, resource).await
    }

    async fn send_json(
        &self,
        builder: reqwest::RequestBuilder,
        body: &serde_json::Value,
        resource: &str,
    ) -> Result<Response, PlatformError> {
        let response = self
            .authed(builder)
            .json(body)
            .send()
            .await
            .map_err(transport)?;
        checked(response, resource).await
    }

    async fn delete(&self, path: &str, resource: &str) -> Result<(), PlatformError> {
        debug!(path, "platform DELETE");
        let response = self
            .authed(self.http.delete(self.url(path)))
            .send()
            .await
            .map_err(transport)?;
        checked(response, resource).await?;
        Ok(())
    }

    /// Installs a repository ruleset.
    async fn create_ruleset(
        &self,
        org: &OrgName,
        repo: &RepoName,
        body: serde_json::Value,
        resource: &str,
    ) -> Result<(), PlatformError> {
        debug!(%org, %repo, resource, "installing ruleset");
        self.send_json(
            self.http
                .post(self.url(&format!("/repos/{org}/{repo}/rulesets"))),
            &body,
            resource,
        )
        .await?;
        Ok(())
    }
}

fn team_from_wire(team: wire::Team) -> Result<Team, PlatformError> {
    Ok(Team {
        id: TeamId::new(team.id),
        slug: TeamSlug::new(team.slug).ok_or_else(|| malformed("empty team slug"))?,
        name: team.name,
    })
}

#[async_trait]
impl PlatformClient for GithubRestClient {
    async fn get_org_membership(
        &self,
        org: &OrgName,
        username: &Username,
    ) -> Result<OrgMembership, PlatformError> {
        let response = self
            .get(
                &format!("/orgs/{org}/memberships/{username}"),
                &format!("membership of {username} in {org}"),
            )
            .await?;
        let membership: wire::Membership = response.json().await.map_err(transport)?;
        let state = match membership.state.as_str() {
            "active" => OrgMembershipState::Active,
            "pending" => OrgMembershipState::Pending,
            other => return Err(malformed(&format!("membership state `{other}`"))),
        };
        let role = match membership.role.as_str() {
            "admin" => OrgRole::Admin,
            _ => OrgRole::Member,
        };
        Ok(OrgMembership { state, role })
    }

    async fn get_team_by_name(
        &self,
        org: &OrgName,
        slug: &TeamSlug,
    ) -> Result<Team, PlatformError> {
        let response = self
            .get(
                &format!("/orgs/{org}/teams/{slug}"),
                &format!("team {slug} in {org}"),
            )
            .await?;
        let team: wire::Team = response.json().await.map_err(transport)?;
        team_from_wire(team)
    }

    async fn create_team(
        &self,
        org: &OrgName,
        name: &str,
        description: Option<&str>,
        maintainers: &[Username],
    ) -> Result<Team, PlatformError> {
        let maintainers: Vec<&str> = maintainers.iter().map(Username::as_str).collect();
        let body = json!({
            "name": name,
            "description": description,
            "maintainers": maintainers,
            "privacy": "closed",
        });
        let response = self
            .send_json(
                self.http.post(self.url(&format!("/orgs/{org}/teams"))),
                &body,
                &format!("team {name} in {org}"),
            )
            .await?;
        let team: wire::Team = response.json().await.map_err(transport)?;
        team_from_wire(team)
    }

    async fn delete_team(&self, team: TeamId) -> Result<(), PlatformError> {
        self.delete(&format!("/teams/{team}"), &format!("team {team}"))
            .await
    }

    async fn add_team_member(
        &self,
        team: TeamId,
        username: &Username,
    ) -> Result<(), PlatformError> {
        self.send_json(
            self.http
                .put(self.url(&format!("/teams/{team}/memberships/{username}"))),
            &json!({ "role": "member" }),
            &format!("team membership of {username}"),
        )
        .await?;
        Ok(())
    }

    async fn remove_team_member(
        &self,
        team: TeamId,
        username: &Username,
    ) -> Result<(), PlatformError> {
        self.delete(
            &format!("/teams/{team}/memberships/{username}"),
            &format!("team membership of {username}"),
        )
        .await
    }

    async fn set_org_membership(
        &self,
        org: &OrgName,
        username: &Username,
        role: OrgRole,
    ) -> Result<(), PlatformError> {
        self.send_json(
            self.http
                .put(self.url(&format!("/orgs/{org}/memberships/{username}"))),
            &json!({ "role": role.as_str() }),
            &format!("membership of {username} in {org}"),
        )
        .await?;
        Ok(())
    }

    async fn create_branch(
        &self,
        org: &OrgName,
        repo: &RepoName,
        from_branch: &BranchName,
        new_branch: &BranchName,
    ) -> Result<(), PlatformError> {
        // Resolve the head of the source branch, then create the new ref.
        let response = self
            .get(
                &format!("/repos/{org}/{repo}/git/ref/heads/{from_branch}"),
                &format!("branch {from_branch} of {org}/{repo}"),
            )
            .await?;
        let git_ref: wire::GitRef = response.json().await.map_err(transport)?;

        self.send_json(
            self.http
                .post(self.url(&format!("/repos/{org}/{repo}/git/refs"))),
            &json!({
                "ref": format!("refs/heads/{new_branch}"),
                "sha": git_ref.object.sha,
            }),
            &format!("branch {new_branch} of {org}/{repo}"),
        )
        .await?;
        Ok(())
    }

    async fn create_deadline_enforcement(
        &self,
        org: &OrgName,
        repo: &RepoName,
        deadline: Timestamp,
    ) -> Result<(), PlatformError> {
        // Protects submission history on the default branch so the state at
        // the deadline stays auditable; the deadline is recorded in the
        // ruleset name.
        let body = json!({
            "name": format!("assignment-deadline {deadline}"),
            "target": "branch",
            "enforcement": "active",
            "conditions": { "ref_name": { "include": ["~DEFAULT_BRANCH"], "exclude": [] } },
            "rules": [ { "type": "deletion" } ],
        });
        self.create_ruleset(org, repo, body, "deadline enforcement ruleset")
            .await
    }

    async fn create_pr_enforcement(
        &self,
        org: &OrgName,
        repo: &RepoName,
    ) -> Result<(), PlatformError> {
        let body = json!({
            "name": "require-pull-request",
            "target": "branch",
            "enforcement": "active",
            "conditions": { "ref_name": { "include": ["~DEFAULT_BRANCH"], "exclude": [] } },
            "rules": [ {
                "type": "pull_request",
                "parameters": {
                    "required_approving_review_count": 0,
                    "dismiss_stale_reviews_on_push": false,
                    "require_code_owner_review": false,
                    "require_last_push_approval": false,
                    "required_review_thread_resolution": false,
                },
            } ],
        });
        self.create_ruleset(org, repo, body, "pull-request enforcement ruleset")
            .await
    }

    async fn create_push_ruleset(
        &self,
        org: &OrgName,
        repo: &RepoName,
    ) -> Result<(), PlatformError> {
        let body = json!({
            "name": "push-protection",
            "target": "branch",
            "enforcement": "active",
            "conditions": { "ref_name": { "include": ["~ALL"], "exclude": [] } },
            "rules": [ { "type": "non_fast_forward" } ],
        });
        self.create_ruleset(org, repo, body, "push-protection ruleset")
            .await
    }

    async fn update_team_repo_permissions(
        &self,
        org: &OrgName,
        team_slug: &TeamSlug,
        owner: &OrgName,
        repo: &RepoName,
        permission: RepoPermission,
    ) -> Result<(), PlatformError> {
        self.send_json(
            self.http
                .put(self.url(&format!("/orgs/{org}/teams/{team_slug}/repos/{owner}/{repo}"))),
            &json!({ "permission": permission.as_str() }),
            &format!("repository access for team {team_slug}"),
        )
        .await?;
        Ok(())
    }

    async fn cancel_org_invitation(
        &self,
        org: &OrgName,
        username: &Username,
    ) -> Result<(), PlatformError> {
        // Invitations are deleted by id; resolve it from the pending list.
        let response = self
            .get(
                &format!("/orgs/{org}/invitations?per_page=100"),
                &format!("pending invitations of {org}"),
            )
            .await?;
        let invitations: Vec<wire::Invitation> = response.json().await.map_err(transport)?;
        let invitation = invitations
            .into_iter()
            .find(|invitation| invitation.login.as_deref() == Some(username.as_str()))
            .ok_or_else(|| PlatformError::NotFound {
                resource: format!("pending invitation for {username} in {org}"),
            })?;

        self.delete(
            &format!("/orgs/{org}/invitations/{}", invitation.id),
            &format!("pending invitation for {username} in {org}"),
        )
        .await
    }
}

// ---------------------------------------------------------------------------
// Per-user client
// ---------------------------------------------------------------------------

/// [`UserPlatformClient`] implementation holding one user's own OAuth token.
pub struct GithubUserClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl GithubUserClient {
    pub fn new(token: impl Into<String>) -> Result<Self, PlatformError> {
        Self::with_base_url(token, DEFAULT_API_URL)
    }

    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, PlatformError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT_VALUE)
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl UserPlatformClient for GithubUserClient {
    async fn accept_org_invitation(&self, org: &OrgName) -> Result<(), PlatformError> {
        let response = self
            .http
            .patch(format!("{}/user/memberships/orgs/{org}", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .json(&json!({ "state": "active" }))
            .send()
            .await
            .map_err(transport)?;
        checked(response, &format!("pending invitation to {org}")).await?;
        Ok(())
    }
}
