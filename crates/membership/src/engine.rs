//! The membership reconciliation engine.
//!
//! Computes and persists the correct internal status for a user in a
//! classroom from freshly observed external membership state, and drives the
//! invitation flow on top of it. Status is written here and nowhere else.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use classroom::{
    transitions, Classroom, ClassroomId, ClassroomStore, ClassroomUser, MembershipStatus,
    NewClassroom, OrgName, OrgRole, PlatformClient, Role, StoreError, User, UserId,
    UserPlatformClient,
};

use crate::errors::MembershipError;

/// Orchestrates membership state between the persistence gateway and the
/// hosting platform.
///
/// Holds no per-request state; every operation derives its writes from a
/// fresh external read, so concurrent invocations for the same (classroom,
/// user) pair converge on the same result.
#[derive(Clone)]
pub struct MembershipEngine {
    store: Arc<dyn ClassroomStore>,
    platform: Arc<dyn PlatformClient>,
}

impl MembershipEngine {
    pub fn new(store: Arc<dyn ClassroomStore>, platform: Arc<dyn PlatformClient>) -> Self {
        Self { store, platform }
    }

    /// Reconciles one membership record against the organization's live
    /// state.
    ///
    /// Requires an existing record — reconciliation never creates
    /// membership. A `Removed` record is returned unchanged without
    /// consulting the platform. Otherwise the fresh observation is fed
    /// through the transition table and the result persisted only when it
    /// differs from the stored status, so repeated calls under unchanged
    /// external state write nothing.
    #[instrument(skip(self, classroom, user), fields(classroom = %classroom.id, user = %user.id))]
    pub async fn reconcile(
        &self,
        classroom: &Classroom,
        user: &User,
    ) -> Result<ClassroomUser, MembershipError> {
        let record = self
            .store
            .get_user_in_classroom(classroom.id, user.id)
            .await
            .map_err(|e| MembershipError::from_store(e, "membership record"))?;

        // Removal is sticky: external state is never consulted again.
        if record.status == MembershipStatus::Removed {
            return Ok(record);
        }

        let observed = match self
            .platform
            .get_org_membership(&classroom.org_name, &user.username)
            .await
        {
            Ok(membership) => Some(membership.state),
            Err(err) => {
                // Absent or unreachable both count as "not observed"; the
                // transition table decides what that means for this record.
                debug!(error = %err, "org membership not observed");
                None
            }
        };

        let next = transitions::next_status(record.status, observed);
        if next == record.status {
            return Ok(record);
        }

        self.store
            .set_user_status(classroom.id, user.id, next)
            .await
            .map_err(|e| MembershipError::from_store(e, "membership record"))
    }

    /// Invites a user into a classroom at the given role.
    ///
    /// Creates the membership record with status `Requested` when absent,
    /// reconciles, and refuses revoked memberships. A strictly higher
    /// requested role is persisted; roles are never downgraded here. The
    /// external invitation then goes through the student team for
    /// [`Role::Student`] and through direct admin-level organization
    /// membership for anything higher; on success the record moves to
    /// `OrgInvited`.
    ///
    /// A platform failure surfaces as [`MembershipError::Provisioning`] with
    /// no rollback — the record keeps whatever reconciliation last computed,
    /// and a retried invite converges.
    #[instrument(skip(self, invitee), fields(classroom = %classroom_id, user = %invitee.id, role = %role))]
    pub async fn invite_user(
        &self,
        classroom_id: ClassroomId,
        role: Role,
        invitee: &User,
    ) -> Result<(Classroom, ClassroomUser), MembershipError> {
        let classroom = self
            .store
            .get_classroom(classroom_id)
            .await
            .map_err(|e| MembershipError::from_store(e, "classroom"))?;

        match self
            .store
            .get_user_in_classroom(classroom_id, invitee.id)
            .await
        {
            Ok(_) => {}
            Err(StoreError::NotFound { .. }) => {
                self.store
                    .add_user_to_classroom(
                        classroom_id,
                        invitee.id,
                        &invitee.username,
                        role,
                        MembershipStatus::Requested,
                    )
                    .await
                    .map_err(|e| MembershipError::from_store(e, "membership record"))?;
            }
            Err(err) => return Err(MembershipError::Persistence { source: err }),
        }

        let record = self.reconcile(&classroom, invitee).await?;
        if record.status == MembershipStatus::Removed {
            return Err(MembershipError::MembershipRevoked);
        }

        // Monotone upgrade: raise the stored role when the requested one is
        // strictly higher, never lower it.
        if role > record.role {
            self.store
                .set_user_role(classroom_id, invitee.id, role)
                .await
                .map_err(|e| MembershipError::from_store(e, "membership record"))?;
        }

        self.send_org_invitation(&classroom, role, invitee).await?;

        let record = self
            .store
            .set_user_status(classroom_id, invitee.id, MembershipStatus::OrgInvited)
            .await
            .map_err(|e| MembershipError::from_store(e, "membership record"))?;

        Ok((classroom, record))
    }

    /// Performs the external invitation call for [`invite_user`].
    async fn send_org_invitation(
        &self,
        classroom: &Classroom,
        role: Role,
        invitee: &User,
    ) -> Result<(), MembershipError> {
        if role == Role::Student {
            let team = self
                .platform
                .get_team_by_name(&classroom.org_name, &classroom.student_team_slug)
                .await
                .map_err(|source| MembershipError::Provisioning { source })?;
            self.platform
                .add_team_member(team.id, &invitee.username)
                .await
                .map_err(|source| MembershipError::Provisioning { source })
        } else {
            self.platform
                .set_org_membership(&classroom.org_name, &invitee.username, OrgRole::Admin)
                .await
                .map_err(|source| MembershipError::Provisioning { source })
        }
    }

    /// Accepts the organization's pending invitation on the invitee's
    /// behalf, using the invitee's own authenticated capability, then marks
    /// the membership `Active`.
    ///
    /// Calling this without a pending invitation is a caller error; the
    /// platform's rejection is surfaced, not retried.
    #[instrument(skip(self, classroom, invitee, user_client), fields(classroom = %classroom.id, user = %invitee.id))]
    pub async fn accept_invitation(
        &self,
        classroom: &Classroom,
        invitee: &User,
        user_client: &dyn UserPlatformClient,
    ) -> Result<(), MembershipError> {
        user_client
            .accept_org_invitation(&classroom.org_name)
            .await
            .map_err(|source| MembershipError::Provisioning { source })?;

        self.store
            .set_user_status(classroom.id, invitee.id, MembershipStatus::Active)
            .await
            .map_err(|e| MembershipError::from_store(e, "membership record"))?;
        Ok(())
    }

    /// Creates a classroom backed by a fresh student team.
    ///
    /// The creator must be an administrator of the organization. A stale
    /// platform team with the derived slug is deleted before the new one is
    /// created. The creator is recorded as an `Active` `Professor`.
    #[instrument(skip(self, creator), fields(org = %org_name, user = %creator.id))]
    pub async fn create_classroom(
        &self,
        name: &str,
        org_name: OrgName,
        creator: &User,
    ) -> Result<Classroom, MembershipError> {
        match self.store.get_classroom_by_name(name).await {
            Ok(_) => {
                return Err(MembershipError::Conflict {
                    message: format!("classroom '{name}' already exists"),
                })
            }
            Err(StoreError::NotFound { .. }) => {}
            Err(err) => return Err(MembershipError::Persistence { source: err }),
        }

        // Only organization admins may bind a classroom to the organization.
        let membership = self
            .platform
            .get_org_membership(&org_name, &creator.username)
            .await
            .map_err(|_| MembershipError::InsufficientPermissions)?;
        if membership.role != OrgRole::Admin {
            return Err(MembershipError::InsufficientPermissions);
        }

        let slug = Classroom::derive_student_team_slug(name);
        match self.platform.get_team_by_name(&org_name, &slug).await {
            Ok(stale) => {
                self.platform
                    .delete_team(stale.id)
                    .await
                    .map_err(|source| MembershipError::Provisioning { source })?;
            }
            Err(classroom::PlatformError::NotFound { .. }) => {}
            Err(source) => return Err(MembershipError::Provisioning { source }),
        }

        let description = format!(
            "The students of {} - {}.\n\nAutomatically generated by ClassHub.",
            org_name, name
        );
        self.platform
            .create_team(
                &org_name,
                slug.as_str(),
                Some(&description),
                std::slice::from_ref(&creator.username),
            )
            .await
            .map_err(|source| MembershipError::Provisioning { source })?;

        let created = self
            .store
            .create_classroom(NewClassroom {
                name: name.to_owned(),
                org_name,
                student_team_slug: slug,
            })
            .await
            .map_err(|e| MembershipError::from_store(e, "classroom"))?;

        self.store
            .add_user_to_classroom(
                created.id,
                creator.id,
                &creator.username,
                Role::Professor,
                MembershipStatus::Active,
            )
            .await
            .map_err(|e| MembershipError::from_store(e, "membership record"))?;

        Ok(created)
    }

    /// Renames a classroom.
    ///
    /// Only the display name moves; the organization binding and the student
    /// team provisioned at creation stay as they are. The new name must be
    /// unique among active classrooms.
    #[instrument(skip(self), fields(classroom = %classroom_id))]
    pub async fn rename_classroom(
        &self,
        classroom_id: ClassroomId,
        new_name: &str,
    ) -> Result<Classroom, MembershipError> {
        match self.store.get_classroom_by_name(new_name).await {
            Ok(existing) if existing.id != classroom_id => {
                return Err(MembershipError::Conflict {
                    message: format!("classroom '{new_name}' already exists"),
                })
            }
            Ok(_) | Err(StoreError::NotFound { .. }) => {}
            Err(err) => return Err(MembershipError::Persistence { source: err }),
        }

        let mut classroom = self
            .store
            .get_classroom(classroom_id)
            .await
            .map_err(|e| MembershipError::from_store(e, "classroom"))?;
        classroom.name = new_name.to_owned();
        self.store
            .update_classroom(classroom)
            .await
            .map_err(|e| MembershipError::from_store(e, "classroom"))
    }

    /// Removes a user from a classroom.
    ///
    /// Team removal is best effort — the user may never have been on the
    /// team, or may already have been removed there — so a platform failure
    /// is logged and ignored. The membership status then becomes the
    /// terminal `Removed`.
    #[instrument(skip(self, classroom), fields(classroom = %classroom.id, user = %user_id))]
    pub async fn remove_user(
        &self,
        classroom: &Classroom,
        user_id: UserId,
    ) -> Result<ClassroomUser, MembershipError> {
        let record = self
            .store
            .get_user_in_classroom(classroom.id, user_id)
            .await
            .map_err(|e| MembershipError::from_store(e, "membership record"))?;

        match self
            .platform
            .get_team_by_name(&classroom.org_name, &classroom.student_team_slug)
            .await
        {
            Ok(team) => {
                if let Err(err) = self
                    .platform
                    .remove_team_member(team.id, &record.username)
                    .await
                {
                    warn!(error = %err, "failed to remove user from student team");
                }
            }
            Err(err) => warn!(error = %err, "student team not resolved during removal"),
        }

        self.store
            .set_user_status(classroom.id, user_id, MembershipStatus::Removed)
            .await
            .map_err(|e| MembershipError::from_store(e, "membership record"))
    }

    /// Cancels a user's pending organization invitation and marks the
    /// membership `Removed`.
    #[instrument(skip(self, classroom), fields(classroom = %classroom.id, user = %user_id))]
    pub async fn revoke_invitation(
        &self,
        classroom: &Classroom,
        user_id: UserId,
    ) -> Result<(), MembershipError> {
        let record = self
            .store
            .get_user_in_classroom(classroom.id, user_id)
            .await
            .map_err(|e| MembershipError::from_store(e, "membership record"))?;
        if record.status == MembershipStatus::Removed {
            return Err(MembershipError::MembershipRevoked);
        }

        self.platform
            .cancel_org_invitation(&classroom.org_name, &record.username)
            .await
            .map_err(|source| MembershipError::Provisioning { source })?;

        self.store
            .set_user_status(classroom.id, user_id, MembershipStatus::Removed)
            .await
            .map_err(|e| MembershipError::from_store(e, "membership record"))?;
        Ok(())
    }

    /// Returns the classroom's members, each reconciled against the
    /// organization's live state. Removed members are omitted; a member
    /// whose reconciliation fails keeps their stored record.
    #[instrument(skip(self, classroom), fields(classroom = %classroom.id))]
    pub async fn roster(
        &self,
        classroom: &Classroom,
    ) -> Result<Vec<ClassroomUser>, MembershipError> {
        let records = self
            .store
            .list_users_in_classroom(classroom.id)
            .await
            .map_err(|e| MembershipError::from_store(e, "classroom roster"))?;

        let mut roster = Vec::with_capacity(records.len());
        for record in records {
            let user = User {
                id: record.user_id,
                username: record.username.clone(),
            };
            match self.reconcile(classroom, &user).await {
                Ok(updated) if updated.status == MembershipStatus::Removed => {}
                Ok(updated) => roster.push(updated),
                Err(err) => {
                    warn!(user = %record.user_id, error = %err, "roster reconciliation failed; keeping stored record");
                    roster.push(record);
                }
            }
        }
        Ok(roster)
    }

    /// Loads a membership record and verifies it holds at least `min_role`.
    pub async fn require_at_least(
        &self,
        classroom_id: ClassroomId,
        user_id: UserId,
        min_role: Role,
    ) -> Result<ClassroomUser, MembershipError> {
        let record = self
            .store
            .get_user_in_classroom(classroom_id, user_id)
            .await
            .map_err(|e| MembershipError::from_store(e, "membership record"))?;
        if record.role < min_role {
            return Err(MembershipError::InsufficientPermissions);
        }
        Ok(record)
    }

    pub(crate) fn store(&self) -> &Arc<dyn ClassroomStore> {
        &self.store
    }
}
