//! ClassHub persistence gateway adapter.
//!
//! [`MemoryStore`] is the in-memory reference implementation of the
//! [`classroom::ClassroomStore`] port: a single `RwLock` over plain maps,
//! with the same uniqueness constraints a relational backend would enforce —
//! active classroom names, the (classroom, role) permanent-token pair, and
//! the assignment base-repository join key all reject duplicate writes with
//! [`StoreError::Conflict`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** No domain rules: the store records what engines
//! decide and answers lookups. It backs the engine test suites and
//! single-node deployments; a relational adapter implements the same trait
//! for anything durable.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use classroom::{
    AssignmentId, AssignmentOutline, Classroom, ClassroomId, ClassroomStore, ClassroomUser,
    InvitationToken, MembershipStatus, NewAssignmentOutline, NewClassroom, RepoId, RepoName,
    Role, StoreError, Timestamp, TokenValue, UserId, Username,
};

#[derive(Default)]
struct Inner {
    classrooms: HashMap<ClassroomId, Classroom>,
    classroom_names: HashMap<String, ClassroomId>,
    memberships: HashMap<(ClassroomId, UserId), ClassroomUser>,
    tokens: HashMap<TokenValue, InvitationToken>,
    permanent_tokens: HashMap<(ClassroomId, Role), TokenValue>,
    assignments: HashMap<AssignmentId, AssignmentOutline>,
    assignments_by_repo: HashMap<RepoId, AssignmentId>,
    next_classroom_id: u64,
    next_assignment_id: u64,
}

/// In-memory [`ClassroomStore`] implementation.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(entity: &str) -> StoreError {
    StoreError::NotFound {
        entity: entity.to_owned(),
    }
}

fn conflict(constraint: &str) -> StoreError {
    StoreError::Conflict {
        constraint: constraint.to_owned(),
    }
}

#[async_trait]
impl ClassroomStore for MemoryStore {
    async fn create_classroom(
        &self,
        classroom: NewClassroom,
    ) -> Result<Classroom, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.classroom_names.contains_key(&classroom.name) {
            return Err(conflict("active classroom name"));
        }
        inner.next_classroom_id += 1;
        let id = ClassroomId::new(inner.next_classroom_id);
        let created = Classroom {
            id,
            name: classroom.name.clone(),
            org_name: classroom.org_name,
            student_team_slug: classroom.student_team_slug,
        };
        inner.classroom_names.insert(classroom.name, id);
        inner.classrooms.insert(id, created.clone());
        Ok(created)
    }

    async fn get_classroom(&self, id: ClassroomId) -> Result<Classroom, StoreError> {
        let inner = self.inner.read().await;
        inner
            .classrooms
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("classroom"))
    }

    async fn get_classroom_by_name(&self, name: &str) -> Result<Classroom, StoreError> {
        let inner = self.inner.read().await;
        inner
            .classroom_names
            .get(name)
            .and_then(|id| inner.classrooms.get(id))
            .cloned()
            .ok_or_else(|| not_found("classroom"))
    }

    async fn update_classroom(&self, classroom: Classroom) -> Result<Classroom, StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .classrooms
            .get(&classroom.id)
            .cloned()
            .ok_or_else(|| not_found("classroom"))?;
        if classroom.org_name != stored.org_name
            || classroom.student_team_slug != stored.student_team_slug
        {
            return Err(conflict("classroom organization binding"));
        }
        if classroom.name != stored.name {
            if inner.classroom_names.contains_key(&classroom.name) {
                return Err(conflict("active classroom name"));
            }
            inner.classroom_names.remove(&stored.name);
            inner
                .classroom_names
                .insert(classroom.name.clone(), classroom.id);
        }
        inner.classrooms.insert(classroom.id, classroom.clone());
        Ok(classroom)
    }

    async fn add_user_to_classroom(
        &self,
        classroom: ClassroomId,
        user: UserId,
        username: &Username,
        role: Role,
        status: MembershipStatus,
    ) -> Result<ClassroomUser, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.classrooms.contains_key(&classroom) {
            return Err(not_found("classroom"));
        }
        if inner.memberships.contains_key(&(classroom, user)) {
            return Err(conflict("membership record per (classroom, user)"));
        }
        let record = ClassroomUser {
            classroom_id: classroom,
            user_id: user,
            username: username.clone(),
            role,
            status,
        };
        inner.memberships.insert((classroom, user), record.clone());
        Ok(record)
    }

    async fn get_user_in_classroom(
        &self,
        classroom: ClassroomId,
        user: UserId,
    ) -> Result<ClassroomUser, StoreError> {
        let inner = self.inner.read().await;
        inner
            .memberships
            .get(&(classroom, user))
            .cloned()
            .ok_or_else(|| not_found("membership record"))
    }

    async fn list_users_in_classroom(
        &self,
        classroom: ClassroomId,
    ) -> Result<Vec<ClassroomUser>, StoreError> {
        let inner = self.inner.read().await;
        let mut users: Vec<ClassroomUser> = inner
            .memberships
            .values()
            .filter(|record| record.classroom_id == classroom)
            .cloned()
            .collect();
        users.sort_by_key(|record| record.user_id.as_u64());
        Ok(users)
    }

    async fn set_user_status(
        &self,
        classroom: ClassroomId,
        user: UserId,
        status: MembershipStatus,
    ) -> Result<ClassroomUser, StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .memberships
            .get_mut(&(classroom, user))
            .ok_or_else(|| not_found("membership record"))?;
        record.status = status;
        Ok(record.clone())
    }

    async fn set_user_role(
        &self,
        classroom: ClassroomId,
        user: UserId,
        role: Role,
    ) -> Result<ClassroomUser, StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .memberships
            .get_mut(&(classroom, user))
            .ok_or_else(|| not_found("membership record"))?;
        record.role = role;
        Ok(record.clone())
    }

    async fn create_invitation_token(
        &self,
        token: InvitationToken,
    ) -> Result<InvitationToken, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.tokens.contains_key(&token.value) {
            return Err(conflict("token value"));
        }
        if token.is_permanent() {
            let key = (token.classroom_id, token.role);
            if inner.permanent_tokens.contains_key(&key) {
                return Err(conflict("permanent token per (classroom, role)"));
            }
            inner.permanent_tokens.insert(key, token.value.clone());
        }
        inner.tokens.insert(token.value.clone(), token.clone());
        Ok(token)
    }

    async fn get_invitation_token(
        &self,
        value: &TokenValue,
    ) -> Result<InvitationToken, StoreError> {
        let inner = self.inner.read().await;
        inner
            .tokens
            .get(value)
            .cloned()
            .ok_or_else(|| not_found("invitation token"))
    }

    async fn get_permanent_token(
        &self,
        classroom: ClassroomId,
        role: Role,
    ) -> Result<InvitationToken, StoreError> {
        let inner = self.inner.read().await;
        inner
            .permanent_tokens
            .get(&(classroom, role))
            .and_then(|value| inner.tokens.get(value))
            .cloned()
            .ok_or_else(|| not_found("permanent token"))
    }

    async fn create_assignment(
        &self,
        outline: NewAssignmentOutline,
    ) -> Result<AssignmentOutline, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.classrooms.contains_key(&outline.classroom_id) {
            return Err(not_found("classroom"));
        }
        if inner.assignments_by_repo.contains_key(&outline.base_repo_id) {
            return Err(conflict("assignment base repository"));
        }
        inner.next_assignment_id += 1;
        let id = AssignmentId::new(inner.next_assignment_id);
        let created = AssignmentOutline {
            id,
            template_id: outline.template_id,
            base_repo_id: outline.base_repo_id,
            name: outline.name,
            classroom_id: outline.classroom_id,
            rubric_id: outline.rubric_id,
            group_assignment: outline.group_assignment,
            main_due_date: outline.main_due_date,
        };
        inner.assignments_by_repo.insert(created.base_repo_id, id);
        inner.assignments.insert(id, created.clone());
        Ok(created)
    }

    async fn get_assignment(
        &self,
        id: AssignmentId,
    ) -> Result<AssignmentOutline, StoreError> {
        let inner = self.inner.read().await;
        inner
            .assignments
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("assignment outline"))
    }

    async fn get_assignment_by_base_repo(
        &self,
        repo: RepoId,
    ) -> Result<AssignmentOutline, StoreError> {
        let inner = self.inner.read().await;
        inner
            .assignments_by_repo
            .get(&repo)
            .and_then(|id| inner.assignments.get(id))
            .cloned()
            .ok_or_else(|| not_found("assignment outline"))
    }

    async fn get_assignment_by_name(
        &self,
        classroom: ClassroomId,
        name: &str,
    ) -> Result<AssignmentOutline, StoreError> {
        let inner = self.inner.read().await;
        inner
            .assignments
            .values()
            .find(|outline| outline.classroom_id == classroom && outline.name == name)
            .cloned()
            .ok_or_else(|| not_found("assignment outline"))
    }

    async fn get_due_date_by_repo_name(
        &self,
        repo: &RepoName,
    ) -> Result<Option<Timestamp>, StoreError> {
        let inner = self.inner.read().await;
        // Assignment repositories carry the outline name, optionally suffixed
        // with the submitter (`"<assignment>-<login>"`).
        let due = inner
            .assignments
            .values()
            .find(|outline| {
                repo.as_str() == outline.name
                    || repo
                        .as_str()
                        .strip_prefix(outline.name.as_str())
                        .is_some_and(|rest| rest.starts_with('-'))
            })
            .and_then(|outline| outline.main_due_date);
        Ok(due)
    }
}
