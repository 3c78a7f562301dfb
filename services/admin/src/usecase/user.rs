//! User CRUD usecases. Each one checks the gate first, then talks to the
//! repositories, then records the mutation in the audit trail.

use uuid::Uuid;

use quarterdeck_domain::action::Action;
use quarterdeck_domain::pagination::{Page, PageRequest};

use crate::auth::password::hash_password;
use crate::domain::repository::{AuditLog, CreateAggregate, Gate, Subject, UserRepository};
use crate::domain::types::{NewIdentity, NewUser, User, UserChanges};
use crate::error::AdminServiceError;
use crate::query::QueryParams;

// ── List ─────────────────────────────────────────────────────────────────────

pub struct ListUsers<R, G> {
    pub repo: R,
    pub gate: G,
}

impl<R: UserRepository, G: Gate> ListUsers<R, G> {
    pub async fn execute(
        &self,
        actor: &User,
        params: &QueryParams,
        page: PageRequest,
    ) -> Result<Page<User>, AdminServiceError> {
        self.gate.authorize(actor, Subject::Users, Action::List)?;
        let scope = self.gate.scope(actor);
        self.repo.search(scope, params, page).await
    }
}

// ── Get ──────────────────────────────────────────────────────────────────────

pub struct GetUser<R, G> {
    pub repo: R,
    pub gate: G,
}

impl<R: UserRepository, G: Gate> GetUser<R, G> {
    pub async fn execute(&self, actor: &User, id: Uuid) -> Result<User, AdminServiceError> {
        let user = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(AdminServiceError::UserNotFound)?;
        self.gate.authorize(actor, Subject::User(&user), Action::Read)?;
        Ok(user)
    }
}

// ── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub username: String,
    pub password: String,
    pub password_confirmation: String,
    pub name: Option<String>,
    pub role_ids: Vec<Uuid>,
}

pub struct CreateUser<R, G, L> {
    pub repo: R,
    pub gate: G,
    pub audit: L,
}

impl<R: UserRepository, G: Gate, L: AuditLog> CreateUser<R, G, L> {
    pub async fn execute(
        &self,
        actor: &User,
        input: CreateUserInput,
    ) -> Result<User, AdminServiceError> {
        self.gate.authorize(actor, Subject::Users, Action::Create)?;

        let identity = NewIdentity {
            username: input.username,
            password: input.password,
            password_confirmation: input.password_confirmation,
        };
        let user = NewUser {
            email: identity.username.clone(),
            name: input.name,
        };
        // Identity and profile validate independently; the caller gets every
        // failure in one response.
        let mut errors = identity.validate();
        errors.merge(user.validate());
        if !errors.is_empty() {
            return Err(AdminServiceError::Validation(errors));
        }

        let password_hash = hash_password(&identity.password)?;
        let created = self
            .repo
            .create_aggregate(CreateAggregate {
                user_id: Uuid::now_v7(),
                email: user.email,
                name: user.name,
                identity_id: Uuid::now_v7(),
                username: identity.username,
                password_hash,
                role_ids: input.role_ids,
            })
            .await?;

        self.audit.record(Some(actor.id), "user_create").await;
        Ok(created)
    }
}

// ── Update ───────────────────────────────────────────────────────────────────

pub struct UpdateUser<R, G, L> {
    pub repo: R,
    pub gate: G,
    pub audit: L,
}

impl<R: UserRepository, G: Gate, L: AuditLog> UpdateUser<R, G, L> {
    pub async fn execute(
        &self,
        actor: &User,
        id: Uuid,
        changes: UserChanges,
        role_ids: Option<Vec<Uuid>>,
    ) -> Result<User, AdminServiceError> {
        let target = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(AdminServiceError::UserNotFound)?;
        self.gate
            .authorize(actor, Subject::User(&target), Action::Update)?;

        let errors = changes.validate();
        if !errors.is_empty() {
            return Err(AdminServiceError::Validation(errors));
        }

        let updated = self.repo.update_profile(id, changes, role_ids).await?;
        self.audit.record(Some(actor.id), "user_update").await;
        Ok(updated)
    }
}

// ── Delete ───────────────────────────────────────────────────────────────────

pub struct DeleteUser<R, G, L> {
    pub repo: R,
    pub gate: G,
    pub audit: L,
}

impl<R: UserRepository, G: Gate, L: AuditLog> DeleteUser<R, G, L> {
    pub async fn execute(&self, actor: &User, id: Uuid) -> Result<(), AdminServiceError> {
        let target = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(AdminServiceError::UserNotFound)?;
        self.gate
            .authorize(actor, Subject::User(&target), Action::Delete)?;

        self.repo.delete_aggregate(id).await?;
        self.audit.record(Some(actor.id), "user_delete").await;
        Ok(())
    }
}

// ── Profile ──────────────────────────────────────────────────────────────────

pub struct GetProfile<R, G> {
    pub repo: R,
    pub gate: G,
}

impl<R: UserRepository, G: Gate> GetProfile<R, G> {
    /// Re-reads the actor's own record so the response reflects concurrent
    /// changes, not the snapshot the extractor resolved.
    pub async fn execute(&self, actor: &User) -> Result<User, AdminServiceError> {
        self.gate.authorize(actor, Subject::User(actor), Action::Read)?;
        self.repo
            .find_by_id(actor.id)
            .await?
            .ok_or(AdminServiceError::UserNotFound)
    }
}
