//! Password change with dual authentication: the old password proves the
//! caller, unless the caller is a super-admin acting on someone's behalf.

use uuid::Uuid;

use quarterdeck_domain::action::Action;

use crate::auth::password::{hash_password, verify_password};
use crate::domain::repository::{AuditLog, Gate, IdentityRepository, Subject, UserRepository};
use crate::domain::types::{User, ValidationErrors};
use crate::error::AdminServiceError;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct UpdatePasswordInput {
    pub old_password: String,
    pub password: String,
    pub password_confirmation: String,
}

pub struct UpdatePassword<R, I, G, L> {
    pub users: R,
    pub identities: I,
    pub gate: G,
    pub audit: L,
}

impl<R, I, G, L> UpdatePassword<R, I, G, L>
where
    R: UserRepository,
    I: IdentityRepository,
    G: Gate,
    L: AuditLog,
{
    pub async fn execute(
        &self,
        actor: &User,
        target_id: Uuid,
        input: UpdatePasswordInput,
    ) -> Result<(), AdminServiceError> {
        let target = self
            .users
            .find_by_id(target_id)
            .await?
            .ok_or(AdminServiceError::UserNotFound)?;
        self.gate
            .authorize(actor, Subject::User(&target), Action::Update)?;

        if input.password != input.password_confirmation {
            return Err(AdminServiceError::PasswordMismatch);
        }

        let identity = self
            .identities
            .find_by_user_id(target.id)
            .await?
            .ok_or(AdminServiceError::IdentityNotFound)?;

        // Super-admins reset without knowing the old password; everyone else
        // proves possession of it.
        let authenticated =
            actor.super_admin() || verify_password(&input.old_password, &identity.password_hash);
        if !authenticated {
            self.audit
                .record(Some(actor.id), "user_update_password_failed")
                .await;
            return Err(AdminServiceError::OldPasswordMismatch);
        }

        if input.password.len() < MIN_PASSWORD_LEN {
            let mut errors = ValidationErrors::default();
            errors.add("password", "must be at least 8 characters");
            return Err(AdminServiceError::Validation(errors));
        }

        let password_hash = hash_password(&input.password)?;
        self.identities
            .update_password(identity.id, &password_hash)
            .await?;
        self.audit
            .record(Some(actor.id), "user_update_password")
            .await;
        Ok(())
    }
}
