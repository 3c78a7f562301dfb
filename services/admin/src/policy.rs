//! Default authorization policy. Rule content is deliberately small — the
//! rest of the service only consumes the [`Gate`] capability check.

use quarterdeck_domain::action::Action;

use crate::domain::repository::{Gate, Subject};
use crate::domain::types::{User, VisibilityScope};
use crate::error::AdminServiceError;

/// Super-admins may do anything to anyone. A signed-in user may read and
/// update their own record. Anonymous actors are denied everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultGate;

impl Gate for DefaultGate {
    fn authorize(
        &self,
        actor: &User,
        subject: Subject<'_>,
        action: Action,
    ) -> Result<(), AdminServiceError> {
        if actor.anonymous() {
            return Err(AdminServiceError::Forbidden);
        }
        if actor.super_admin() {
            return Ok(());
        }
        let allowed = match (subject, action) {
            (Subject::User(target), Action::Read | Action::Update) => target.id == actor.id,
            _ => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(AdminServiceError::Forbidden)
        }
    }

    fn scope(&self, actor: &User) -> VisibilityScope {
        if actor.anonymous() {
            VisibilityScope::Nothing
        } else if actor.super_admin() {
            VisibilityScope::All
        } else {
            VisibilityScope::OnlyUser(actor.id)
        }
    }
}
