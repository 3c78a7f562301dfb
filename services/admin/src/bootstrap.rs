//! Startup provisioning: well-known roles and the anonymous actor. Runs
//! before the server binds; failures here stop the process.

use crate::domain::repository::{RoleRepository, UserRepository};
use crate::domain::types::{ROLE_ANONYMOUS, ROLE_SUPER_ADMIN, ROLE_USER, User};
use crate::error::AdminServiceError;

/// Placeholder address for the anonymous profile row. Never routable.
pub const ANONYMOUS_EMAIL: &str = "anonymous@localhost";

pub async fn ensure_well_known_roles<R: RoleRepository>(
    roles: &R,
) -> Result<(), AdminServiceError> {
    for name in [ROLE_ANONYMOUS, ROLE_USER, ROLE_SUPER_ADMIN] {
        roles.ensure(name).await?;
    }
    Ok(())
}

/// Resolve the anonymous actor once at startup: the first user holding the
/// anonymous role, created on first boot. The resolved user is fixed for the
/// process lifetime; role edits for it take effect on restart.
pub async fn resolve_anonymous<U, R>(users: &U, roles: &R) -> Result<User, AdminServiceError>
where
    U: UserRepository,
    R: RoleRepository,
{
    if let Some(user) = users.find_by_role_name(ROLE_ANONYMOUS).await? {
        return Ok(user);
    }
    let role = roles
        .find_by_name(ROLE_ANONYMOUS)
        .await?
        .ok_or_else(|| AdminServiceError::Internal(anyhow::anyhow!("anonymous role missing")))?;
    users.create_with_role(ANONYMOUS_EMAIL, role.id).await
}
