#![allow(async_fn_in_trait)]

use uuid::Uuid;

use quarterdeck_domain::action::Action;
use quarterdeck_domain::pagination::{Page, PageRequest};

use crate::domain::types::{Identity, Role, User, UserChanges, VisibilityScope};
use crate::error::AdminServiceError;
use crate::query::QueryParams;

/// Everything persisted in one create transaction: the profile row, its
/// credential row and the requested role edges.
#[derive(Debug, Clone)]
pub struct CreateAggregate {
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub identity_id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role_ids: Vec<Uuid>,
}

/// Repository for the user aggregate (profile + role edges + identity link).
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AdminServiceError>;

    /// Scoped, filtered, searched and paginated view over the collection.
    /// `scope` comes from the gate and is applied before any request filter.
    async fn search(
        &self,
        scope: VisibilityScope,
        params: &QueryParams,
        page: PageRequest,
    ) -> Result<Page<User>, AdminServiceError>;

    /// Persist the whole aggregate in one serializable transaction.
    /// All-or-nothing: a failing role edge aborts the user and identity rows.
    async fn create_aggregate(&self, aggregate: CreateAggregate)
    -> Result<User, AdminServiceError>;

    /// Apply profile changes; when `role_ids` is given, replace the entire
    /// role-edge set. Runs in one transaction.
    async fn update_profile(
        &self,
        id: Uuid,
        changes: UserChanges,
        role_ids: Option<Vec<Uuid>>,
    ) -> Result<User, AdminServiceError>;

    /// Detach identities and role edges, then delete the row, in one
    /// transaction. Role rows themselves are never deleted.
    async fn delete_aggregate(&self, id: Uuid) -> Result<(), AdminServiceError>;

    /// First user holding the named role. Used to resolve the anonymous actor.
    async fn find_by_role_name(&self, role: &str) -> Result<Option<User>, AdminServiceError>;

    /// Insert a bare profile row with a single role edge and no identity.
    /// Bootstrap-only.
    async fn create_with_role(&self, email: &str, role_id: Uuid)
    -> Result<User, AdminServiceError>;
}

/// Repository for credential records.
pub trait IdentityRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AdminServiceError>;
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Identity>, AdminServiceError>;
    async fn update_password(&self, id: Uuid, password_hash: &str)
    -> Result<(), AdminServiceError>;
}

/// Repository for roles.
pub trait RoleRepository: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AdminServiceError>;
    /// Find or create the named role. Bootstrap-only.
    async fn ensure(&self, name: &str) -> Result<Role, AdminServiceError>;
}

/// Append-only audit trail. Fire-and-forget: implementations swallow and log
/// their own failures so an audit hiccup never fails the main operation.
pub trait AuditLog: Send + Sync {
    async fn record(&self, actor: Option<Uuid>, action: &str);
}

/// Session store mapping opaque tokens to user ids.
pub trait SessionStore: Send + Sync {
    async fn get(&self, token: &str) -> Result<Option<Uuid>, AdminServiceError>;
    async fn set(&self, token: &str, user_id: Uuid, ttl_secs: u64)
    -> Result<(), AdminServiceError>;
    async fn delete(&self, token: &str) -> Result<(), AdminServiceError>;
}

/// What an authorization check is about: the collection as a whole (create,
/// list) or one live entity.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Users,
    User(&'a User),
}

/// Capability check consulted before every mutating or profile-reading
/// operation. Denial is fatal to the request; implementations fail closed.
pub trait Gate: Send + Sync {
    fn authorize(
        &self,
        actor: &User,
        subject: Subject<'_>,
        action: Action,
    ) -> Result<(), AdminServiceError>;

    /// Visibility predicate for list queries, applied before user filters.
    fn scope(&self, actor: &User) -> VisibilityScope;
}
