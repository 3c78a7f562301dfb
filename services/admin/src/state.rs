use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::domain::types::User;
use crate::infra::db::{DbAuditLog, DbIdentityRepository, DbRoleRepository, DbUserRepository};
use crate::infra::session::RedisSessionStore;
use crate::policy::DefaultGate;
use crate::query::users::UserComponent;

/// Shared application state. The anonymous actor is resolved once at startup
/// and fixed for the process lifetime.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: deadpool_redis::Pool,
    pub anonymous: Arc<User>,
    pub component: Arc<UserComponent>,
    pub session_ttl_secs: u64,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
            component: self.component.clone(),
        }
    }

    pub fn identity_repo(&self) -> DbIdentityRepository {
        DbIdentityRepository {
            db: self.db.clone(),
        }
    }

    pub fn role_repo(&self) -> DbRoleRepository {
        DbRoleRepository {
            db: self.db.clone(),
        }
    }

    pub fn audit(&self) -> DbAuditLog {
        DbAuditLog {
            db: self.db.clone(),
        }
    }

    pub fn sessions(&self) -> RedisSessionStore {
        RedisSessionStore {
            pool: self.redis.clone(),
        }
    }

    pub fn gate(&self) -> DefaultGate {
        DefaultGate
    }
}
