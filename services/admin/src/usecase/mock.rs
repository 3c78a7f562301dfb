//! In-memory repository doubles shared by the usecase tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use quarterdeck_domain::pagination::{Page, PageRequest};

use crate::domain::repository::{
    AuditLog, CreateAggregate, IdentityRepository, RoleRepository, SessionStore, UserRepository,
};
use crate::domain::types::{
    Identity, ROLE_ANONYMOUS, Role, User, UserChanges, VisibilityScope,
};
use crate::error::AdminServiceError;
use crate::query::QueryParams;

pub fn user_with_roles(names: &[&str]) -> User {
    User {
        id: Uuid::now_v7(),
        email: "someone@example.com".into(),
        name: None,
        roles: names
            .iter()
            .map(|n| Role {
                id: Uuid::new_v4(),
                name: (*n).into(),
            })
            .collect(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[derive(Clone, Default)]
pub struct MockUsers {
    pub users: Arc<Mutex<Vec<User>>>,
    pub created: Arc<Mutex<Vec<CreateAggregate>>>,
}

impl MockUsers {
    pub fn with(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
            created: Arc::default(),
        }
    }
}

impl UserRepository for MockUsers {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AdminServiceError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn search(
        &self,
        scope: VisibilityScope,
        _params: &QueryParams,
        page: PageRequest,
    ) -> Result<Page<User>, AdminServiceError> {
        let page = page.validated()?;
        let visible: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| match scope {
                VisibilityScope::All => true,
                VisibilityScope::OnlyUser(id) => u.id == id,
                VisibilityScope::Nothing => false,
            })
            .cloned()
            .collect();
        let total = visible.len() as u64;
        let items = visible
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.count as usize)
            .collect();
        Ok(Page {
            items,
            total,
            page: page.page,
            count: page.count,
        })
    }

    async fn create_aggregate(
        &self,
        aggregate: CreateAggregate,
    ) -> Result<User, AdminServiceError> {
        let user = User {
            id: aggregate.user_id,
            email: aggregate.email.clone(),
            name: aggregate.name.clone(),
            roles: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.created.lock().unwrap().push(aggregate);
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: UserChanges,
        _role_ids: Option<Vec<Uuid>>,
    ) -> Result<User, AdminServiceError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(AdminServiceError::UserNotFound)?;
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(name) = changes.name {
            user.name = Some(name);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_aggregate(&self, id: Uuid) -> Result<(), AdminServiceError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            Err(AdminServiceError::UserNotFound)
        } else {
            Ok(())
        }
    }

    async fn find_by_role_name(&self, role: &str) -> Result<Option<User>, AdminServiceError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.has_role(role))
            .cloned())
    }

    async fn create_with_role(
        &self,
        email: &str,
        role_id: Uuid,
    ) -> Result<User, AdminServiceError> {
        // The mock only hands out the anonymous role; bootstrap is its sole
        // caller.
        let user = User {
            id: Uuid::now_v7(),
            email: email.to_owned(),
            name: None,
            roles: vec![Role {
                id: role_id,
                name: ROLE_ANONYMOUS.into(),
            }],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }
}

#[derive(Clone, Default)]
pub struct MockIdentities {
    pub identities: Arc<Mutex<Vec<Identity>>>,
}

impl MockIdentities {
    pub fn with(identities: Vec<Identity>) -> Self {
        Self {
            identities: Arc::new(Mutex::new(identities)),
        }
    }
}

impl IdentityRepository for MockIdentities {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AdminServiceError> {
        Ok(self
            .identities
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.username == username)
            .cloned())
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Identity>, AdminServiceError> {
        Ok(self
            .identities
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.user_id == user_id)
            .cloned())
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), AdminServiceError> {
        let mut identities = self.identities.lock().unwrap();
        let identity = identities
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(AdminServiceError::IdentityNotFound)?;
        identity.password_hash = password_hash.to_owned();
        identity.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockRoles {
    pub roles: Arc<Mutex<Vec<Role>>>,
}

impl RoleRepository for MockRoles {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AdminServiceError> {
        Ok(self
            .roles
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn ensure(&self, name: &str) -> Result<Role, AdminServiceError> {
        if let Some(role) = self.find_by_name(name).await? {
            return Ok(role);
        }
        let role = Role {
            id: Uuid::now_v7(),
            name: name.to_owned(),
        };
        self.roles.lock().unwrap().push(role.clone());
        Ok(role)
    }
}

#[derive(Clone, Default)]
pub struct MockAudit {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl MockAudit {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl AuditLog for MockAudit {
    async fn record(&self, _actor: Option<Uuid>, action: &str) {
        self.events.lock().unwrap().push(action.to_owned());
    }
}

#[derive(Clone, Default)]
pub struct MockSessions {
    pub sessions: Arc<Mutex<BTreeMap<String, Uuid>>>,
}

impl SessionStore for MockSessions {
    async fn get(&self, token: &str) -> Result<Option<Uuid>, AdminServiceError> {
        Ok(self.sessions.lock().unwrap().get(token).copied())
    }

    async fn set(
        &self,
        token: &str,
        user_id: Uuid,
        _ttl_secs: u64,
    ) -> Result<(), AdminServiceError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(token.to_owned(), user_id);
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), AdminServiceError> {
        self.sessions.lock().unwrap().remove(token);
        Ok(())
    }
}
