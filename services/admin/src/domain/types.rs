use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Role granted to every visitor without credentials.
pub const ROLE_ANONYMOUS: &str = "anonymous";
/// Default role assigned when a mutation would leave a user role-less.
pub const ROLE_USER: &str = "user";
/// Role whose members bypass ownership checks and password verification.
pub const ROLE_SUPER_ADMIN: &str = "super_admin";

/// Named permission group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
}

/// User profile together with its role memberships. This is also the actor
/// type: the resolved current user of a request.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }

    /// Derived from role membership, never stored.
    pub fn super_admin(&self) -> bool {
        self.has_role(ROLE_SUPER_ADMIN)
    }

    pub fn anonymous(&self) -> bool {
        self.has_role(ROLE_ANONYMOUS)
    }
}

/// Credential record. The hash is an argon2 PHC string; plaintext passwords
/// only ever exist in-flight.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field-level validation failures, keyed by field name. Serialized into the
/// 422 response body so the caller can redisplay the rejected input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.errors.get(name).map(Vec::as_slice)
    }
}

/// Proposed user profile, not yet persisted. The email is derived from the
/// proposed identity's username but validated independently.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        if self.email.is_empty() {
            errors.add("email", "is required");
        } else if !looks_like_email(&self.email) {
            errors.add("email", "is not a valid email address");
        }
        errors
    }
}

/// Proposed credential, not yet persisted. The username doubles as the
/// user's email address.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub username: String,
    pub password: String,
    pub password_confirmation: String,
}

impl NewIdentity {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        if self.username.len() < 3 {
            errors.add("username", "must be at least 3 characters");
        }
        if self.username.chars().any(char::is_whitespace) {
            errors.add("username", "must not contain whitespace");
        }
        if self.password.len() < 8 {
            errors.add("password", "must be at least 8 characters");
        }
        if self.password != self.password_confirmation {
            errors.add("password_confirmation", "doesn't match password");
        }
        errors
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    }
}

/// Profile fields an update may change. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
}

impl UserChanges {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        if let Some(email) = &self.email {
            if !looks_like_email(email) {
                errors.add("email", "is not a valid email address");
            }
        }
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none()
    }
}

/// Visibility predicate the gate derives for an actor. Applied to every list
/// query before user-supplied filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityScope {
    All,
    OnlyUser(Uuid),
    Nothing,
}

/// Normalize a role-id set after a mutation:
///
/// 1. duplicates collapse (membership is set-semantics);
/// 2. the anonymous role never coexists with another role;
/// 3. a user left with no roles gets the default role.
pub fn check_roles(assigned: Vec<Uuid>, anonymous_role: Uuid, default_role: Uuid) -> Vec<Uuid> {
    let mut normalized: Vec<Uuid> = Vec::with_capacity(assigned.len());
    for id in assigned {
        if !normalized.contains(&id) {
            normalized.push(id);
        }
    }
    if normalized.len() > 1 {
        normalized.retain(|id| *id != anonymous_role);
    }
    if normalized.is_empty() {
        normalized.push(default_role);
    }
    normalized
}
