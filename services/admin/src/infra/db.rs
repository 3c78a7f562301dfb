//! sea-orm repository implementations.

use std::sync::Arc;

use anyhow::Context as _;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, IsolationLevel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, SqlErr, TransactionError, TransactionTrait,
};
use uuid::Uuid;

use quarterdeck_admin_schema::{audit_logs, identities, roles, user_roles, users};
use quarterdeck_domain::pagination::{Page, PageRequest};

use crate::domain::repository::{
    AuditLog, CreateAggregate, IdentityRepository, RoleRepository, UserRepository,
};
use crate::domain::types::{
    Identity, ROLE_ANONYMOUS, ROLE_USER, Role, User, UserChanges, ValidationErrors,
    VisibilityScope, check_roles,
};
use crate::error::AdminServiceError;
use crate::query::users::UserComponent;
use crate::query::{QueryParams, shape};

// ── Model conversion ─────────────────────────────────────────────────────────

fn role_from_model(model: roles::Model) -> Role {
    Role {
        id: model.id,
        name: model.name,
    }
}

fn user_from_model(model: users::Model, role_models: Vec<roles::Model>) -> User {
    User {
        id: model.id,
        email: model.email,
        name: model.name,
        roles: role_models.into_iter().map(role_from_model).collect(),
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn identity_from_model(model: identities::Model) -> Identity {
    Identity {
        id: model.id,
        user_id: model.user_id,
        username: model.username,
        password_hash: model.password_hash,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

/// Map a unique-index violation to a field-level validation failure; anything
/// else stays internal.
fn map_write_error(e: DbErr, field: &str, context: &'static str) -> AdminServiceError {
    if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        let mut errors = ValidationErrors::default();
        errors.add(field, "is already taken");
        return AdminServiceError::Validation(errors);
    }
    AdminServiceError::Internal(anyhow::Error::new(e).context(context))
}

fn flatten_txn(e: TransactionError<DbErr>) -> DbErr {
    match e {
        TransactionError::Connection(e) | TransactionError::Transaction(e) => e,
    }
}

/// Normalize a requested role-id set against the well-known roles. Runs
/// inside the surrounding transaction.
async fn normalized_role_ids<C: ConnectionTrait>(
    db: &C,
    requested: Vec<Uuid>,
) -> Result<Vec<Uuid>, DbErr> {
    let well_known = roles::Entity::find()
        .filter(roles::Column::Name.is_in([ROLE_ANONYMOUS, ROLE_USER]))
        .all(db)
        .await?;
    let id_of = |name: &str| well_known.iter().find(|r| r.name == name).map(|r| r.id);
    let anonymous = id_of(ROLE_ANONYMOUS)
        .ok_or_else(|| DbErr::Custom("anonymous role missing; run bootstrap".into()))?;
    let fallback = id_of(ROLE_USER)
        .ok_or_else(|| DbErr::Custom("user role missing; run bootstrap".into()))?;
    Ok(check_roles(requested, anonymous, fallback))
}

async fn insert_role_edges<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    role_ids: &[Uuid],
) -> Result<(), DbErr> {
    let now = Utc::now();
    for role_id in role_ids {
        user_roles::ActiveModel {
            user_id: Set(user_id),
            role_id: Set(*role_id),
            created_at: Set(now),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

// ── Users ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
    pub component: Arc<UserComponent>,
}

impl DbUserRepository {
    async fn with_roles(&self, model: users::Model) -> Result<User, AdminServiceError> {
        let role_models = model
            .find_related(roles::Entity)
            .all(&self.db)
            .await
            .context("load user roles")?;
        Ok(user_from_model(model, role_models))
    }
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AdminServiceError> {
        let Some(model) = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?
        else {
            return Ok(None);
        };
        Ok(Some(self.with_roles(model).await?))
    }

    async fn search(
        &self,
        scope: VisibilityScope,
        params: &QueryParams,
        page: PageRequest,
    ) -> Result<Page<User>, AdminServiceError> {
        let page = page.validated()?;

        let select = match scope {
            VisibilityScope::All => users::Entity::find(),
            VisibilityScope::OnlyUser(id) => users::Entity::find().filter(users::Column::Id.eq(id)),
            VisibilityScope::Nothing => {
                users::Entity::find().filter(users::Column::Id.is_in(Vec::<Uuid>::new()))
            }
        };
        let select = shape(
            &self.db,
            select,
            &self.component.filters,
            &self.component.searchable,
            params,
        )
        .await?;

        let total = select
            .clone()
            .count(&self.db)
            .await
            .context("count users")?;
        let models = select
            .order_by_asc(users::Column::Email)
            .order_by_asc(users::Column::Id)
            .offset(page.offset())
            .limit(u64::from(page.count))
            .all(&self.db)
            .await
            .context("list users")?;

        let mut items = Vec::with_capacity(models.len());
        for model in models {
            items.push(self.with_roles(model).await?);
        }
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
        let result = self
            .db
            .transaction_with_config::<_, users::Model, DbErr>(
                |txn| {
                    Box::pin(async move {
                        let now = Utc::now();
                        let user = users::ActiveModel {
                            id: Set(aggregate.user_id),
                            email: Set(aggregate.email),
                            name: Set(aggregate.name),
                            created_at: Set(now),
                            updated_at: Set(now),
                        }
                        .insert(txn)
                        .await?;
                        identities::ActiveModel {
                            id: Set(aggregate.identity_id),
                            user_id: Set(user.id),
                            username: Set(aggregate.username),
                            password_hash: Set(aggregate.password_hash),
                            created_at: Set(now),
                            updated_at: Set(now),
                        }
                        .insert(txn)
                        .await?;
                        let role_ids = normalized_role_ids(txn, aggregate.role_ids).await?;
                        insert_role_edges(txn, user.id, &role_ids).await?;
                        Ok(user)
                    })
                },
                Some(IsolationLevel::Serializable),
                None,
            )
            .await;

        let model = result
            .map_err(flatten_txn)
            .map_err(|e| map_write_error(e, "username", "create user aggregate"))?;
        self.with_roles(model).await
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: UserChanges,
        role_ids: Option<Vec<Uuid>>,
    ) -> Result<User, AdminServiceError> {
        let result = self
            .db
            .transaction::<_, Option<users::Model>, DbErr>(|txn| {
                Box::pin(async move {
                    let Some(model) = users::Entity::find_by_id(id).one(txn).await? else {
                        return Ok(None);
                    };
                    let mut active = model.into_active_model();
                    if let Some(email) = changes.email {
                        active.email = Set(email);
                    }
                    if let Some(name) = changes.name {
                        active.name = Set(Some(name));
                    }
                    active.updated_at = Set(Utc::now());
                    let model = active.update(txn).await?;

                    if let Some(requested) = role_ids {
                        user_roles::Entity::delete_many()
                            .filter(user_roles::Column::UserId.eq(id))
                            .exec(txn)
                            .await?;
                        let role_ids = normalized_role_ids(txn, requested).await?;
                        insert_role_edges(txn, id, &role_ids).await?;
                    }
                    Ok(Some(model))
                })
            })
            .await;

        let model = result
            .map_err(flatten_txn)
            .map_err(|e| map_write_error(e, "email", "update user profile"))?
            .ok_or(AdminServiceError::UserNotFound)?;
        self.with_roles(model).await
    }

    async fn delete_aggregate(&self, id: Uuid) -> Result<(), AdminServiceError> {
        let deleted = self
            .db
            .transaction::<_, bool, DbErr>(|txn| {
                Box::pin(async move {
                    let Some(model) = users::Entity::find_by_id(id).one(txn).await? else {
                        return Ok(false);
                    };
                    identities::Entity::delete_many()
                        .filter(identities::Column::UserId.eq(id))
                        .exec(txn)
                        .await?;
                    user_roles::Entity::delete_many()
                        .filter(user_roles::Column::UserId.eq(id))
                        .exec(txn)
                        .await?;
                    model.delete(txn).await?;
                    Ok(true)
                })
            })
            .await
            .map_err(flatten_txn)
            .context("delete user aggregate")?;

        if deleted {
            Ok(())
        } else {
            Err(AdminServiceError::UserNotFound)
        }
    }

    async fn find_by_role_name(&self, role: &str) -> Result<Option<User>, AdminServiceError> {
        let Some(role) = roles::Entity::find()
            .filter(roles::Column::Name.eq(role))
            .one(&self.db)
            .await
            .context("find role by name")?
        else {
            return Ok(None);
        };
        let Some(model) = role
            .find_related(users::Entity)
            .one(&self.db)
            .await
            .context("find user by role")?
        else {
            return Ok(None);
        };
        Ok(Some(self.with_roles(model).await?))
    }

    async fn create_with_role(
        &self,
        email: &str,
        role_id: Uuid,
    ) -> Result<User, AdminServiceError> {
        let email = email.to_owned();
        let model = self
            .db
            .transaction::<_, users::Model, DbErr>(|txn| {
                Box::pin(async move {
                    let now = Utc::now();
                    let user = users::ActiveModel {
                        id: Set(Uuid::now_v7()),
                        email: Set(email),
                        name: Set(None),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(txn)
                    .await?;
                    insert_role_edges(txn, user.id, &[role_id]).await?;
                    Ok(user)
                })
            })
            .await
            .map_err(flatten_txn)
            .context("create user with role")?;
        self.with_roles(model).await
    }
}

// ── Identities ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbIdentityRepository {
    pub db: DatabaseConnection,
}

impl IdentityRepository for DbIdentityRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AdminServiceError> {
        let model = identities::Entity::find()
            .filter(identities::Column::Username.eq(username))
            .one(&self.db)
            .await
            .context("find identity by username")?;
        Ok(model.map(identity_from_model))
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Identity>, AdminServiceError> {
        let model = identities::Entity::find()
            .filter(identities::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .context("find identity by user id")?;
        Ok(model.map(identity_from_model))
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), AdminServiceError> {
        identities::ActiveModel {
            id: Set(id),
            password_hash: Set(password_hash.to_owned()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update identity password")?;
        Ok(())
    }
}

// ── Roles ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRoleRepository {
    pub db: DatabaseConnection,
}

impl RoleRepository for DbRoleRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AdminServiceError> {
        let model = roles::Entity::find()
            .filter(roles::Column::Name.eq(name))
            .one(&self.db)
            .await
            .context("find role by name")?;
        Ok(model.map(role_from_model))
    }

    async fn ensure(&self, name: &str) -> Result<Role, AdminServiceError> {
        if let Some(role) = self.find_by_name(name).await? {
            return Ok(role);
        }
        let model = roles::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.to_owned()),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .context("create role")?;
        Ok(role_from_model(model))
    }
}

// ── Audit trail ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAuditLog {
    pub db: DatabaseConnection,
}

impl AuditLog for DbAuditLog {
    async fn record(&self, actor: Option<Uuid>, action: &str) {
        let result = audit_logs::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(actor),
            action: Set(action.to_owned()),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await;
        if let Err(e) = result {
            tracing::warn!(error = %e, action, "audit log write failed");
        }
    }
}
