//! HTTP handlers for the users collection and the profile endpoint. Thin:
//! decode the request, run a usecase, encode the response.

use axum::Json;
use axum::extract::{Path, RawQuery, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quarterdeck_core::serde::to_rfc3339_ms;
use quarterdeck_domain::pagination::Page;

use crate::auth::current_user::CurrentUser;
use crate::domain::types::{User, UserChanges};
use crate::error::AdminServiceError;
use crate::query::QueryParams;
use crate::state::AppState;
use crate::usecase::password::{UpdatePassword, UpdatePasswordInput};
use crate::usecase::user::{
    CreateUser, CreateUserInput, DeleteUser, GetProfile, GetUser, ListUsers, UpdateUser,
};

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub roles: Vec<String>,
    pub super_admin: bool,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let super_admin = user.super_admin();
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            roles: user.roles.into_iter().map(|r| r.name).collect(),
            super_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

pub async fn list_users(
    CurrentUser(actor): CurrentUser,
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Page<UserResponse>>, AdminServiceError> {
    let params = QueryParams::from_raw(raw.as_deref());
    let page = params.page_request();
    let usecase = ListUsers {
        repo: state.user_repo(),
        gate: state.gate(),
    };
    let page = usecase.execute(&actor, &params, page).await?;
    Ok(Json(page.map(UserResponse::from)))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub password_confirmation: String,
    pub name: Option<String>,
    #[serde(default)]
    pub role_ids: Vec<Uuid>,
}

pub async fn create_user(
    CurrentUser(actor): CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AdminServiceError> {
    let usecase = CreateUser {
        repo: state.user_repo(),
        gate: state.gate(),
        audit: state.audit(),
    };
    let user = usecase
        .execute(
            &actor,
            CreateUserInput {
                username: body.username,
                password: body.password,
                password_confirmation: body.password_confirmation,
                name: body.name,
                role_ids: body.role_ids,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/users/{}", user.id))],
        Json(UserResponse::from(user)),
    ))
}

pub async fn get_user(
    CurrentUser(actor): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, AdminServiceError> {
    let usecase = GetUser {
        repo: state.user_repo(),
        gate: state.gate(),
    };
    let user = usecase.execute(&actor, id).await?;
    Ok(Json(UserResponse::from(user)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role_ids: Option<Vec<Uuid>>,
}

pub async fn update_user(
    CurrentUser(actor): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AdminServiceError> {
    let usecase = UpdateUser {
        repo: state.user_repo(),
        gate: state.gate(),
        audit: state.audit(),
    };
    let changes = UserChanges {
        email: body.email,
        name: body.name,
    };
    let user = usecase.execute(&actor, id, changes, body.role_ids).await?;
    Ok(Json(UserResponse::from(user)))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    /// Ignored when a super-admin resets someone else's password.
    #[serde(default)]
    pub old_password: String,
    pub password: String,
    pub password_confirmation: String,
}

pub async fn update_password(
    CurrentUser(actor): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<StatusCode, AdminServiceError> {
    let usecase = UpdatePassword {
        users: state.user_repo(),
        identities: state.identity_repo(),
        gate: state.gate(),
        audit: state.audit(),
    };
    usecase
        .execute(
            &actor,
            id,
            UpdatePasswordInput {
                old_password: body.old_password,
                password: body.password,
                password_confirmation: body.password_confirmation,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_user(
    CurrentUser(actor): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AdminServiceError> {
    let usecase = DeleteUser {
        repo: state.user_repo(),
        gate: state.gate(),
        audit: state.audit(),
    };
    usecase.execute(&actor, id).await?;
    Ok((
        StatusCode::NO_CONTENT,
        [(header::LOCATION, "/users".to_owned())],
    ))
}

pub async fn profile(
    CurrentUser(actor): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AdminServiceError> {
    let usecase = GetProfile {
        repo: state.user_repo(),
        gate: state.gate(),
    };
    let user = usecase.execute(&actor).await?;
    Ok(Json(UserResponse::from(user)))
}
