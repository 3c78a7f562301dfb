//! Current-actor resolution. Every request resolves to exactly one actor:
//! a session user, a basic-auth user, or the shared anonymous user. The
//! extractor itself never rejects for missing credentials; authorization is
//! the gate's job.

use axum::extract::FromRequestParts;
use axum_extra::extract::CookieJar;
use axum_extra::headers::authorization::Basic;
use axum_extra::headers::{Authorization, HeaderMapExt};
use http::request::Parts;

use crate::domain::repository::{IdentityRepository, SessionStore, UserRepository};
use crate::domain::types::User;
use crate::error::AdminServiceError;
use crate::state::AppState;
use crate::usecase::session::authenticate_credentials;

pub const SESSION_COOKIE: &str = "quarterdeck_session";

/// Resolved actor of the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Session cookie first, basic-auth credentials second, the anonymous actor
/// last. A stale or orphaned session falls through to the next mechanism
/// instead of erroring.
pub async fn resolve_actor<S, R, I>(
    sessions: &S,
    users: &R,
    identities: &I,
    anonymous: &User,
    session_token: Option<&str>,
    basic: Option<(&str, &str)>,
) -> Result<User, AdminServiceError>
where
    S: SessionStore,
    R: UserRepository,
    I: IdentityRepository,
{
    if let Some(token) = session_token {
        match sessions.get(token).await {
            Ok(Some(user_id)) => {
                if let Some(user) = users.find_by_id(user_id).await? {
                    return Ok(user);
                }
            }
            Ok(None) => {}
            // A session-store outage degrades to the other mechanisms
            // instead of failing every request.
            Err(e) => tracing::warn!(error = %e, "session lookup failed"),
        }
    }
    if let Some((username, password)) = basic {
        if let Some(user) = authenticate_credentials(identities, users, username, password).await? {
            return Ok(user);
        }
    }
    Ok(anonymous.clone())
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AdminServiceError;

    // axum-core 0.5 defines this as `fn -> impl Future + Send` (not `async fn`).
    // In Rust 1.82+ precise capturing, `async fn` captures lifetimes differently,
    // causing E0195. Fix: extract values synchronously, return a 'static async move block.
    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let state = state.clone();
        let session_token = CookieJar::from_headers(&parts.headers)
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_owned());
        let basic = parts.headers.typed_get::<Authorization<Basic>>();

        async move {
            let user = resolve_actor(
                &state.sessions(),
                &state.user_repo(),
                &state.identity_repo(),
                &state.anonymous,
                session_token.as_deref(),
                basic
                    .as_ref()
                    .map(|auth| (auth.username(), auth.password())),
            )
            .await?;
            Ok(Self(user))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::auth::password::hash_password;
    use crate::domain::types::Identity;
    use crate::usecase::mock::{MockIdentities, MockSessions, MockUsers, user_with_roles};

    fn anonymous() -> User {
        user_with_roles(&["anonymous"])
    }

    #[tokio::test]
    async fn session_cookie_wins() {
        let user = user_with_roles(&["user"]);
        let users = MockUsers::with(vec![user.clone()]);
        let sessions = MockSessions::default();
        sessions
            .sessions
            .lock()
            .unwrap()
            .insert("token".into(), user.id);

        let actor = resolve_actor(
            &sessions,
            &users,
            &MockIdentities::default(),
            &anonymous(),
            Some("token"),
            None,
        )
        .await
        .unwrap();
        assert_eq!(actor.id, user.id);
    }

    #[tokio::test]
    async fn stale_session_falls_back_to_anonymous() {
        let anon = anonymous();
        let actor = resolve_actor(
            &MockSessions::default(),
            &MockUsers::default(),
            &MockIdentities::default(),
            &anon,
            Some("expired-token"),
            None,
        )
        .await
        .unwrap();
        assert_eq!(actor.id, anon.id);
    }

    #[tokio::test]
    async fn basic_auth_is_the_second_mechanism() {
        let user = user_with_roles(&["user"]);
        let identity = Identity {
            id: Uuid::now_v7(),
            user_id: user.id,
            username: "alice@example.com".into(),
            password_hash: hash_password("correct horse").unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let users = MockUsers::with(vec![user.clone()]);
        let identities = MockIdentities::with(vec![identity]);

        let actor = resolve_actor(
            &MockSessions::default(),
            &users,
            &identities,
            &anonymous(),
            None,
            Some(("alice@example.com", "correct horse")),
        )
        .await
        .unwrap();
        assert_eq!(actor.id, user.id);
    }

    #[tokio::test]
    async fn wrong_basic_credentials_resolve_to_anonymous() {
        let user = user_with_roles(&["user"]);
        let identity = Identity {
            id: Uuid::now_v7(),
            user_id: user.id,
            username: "alice@example.com".into(),
            password_hash: hash_password("correct horse").unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let anon = anonymous();

        let actor = resolve_actor(
            &MockSessions::default(),
            &MockUsers::with(vec![user]),
            &MockIdentities::with(vec![identity]),
            &anon,
            None,
            Some(("alice@example.com", "wrong")),
        )
        .await
        .unwrap();
        assert_eq!(actor.id, anon.id);
    }

    #[tokio::test]
    async fn no_credentials_resolve_to_anonymous() {
        let anon = anonymous();
        let actor = resolve_actor(
            &MockSessions::default(),
            &MockUsers::default(),
            &MockIdentities::default(),
            &anon,
            None,
            None,
        )
        .await
        .unwrap();
        assert_eq!(actor.id, anon.id);
        assert!(actor.anonymous());
    }
}
