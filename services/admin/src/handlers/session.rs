//! Session endpoints. Login takes basic-auth credentials and answers with a
//! session cookie; logout revokes the token behind the cookie.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::TypedHeader;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Basic;

use crate::auth::current_user::SESSION_COOKIE;
use crate::error::AdminServiceError;
use crate::state::AppState;
use crate::usecase::session::{Login, Logout};

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    basic: Option<TypedHeader<Authorization<Basic>>>,
) -> Result<impl IntoResponse, AdminServiceError> {
    let Some(TypedHeader(Authorization(basic))) = basic else {
        return Err(AdminServiceError::Unauthenticated);
    };
    let usecase = Login {
        identities: state.identity_repo(),
        users: state.user_repo(),
        sessions: state.sessions(),
        session_ttl_secs: state.session_ttl_secs,
    };
    let out = usecase.execute(basic.username(), basic.password()).await?;

    let cookie = Cookie::build((SESSION_COOKIE, out.token))
        .path("/")
        .http_only(true)
        .build();
    Ok((jar.add(cookie), StatusCode::CREATED))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AdminServiceError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let usecase = Logout {
            sessions: state.sessions(),
        };
        usecase.execute(cookie.value()).await?;
    }
    let removal = Cookie::build(SESSION_COOKIE).path("/").build();
    Ok((jar.remove(removal), StatusCode::NO_CONTENT))
}
