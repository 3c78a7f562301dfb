//! Session lifecycle: credential verification, opaque token issuance and
//! revocation.

use percent_encoding::percent_decode_str;
use rand::Rng as _;

use crate::auth::password::verify_password;
use crate::domain::repository::{IdentityRepository, SessionStore, UserRepository};
use crate::domain::types::User;
use crate::error::AdminServiceError;

/// Verify a username/password pair and load the owning user. `Ok(None)`
/// covers both unknown usernames and wrong passwords; the caller must not
/// distinguish them.
pub async fn authenticate_credentials<I, R>(
    identities: &I,
    users: &R,
    username: &str,
    password: &str,
) -> Result<Option<User>, AdminServiceError>
where
    I: IdentityRepository,
    R: UserRepository,
{
    let mut identity = identities.find_by_username(username).await?;
    if identity.is_none() {
        // Some basic-auth clients percent-encode the username; retry decoded.
        if let Ok(decoded) = percent_decode_str(username).decode_utf8() {
            if decoded != username {
                identity = identities.find_by_username(&decoded).await?;
            }
        }
    }
    let Some(identity) = identity else {
        return Ok(None);
    };
    if !verify_password(password, &identity.password_hash) {
        return Ok(None);
    }
    users.find_by_id(identity.user_id).await
}

/// 256-bit random token, hex encoded. Opaque: carries no claims, the store
/// is the single source of truth.
pub fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub struct LoginOutput {
    pub token: String,
    pub user: User,
}

pub struct Login<I, R, S> {
    pub identities: I,
    pub users: R,
    pub sessions: S,
    pub session_ttl_secs: u64,
}

impl<I, R, S> Login<I, R, S>
where
    I: IdentityRepository,
    R: UserRepository,
    S: SessionStore,
{
    pub async fn execute(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginOutput, AdminServiceError> {
        let user = authenticate_credentials(&self.identities, &self.users, username, password)
            .await?
            .ok_or(AdminServiceError::Unauthenticated)?;
        let token = new_session_token();
        self.sessions
            .set(&token, user.id, self.session_ttl_secs)
            .await?;
        Ok(LoginOutput { token, user })
    }
}

pub struct Logout<S> {
    pub sessions: S,
}

impl<S: SessionStore> Logout<S> {
    pub async fn execute(&self, token: &str) -> Result<(), AdminServiceError> {
        self.sessions.delete(token).await
    }
}
