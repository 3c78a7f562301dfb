//! Redis-backed session store. One key per opaque token, expired by Redis
//! itself via the configured TTL.

use anyhow::Context as _;
use deadpool_redis::Pool;
use deadpool_redis::redis::AsyncCommands;
use uuid::Uuid;

use crate::domain::repository::SessionStore;
use crate::error::AdminServiceError;

#[derive(Clone)]
pub struct RedisSessionStore {
    pub pool: Pool,
}

fn session_key(token: &str) -> String {
    format!("session:{token}")
}

impl SessionStore for RedisSessionStore {
    async fn get(&self, token: &str) -> Result<Option<Uuid>, AdminServiceError> {
        let mut conn = self.pool.get().await.context("get redis connection")?;
        let value: Option<String> = conn
            .get(session_key(token))
            .await
            .context("get session")?;
        let Some(value) = value else {
            return Ok(None);
        };
        match value.parse::<Uuid>() {
            Ok(user_id) => Ok(Some(user_id)),
            Err(_) => {
                // Unparseable payloads count as no session.
                tracing::warn!("discarding malformed session payload");
                Ok(None)
            }
        }
    }

    async fn set(&self, token: &str, user_id: Uuid, ttl_secs: u64) -> Result<(), AdminServiceError> {
        let mut conn = self.pool.get().await.context("get redis connection")?;
        conn.set_ex::<_, _, ()>(session_key(token), user_id.to_string(), ttl_secs)
            .await
            .context("set session")?;
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), AdminServiceError> {
        let mut conn = self.pool.get().await.context("get redis connection")?;
        conn.del::<_, ()>(session_key(token))
            .await
            .context("delete session")?;
        Ok(())
    }
}
