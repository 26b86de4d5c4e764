use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;
use tracing::{debug, trace};
use uuid::Uuid;

/// Error raised by the token storage backend.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token storage error: {0}")]
    Storage(#[from] redis::RedisError),
}

/// Storage for opaque access tokens.
///
/// A token maps to the id of the user it was issued for and disappears
/// when its lifetime elapses. Resolving an expired or unknown token is
/// `None`, not an error.
#[async_trait]
pub trait TokenBackend: Send + Sync {
    /// Mint a fresh token for `user_id` and persist the mapping.
    async fn issue(&self, user_id: Uuid) -> Result<String, TokenError>;

    /// Look up the user id a token was issued for.
    async fn resolve(&self, token: &str) -> Result<Option<Uuid>, TokenError>;

    /// Drop the mapping for `token`. Revoking an unknown token is a no-op.
    async fn revoke(&self, token: &str) -> Result<(), TokenError>;

    /// Whether the backing store is reachable.
    async fn ping(&self) -> bool;
}

/// Generate an opaque access token: 256 bits of randomness, hex encoded.
pub(crate) fn generate_token() -> String {
    format!(
        "{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}

/// Token store backed by Redis.
///
/// Keys are `<prefix><token>`, values are the user id string, expiry is
/// the Redis TTL.
#[derive(Clone)]
pub struct RedisTokenStore {
    conn: ConnectionManager,
    prefix: String,
    lifetime_secs: u64,
}

impl RedisTokenStore {
    pub fn new(conn: ConnectionManager, prefix: &str, lifetime_secs: u64) -> Self {
        Self {
            conn,
            prefix: prefix.to_string(),
            lifetime_secs,
        }
    }

    fn key(&self, token: &str) -> String {
        format!("{}{}", self.prefix, token)
    }
}

#[async_trait]
impl TokenBackend for RedisTokenStore {
    async fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        let token = generate_token();
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(self.key(&token), user_id.to_string(), self.lifetime_secs)
            .await?;
        debug!("Issued access token for user {}", user_id);
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<Uuid>, TokenError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(self.key(token)).await?;
        trace!("Token lookup {}", if value.is_some() { "hit" } else { "miss" });
        Ok(value.and_then(|raw| Uuid::parse_str(&raw).ok()))
    }

    async fn revoke(&self, token: &str) -> Result<(), TokenError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.key(token)).await?;
        debug!("Revoked access token");
        Ok(())
    }

    async fn ping(&self) -> bool {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .is_ok()
    }
}
