//! Redis cache backend.
//!
//! Every key written is also recorded in the `books:keys` set, so a purge can
//! delete exactly the catalog keys without scanning the keyspace. Keys that
//! expired by TTL are dropped from the set the next time a read misses them.

use std::sync::LazyLock;
use std::time::Duration;

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Script};

use super::CacheError;

/// Set holding every catalog key currently written.
const KEY_SET: &str = "books:keys";

/// Untrack `KEYS[1]` from the set `KEYS[2]` unless it was written again.
static UNTRACK_IF_GONE: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 0 then
            return redis.call('SREM', KEYS[2], KEYS[1])
        end
        return 0
        ",
    )
});

/// Redis-backed cache of serialized listings.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    ttl: Option<Duration>,
}

impl RedisCache {
    /// Connect to Redis.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Redis` if the URL is invalid or the server is
    /// unreachable.
    pub async fn connect(url: &str, ttl: Option<Duration>) -> Result<Self, CacheError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(2)
            .set_connection_timeout(Duration::from_secs(2));

        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager_with_config(config).await?;

        Ok(Self { conn, ttl })
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(key).await?;
        if payload.is_none() {
            let _untracked: i64 = UNTRACK_IF_GONE
                .key(key)
                .key(KEY_SET)
                .invoke_async(&mut conn)
                .await?;
        }
        Ok(payload)
    }

    pub async fn set(&self, key: &str, payload: String) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic();
        if let Some(ttl) = self.ttl {
            pipe.set_ex(key, payload, ttl.as_secs().max(1)).ignore();
        } else {
            pipe.set(key, payload).ignore();
        }
        pipe.sadd(KEY_SET, key).ignore();

        let () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    pub async fn contains(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    /// Delete every tracked catalog key. Returns how many were tracked.
    pub async fn purge(&self) -> Result<usize, CacheError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.smembers(KEY_SET).await?;
        if keys.is_empty() {
            return Ok(0);
        }

        let () = redis::pipe()
            .atomic()
            .del(&keys)
            .ignore()
            .srem(KEY_SET, &keys)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(keys.len())
    }
}
