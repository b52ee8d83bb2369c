use async_trait::async_trait;
use matcher_core::ports::{PoolError, PoolStore};
use matcher_core::pool::PoolEntry;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

/// Connection settings for the Redis-backed pool.
#[derive(Debug, Clone)]
pub struct PoolStoreConfig {
    pub url: String,
    /// Sorted-set key holding the lex-ordered membership. Defaults to the
    /// literal key used throughout design discussion, `h3:airport_pool`.
    pub pool_key: String,
}

impl Default for PoolStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            pool_key: "h3:airport_pool".to_string(),
        }
    }
}

/// Redis-backed `PoolStore`: a sorted set for the membership, string keys for
/// metadata. All members share score `0`; Redis breaks ties between equal
/// scores lexicographically, so `ZRANGEBYLEX`/`ZREVRANGEBYLEX` give exactly
/// the ordering the Matching Engine's scan needs.
pub struct RedisPoolStore {
    conn: ConnectionManager,
    pool_key: String,
    meta_prefix: String,
}

impl RedisPoolStore {
    pub async fn connect(config: PoolStoreConfig) -> Result<Self, PoolError> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| PoolError(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| PoolError(format!("redis connect failed: {e}")))?;
        Ok(Self {
            conn,
            meta_prefix: format!("{}:meta:", config.pool_key),
            pool_key: config.pool_key,
        })
    }

    fn meta_key(&self, entry_id: &str) -> String {
        format!("{}{}", self.meta_prefix, entry_id)
    }
}

#[async_trait]
impl PoolStore for RedisPoolStore {
    async fn put_meta(&self, entry_id: &str, entry: &PoolEntry) -> Result<(), PoolError> {
        let payload = serde_json::to_string(entry)
            .map_err(|e| PoolError(format!("serialize pool entry: {e}")))?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(self.meta_key(entry_id), payload)
            .await
            .map_err(|e| PoolError(format!("SET failed: {e}")))
    }

    async fn get_meta(&self, entry_id: &str) -> Result<Option<PoolEntry>, PoolError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(self.meta_key(entry_id))
            .await
            .map_err(|e| PoolError(format!("GET failed: {e}")))?;
        match raw {
            None => Ok(None),
            Some(s) => serde_json::from_str(&s)
                .map(Some)
                .map_err(|e| PoolError(format!("deserialize pool entry: {e}"))),
        }
    }

    async fn del_meta(&self, entry_ids: &[String]) -> Result<(), PoolError> {
        if entry_ids.is_empty() {
            return Ok(());
        }
        let keys: Vec<String> = entry_ids.iter().map(|id| self.meta_key(id)).collect();
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(keys)
            .await
            .map_err(|e| PoolError(format!("DEL failed: {e}")))
    }

    async fn zadd(&self, member: &str) -> Result<(), PoolError> {
        let mut conn = self.conn.clone();
        conn.zadd::<_, _, _, ()>(&self.pool_key, member, 0)
            .await
            .map_err(|e| PoolError(format!("ZADD failed: {e}")))
    }

    async fn zrem(&self, members: &[String]) -> Result<usize, PoolError> {
        if members.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let removed: usize = conn
            .zrem(&self.pool_key, members)
            .await
            .map_err(|e| PoolError(format!("ZREM failed: {e}")))?;
        Ok(removed)
    }

    async fn zrange_lex(
        &self,
        min: &str,
        max: &str,
        reverse: bool,
        limit: usize,
    ) -> Result<Vec<String>, PoolError> {
        let min_bound = if min.is_empty() {
            "-".to_string()
        } else {
            format!("[{min}")
        };
        let max_bound = if max.is_empty() {
            "+".to_string()
        } else {
            format!("({max}")
        };
        let mut conn = self.conn.clone();
        let result: Vec<String> = if reverse {
            redis::cmd("ZREVRANGEBYLEX")
                .arg(&self.pool_key)
                .arg(&max_bound)
                .arg(&min_bound)
                .arg("LIMIT")
                .arg(0)
                .arg(limit as isize)
                .query_async(&mut conn)
                .await
                .map_err(|e| PoolError(format!("ZREVRANGEBYLEX failed: {e}")))?
        } else {
            redis::cmd("ZRANGEBYLEX")
                .arg(&self.pool_key)
                .arg(&min_bound)
                .arg(&max_bound)
                .arg("LIMIT")
                .arg(0)
                .arg(limit as isize)
                .query_async(&mut conn)
                .await
                .map_err(|e| PoolError(format!("ZRANGEBYLEX failed: {e}")))?
        };
        debug!(count = result.len(), reverse, "pool lex range scan");
        Ok(result)
    }

    async fn zscan_all(&self) -> Result<Vec<String>, PoolError> {
        let mut conn = self.conn.clone();
        conn.zrange(&self.pool_key, 0, -1)
            .await
            .map_err(|e| PoolError(format!("ZRANGE failed: {e}")))
    }
}
