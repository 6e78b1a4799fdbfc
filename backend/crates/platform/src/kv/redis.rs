//! Redis backend

use std::collections::HashMap;
use std::time::Duration;

use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client, Script};

use super::{KvBatch, KvOp, KvResult, KvStore};

// KEYS[1] = hash, ARGV[1] = ttl seconds (0 keeps the current expiry),
// ARGV[2..] = field/value pairs
const HASH_UPDATE: &str = r"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return 0
end
if #ARGV > 1 then
    redis.call('HSET', KEYS[1], unpack(ARGV, 2))
end
local ttl = tonumber(ARGV[1])
if ttl > 0 then
    redis.call('EXPIRE', KEYS[1], ttl)
end
return 1
";

/// Redis-backed store over a multiplexed, auto-reconnecting connection.
/// Cloning is cheap; clones share the connection.
#[derive(Clone)]
pub struct RedisKv {
    conn: ConnectionManager,
    hash_update: Script,
}

impl RedisKv {
    pub async fn connect(redis_url: &str) -> KvResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!("Connected to redis");
        Ok(Self {
            conn,
            hash_update: Script::new(HASH_UPDATE),
        })
    }
}

impl KvStore for RedisKv {
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> KvResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl.as_secs()).await?;
        Ok(())
    }

    async fn take(&self, key: &str) -> KvResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get_del(key).await?;
        Ok(value)
    }

    async fn hash_get_all(&self, key: &str) -> KvResult<HashMap<String, String>> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn.hgetall(key).await?;
        Ok(fields)
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> KvResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.hset(key, field, value).await?;
        Ok(())
    }

    async fn hash_update(
        &self,
        key: &str,
        fields: Vec<(String, String)>,
        ttl: Option<Duration>,
    ) -> KvResult<bool> {
        let mut invocation = self.hash_update.key(key);
        invocation.arg(ttl.map_or(0, |ttl| ttl.as_secs()));
        for (field, value) in &fields {
            invocation.arg(field).arg(value);
        }

        let mut conn = self.conn.clone();
        let updated: i64 = invocation.invoke_async(&mut conn).await?;
        Ok(updated == 1)
    }

    async fn delete(&self, key: &str) -> KvResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn sorted_range(&self, key: &str) -> KvResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn.zrangebyscore(key, "-inf", "+inf").await?;
        Ok(members)
    }

    async fn sorted_count(&self, key: &str) -> KvResult<u64> {
        let mut conn = self.conn.clone();
        let count: u64 = conn.zcount(key, "-inf", "+inf").await?;
        Ok(count)
    }

    async fn apply(&self, batch: KvBatch) -> KvResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut pipe = ::redis::pipe();
        pipe.atomic();
        for op in batch.into_ops() {
            match op {
                KvOp::HashSet { key, fields } => {
                    pipe.hset_multiple(key, &fields).ignore();
                }
                KvOp::Expire { key, ttl } => {
                    pipe.expire(key, ttl.as_secs() as i64).ignore();
                }
                KvOp::SortedAdd { key, score, member } => {
                    pipe.zadd(key, member, score).ignore();
                }
                KvOp::SortedRemove { key, member } => {
                    pipe.zrem(key, member).ignore();
                }
                KvOp::Delete { key } => {
                    pipe.del(key).ignore();
                }
            }
        }

        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }
}
