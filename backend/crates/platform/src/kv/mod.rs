//! Key-Value Store Abstraction
//!
//! The marketplace keeps sessions, confirmation keys, comment threads and bid
//! maps in a key-value store. [`KvStore`] names the primitives those features
//! need; [`RedisKv`] is the production backend and [`MemoryKv`] an in-process
//! twin with the same semantics for tests and local development.
//!
//! Multi-key writes go through [`KvBatch`], which a backend applies
//! atomically (`MULTI`/`EXEC` on Redis).

mod memory;
mod redis;

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

pub use self::memory::MemoryKv;
pub use self::redis::RedisKv;

pub type KvResult<T> = Result<T, KvError>;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    /// Operation against a key holding another type of value
    #[error("wrong value type at key {0}")]
    WrongType(String),

    #[error("key-value store unavailable")]
    Unavailable,
}

/// A single write inside a [`KvBatch`]
#[derive(Debug, Clone, PartialEq)]
pub enum KvOp {
    HashSet {
        key: String,
        fields: Vec<(String, String)>,
    },
    Expire {
        key: String,
        ttl: Duration,
    },
    SortedAdd {
        key: String,
        score: f64,
        member: String,
    },
    SortedRemove {
        key: String,
        member: String,
    },
    Delete {
        key: String,
    },
}

/// Ordered group of writes applied all-or-nothing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KvBatch {
    ops: Vec<KvOp>,
}

impl KvBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hash_set(mut self, key: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        self.ops.push(KvOp::HashSet {
            key: key.into(),
            fields,
        });
        self
    }

    pub fn expire(mut self, key: impl Into<String>, ttl: Duration) -> Self {
        self.ops.push(KvOp::Expire {
            key: key.into(),
            ttl,
        });
        self
    }

    pub fn sorted_add(mut self, key: impl Into<String>, score: f64, member: impl Into<String>) -> Self {
        self.ops.push(KvOp::SortedAdd {
            key: key.into(),
            score,
            member: member.into(),
        });
        self
    }

    pub fn sorted_remove(mut self, key: impl Into<String>, member: impl Into<String>) -> Self {
        self.ops.push(KvOp::SortedRemove {
            key: key.into(),
            member: member.into(),
        });
        self
    }

    pub fn delete(mut self, key: impl Into<String>) -> Self {
        self.ops.push(KvOp::Delete { key: key.into() });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[KvOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<KvOp> {
        self.ops
    }
}

/// Key-value store primitives
#[trait_variant::make(KvStore: Send)]
pub trait LocalKvStore {
    /// SET with expiry
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> KvResult<()>;

    /// GETDEL: read and remove in one step, so a value is handed out once
    async fn take(&self, key: &str) -> KvResult<Option<String>>;

    /// HGETALL; an absent key yields an empty map
    async fn hash_get_all(&self, key: &str) -> KvResult<HashMap<String, String>>;

    /// HSET of a single field
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> KvResult<()>;

    /// HSET that only touches an existing hash, optionally restarting its
    /// TTL. Returns false, writing nothing, when the key is absent.
    async fn hash_update(
        &self,
        key: &str,
        fields: Vec<(String, String)>,
        ttl: Option<Duration>,
    ) -> KvResult<bool>;

    /// DEL; deleting an absent key is not an error
    async fn delete(&self, key: &str) -> KvResult<()>;

    /// Members of a sorted set over the full score range, ascending.
    /// Equal scores are ordered lexicographically by member.
    async fn sorted_range(&self, key: &str) -> KvResult<Vec<String>>;

    /// Number of sorted set members over the full score range
    async fn sorted_count(&self, key: &str) -> KvResult<u64>;

    /// Apply every write of the batch atomically
    async fn apply(&self, batch: KvBatch) -> KvResult<()>;
}

/// Bound shared by every component that owns a store handle
pub trait SharedKv: KvStore + Clone + Send + Sync + 'static {}

impl<T> SharedKv for T where T: KvStore + Clone + Send + Sync + 'static {}
