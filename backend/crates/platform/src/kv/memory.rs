//! In-memory backend
//!
//! Mirrors the Redis semantics the marketplace relies on: key expiry,
//! hashes that vanish with their last field, and sorted sets ordered by
//! `(score, member)`. The whole store sits behind one mutex, so a batch is
//! applied atomically with respect to every other call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::{KvBatch, KvError, KvOp, KvResult, KvStore};

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Hash(HashMap<String, String>),
    Sorted(Vec<(f64, String)>),
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, Entry>,
    clock_offset: Duration,
    /// Calls left before the next one fails
    fail_after: Option<usize>,
}

impl State {
    fn now(&self) -> Instant {
        Instant::now() + self.clock_offset
    }

    fn check_fault(&mut self) -> KvResult<()> {
        match self.fail_after {
            Some(0) => {
                self.fail_after = None;
                Err(KvError::Unavailable)
            }
            Some(n) => {
                self.fail_after = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn purge_if_expired(&mut self, key: &str) {
        let now = self.now();
        let expired = self
            .entries
            .get(key)
            .and_then(|e| e.expires_at)
            .is_some_and(|at| at <= now);
        if expired {
            self.entries.remove(key);
        }
    }

    fn live(&mut self, key: &str) -> Option<&mut Entry> {
        self.purge_if_expired(key);
        self.entries.get_mut(key)
    }

    fn hash_mut(&mut self, key: &str) -> KvResult<&mut HashMap<String, String>> {
        self.purge_if_expired(key);
        let entry = self.entries.entry(key.to_string()).or_insert(Entry {
            value: Value::Hash(HashMap::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Value::Hash(map) => Ok(map),
            _ => Err(KvError::WrongType(key.to_string())),
        }
    }

    fn sorted_mut(&mut self, key: &str) -> KvResult<&mut Vec<(f64, String)>> {
        self.purge_if_expired(key);
        let entry = self.entries.entry(key.to_string()).or_insert(Entry {
            value: Value::Sorted(Vec::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Value::Sorted(set) => Ok(set),
            _ => Err(KvError::WrongType(key.to_string())),
        }
    }

    fn drop_if_empty(&mut self, key: &str) {
        let empty = match self.entries.get(key).map(|e| &e.value) {
            Some(Value::Hash(map)) => map.is_empty(),
            Some(Value::Sorted(set)) => set.is_empty(),
            _ => false,
        };
        if empty {
            self.entries.remove(key);
        }
    }

    fn apply_op(&mut self, op: KvOp) -> KvResult<()> {
        match op {
            KvOp::HashSet { key, fields } => {
                let map = self.hash_mut(&key)?;
                map.extend(fields);
                self.drop_if_empty(&key);
            }
            KvOp::Expire { key, ttl } => {
                let at = self.now() + ttl;
                if let Some(entry) = self.live(&key) {
                    entry.expires_at = Some(at);
                }
            }
            KvOp::SortedAdd { key, score, member } => {
                let set = self.sorted_mut(&key)?;
                set.retain(|(_, m)| *m != member);
                set.push((score, member));
                set.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
            }
            KvOp::SortedRemove { key, member } => {
                if self.live(&key).is_some() {
                    let set = self.sorted_mut(&key)?;
                    set.retain(|(_, m)| *m != member);
                    self.drop_if_empty(&key);
                }
            }
            KvOp::Delete { key } => {
                self.entries.remove(&key);
            }
        }
        Ok(())
    }
}

/// In-process key-value store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    state: Arc<Mutex<State>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Batches are validated before any write, so a poisoned lock still
        // guards consistent data.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Move the store's clock forward, expiring keys whose TTL has passed.
    pub fn advance_clock(&self, by: Duration) {
        self.lock().clock_offset += by;
    }

    /// Let `calls` more operations succeed, then fail the next one with
    /// [`KvError::Unavailable`].
    pub fn fail_after(&self, calls: usize) {
        self.lock().fail_after = Some(calls);
    }

    /// Whether a key currently exists (expired keys do not)
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().live(key).is_some()
    }

    /// Remaining time to live of a key, if it has one
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let mut state = self.lock();
        let now = state.now();
        state
            .live(key)
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }
}

impl KvStore for MemoryKv {
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> KvResult<()> {
        let mut state = self.lock();
        state.check_fault()?;
        let expires_at = Some(state.now() + ttl);
        state.entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at,
            },
        );
        Ok(())
    }

    async fn take(&self, key: &str) -> KvResult<Option<String>> {
        let mut state = self.lock();
        state.check_fault()?;
        let is_string = state.live(key).map(|e| matches!(e.value, Value::Str(_)));
        match is_string {
            None => Ok(None),
            Some(false) => Err(KvError::WrongType(key.to_string())),
            Some(true) => match state.entries.remove(key).map(|e| e.value) {
                Some(Value::Str(value)) => Ok(Some(value)),
                _ => Ok(None),
            },
        }
    }

    async fn hash_get_all(&self, key: &str) -> KvResult<HashMap<String, String>> {
        let mut state = self.lock();
        state.check_fault()?;
        match state.live(key).map(|e| &e.value) {
            None => Ok(HashMap::new()),
            Some(Value::Hash(map)) => Ok(map.clone()),
            Some(_) => Err(KvError::WrongType(key.to_string())),
        }
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> KvResult<()> {
        let mut state = self.lock();
        state.check_fault()?;
        state
            .hash_mut(key)?
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hash_update(
        &self,
        key: &str,
        fields: Vec<(String, String)>,
        ttl: Option<Duration>,
    ) -> KvResult<bool> {
        let mut state = self.lock();
        state.check_fault()?;
        let expires_at = ttl.map(|ttl| state.now() + ttl);
        let Some(entry) = state.live(key) else {
            return Ok(false);
        };
        let Value::Hash(map) = &mut entry.value else {
            return Err(KvError::WrongType(key.to_string()));
        };
        map.extend(fields);
        if expires_at.is_some() {
            entry.expires_at = expires_at;
        }
        Ok(true)
    }

    async fn delete(&self, key: &str) -> KvResult<()> {
        let mut state = self.lock();
        state.check_fault()?;
        state.entries.remove(key);
        Ok(())
    }

    async fn sorted_range(&self, key: &str) -> KvResult<Vec<String>> {
        let mut state = self.lock();
        state.check_fault()?;
        match state.live(key).map(|e| &e.value) {
            None => Ok(Vec::new()),
            Some(Value::Sorted(set)) => Ok(set.iter().map(|(_, m)| m.clone()).collect()),
            Some(_) => Err(KvError::WrongType(key.to_string())),
        }
    }

    async fn sorted_count(&self, key: &str) -> KvResult<u64> {
        let mut state = self.lock();
        state.check_fault()?;
        match state.live(key).map(|e| &e.value) {
            None => Ok(0),
            Some(Value::Sorted(set)) => Ok(set.len() as u64),
            Some(_) => Err(KvError::WrongType(key.to_string())),
        }
    }

    async fn apply(&self, batch: KvBatch) -> KvResult<()> {
        let mut state = self.lock();
        state.check_fault()?;

        // Type errors abort the whole batch before anything is written.
        for op in batch.ops() {
            let (key, want_hash) = match op {
                KvOp::HashSet { key, .. } => (key, true),
                KvOp::SortedAdd { key, .. } | KvOp::SortedRemove { key, .. } => (key, false),
                KvOp::Expire { .. } | KvOp::Delete { .. } => continue,
            };
            let mismatch = match state.live(key).map(|e| &e.value) {
                Some(Value::Hash(_)) => !want_hash,
                Some(Value::Sorted(_)) => want_hash,
                Some(Value::Str(_)) => true,
                None => false,
            };
            if mismatch {
                return Err(KvError::WrongType(key.clone()));
            }
        }

        for op in batch.into_ops() {
            state.apply_op(op)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_roundtrip_and_expiry() {
        let kv = MemoryKv::new();
        let batch = KvBatch::new()
            .hash_set("session:a", vec![("DisplayName".into(), "ada".into())])
            .expire("session:a", Duration::from_secs(60));
        kv.apply(batch).await.unwrap();

        let fields = kv.hash_get_all("session:a").await.unwrap();
        assert_eq!(fields.get("DisplayName").map(String::as_str), Some("ada"));
        let ttl = kv.ttl("session:a").unwrap();
        assert!(ttl <= Duration::from_secs(60) && ttl > Duration::from_secs(59));

        kv.advance_clock(Duration::from_secs(61));
        assert!(kv.hash_get_all("session:a").await.unwrap().is_empty());
        assert!(!kv.contains_key("session:a"));
    }

    #[tokio::test]
    async fn test_take_returns_value_once() {
        let kv = MemoryKv::new();
        kv.set_ex("confirm:x", "user-1", Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(kv.take("confirm:x").await.unwrap().as_deref(), Some("user-1"));
        assert_eq!(kv.take("confirm:x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sorted_set_orders_by_score_then_member() {
        let kv = MemoryKv::new();
        let batch = KvBatch::new()
            .sorted_add("idx", 2.0, "b")
            .sorted_add("idx", 1.0, "z")
            .sorted_add("idx", 2.0, "a");
        kv.apply(batch).await.unwrap();

        assert_eq!(kv.sorted_range("idx").await.unwrap(), vec!["z", "a", "b"]);
        assert_eq!(kv.sorted_count("idx").await.unwrap(), 3);

        kv.apply(KvBatch::new().sorted_remove("idx", "a")).await.unwrap();
        assert_eq!(kv.sorted_count("idx").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_readding_member_updates_score() {
        let kv = MemoryKv::new();
        kv.apply(KvBatch::new().sorted_add("idx", 1.0, "a").sorted_add("idx", 2.0, "b"))
            .await
            .unwrap();
        kv.apply(KvBatch::new().sorted_add("idx", 3.0, "a")).await.unwrap();
        assert_eq!(kv.sorted_range("idx").await.unwrap(), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_wrong_type_aborts_whole_batch() {
        let kv = MemoryKv::new();
        kv.hash_set("h", "f", "v").await.unwrap();

        let batch = KvBatch::new()
            .sorted_add("idx", 1.0, "a")
            .sorted_add("h", 1.0, "a");
        assert!(matches!(kv.apply(batch).await, Err(KvError::WrongType(_))));
        assert_eq!(kv.sorted_count("idx").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_hash_update_skips_absent_keys() {
        let kv = MemoryKv::new();
        let fields = vec![("body".to_string(), "edited".to_string())];

        assert!(!kv.hash_update("comment:1", fields.clone(), None).await.unwrap());
        assert!(!kv.contains_key("comment:1"));

        kv.hash_set("comment:1", "body", "first").await.unwrap();
        kv.hash_set("comment:1", "author", "ada").await.unwrap();
        assert!(kv.hash_update("comment:1", fields, None).await.unwrap());

        let stored = kv.hash_get_all("comment:1").await.unwrap();
        assert_eq!(stored["body"], "edited");
        assert_eq!(stored["author"], "ada");
        assert_eq!(kv.ttl("comment:1"), None);
    }

    #[tokio::test]
    async fn test_hash_update_restarts_ttl_and_respects_expiry() {
        let kv = MemoryKv::new();
        let batch = KvBatch::new()
            .hash_set("session:a", vec![("Active".into(), "false".into())])
            .expire("session:a", Duration::from_secs(60));
        kv.apply(batch).await.unwrap();

        kv.advance_clock(Duration::from_secs(50));
        let fields = vec![("Active".to_string(), "true".to_string())];
        assert!(kv.hash_update("session:a", fields.clone(), Some(Duration::from_secs(60))).await.unwrap());
        assert!(kv.ttl("session:a").is_some_and(|ttl| ttl > Duration::from_secs(50)));

        kv.advance_clock(Duration::from_secs(60));
        assert!(!kv.hash_update("session:a", fields, Some(Duration::from_secs(60))).await.unwrap());
        assert!(kv.hash_get_all("session:a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let kv = MemoryKv::new();
        kv.fail_after(1);
        assert!(kv.hash_set("h", "f", "v").await.is_ok());
        assert!(matches!(kv.delete("h").await, Err(KvError::Unavailable)));
        // Only one call fails
        assert!(kv.delete("h").await.is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let kv = MemoryKv::new();
        let other = kv.clone();
        kv.hash_set("h", "f", "v").await.unwrap();
        assert_eq!(other.hash_get_all("h").await.unwrap().len(), 1);
    }
}
