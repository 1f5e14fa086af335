//! Ephemeral TTL key-value seam.
//!
//! Covers the two shapes the engine needs: sets (per-officer rejection
//! index) and lists (per-user notification feed). Keys expire as whole
//! values - TTL is on the key, not per element. This is a cache layer,
//! never the system of record.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use vigil_common::error::Result;
use vigil_common::EngineError;

/// Set and list operations with key-level TTL.
pub trait EphemeralStore: Send + Sync {
    fn sadd(&self, key: &str, member: &str) -> Result<()>;
    fn smembers(&self, key: &str) -> Result<HashSet<String>>;

    fn push_front(&self, key: &str, value: String) -> Result<()>;
    fn range(&self, key: &str) -> Result<Vec<String>>;
    fn set_at(&self, key: &str, index: usize, value: String) -> Result<()>;
    fn remove_at(&self, key: &str, index: usize) -> Result<()>;
    /// Drop list entries beyond `max_len`, oldest (back) first.
    fn trim(&self, key: &str, max_len: usize) -> Result<()>;

    /// (Re)set the TTL on a key. Missing key is a no-op.
    fn expire(&self, key: &str, ttl: Duration) -> Result<()>;
}

enum Value {
    Set(HashSet<String>),
    List(Vec<String>),
}

struct Entry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

/// In-memory ephemeral store. Expired keys are swept lazily on access.
#[derive(Default)]
pub struct MemoryEphemeral {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryEphemeral {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every key expired as of `now`. The daemon relies on lazy
    /// sweeping; tests call this directly to simulate the clock.
    pub fn sweep_at(&self, now: DateTime<Utc>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|_, e| match e.expires_at {
                Some(at) => at > now,
                None => true,
            });
        }
    }

    fn with_entries<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, Entry>) -> Result<T>,
    ) -> Result<T> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| EngineError::Store("ephemeral lock poisoned".to_string()))?;
        let now = Utc::now();
        entries.retain(|_, e| match e.expires_at {
            Some(at) => at > now,
            None => true,
        });
        f(&mut entries)
    }
}

fn wrong_kind(key: &str) -> EngineError {
    EngineError::Store(format!("wrong value kind at key '{key}'"))
}

impl EphemeralStore for MemoryEphemeral {
    fn sadd(&self, key: &str, member: &str) -> Result<()> {
        self.with_entries(|entries| {
            let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
                value: Value::Set(HashSet::new()),
                expires_at: None,
            });
            match &mut entry.value {
                Value::Set(set) => {
                    set.insert(member.to_string());
                    Ok(())
                }
                Value::List(_) => Err(wrong_kind(key)),
            }
        })
    }

    fn smembers(&self, key: &str) -> Result<HashSet<String>> {
        self.with_entries(|entries| match entries.get(key) {
            Some(Entry { value: Value::Set(set), .. }) => Ok(set.clone()),
            Some(_) => Err(wrong_kind(key)),
            None => Ok(HashSet::new()),
        })
    }

    fn push_front(&self, key: &str, value: String) -> Result<()> {
        self.with_entries(|entries| {
            let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
                value: Value::List(Vec::new()),
                expires_at: None,
            });
            match &mut entry.value {
                Value::List(list) => {
                    list.insert(0, value);
                    Ok(())
                }
                Value::Set(_) => Err(wrong_kind(key)),
            }
        })
    }

    fn range(&self, key: &str) -> Result<Vec<String>> {
        self.with_entries(|entries| match entries.get(key) {
            Some(Entry { value: Value::List(list), .. }) => Ok(list.clone()),
            Some(_) => Err(wrong_kind(key)),
            None => Ok(Vec::new()),
        })
    }

    fn set_at(&self, key: &str, index: usize, value: String) -> Result<()> {
        self.with_entries(|entries| match entries.get_mut(key) {
            Some(Entry { value: Value::List(list), .. }) => {
                let slot = list
                    .get_mut(index)
                    .ok_or_else(|| EngineError::Store(format!("index {index} out of range")))?;
                *slot = value;
                Ok(())
            }
            Some(_) => Err(wrong_kind(key)),
            None => Err(EngineError::Store(format!("no list at key '{key}'"))),
        })
    }

    fn remove_at(&self, key: &str, index: usize) -> Result<()> {
        self.with_entries(|entries| match entries.get_mut(key) {
            Some(Entry { value: Value::List(list), .. }) => {
                if index >= list.len() {
                    return Err(EngineError::Store(format!("index {index} out of range")));
                }
                list.remove(index);
                Ok(())
            }
            Some(_) => Err(wrong_kind(key)),
            None => Err(EngineError::Store(format!("no list at key '{key}'"))),
        })
    }

    fn trim(&self, key: &str, max_len: usize) -> Result<()> {
        self.with_entries(|entries| {
            if let Some(Entry { value: Value::List(list), .. }) = entries.get_mut(key) {
                list.truncate(max_len);
            }
            Ok(())
        })
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        let ttl = ChronoDuration::from_std(ttl)
            .map_err(|e| EngineError::Store(format!("ttl out of range: {e}")))?;
        self.with_entries(|entries| {
            if let Some(entry) = entries.get_mut(key) {
                entry.expires_at = Some(Utc::now() + ttl);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_ops() {
        let store = MemoryEphemeral::new();
        store.sadd("rejections:off-1", "c1").unwrap();
        store.sadd("rejections:off-1", "c2").unwrap();
        store.sadd("rejections:off-1", "c1").unwrap();
        let members = store.smembers("rejections:off-1").unwrap();
        assert_eq!(members.len(), 2);
        assert!(members.contains("c1"));
        // Unknown key reads as empty, not as an error
        assert!(store.smembers("rejections:off-2").unwrap().is_empty());
    }

    #[test]
    fn test_list_newest_first() {
        let store = MemoryEphemeral::new();
        store.push_front("n:u1", "a".to_string()).unwrap();
        store.push_front("n:u1", "b".to_string()).unwrap();
        assert_eq!(store.range("n:u1").unwrap(), vec!["b", "a"]);
        store.remove_at("n:u1", 0).unwrap();
        assert_eq!(store.range("n:u1").unwrap(), vec!["a"]);
    }

    #[test]
    fn test_trim_drops_oldest() {
        let store = MemoryEphemeral::new();
        for i in 0..5 {
            store.push_front("n:u1", format!("{i}")).unwrap();
        }
        store.trim("n:u1", 3).unwrap();
        assert_eq!(store.range("n:u1").unwrap(), vec!["4", "3", "2"]);
    }

    #[test]
    fn test_expiry_sweep() {
        let store = MemoryEphemeral::new();
        store.sadd("k", "v").unwrap();
        store.expire("k", Duration::from_secs(60)).unwrap();
        // Still live now
        assert_eq!(store.smembers("k").unwrap().len(), 1);
        // Swept once the clock passes the deadline
        store.sweep_at(Utc::now() + ChronoDuration::seconds(120));
        assert!(store.smembers("k").unwrap().is_empty());
    }

    #[test]
    fn test_kind_mismatch_is_error() {
        let store = MemoryEphemeral::new();
        store.sadd("k", "v").unwrap();
        assert!(store.push_front("k", "x".to_string()).is_err());
    }
}
