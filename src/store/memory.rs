//! In-process key-value store.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::StoreError;
use crate::store::KeyValueStore;

/// A value held under one key.
#[derive(Debug, Clone)]
enum Entry {
    Text(String),
    Set(BTreeSet<i64>),
    Ranking(HashMap<String, i64>),
}

impl Entry {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "string",
            Self::Set(_) => "set",
            Self::Ranking(_) => "ranking",
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, Entry>,
}

impl MemoryState {
    fn text(&self, key: &str) -> Result<Option<&String>, StoreError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Entry::Text(value)) => Ok(Some(value)),
            Some(other) => Err(wrong_type(key, "string", other)),
        }
    }

    fn set(&self, key: &str) -> Result<Option<&BTreeSet<i64>>, StoreError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Entry::Set(members)) => Ok(Some(members)),
            Some(other) => Err(wrong_type(key, "set", other)),
        }
    }

    fn set_mut(&mut self, key: &str) -> Result<&mut BTreeSet<i64>, StoreError> {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Set(BTreeSet::new()));
        match entry {
            Entry::Set(members) => Ok(members),
            other => Err(wrong_type(key, "set", other)),
        }
    }

    fn ranking(&self, key: &str) -> Result<Option<&HashMap<String, i64>>, StoreError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Entry::Ranking(scores)) => Ok(Some(scores)),
            Some(other) => Err(wrong_type(key, "ranking", other)),
        }
    }

    fn ranking_mut(&mut self, key: &str) -> Result<&mut HashMap<String, i64>, StoreError> {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Ranking(HashMap::new()));
        match entry {
            Entry::Ranking(scores) => Ok(scores),
            other => Err(wrong_type(key, "ranking", other)),
        }
    }

    /// Reads a scalar as an integer, treating a missing key as zero.
    fn integer(&self, key: &str) -> Result<i64, StoreError> {
        match self.text(key)? {
            None => Ok(0),
            Some(raw) => raw
                .parse()
                .map_err(|_| StoreError::new(format!("Value at '{}' is not an integer", key))),
        }
    }

    /// Drops `key` if it holds an empty set or ranking.
    fn prune(&mut self, key: &str) {
        let empty = match self.entries.get(key) {
            Some(Entry::Set(members)) => members.is_empty(),
            Some(Entry::Ranking(scores)) => scores.is_empty(),
            _ => false,
        };
        if empty {
            self.entries.remove(key);
        }
    }
}

#[track_caller]
fn wrong_type(key: &str, expected: &str, found: &Entry) -> StoreError {
    StoreError::new(format!(
        "WRONGTYPE key '{}' holds a {}, expected a {}",
        key,
        found.type_name(),
        expected
    ))
}

/// Key-value store held in process memory.
///
/// Clones share the same data. Each operation holds the lock for its whole
/// duration, so every call is atomic with respect to every other call.
/// Sets list their members in ascending order and ranking ties order by
/// member name descending, matching Redis.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory store");
        Self::default()
    }

    /// Brings the store online or takes it offline.
    ///
    /// While offline every operation fails, which lets callers observe
    /// connectivity errors without a real network.
    #[instrument(skip(self))]
    pub fn set_online(&self, online: bool) {
        info!(online, "Changing in-memory store availability");
        self.offline.store(!online, Ordering::SeqCst);
    }

    /// Removes every key.
    #[instrument(skip(self))]
    pub fn flush_all(&self) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let count = state.entries.len();
        state.entries.clear();
        debug!(count, "Flushed in-memory store");
        Ok(())
    }

    #[track_caller]
    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::new("In-memory store is offline"));
        }
        self.state
            .lock()
            .map_err(|e| StoreError::new(format!("In-memory store lock poisoned: {}", e)))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    #[instrument(skip(self))]
    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let state = self.lock()?;
        Ok(state.text(key)?.cloned())
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state
            .entries
            .insert(key.to_string(), Entry::Text(value.to_string()));
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_ranked(
        &self,
        key: &str,
        ranking: &str,
        member: &str,
        value: i64,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        // Type-check both keys before touching either one.
        state.text(key)?;
        state.ranking(ranking)?;
        state
            .entries
            .insert(key.to_string(), Entry::Text(value.to_string()));
        state.ranking_mut(ranking)?.insert(member.to_string(), value);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn incr_ranked(
        &self,
        key: &str,
        ranking: &str,
        member: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let mut state = self.lock()?;
        let current = state.integer(key)?;
        let updated = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::new(format!("Increment of '{}' would overflow", key)))?;

        state
            .ranking_mut(ranking)?
            .insert(member.to_string(), updated);

        state
            .entries
            .insert(key.to_string(), Entry::Text(updated.to_string()));
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn set_add(&self, key: &str, members: &[i64]) -> Result<(), StoreError> {
        if members.is_empty() {
            return Ok(());
        }
        let mut state = self.lock()?;
        state.set_mut(key)?.extend(members.iter().copied());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_remove(&self, key: &str, member: i64) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.set(key)?.is_none() {
            return Ok(());
        }
        state.set_mut(key)?.remove(&member);
        state.prune(key);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_members(&self, key: &str) -> Result<Vec<i64>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .set(key)?
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn set_contains(&self, key: &str, member: i64) -> Result<bool, StoreError> {
        let state = self.lock()?;
        Ok(state
            .set(key)?
            .is_some_and(|members| members.contains(&member)))
    }

    #[instrument(skip(self))]
    async fn rank_desc(&self, ranking: &str, member: &str) -> Result<Option<u64>, StoreError> {
        let state = self.lock()?;
        let Some(scores) = state.ranking(ranking)? else {
            return Ok(None);
        };
        let Some(&score) = scores.get(member) else {
            return Ok(None);
        };

        let ahead = scores
            .iter()
            .filter(|&(other, &other_score)| {
                other_score > score || (other_score == score && other.as_str() > member)
            })
            .count();
        Ok(Some(ahead as u64))
    }

    #[instrument(skip(self))]
    async fn delete_ranked(
        &self,
        keys: &[String],
        ranking: &str,
        member: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.ranking(ranking)?;
        for key in keys {
            state.entries.remove(key);
        }
        if let Some(Entry::Ranking(scores)) = state.entries.get_mut(ranking) {
            scores.remove(member);
        }
        state.prune(ranking);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_keys_read_as_empty() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
        assert!(store.set_members("nope").await.unwrap().is_empty());
        assert!(!store.set_contains("nope", 1).await.unwrap());
        assert_eq!(store.rank_desc("board", "nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rank_ties_order_by_member_descending() {
        let store = MemoryStore::new();
        store.set_ranked("a", "board", "alice", 10).await.unwrap();
        store.set_ranked("b", "board", "bob", 10).await.unwrap();
        store.set_ranked("c", "board", "carol", 20).await.unwrap();

        assert_eq!(store.rank_desc("board", "carol").await.unwrap(), Some(0));
        assert_eq!(store.rank_desc("board", "bob").await.unwrap(), Some(1));
        assert_eq!(store.rank_desc("board", "alice").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_incr_on_text_value_fails() {
        let store = MemoryStore::new();
        store.set("score", "not a number").await.unwrap();
        let result = store.incr_ranked("score", "board", "m", 1).await;
        assert!(result.is_err());
        assert_eq!(store.rank_desc("board", "m").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_incr_overflow_leaves_ranking_untouched() {
        let store = MemoryStore::new();
        store.set_ranked("top", "board", "top", 1).await.unwrap();
        store.set_ranked("score", "board", "m", i64::MAX).await.unwrap();
        assert!(store.incr_ranked("score", "board", "m", 1).await.is_err());
        assert_eq!(
            store.get("score").await.unwrap(),
            Some(i64::MAX.to_string())
        );
        assert_eq!(store.rank_desc("board", "m").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_incr_with_wrong_type_ranking_leaves_scalar_untouched() {
        let store = MemoryStore::new();
        store.set("board", "not a ranking").await.unwrap();
        assert!(store.incr_ranked("score", "board", "m", 5).await.is_err());
        assert_eq!(store.get("score").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_operation_on_text_key_is_wrong_type() {
        let store = MemoryStore::new();
        store.set("name", "Alice").await.unwrap();
        let err = store.set_add("name", &[1]).await.unwrap_err();
        assert!(err.message.contains("WRONGTYPE"));
    }

    #[tokio::test]
    async fn test_removing_last_member_drops_the_key() {
        let store = MemoryStore::new();
        store.set_add("badges", &[7]).await.unwrap();
        store.set_remove("badges", 7).await.unwrap();
        // A lingering empty set would make this a WRONGTYPE error.
        assert_eq!(store.get("badges").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_flush_all_clears_every_key() {
        let store = MemoryStore::new();
        store.set("name", "Alice").await.unwrap();
        store.set_ranked("score", "board", "alice", 3).await.unwrap();
        store.flush_all().unwrap();
        assert_eq!(store.get("name").await.unwrap(), None);
        assert_eq!(store.rank_desc("board", "alice").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_offline_store_rejects_everything() {
        let store = MemoryStore::new();
        store.set_online(false);
        assert!(store.ping().await.is_err());
        assert!(store.get("k").await.is_err());
        store.set_online(true);
        assert!(store.ping().await.is_ok());
    }
}
