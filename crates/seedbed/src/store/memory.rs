//! In-process store engine.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{Store, StoreError};

#[derive(Debug, Clone)]
enum Entry {
    Object(Map<String, Value>),
    Set(BTreeSet<String>),
    SortedSet(Vec<(i64, String)>),
}

impl Entry {
    fn kind(&self) -> &'static str {
        match self {
            Self::Object(_) => "hash",
            Self::Set(_) => "set",
            Self::SortedSet(_) => "sorted set",
        }
    }
}

/// Volatile store kept entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    initialised: AtomicBool,
    sessions_ready: AtomicBool,
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Builds an empty, unconnected store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the session store has been prepared.
    #[must_use]
    pub fn sessions_ready(&self) -> bool {
        self.sessions_ready.load(Ordering::SeqCst)
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        if !self.initialised.load(Ordering::SeqCst) {
            return Err(StoreError::NotInitialised);
        }
        Ok(self.entries.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

fn wrong_type(key: &str, expected: &'static str, found: &Entry) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn init(&self) -> Result<(), StoreError> {
        self.initialised.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn empty(&self) -> Result<(), StoreError> {
        self.entries()?.clear();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys: Vec<String> = self.entries()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries()?.remove(key);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Option<Map<String, Value>>, StoreError> {
        match self.entries()?.get(key) {
            None => Ok(None),
            Some(Entry::Object(object)) => Ok(Some(object.clone())),
            Some(other) => Err(wrong_type(key, "hash", other)),
        }
    }

    async fn set_object_field(
        &self,
        key: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries()?;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Object(Map::new()));
        match entry {
            Entry::Object(object) => {
                object.insert(field.to_string(), value);
                Ok(())
            }
            other => Err(wrong_type(key, "hash", other)),
        }
    }

    async fn set_add(&self, key: &str, members: &[String]) -> Result<(), StoreError> {
        let mut entries = self.entries()?;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Set(BTreeSet::new()));
        match entry {
            Entry::Set(set) => {
                set.extend(members.iter().cloned());
                Ok(())
            }
            other => Err(wrong_type(key, "set", other)),
        }
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        match self.entries()?.get(key) {
            None => Ok(Vec::new()),
            Some(Entry::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(other) => Err(wrong_type(key, "set", other)),
        }
    }

    async fn is_set_member(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        match self.entries()?.get(key) {
            None => Ok(false),
            Some(Entry::Set(set)) => Ok(set.contains(member)),
            Some(other) => Err(wrong_type(key, "set", other)),
        }
    }

    async fn sorted_set_add(&self, key: &str, entries: &[(i64, String)]) -> Result<(), StoreError> {
        let mut store = self.entries()?;
        let entry = store
            .entry(key.to_string())
            .or_insert_with(|| Entry::SortedSet(Vec::new()));
        match entry {
            Entry::SortedSet(members) => {
                for (score, member) in entries {
                    members.retain(|(_, existing)| existing != member);
                    members.push((*score, member.clone()));
                }
                members.sort();
                Ok(())
            }
            other => Err(wrong_type(key, "sorted set", other)),
        }
    }

    async fn sorted_set_range(&self, key: &str) -> Result<Vec<String>, StoreError> {
        match self.entries()?.get(key) {
            None => Ok(Vec::new()),
            Some(Entry::SortedSet(members)) => {
                Ok(members.iter().map(|(_, member)| member.clone()).collect())
            }
            Some(other) => Err(wrong_type(key, "sorted set", other)),
        }
    }

    async fn init_session_store(&self) -> Result<(), StoreError> {
        if !self.initialised.load(Ordering::SeqCst) {
            return Err(StoreError::NotInitialised);
        }
        self.sessions_ready.store(true, Ordering::SeqCst);
        Ok(())
    }
}
