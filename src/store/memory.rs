use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::{Record, RecordStore};

struct MemoryState<T> {
    last_id: u64,
    rows: BTreeMap<u64, T>,
}

/// In-memory record store, used by tests and throwaway sessions
pub struct MemoryStore<T> {
    inner: Mutex<MemoryState<T>>,
}

impl<T: Record> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryState {
                last_id: 0,
                rows: BTreeMap::new(),
            }),
        }
    }
}

impl<T: Record> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for MemoryStore<T> {
    async fn insert(&self, mut record: T) -> Result<T> {
        let mut state = self.inner.lock().await;
        state.last_id += 1;
        record.set_id(state.last_id);
        debug!("Store INSERT for id: {}", record.id());
        state.rows.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn get(&self, owner: &str, id: u64) -> Result<Option<T>> {
        let state = self.inner.lock().await;
        Ok(state.rows.get(&id).filter(|r| r.owner() == owner).cloned())
    }

    async fn update(&self, record: T) -> Result<bool> {
        let mut state = self.inner.lock().await;
        match state.rows.get_mut(&record.id()) {
            Some(existing) if existing.owner() == record.owner() => {
                debug!("Store UPDATE for id: {}", record.id());
                *existing = record;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, owner: &str, id: u64) -> Result<bool> {
        let mut state = self.inner.lock().await;
        if state.rows.get(&id).is_some_and(|r| r.owner() == owner) {
            state.rows.remove(&id);
            debug!("Store DELETE for id: {}", id);
            return Ok(true);
        }
        Ok(false)
    }

    async fn all(&self, owner: &str) -> Result<Vec<T>> {
        let state = self.inner.lock().await;
        Ok(state
            .rows
            .values()
            .filter(|r| r.owner() == owner)
            .cloned()
            .collect())
    }
}
