use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

use super::{Record, RecordStore};

const META_PARTITION: &str = "meta";

/// The on-disk ledger: one fjall keyspace holding a partition per collection
/// plus a `meta` partition with each collection's id counter.
pub struct LedgerDb {
    keyspace: Keyspace,
    meta: PartitionHandle,
}

impl LedgerDb {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory: {}", path.display()))?;

        let keyspace = fjall::Config::new(path.join("ledger"))
            .open()
            .with_context(|| format!("Failed to open ledger at {}", path.display()))?;
        let meta = keyspace.open_partition(META_PARTITION, PartitionCreateOptions::default())?;
        debug!("Opened ledger at {}", path.display());

        Ok(Self { keyspace, meta })
    }

    pub fn collection<T: Record>(&self, name: &str) -> Result<DiskStore<T>> {
        let partition = self
            .keyspace
            .open_partition(name, PartitionCreateOptions::default())
            .with_context(|| format!("Failed to open collection: {name}"))?;

        Ok(DiskStore {
            keyspace: self.keyspace.clone(),
            partition,
            meta: self.meta.clone(),
            counter_key: format!("{name}.last_id").into_bytes(),
            write_lock: Mutex::new(()),
            _marker: PhantomData,
        })
    }
}

/// Records persisted in a fjall partition as JSON, keyed by big-endian id
/// so iteration order is id order.
pub struct DiskStore<T> {
    keyspace: Keyspace,
    partition: PartitionHandle,
    meta: PartitionHandle,
    counter_key: Vec<u8>,
    // Serializes id allocation with the write that claims it.
    write_lock: Mutex<()>,
    _marker: PhantomData<T>,
}

fn decode_id(bytes: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = bytes.try_into().context("Corrupt id bytes")?;
    Ok(u64::from_be_bytes(bytes))
}

impl<T: Record> DiskStore<T> {
    fn read(&self, id: u64) -> Result<Option<T>> {
        match self.partition.get(id.to_be_bytes())? {
            Some(value) => Ok(Some(
                serde_json::from_slice(&value)
                    .with_context(|| format!("Corrupt record: {id}"))?,
            )),
            None => Ok(None),
        }
    }

    fn write(&self, record: &T) -> Result<()> {
        self.partition
            .insert(record.id().to_be_bytes().to_vec(), serde_json::to_vec(record)?)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        Ok(())
    }

    /// Highest id ever handed out. Ledgers written before the counter existed
    /// fall back to the highest stored key.
    fn last_id(&self) -> Result<u64> {
        let counter = match self.meta.get(&self.counter_key)? {
            Some(value) => decode_id(&value)?,
            None => 0,
        };
        let highest_key = match self.partition.last_key_value()? {
            Some((key, _)) => decode_id(&key)?,
            None => 0,
        };
        Ok(counter.max(highest_key))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Ledger write lock poisoned"))
    }
}

#[async_trait]
impl<T: Record> RecordStore<T> for DiskStore<T> {
    async fn insert(&self, mut record: T) -> Result<T> {
        let _guard = self.lock()?;
        let id = self.last_id()?.checked_add(1).context("Record ids exhausted")?;
        record.set_id(id);

        // Row and counter are committed together.
        let mut batch = self.keyspace.batch();
        batch.insert(
            &self.partition,
            id.to_be_bytes().to_vec(),
            serde_json::to_vec(&record)?,
        );
        batch.insert(&self.meta, self.counter_key.clone(), id.to_be_bytes().to_vec());
        batch.commit()?;
        self.keyspace.persist(PersistMode::SyncAll)?;

        debug!("Store INSERT for id: {}", id);
        Ok(record)
    }

    async fn get(&self, owner: &str, id: u64) -> Result<Option<T>> {
        Ok(self.read(id)?.filter(|r| r.owner() == owner))
    }

    async fn update(&self, record: T) -> Result<bool> {
        let _guard = self.lock()?;
        match self.read(record.id())? {
            Some(existing) if existing.owner() == record.owner() => {
                self.write(&record)?;
                debug!("Store UPDATE for id: {}", record.id());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, owner: &str, id: u64) -> Result<bool> {
        let _guard = self.lock()?;
        match self.read(id)? {
            Some(existing) if existing.owner() == owner => {
                self.partition.remove(id.to_be_bytes().to_vec())?;
                self.keyspace.persist(PersistMode::SyncAll)?;
                debug!("Store DELETE for id: {}", id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn all(&self, owner: &str) -> Result<Vec<T>> {
        let mut rows = Vec::new();
        for item in self.partition.iter() {
            let (_, value) = item?;
            let row: T = serde_json::from_slice(&value).context("Corrupt record")?;
            if row.owner() == owner {
                rows.push(row);
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::sample;
    use crate::ledger::{Category, Transaction};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_disk_store_insert_get() {
        let dir = tempdir().unwrap();
        let db = LedgerDb::open(dir.path()).unwrap();
        let store = db.collection::<Transaction>("transactions").unwrap();

        // Initially, store is empty
        assert!(store.get("me", 1).await.unwrap().is_none());

        let first = store.insert(sample(0, "me", "2026-01-01", "Food")).await.unwrap();
        let second = store.insert(sample(0, "me", "2026-01-02", "Rent")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.get("me", 1).await.unwrap(), Some(first));
        assert!(store.get("you", 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disk_store_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let db = LedgerDb::open(dir.path()).unwrap();
            let store = db.collection::<Transaction>("transactions").unwrap();
            store.insert(sample(0, "me", "2026-01-01", "Food")).await.unwrap();
        }

        let db = LedgerDb::open(dir.path()).unwrap();
        let store = db.collection::<Transaction>("transactions").unwrap();
        let rows = store.all("me").await.unwrap();
        assert_eq!(rows.len(), 1);

        let next = store.insert(sample(0, "me", "2026-01-05", "Food")).await.unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn test_deleting_last_row_does_not_reuse_its_id() {
        let dir = tempdir().unwrap();
        {
            let db = LedgerDb::open(dir.path()).unwrap();
            let store = db.collection::<Transaction>("transactions").unwrap();
            store.insert(sample(0, "me", "2026-01-01", "Food")).await.unwrap();
            let last = store.insert(sample(0, "me", "2026-01-02", "Food")).await.unwrap();
            assert!(store.delete("me", last.id).await.unwrap());

            let next = store.insert(sample(0, "me", "2026-01-03", "Food")).await.unwrap();
            assert_eq!(next.id, 3);
            assert!(store.delete("me", next.id).await.unwrap());
        }

        // The counter is persisted, not derived from the remaining rows
        let db = LedgerDb::open(dir.path()).unwrap();
        let store = db.collection::<Transaction>("transactions").unwrap();
        let next = store.insert(sample(0, "me", "2026-01-04", "Food")).await.unwrap();
        assert_eq!(next.id, 4);
    }

    #[tokio::test]
    async fn test_collections_have_independent_ids() {
        let dir = tempdir().unwrap();
        let db = LedgerDb::open(dir.path()).unwrap();
        let transactions = db.collection::<Transaction>("transactions").unwrap();
        let categories = db.collection::<Category>("categories").unwrap();

        transactions
            .insert(sample(0, "me", "2026-01-01", "Food"))
            .await
            .unwrap();
        let food = categories
            .insert(Category::new("me", "Food", None))
            .await
            .unwrap();

        assert_eq!(food.id, 1);
        assert_eq!(categories.all("me").await.unwrap(), vec![food]);
    }

    #[tokio::test]
    async fn test_disk_store_update_delete() {
        let dir = tempdir().unwrap();
        let db = LedgerDb::open(dir.path()).unwrap();
        let store = db.collection::<Transaction>("transactions").unwrap();
        let mut tx = store.insert(sample(0, "me", "2026-01-01", "Food")).await.unwrap();

        tx.note = Some("weekly groceries".to_string());
        assert!(store.update(tx.clone()).await.unwrap());
        assert_eq!(store.get("me", tx.id).await.unwrap(), Some(tx.clone()));

        assert!(!store.delete("you", tx.id).await.unwrap());
        assert!(store.delete("me", tx.id).await.unwrap());
        assert!(store.all("me").await.unwrap().is_empty());
    }
}
