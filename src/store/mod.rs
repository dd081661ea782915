pub mod disk;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

pub use disk::{DiskStore, LedgerDb};
pub use memory::MemoryStore;

/// A row owned by one user, keyed by a store assigned id.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn id(&self) -> u64;
    fn set_id(&mut self, id: u64);
    fn owner(&self) -> &str;
}

/// Persistence for owner scoped records. Every read is scoped to an owner.
///
/// Ids are never reused, even after the highest id is deleted.
#[async_trait]
pub trait RecordStore<T: Record>: Send + Sync {
    /// Stores `record` under a freshly assigned id and returns it.
    async fn insert(&self, record: T) -> Result<T>;

    async fn get(&self, owner: &str, id: u64) -> Result<Option<T>>;

    /// Replaces an existing row. Returns `false` when the id is unknown for the owner.
    async fn update(&self, record: T) -> Result<bool>;

    async fn delete(&self, owner: &str, id: u64) -> Result<bool>;

    /// All rows of `owner` in id order.
    async fn all(&self, owner: &str) -> Result<Vec<T>>;
}
