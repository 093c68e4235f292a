//! Item persistence seam
//!
//! Analysis never writes to a store; callers persist the records they accept.
use async_trait::async_trait;
use dashmap::DashMap;
use error_types::AppResult;
use uuid::Uuid;

use crate::models::ItemRecord;

/// Storage for accepted records, partitioned by realm (a shared household inventory)
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn save(&self, realm: &str, record: ItemRecord) -> AppResult<Uuid>;

    async fn read(&self, realm: &str, id: Uuid) -> AppResult<Option<ItemRecord>>;

    /// Removing a missing record is not an error
    async fn delete(&self, realm: &str, id: Uuid) -> AppResult<()>;
}

/// Process-local store for development and tests
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    items: DashMap<(String, Uuid), ItemRecord>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn save(&self, realm: &str, record: ItemRecord) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        self.items.insert((realm.to_string(), id), record);
        Ok(id)
    }

    async fn read(&self, realm: &str, id: Uuid) -> AppResult<Option<ItemRecord>> {
        Ok(self
            .items
            .get(&(realm.to_string(), id))
            .map(|entry| entry.value().clone()))
    }

    async fn delete(&self, realm: &str, id: Uuid) -> AppResult<()> {
        self.items.remove(&(realm.to_string(), id));
        Ok(())
    }
}
