//! Session storage backends.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store;
use tower_sessions::SessionStore;

/// In-process store backed by a concurrent map.
///
/// Records past their expiry are invisible to `load` and dropped by
/// [`MemoryStore::purge_expired`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<Id, Record>>,
}

fn is_live(record: &Record, now: OffsetDateTime) -> bool {
    record.expiry_date > now
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, expired or not.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// An unexpired record by id.
    pub fn find(&self, id: &Id) -> Option<Record> {
        let record = self.inner.get(id)?;
        is_live(&record, OffsetDateTime::now_utc()).then(|| record.value().clone())
    }

    /// Drop every expired record, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        let before = self.inner.len();
        self.inner.retain(|_, record| is_live(record, now));
        before.saturating_sub(self.inner.len())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        while self.inner.contains_key(&record.id) {
            record.id = Id::default();
        }
        self.inner.insert(record.id, record.clone());
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.inner.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, id: &Id) -> session_store::Result<Option<Record>> {
        Ok(self.find(id))
    }

    async fn delete(&self, id: &Id) -> session_store::Result<()> {
        self.inner.remove(id);
        Ok(())
    }
}
