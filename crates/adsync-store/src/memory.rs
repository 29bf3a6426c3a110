//! In-memory [`AdRecordStore`] backend.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use adsync_shared::AdRecord;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::store::{AdRecordPatch, AdRecordStore, NewAdRecord};

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<Uuid, AdRecord>,
    by_source: HashMap<String, Uuid>,
    /// Source ids of deleted records. They stay reserved.
    retired: HashSet<String>,
}

/// Records kept in a lock-protected map. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryAdStore {
    inner: RwLock<Inner>,
}

impl MemoryAdStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|g| g.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AdRecordStore for MemoryAdStore {
    fn create(&self, new: NewAdRecord) -> Result<AdRecord> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;

        if guard.by_source.contains_key(&new.source_id) || guard.retired.contains(&new.source_id) {
            return Err(StoreError::DuplicateSourceId(new.source_id));
        }

        let record = new.into_record(Utc::now());
        guard.by_source.insert(record.source_id.clone(), record.id);
        guard.records.insert(record.id, record.clone());

        debug!(id = %record.id, source_id = %record.source_id, "Stored ad record");
        Ok(record)
    }

    fn get_by_id(&self, id: Uuid) -> Result<Option<AdRecord>> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.records.get(&id).cloned())
    }

    fn get_by_source_id(&self, source_id: &str) -> Result<Option<AdRecord>> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard
            .by_source
            .get(source_id)
            .and_then(|id| guard.records.get(id))
            .cloned())
    }

    fn list_by_owner(&self, owner_id: &str) -> Result<Vec<AdRecord>> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut records: Vec<AdRecord> = guard
            .records
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    fn update(&self, id: Uuid, patch: AdRecordPatch) -> Result<AdRecord> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        let record = guard.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        patch.apply(record, Utc::now());
        Ok(record.clone())
    }

    fn delete(&self, id: Uuid) -> Result<bool> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        match guard.records.remove(&id) {
            Some(record) => {
                guard.by_source.remove(&record.source_id);
                guard.retired.insert(record.source_id);
                debug!(id = %id, "Deleted ad record");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
