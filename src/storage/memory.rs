use crate::clock::Clock;
use crate::expiry;
use crate::models::{ClickEvent, MappingRecord};
use crate::storage::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory storage backed by a DashMap.
///
/// DashMap shards its locks, so the check-and-insert in `create_with_code`
/// and the check-and-append in `record_click` each run under the write lock
/// of the shard that owns the code, while other codes proceed in parallel.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    urls: DashMap<String, MappingRecord>,
    next_id: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_with_code(
        &self,
        short_code: &str,
        original_url: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<MappingRecord> {
        match self.urls.entry(short_code.to_string()) {
            Entry::Occupied(_) => Err(StorageError::Conflict),
            Entry::Vacant(slot) => {
                let record = MappingRecord {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
                    short_code: short_code.to_string(),
                    original_url: original_url.to_string(),
                    created_at,
                    expires_at,
                    click_count: 0,
                    click_history: Vec::new(),
                };
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn get(&self, short_code: &str) -> StorageResult<Option<MappingRecord>> {
        Ok(self.urls.get(short_code).map(|entry| entry.value().clone()))
    }

    async fn delete(&self, short_code: &str) -> StorageResult<bool> {
        Ok(self.urls.remove(short_code).is_some())
    }

    async fn record_click(
        &self,
        short_code: &str,
        referrer: Option<&str>,
        clock: &dyn Clock,
    ) -> StorageResult<String> {
        let mut entry = self.urls.get_mut(short_code).ok_or(StorageError::NotFound)?;
        let record = entry.value_mut();

        let now = clock.now();
        if expiry::is_expired(record, now) {
            return Err(StorageError::Expired);
        }

        record.click_history.push(ClickEvent::new(now, referrer));
        record.click_count += 1;
        Ok(record.original_url.clone())
    }

    async fn list(&self) -> StorageResult<Vec<MappingRecord>> {
        let mut records: Vec<MappingRecord> = self
            .urls
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(records)
    }

    async fn len(&self) -> usize {
        self.urls.len()
    }
}
