use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::models::{ClickEvent, MappingRecord, RegistryStats};
use crate::storage::{Storage, StorageResult};

/// Totals and the active/expired split at `now`
pub fn summarize(records: &[MappingRecord], now: DateTime<Utc>) -> RegistryStats {
    records
        .iter()
        .fold(RegistryStats::default(), |mut stats, record| {
            stats.total_urls += 1;
            stats.total_clicks += record.click_count;
            if record.is_expired_at(now) {
                stats.expired_urls += 1;
            } else {
                stats.active_urls += 1;
            }
            stats
        })
}

/// Records by click count descending; ties go to the earlier-created record
pub fn top_by_clicks(mut records: Vec<MappingRecord>, n: usize) -> Vec<MappingRecord> {
    records.sort_by(|a, b| b.click_count.cmp(&a.click_count).then(a.id.cmp(&b.id)));
    records.truncate(n);
    records
}

/// The last `k` clicks, most recent first
pub fn recent_activity(record: &MappingRecord, k: usize) -> Vec<ClickEvent> {
    record.click_history.iter().rev().take(k).cloned().collect()
}

/// Click counts per referrer, highest first, then alphabetical
pub fn referrer_breakdown(record: &MappingRecord) -> Vec<(String, u64)> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for click in &record.click_history {
        *counts.entry(click.referrer.as_str()).or_insert(0) += 1;
    }

    let mut result: Vec<(String, u64)> = counts
        .into_iter()
        .map(|(referrer, count)| (referrer.to_string(), count))
        .collect();
    result.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    result
}

/// Computes registry-wide analytics on demand
#[derive(Clone)]
pub struct AnalyticsAggregator {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
}

impl AnalyticsAggregator {
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    pub async fn stats(&self) -> StorageResult<RegistryStats> {
        let records = self.storage.list().await?;
        Ok(summarize(&records, self.clock.now()))
    }

    pub async fn total_count(&self) -> usize {
        self.storage.len().await
    }

    pub async fn total_clicks(&self) -> StorageResult<u64> {
        Ok(self.stats().await?.total_clicks)
    }

    pub async fn active_count(&self) -> StorageResult<usize> {
        Ok(self.stats().await?.active_urls)
    }

    pub async fn expired_count(&self) -> StorageResult<usize> {
        Ok(self.stats().await?.expired_urls)
    }

    pub async fn top_by_clicks(&self, n: usize) -> StorageResult<Vec<MappingRecord>> {
        let records = self.storage.list().await?;
        Ok(top_by_clicks(records, n))
    }
}
