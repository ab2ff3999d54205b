use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::expiry;

/// Referrer recorded when the caller supplies none
pub const DIRECT_REFERRER: &str = "Direct";

/// One successful resolution of a short code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub timestamp: DateTime<Utc>,
    pub referrer: String,
}

impl ClickEvent {
    /// A missing or empty referrer is recorded as [`DIRECT_REFERRER`]; any
    /// other value is kept exactly as supplied
    pub fn new(timestamp: DateTime<Utc>, referrer: Option<&str>) -> Self {
        let referrer = referrer
            .filter(|r| !r.is_empty())
            .unwrap_or(DIRECT_REFERRER)
            .to_string();
        Self {
            timestamp,
            referrer,
        }
    }
}

/// A stored short code mapping.
///
/// `id` is assigned by storage on insert and grows with every insert, so it
/// orders records by creation even when two share a `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingRecord {
    pub id: u64,
    pub short_code: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub click_count: u64,
    pub click_history: Vec<ClickEvent>,
}

impl MappingRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        expiry::is_expired(self, now)
    }

    /// Project into the read-only shape handed to callers
    pub fn to_view(&self, base_url: &str, now: DateTime<Utc>) -> MappingRecordView {
        MappingRecordView {
            short_code: self.short_code.clone(),
            short_url: short_url(base_url, &self.short_code),
            original_url: self.original_url.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at,
            click_count: self.click_count,
            click_history: self.click_history.clone(),
            is_expired: self.is_expired_at(now),
        }
    }
}

/// Joins a base URL and a short code with exactly one slash between them
pub fn short_url(base_url: &str, short_code: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), short_code)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRecordView {
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub click_count: u64,
    pub click_history: Vec<ClickEvent>,
    pub is_expired: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_urls: usize,
    pub total_clicks: u64,
    pub active_urls: usize,
    pub expired_urls: usize,
}
