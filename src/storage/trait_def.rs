use crate::clock::Clock;
use crate::models::MappingRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short code already exists")]
    Conflict,
    #[error("short code not found")]
    NotFound,
    #[error("short code has expired")]
    Expired,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Owner of all mapping records.
///
/// Every method is atomic with respect to the others for the record it
/// touches; no caller ever holds a reference into storage.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert a new record under `short_code`, failing with `Conflict` if the
    /// code is currently stored (expired or not)
    async fn create_with_code(
        &self,
        short_code: &str,
        original_url: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<MappingRecord>;

    /// Get a snapshot of a record by short code
    async fn get(&self, short_code: &str) -> StorageResult<Option<MappingRecord>>;

    /// Remove a record, returning whether it existed
    async fn delete(&self, short_code: &str) -> StorageResult<bool>;

    /// Append a click and bump the counter, unless the record is expired.
    ///
    /// `clock` is read while the record is locked, so click history stays in
    /// timestamp order under concurrent clicks. Returns the original URL.
    async fn record_click(
        &self,
        short_code: &str,
        referrer: Option<&str>,
        clock: &dyn Clock,
    ) -> StorageResult<String>;

    /// All records, most recently created first
    async fn list(&self) -> StorageResult<Vec<MappingRecord>>;

    async fn len(&self) -> usize;
}
