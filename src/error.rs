use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid short code: {0}")]
    InvalidShortcodeFormat(String),
    #[error("short code already exists: {0}")]
    ShortcodeTaken(String),
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("short code has expired: {0}")]
    Expired(String),
    #[error("validity of {minutes} minutes is outside [{min}, {max}]")]
    InvalidValidity { minutes: i64, min: i64, max: i64 },
    #[error("no free short code found after {attempts} attempts")]
    AllocationExhausted { attempts: u32 },
    #[error("storage error: {0}")]
    Storage(#[source] anyhow::Error),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

impl RegistryError {
    /// Stable name of the error kind, for transports that map errors to codes
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "InvalidUrl",
            Self::InvalidShortcodeFormat(_) => "InvalidShortcodeFormat",
            Self::ShortcodeTaken(_) => "ShortcodeTaken",
            Self::NotFound(_) => "NotFound",
            Self::Expired(_) => "Expired",
            Self::InvalidValidity { .. } => "InvalidValidity",
            Self::AllocationExhausted { .. } => "AllocationExhausted",
            Self::Storage(_) => "Storage",
        }
    }

    /// Map a storage failure onto the short code it concerned
    pub(crate) fn from_storage(err: StorageError, short_code: &str) -> Self {
        match err {
            StorageError::Conflict => Self::ShortcodeTaken(short_code.to_string()),
            StorageError::NotFound => Self::NotFound(short_code.to_string()),
            StorageError::Expired => Self::Expired(short_code.to_string()),
            StorageError::Other(e) => Self::Storage(e),
        }
    }

    /// Map a failure from a read that spans the whole store; no single code
    /// can be blamed, so every variant is a storage fault
    pub(crate) fn from_listing(err: StorageError) -> Self {
        match err {
            StorageError::Other(e) => Self::Storage(e),
            other => Self::Storage(anyhow::anyhow!("listing mappings failed: {other}")),
        }
    }
}
