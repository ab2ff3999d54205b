//! Time-to-live policy for mappings
//!
//! Expiry is a pure function of a record and a reference time. Expired
//! records stay in storage; they only stop resolving.

mod sweeper;

use chrono::{DateTime, TimeDelta, Utc};

use crate::models::MappingRecord;

pub use sweeper::{sweep, ExpirySweeper, SweepReport};

/// True once `now` is strictly past the record's expiry instant
pub fn is_expired(record: &MappingRecord, now: DateTime<Utc>) -> bool {
    now > record.expires_at
}

/// Expiry instant for a mapping created at `created_at`, or `None` when it
/// falls outside the representable range
pub fn expires_at(created_at: DateTime<Utc>, validity_minutes: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_minutes(validity_minutes).and_then(|ttl| created_at.checked_add_signed(ttl))
}
