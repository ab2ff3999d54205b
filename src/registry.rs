//! Public entry point for creating, resolving and inspecting short URLs
//!
//! [`Registry`] wires storage, the code generator, the click recorder and the
//! analytics aggregator together behind the operations a transport layer
//! needs. It is cheap to clone and safe to share across tasks.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use url::Url;

use crate::analytics::{self, AnalyticsAggregator};
use crate::clicks::ClickRecorder;
use crate::clock::{Clock, SystemClock};
use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::expiry::{self, ExpirySweeper};
use crate::models::{ClickEvent, MappingRecord, MappingRecordView, RegistryStats};
use crate::shortcode::{validate_custom_code, CodeGenerator, RandomCodeGenerator};
use crate::storage::{MemoryStorage, Storage, StorageError};

#[derive(Clone)]
pub struct Registry {
    config: Arc<RegistryConfig>,
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    generator: Arc<dyn CodeGenerator>,
    recorder: ClickRecorder,
    analytics: AnalyticsAggregator,
}

impl Registry {
    pub fn new(config: RegistryConfig, storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        let generator = Arc::new(RandomCodeGenerator::new(config.short_code_length));
        Self {
            recorder: ClickRecorder::new(Arc::clone(&storage), Arc::clone(&clock)),
            analytics: AnalyticsAggregator::new(Arc::clone(&storage), Arc::clone(&clock)),
            config: Arc::new(config),
            storage,
            clock,
            generator,
        }
    }

    /// In-memory registry on the wall clock
    pub fn in_memory(config: RegistryConfig) -> Self {
        Self::new(config, Arc::new(MemoryStorage::new()), Arc::new(SystemClock))
    }

    /// Replace the random code generator
    pub fn with_generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Shorten `original_url`, using `custom_code` when given or a fresh
    /// random code otherwise. `validity_minutes` defaults to the configured
    /// default validity.
    pub async fn create_short_url(
        &self,
        original_url: &str,
        custom_code: Option<&str>,
        validity_minutes: Option<i64>,
    ) -> RegistryResult<MappingRecordView> {
        validate_url(original_url)?;
        let validity = self.validity(validity_minutes)?;
        if let Some(code) = custom_code {
            validate_custom_code(
                code,
                self.config.custom_code_min_length,
                self.config.custom_code_max_length,
            )?;
        }

        let created_at = self.clock.now();
        let expires_at = expiry::expires_at(created_at, validity).ok_or_else(|| {
            RegistryError::InvalidValidity {
                minutes: validity,
                min: self.config.min_validity_minutes.max(1),
                max: self.config.max_validity_minutes,
            }
        })?;

        let record = match custom_code {
            Some(code) => self
                .storage
                .create_with_code(code, original_url, created_at, expires_at)
                .await
                .map_err(|e| RegistryError::from_storage(e, code))?,
            None => {
                self.insert_generated(original_url, created_at, expires_at)
                    .await?
            }
        };

        tracing::info!(
            short_code = %record.short_code,
            expires_at = %record.expires_at,
            "short url created"
        );
        Ok(self.view(&record))
    }

    /// Resolve a code to its original URL, recording the click
    pub async fn resolve(&self, short_code: &str, referrer: Option<&str>) -> RegistryResult<String> {
        self.recorder.record_click(short_code, referrer).await
    }

    pub async fn delete_short_url(&self, short_code: &str) -> RegistryResult<()> {
        let deleted = self
            .storage
            .delete(short_code)
            .await
            .map_err(|e| RegistryError::from_storage(e, short_code))?;
        if deleted {
            tracing::info!(short_code = %short_code, "short url deleted");
            Ok(())
        } else {
            Err(RegistryError::NotFound(short_code.to_string()))
        }
    }

    /// Fetch one mapping without counting a click; expired mappings are
    /// still returned
    pub async fn lookup(&self, short_code: &str) -> RegistryResult<MappingRecordView> {
        let record = self.record(short_code).await?;
        Ok(self.view(&record))
    }

    /// Every mapping, most recently created first
    pub async fn list_all(&self) -> RegistryResult<Vec<MappingRecordView>> {
        let now = self.clock.now();
        let records = self
            .storage
            .list()
            .await
            .map_err(RegistryError::from_listing)?;
        Ok(records
            .iter()
            .map(|record| record.to_view(&self.config.base_url, now))
            .collect())
    }

    pub async fn stats(&self) -> RegistryResult<RegistryStats> {
        self.analytics
            .stats()
            .await
            .map_err(RegistryError::from_listing)
    }

    /// The `n` most clicked mappings
    pub async fn top_performers(&self, n: usize) -> RegistryResult<Vec<MappingRecordView>> {
        let now = self.clock.now();
        let records = self
            .analytics
            .top_by_clicks(n)
            .await
            .map_err(RegistryError::from_listing)?;
        Ok(records
            .iter()
            .map(|record| record.to_view(&self.config.base_url, now))
            .collect())
    }

    /// The last `k` clicks on a mapping, most recent first
    pub async fn recent_activity(
        &self,
        short_code: &str,
        k: usize,
    ) -> RegistryResult<Vec<ClickEvent>> {
        let record = self.record(short_code).await?;
        Ok(analytics::recent_activity(&record, k))
    }

    pub async fn referrer_breakdown(&self, short_code: &str) -> RegistryResult<Vec<(String, u64)>> {
        let record = self.record(short_code).await?;
        Ok(analytics::referrer_breakdown(&record))
    }

    /// Start the periodic expiry logger at the configured interval
    pub fn start_sweeper(&self) -> ExpirySweeper {
        ExpirySweeper::spawn(
            Arc::clone(&self.storage),
            Arc::clone(&self.clock),
            Duration::from_secs(self.config.sweep_interval_secs),
        )
    }

    fn validity(&self, validity_minutes: Option<i64>) -> RegistryResult<i64> {
        let minutes = validity_minutes.unwrap_or(self.config.default_validity_minutes);
        // Expiry must land strictly after creation
        let (min, max) = (
            self.config.min_validity_minutes.max(1),
            self.config.max_validity_minutes,
        );
        if minutes < min || minutes > max {
            return Err(RegistryError::InvalidValidity { minutes, min, max });
        }
        Ok(minutes)
    }

    /// Draw random codes until one inserts cleanly.
    ///
    /// The insert itself is the uniqueness check, so two callers drawing the
    /// same code cannot both win.
    async fn insert_generated(
        &self,
        original_url: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> RegistryResult<MappingRecord> {
        let attempts = self.config.max_allocation_attempts;
        for attempt in 1..=attempts {
            let code = self.generator.generate();
            match self
                .storage
                .create_with_code(&code, original_url, created_at, expires_at)
                .await
            {
                Ok(record) => return Ok(record),
                Err(StorageError::Conflict) => {
                    tracing::warn!(short_code = %code, attempt, "generated short code collided, retrying");
                }
                Err(e) => return Err(RegistryError::from_storage(e, &code)),
            }
        }

        tracing::warn!(attempts, "gave up allocating a random short code");
        Err(RegistryError::AllocationExhausted { attempts })
    }

    async fn record(&self, short_code: &str) -> RegistryResult<MappingRecord> {
        self.storage
            .get(short_code)
            .await
            .map_err(|e| RegistryError::from_storage(e, short_code))?
            .ok_or_else(|| RegistryError::NotFound(short_code.to_string()))
    }

    fn view(&self, record: &MappingRecord) -> MappingRecordView {
        record.to_view(&self.config.base_url, self.clock.now())
    }
}

/// Accept any syntactically valid absolute URL
fn validate_url(original_url: &str) -> RegistryResult<()> {
    if original_url.trim().is_empty() {
        return Err(RegistryError::InvalidUrl("URL cannot be empty".to_string()));
    }

    Url::parse(original_url)
        .map(|_| ())
        .map_err(|e| RegistryError::InvalidUrl(format!("{original_url}: {e}")))
}
