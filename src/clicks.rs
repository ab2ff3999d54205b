use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{RegistryError, RegistryResult};
use crate::storage::Storage;

/// Turns a resolution attempt into a recorded click
#[derive(Clone)]
pub struct ClickRecorder {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
}

impl ClickRecorder {
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Record one click and hand back the URL to redirect to.
    ///
    /// Fails with `NotFound` for unknown codes and `Expired` once the TTL has
    /// passed; neither failure changes the record.
    pub async fn record_click(
        &self,
        short_code: &str,
        referrer: Option<&str>,
    ) -> RegistryResult<String> {
        match self
            .storage
            .record_click(short_code, referrer, self.clock.as_ref())
            .await
        {
            Ok(original_url) => {
                tracing::debug!(short_code = %short_code, referrer = ?referrer, "click recorded");
                Ok(original_url)
            }
            Err(err) => {
                let err = RegistryError::from_storage(err, short_code);
                if let RegistryError::Storage(ref e) = err {
                    tracing::warn!(short_code = %short_code, error = %e, "failed to record click");
                }
                Err(err)
            }
        }
    }
}
