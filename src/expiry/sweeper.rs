use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::clock::Clock;
use crate::storage::{Storage, StorageResult};

/// Outcome of one pass over the registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub swept_at: Option<DateTime<Utc>>,
    pub total: usize,
    pub active: usize,
    pub expired: usize,
    /// Codes that expired since the previous pass
    pub newly_expired: Vec<String>,
}

/// Count expired records without touching them.
///
/// `reported` carries `(short_code, id)` pairs already logged as expired so
/// each record is announced once. Pairs for records that no longer exist are
/// pruned, so a code deleted and re-created is reported again.
pub async fn sweep(
    storage: &dyn Storage,
    now: DateTime<Utc>,
    reported: &mut HashSet<(String, u64)>,
) -> StorageResult<SweepReport> {
    let records = storage.list().await?;

    let mut report = SweepReport {
        swept_at: Some(now),
        total: records.len(),
        ..SweepReport::default()
    };

    let mut still_expired = HashSet::with_capacity(reported.len());
    for record in &records {
        if !record.is_expired_at(now) {
            report.active += 1;
            continue;
        }

        report.expired += 1;
        let key = (record.short_code.clone(), record.id);
        if !reported.contains(&key) {
            report.newly_expired.push(record.short_code.clone());
        }
        still_expired.insert(key);
    }
    *reported = still_expired;

    Ok(report)
}

/// Background task that periodically logs expired mappings.
///
/// Observability only: the sweeper reads storage and never mutates it, so
/// stopping it at any point leaves the registry untouched.
pub struct ExpirySweeper {
    shutdown_tx: watch::Sender<bool>,
    report_rx: watch::Receiver<SweepReport>,
    handle: JoinHandle<()>,
}

impl ExpirySweeper {
    pub fn spawn(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let (report_tx, report_rx) = watch::channel(SweepReport::default());

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut reported = HashSet::new();

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match sweep(storage.as_ref(), clock.now(), &mut reported).await {
                            Ok(report) => {
                                for code in &report.newly_expired {
                                    tracing::info!(short_code = %code, "short url expired");
                                }
                                tracing::debug!(
                                    total = report.total,
                                    active = report.active,
                                    expired = report.expired,
                                    "expiry sweep complete"
                                );
                                report_tx.send_replace(report);
                            }
                            Err(e) => tracing::error!("Expiry sweep failed: {}", e),
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            tracing::info!("Expiry sweeper shutting down");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            report_rx,
            handle,
        }
    }

    /// Most recent sweep result (default until the first pass finishes)
    pub fn latest_report(&self) -> SweepReport {
        self.report_rx.borrow().clone()
    }

    /// Watch every report as it is published
    pub fn subscribe(&self) -> watch::Receiver<SweepReport> {
        self.report_rx.clone()
    }

    /// Signal the task to stop and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            tracing::error!("Expiry sweeper task failed: {}", e);
        }
    }
}
