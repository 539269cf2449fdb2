//! Periodic purge of lapsed revocation entries and refresh sessions.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use kydohub_core::result::AppResult;
use kydohub_database::Store;
use kydohub_database::repositories::{RefreshSessionRepository, RevocationRepository};

/// Counts removed by one cleanup cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Revocation entries past their expiry.
    pub revocations: u64,
    /// Refresh sessions past their expiry.
    pub refresh_sessions: u64,
}

/// Background housekeeping over the durable stores.
#[derive(Clone)]
pub struct Housekeeping {
    revocations: Arc<dyn RevocationRepository>,
    sessions: Arc<dyn RefreshSessionRepository>,
}

impl std::fmt::Debug for Housekeeping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Housekeeping").finish()
    }
}

impl Housekeeping {
    /// Creates a housekeeping handler over `store`.
    pub fn new(store: &Store) -> Self {
        Self {
            revocations: store.revocations.clone(),
            sessions: store.refresh_sessions.clone(),
        }
    }

    /// Run one cleanup cycle.
    pub async fn run_cleanup(&self) -> AppResult<CleanupReport> {
        let now = Utc::now();
        let report = CleanupReport {
            revocations: self.revocations.purge_expired(now).await?,
            refresh_sessions: self.sessions.purge_expired(now).await?,
        };

        if report == CleanupReport::default() {
            debug!("Cleanup found nothing to purge");
        } else {
            info!(
                revocations = report.revocations,
                refresh_sessions = report.refresh_sessions,
                "Cleanup completed"
            );
        }
        Ok(report)
    }

    /// Run cleanup every `every` until the task is aborted.
    pub fn spawn(self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_cleanup().await {
                    error!(error = %e, "Cleanup cycle failed");
                }
            }
        })
    }
}
