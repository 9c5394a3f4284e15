//! Scan orchestration
//!
//! A scan validates its pillar set, records itself as running, launches one
//! assessment task per pillar all at once, waits for every task, aggregates
//! whatever succeeded and persists the result exactly once.

use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::task::AssessmentTask;
use crate::catalog::ControlCatalog;
use crate::db::ScanRecordStore;
use crate::error::{ScanError, TaskFailure};
use crate::models::{
    FailedPillar, PillarId, PillarScore, ScanConfig, ScanHistoryEntry, ScanOutcome, ScanSettings,
    ScanStatus,
};
use crate::oracle::ReasoningOracle;
use crate::scoring::ScoreAggregator;

pub struct ScanCoordinator {
    oracle: Arc<dyn ReasoningOracle>,
    store: Arc<dyn ScanRecordStore>,
    settings: ScanSettings,
}

impl ScanCoordinator {
    pub fn new(oracle: Arc<dyn ReasoningOracle>, store: Arc<dyn ScanRecordStore>, settings: ScanSettings) -> Self {
        Self {
            oracle,
            store,
            settings,
        }
    }

    /// Run one scan to completion.
    ///
    /// Individual pillar failures are reported on the outcome, never as an
    /// error. Only configuration and persistence problems return `Err`.
    pub async fn run_scan(
        &self,
        organization_id: &str,
        pillars: &[PillarId],
        context: Value,
    ) -> Result<ScanOutcome, ScanError> {
        self.run_scan_with_cancel(organization_id, pillars, context, CancellationToken::new())
            .await
    }

    /// Like `run_scan`, but outstanding tasks finish as `Cancelled` once
    /// `cancel` fires. Pillars that already finished are kept.
    pub async fn run_scan_with_cancel(
        &self,
        organization_id: &str,
        pillars: &[PillarId],
        context: Value,
        cancel: CancellationToken,
    ) -> Result<ScanOutcome, ScanError> {
        if organization_id.trim().is_empty() {
            return Err(ScanError::Configuration(
                "Organization id cannot be empty".to_string(),
            ));
        }
        ControlCatalog::validate(pillars)?;

        let started = Instant::now();
        let config = ScanConfig::new(pillars, &self.settings);
        let org = organization_id.to_string();
        let scan_id = on_store(&self.store, move |store| store.create_scan(&org, &config))
            .await
            .map_err(ScanError::Persistence)?;

        info!(
            scan_id,
            organization_id,
            pillars = pillars.len(),
            "Scan started"
        );

        // Cancelled when the caller cancels, the scan deadline fires, or this
        // function returns
        let scan_token = cancel.child_token();
        let _scan_guard = scan_token.clone().drop_guard();
        if let Some(limit) = self.settings.scan_timeout {
            spawn_scan_deadline(scan_token.clone(), limit, scan_id);
        }

        let context = Arc::new(context);
        let mut handles: Vec<(PillarId, JoinHandle<Result<PillarScore, TaskFailure>>)> =
            Vec::with_capacity(pillars.len());

        for &pillar in pillars {
            let task = AssessmentTask::new(pillar, Arc::clone(&context), &self.settings);
            let oracle = Arc::clone(&self.oracle);
            let token = scan_token.clone();

            let handle = tokio::spawn(async move { task.evaluate(oracle.as_ref(), &token).await });
            handles.push((pillar, handle));
        }

        let mut scores = Vec::with_capacity(handles.len());
        let mut failed = Vec::new();

        for (pillar, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(TaskFailure::Aborted(e.to_string())),
            };

            match result {
                Ok(score) => scores.push(score),
                Err(failure) => {
                    warn!(
                        scan_id,
                        pillar = %pillar,
                        kind = ?failure.kind(),
                        error = %failure,
                        "Pillar assessment failed"
                    );
                    failed.push(FailedPillar {
                        pillar_id: pillar,
                        kind: failure.kind(),
                        reason: failure.to_string(),
                    });
                }
            }
        }

        let aggregate = ScoreAggregator::new(self.settings.weighting).aggregate(&scores);
        let status = if scores.is_empty() {
            ScanStatus::Failed
        } else {
            ScanStatus::Completed
        };

        let entry = ScanHistoryEntry::new(scan_id, organization_id, &aggregate, &scores, &failed);
        self.persist(scan_id, entry, status).await?;

        info!(
            scan_id,
            status = status.as_str(),
            overall_score = ?aggregate.overall_score.value(),
            succeeded = scores.len(),
            failed = failed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scan finished"
        );

        Ok(ScanOutcome {
            scan_id,
            organization_id: organization_id.to_string(),
            status,
            overall_score: aggregate.overall_score,
            pillars: scores,
            failed_pillars: failed,
            totals: aggregate.totals,
        })
    }

    /// Write the history entry, then the terminal status.
    ///
    /// On any write failure the scan is marked failed on a best-effort basis
    /// and the original error is returned.
    async fn persist(&self, scan_id: i64, entry: ScanHistoryEntry, status: ScanStatus) -> Result<(), ScanError> {
        let completed_at = chrono::Utc::now().to_rfc3339();

        let stamp = completed_at.clone();
        let written = on_store(&self.store, move |store| {
            store.write_history_entry(&entry)?;
            store.update_scan_status(scan_id, status, Some(&stamp))
        })
        .await;

        if let Err(e) = written {
            error!(scan_id, error = %format!("{:#}", e), "Failed to persist scan result");
            let marked = on_store(&self.store, move |store| {
                store.update_scan_status(scan_id, ScanStatus::Failed, Some(&completed_at))
            })
            .await;
            if let Err(mark_err) = marked {
                warn!(scan_id, error = %format!("{:#}", mark_err), "Could not mark scan as failed");
            }
            return Err(ScanError::Persistence(e));
        }

        Ok(())
    }
}

/// Run a store call on the blocking pool so SQLite I/O never stalls a
/// runtime worker
async fn on_store<T, F>(store: &Arc<dyn ScanRecordStore>, call: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn ScanRecordStore) -> anyhow::Result<T> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || call(store.as_ref()))
        .await
        .map_err(|e| anyhow::anyhow!("Store task did not complete: {}", e))?
}

fn spawn_scan_deadline(token: CancellationToken, limit: Duration, scan_id: i64) {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::time::sleep(limit) => {
                warn!(scan_id, limit_ms = limit.as_millis() as u64, "Scan deadline reached, cancelling outstanding tasks");
                token.cancel();
            }
        }
    });
}
