//! Common test helpers for integration tests
//!
//! Provides an isolated on-disk store, a scripted oracle keyed by the pillar
//! named in each prompt, and a store wrapper that can be told to fail.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use vigil::models::{ScanConfig, ScanHistoryEntry, ScanRecord, ScanStatus};
use vigil::{ControlCatalog, OracleError, OracleRequest, PillarId, ReasoningOracle, ScanRecordStore, SqliteScanStore};

/// SQLite store in its own temporary directory
pub struct TestStore {
    #[allow(dead_code)]
    temp_dir: TempDir,
    pub store: Arc<SqliteScanStore>,
}

impl TestStore {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let store = SqliteScanStore::open(&temp_dir.path().join("vigil.db"))?;
        Ok(Self {
            temp_dir,
            store: Arc::new(store),
        })
    }
}

/// What the scripted oracle does for one pillar
#[derive(Debug, Clone)]
pub enum Behavior {
    Respond(String),
    Delay(Duration, String),
    Fail(OracleError),
    /// Fail with `error` for the first `times` calls, then respond
    FailTimes { times: usize, error: OracleError, body: String },
    /// Never answer
    Hang,
}

/// Oracle that answers per pillar, found via the `Pillar id:` prompt line.
/// Pillars without a script get every control passed.
#[derive(Default)]
pub struct ScriptedOracle {
    script: HashMap<PillarId, Behavior>,
    calls: AtomicUsize,
    calls_by_pillar: Mutex<HashMap<PillarId, usize>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, pillar: PillarId, behavior: Behavior) -> Self {
        self.script.insert(pillar, behavior);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, pillar: PillarId) -> usize {
        self.calls_by_pillar
            .lock()
            .unwrap()
            .get(&pillar)
            .copied()
            .unwrap_or(0)
    }

    fn record_call(&self, pillar: PillarId) -> usize {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut by_pillar = self.calls_by_pillar.lock().unwrap();
        let count = by_pillar.entry(pillar).or_insert(0);
        *count += 1;
        *count
    }
}

pub fn pillar_in_prompt(prompt: &str) -> Option<PillarId> {
    PillarId::ALL
        .into_iter()
        .find(|p| prompt.contains(&format!("Pillar id: {}\n", p.as_str())))
}

#[async_trait]
impl ReasoningOracle for ScriptedOracle {
    async fn complete(&self, request: OracleRequest) -> Result<String, OracleError> {
        let pillar = pillar_in_prompt(&request.prompt)
            .ok_or_else(|| OracleError::InvalidResponse("prompt names no pillar".to_string()))?;
        let attempt = self.record_call(pillar);

        let behavior = self
            .script
            .get(&pillar)
            .cloned()
            .unwrap_or_else(|| Behavior::Respond(all_pass(pillar)));

        match behavior {
            Behavior::Respond(body) => Ok(body),
            Behavior::Delay(delay, body) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            }
            Behavior::Fail(error) => Err(error),
            Behavior::FailTimes { times, error, body } => {
                if attempt <= times {
                    Err(error)
                } else {
                    Ok(body)
                }
            }
            Behavior::Hang => std::future::pending().await,
        }
    }
}

/// Every catalog control of `pillar` passed
pub fn all_pass(pillar: PillarId) -> String {
    let items: Vec<String> = ControlCatalog::controls(pillar)
        .iter()
        .map(|c| format!(r#"{{"control_id":"{}","status":"passed"}}"#, c.control_id))
        .collect();
    format!("[{}]", items.join(","))
}

/// `passed` controls passed and `failed` controls failed at high severity
pub fn mixed(pillar: PillarId, passed: usize, failed: usize) -> String {
    let controls = ControlCatalog::controls(pillar);
    assert!(passed + failed <= controls.len(), "not enough controls in {}", pillar);

    let items: Vec<String> = controls
        .iter()
        .take(passed + failed)
        .enumerate()
        .map(|(i, c)| {
            if i < passed {
                format!(r#"{{"control_id":"{}","status":"passed"}}"#, c.control_id)
            } else {
                format!(
                    r#"{{"control_id":"{}","status":"failed","severity":"high","remediation_steps":"Fix {}"}}"#,
                    c.control_id, c.control_id
                )
            }
        })
        .collect();
    format!("[{}]", items.join(","))
}

/// Store wrapper whose writes can be made to fail
pub struct FlakyStore {
    inner: Arc<SqliteScanStore>,
    pub fail_history: AtomicBool,
    pub fail_status: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Arc<SqliteScanStore>) -> Self {
        Self {
            inner,
            fail_history: AtomicBool::new(false),
            fail_status: AtomicBool::new(false),
        }
    }
}

impl ScanRecordStore for FlakyStore {
    fn create_scan(&self, organization_id: &str, config: &ScanConfig) -> Result<i64> {
        self.inner.create_scan(organization_id, config)
    }

    fn update_scan_status(&self, scan_id: i64, status: ScanStatus, completed_at: Option<&str>) -> Result<()> {
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(anyhow!("database is locked"));
        }
        self.inner.update_scan_status(scan_id, status, completed_at)
    }

    fn write_history_entry(&self, entry: &ScanHistoryEntry) -> Result<i64> {
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(anyhow!("disk I/O error"));
        }
        self.inner.write_history_entry(entry)
    }

    fn get_scan(&self, scan_id: i64) -> Result<Option<ScanRecord>> {
        self.inner.get_scan(scan_id)
    }

    fn list_scans(&self, organization_id: &str) -> Result<Vec<ScanRecord>> {
        self.inner.list_scans(organization_id)
    }

    fn latest_history_entry(&self, organization_id: &str) -> Result<Option<ScanHistoryEntry>> {
        self.inner.latest_history_entry(organization_id)
    }
}
