use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::{get_db_path, migrations, queries};
use crate::models::{ScanConfig, ScanHistoryEntry, ScanRecord, ScanStatus};

/// Durable record of scans and their history snapshots
pub trait ScanRecordStore: Send + Sync {
    /// Insert a `running` scan record and return its id
    fn create_scan(&self, organization_id: &str, config: &ScanConfig) -> Result<i64>;

    /// Move a running scan to a terminal status
    fn update_scan_status(&self, scan_id: i64, status: ScanStatus, completed_at: Option<&str>) -> Result<()>;

    /// Append the history snapshot for a scan; at most one per scan
    fn write_history_entry(&self, entry: &ScanHistoryEntry) -> Result<i64>;

    fn get_scan(&self, scan_id: i64) -> Result<Option<ScanRecord>>;

    /// Newest first
    fn list_scans(&self, organization_id: &str) -> Result<Vec<ScanRecord>>;

    fn latest_history_entry(&self, organization_id: &str) -> Result<Option<ScanHistoryEntry>>;
}

/// SQLite-backed store. One connection, serialized behind a mutex.
pub struct SqliteScanStore {
    conn: Mutex<Connection>,
}

impl SqliteScanStore {
    /// Open (or create) the database file and run migrations
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open database at {:?}", path))?;

        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .context("Failed to enable WAL mode")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        debug!(path = %path.display(), "Opened scan database");
        Self::init(conn)
    }

    /// Open the database under `VIGIL_DATA_DIR`
    pub fn open_default() -> Result<Self> {
        Self::open(&get_db_path()?)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")
            .context("Failed to enable foreign keys")?;
        migrations::run_migrations(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ScanRecordStore for SqliteScanStore {
    fn create_scan(&self, organization_id: &str, config: &ScanConfig) -> Result<i64> {
        let record = ScanRecord::new(organization_id, config.clone());
        queries::insert_scan(&self.conn(), &record)
    }

    fn update_scan_status(&self, scan_id: i64, status: ScanStatus, completed_at: Option<&str>) -> Result<()> {
        queries::update_scan_status(&self.conn(), scan_id, status, completed_at)
    }

    fn write_history_entry(&self, entry: &ScanHistoryEntry) -> Result<i64> {
        queries::insert_history_entry(&self.conn(), entry)
    }

    fn get_scan(&self, scan_id: i64) -> Result<Option<ScanRecord>> {
        queries::select_scan(&self.conn(), scan_id)
    }

    fn list_scans(&self, organization_id: &str) -> Result<Vec<ScanRecord>> {
        queries::select_scans(&self.conn(), organization_id)
    }

    fn latest_history_entry(&self, organization_id: &str) -> Result<Option<ScanHistoryEntry>> {
        queries::select_latest_history(&self.conn(), organization_id)
    }
}
