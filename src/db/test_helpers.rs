//! Test isolation and database setup helpers
//!
//! Each guard owns a temporary directory, so tests never share a database file

use super::{migrations, SqliteScanStore, DB_FILE_NAME};
use rusqlite::Connection;

pub struct TestDbGuard {
    pub temp_dir: tempfile::TempDir,
}

impl TestDbGuard {
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().unwrap();
        TestDbGuard { temp_dir }
    }

    pub fn db_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join(DB_FILE_NAME)
    }

    /// Open a fresh database with the current schema
    pub fn init_db(&self) -> anyhow::Result<Connection> {
        let conn = Connection::open(self.db_path())
            .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;

        conn.execute("PRAGMA foreign_keys = ON", [])
            .map_err(|e| anyhow::anyhow!("Failed to enable foreign keys: {}", e))?;

        migrations::run_migrations(&conn)?;

        Ok(conn)
    }

    pub fn store(&self) -> anyhow::Result<SqliteScanStore> {
        SqliteScanStore::open(&self.db_path())
    }
}

impl Default for TestDbGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_isolation() {
        let guard1 = TestDbGuard::new();
        let guard2 = TestDbGuard::new();
        assert_ne!(guard1.db_path(), guard2.db_path());

        let conn1 = guard1.init_db().expect("Failed to initialize database");
        conn1
            .execute(
                "INSERT INTO scans (organization_id, status, scan_config, created_at) VALUES ('org', 'running', '{}', 'now')",
                [],
            )
            .unwrap();

        let conn2 = guard2.init_db().expect("Failed to initialize database");
        let count: i64 = conn2
            .query_row("SELECT COUNT(*) FROM scans", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
