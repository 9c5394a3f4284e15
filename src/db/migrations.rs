use anyhow::{Context, Result};
use rusqlite::Connection;

const SCHEMA_VERSION: i64 = 2;

/// Get current database schema version
fn get_schema_version(conn: &Connection) -> Result<i64> {
    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .context("Failed to get schema version")?;
    Ok(version)
}

/// Set database schema version
fn set_schema_version(conn: &Connection, version: i64) -> Result<()> {
    conn.execute(&format!("PRAGMA user_version = {}", version), [])
        .context("Failed to set schema version")?;
    Ok(())
}

/// Migrate from v0 (empty) to v1: scan lifecycle records
fn migrate_to_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS scans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            organization_id TEXT NOT NULL,
            status TEXT NOT NULL
                CHECK(status IN ('pending', 'running', 'completed', 'failed')),
            scan_config TEXT NOT NULL,
            created_at TEXT NOT NULL,
            completed_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_scans_organization_id ON scans(organization_id);",
    )
    .context("Failed to execute v1 schema migration")?;

    Ok(())
}

/// Migrate from v1 to v2: one append-only history snapshot per scan
fn migrate_to_v2(conn: &Connection) -> Result<()> {
    // overall_score is NULL when no pillar produced data
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS scan_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            scan_id INTEGER NOT NULL UNIQUE,
            organization_id TEXT NOT NULL,
            overall_score REAL,
            pillar_scores TEXT NOT NULL,
            total_checks INTEGER NOT NULL DEFAULT 0,
            passed_checks INTEGER NOT NULL DEFAULT 0,
            failed_checks INTEGER NOT NULL DEFAULT 0,
            critical_count INTEGER NOT NULL DEFAULT 0,
            high_count INTEGER NOT NULL DEFAULT 0,
            medium_count INTEGER NOT NULL DEFAULT 0,
            low_count INTEGER NOT NULL DEFAULT 0,
            pillar_details TEXT NOT NULL,
            failed_pillars TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (scan_id) REFERENCES scans(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_scan_history_org_created
            ON scan_history(organization_id, created_at);",
    )
    .context("Failed to execute v2 schema migration")?;

    Ok(())
}

/// Bring the schema up to date. Safe to call on every open.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_to_v1(conn)?;
        set_schema_version(conn, 1)?;
    }

    if current_version < 2 {
        migrate_to_v2(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    }

    Ok(())
}
