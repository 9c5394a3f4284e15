use anyhow::{anyhow, bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{OverallScore, ScanConfig, ScanHistoryEntry, ScanRecord, ScanStatus, SeverityCounts};

// ===== SCAN CRUD =====

pub fn insert_scan(conn: &Connection, record: &ScanRecord) -> Result<i64> {
    let scan_config =
        serde_json::to_string(&record.scan_config).context("Failed to serialize scan config")?;

    conn.execute(
        "INSERT INTO scans (organization_id, status, scan_config, created_at, completed_at) VALUES (?, ?, ?, ?, ?)",
        params![
            record.organization_id,
            record.status.as_str(),
            scan_config,
            record.created_at,
            record.completed_at,
        ],
    )
    .context("Failed to insert scan")?;

    Ok(conn.last_insert_rowid())
}

/// Raw scan columns, converted after the row is read
struct ScanRow {
    id: i64,
    organization_id: String,
    status: String,
    scan_config: String,
    created_at: String,
    completed_at: Option<String>,
}

impl ScanRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            organization_id: row.get(1)?,
            status: row.get(2)?,
            scan_config: row.get(3)?,
            created_at: row.get(4)?,
            completed_at: row.get(5)?,
        })
    }

    fn into_record(self) -> Result<ScanRecord> {
        let status = ScanStatus::from_str(&self.status)
            .ok_or_else(|| anyhow!("Unknown scan status '{}' for scan {}", self.status, self.id))?;
        let scan_config: ScanConfig = serde_json::from_str(&self.scan_config)
            .with_context(|| format!("Failed to decode scan config for scan {}", self.id))?;

        Ok(ScanRecord {
            id: self.id,
            organization_id: self.organization_id,
            status,
            scan_config,
            created_at: self.created_at,
            completed_at: self.completed_at,
        })
    }
}

const SCAN_COLUMNS: &str = "id, organization_id, status, scan_config, created_at, completed_at";

pub fn select_scan(conn: &Connection, id: i64) -> Result<Option<ScanRecord>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {} FROM scans WHERE id = ?", SCAN_COLUMNS))
        .context("Failed to prepare select scan query")?;

    let row = stmt
        .query_row(params![id], ScanRow::from_row)
        .optional()
        .context("Failed to query scan")?;

    row.map(ScanRow::into_record).transpose()
}

/// Scans for one organization, newest first
pub fn select_scans(conn: &Connection, organization_id: &str) -> Result<Vec<ScanRecord>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM scans WHERE organization_id = ? ORDER BY created_at DESC, id DESC",
            SCAN_COLUMNS
        ))
        .context("Failed to prepare select scans query")?;

    let rows = stmt
        .query_map(params![organization_id], ScanRow::from_row)
        .context("Failed to map scans from query")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect scans")?;

    rows.into_iter().map(ScanRow::into_record).collect()
}

/// Move a running scan to its terminal status.
///
/// Fails if the scan does not exist or has already left `running`, so a
/// scan can be finalized at most once.
pub fn update_scan_status(
    conn: &Connection,
    id: i64,
    status: ScanStatus,
    completed_at: Option<&str>,
) -> Result<()> {
    let changed = conn
        .execute(
            "UPDATE scans SET status = ?, completed_at = ? WHERE id = ? AND status = 'running'",
            params![status.as_str(), completed_at, id],
        )
        .context("Failed to update scan status")?;

    if changed == 0 {
        bail!("Scan {} is not running; status was not updated to {}", id, status.as_str());
    }

    Ok(())
}

// ===== SCAN HISTORY =====

pub fn insert_history_entry(conn: &Connection, entry: &ScanHistoryEntry) -> Result<i64> {
    let pillar_scores =
        serde_json::to_string(&entry.pillar_scores).context("Failed to serialize pillar scores")?;
    let pillar_details =
        serde_json::to_string(&entry.pillar_details).context("Failed to serialize pillar details")?;
    let failed_pillars =
        serde_json::to_string(&entry.failed_pillars).context("Failed to serialize failed pillars")?;

    conn.execute(
        "INSERT INTO scan_history (scan_id, organization_id, overall_score, pillar_scores, total_checks, passed_checks, failed_checks, critical_count, high_count, medium_count, low_count, pillar_details, failed_pillars, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            entry.scan_id,
            entry.organization_id,
            entry.overall_score.value(),
            pillar_scores,
            entry.total_checks,
            entry.passed_checks,
            entry.failed_checks,
            entry.severity_totals.critical,
            entry.severity_totals.high,
            entry.severity_totals.medium,
            entry.severity_totals.low,
            pillar_details,
            failed_pillars,
            entry.created_at,
        ],
    )
    .with_context(|| format!("Failed to insert history entry for scan {}", entry.scan_id))?;

    Ok(conn.last_insert_rowid())
}

struct HistoryRow {
    id: i64,
    scan_id: i64,
    organization_id: String,
    overall_score: Option<f64>,
    pillar_scores: String,
    total_checks: u32,
    passed_checks: u32,
    failed_checks: u32,
    severity_totals: SeverityCounts,
    pillar_details: String,
    failed_pillars: String,
    created_at: String,
}

impl HistoryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            scan_id: row.get(1)?,
            organization_id: row.get(2)?,
            overall_score: row.get(3)?,
            pillar_scores: row.get(4)?,
            total_checks: row.get(5)?,
            passed_checks: row.get(6)?,
            failed_checks: row.get(7)?,
            severity_totals: SeverityCounts {
                critical: row.get(8)?,
                high: row.get(9)?,
                medium: row.get(10)?,
                low: row.get(11)?,
            },
            pillar_details: row.get(12)?,
            failed_pillars: row.get(13)?,
            created_at: row.get(14)?,
        })
    }

    fn into_entry(self) -> Result<ScanHistoryEntry> {
        Ok(ScanHistoryEntry {
            id: self.id,
            scan_id: self.scan_id,
            organization_id: self.organization_id,
            overall_score: self
                .overall_score
                .map(OverallScore::Score)
                .unwrap_or(OverallScore::NoData),
            pillar_scores: serde_json::from_str(&self.pillar_scores)
                .context("Failed to decode pillar scores")?,
            total_checks: self.total_checks,
            passed_checks: self.passed_checks,
            failed_checks: self.failed_checks,
            severity_totals: self.severity_totals,
            pillar_details: serde_json::from_str(&self.pillar_details)
                .context("Failed to decode pillar details")?,
            failed_pillars: serde_json::from_str(&self.failed_pillars)
                .context("Failed to decode failed pillars")?,
            created_at: self.created_at,
        })
    }
}

/// Most recent history snapshot for an organization
pub fn select_latest_history(conn: &Connection, organization_id: &str) -> Result<Option<ScanHistoryEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, scan_id, organization_id, overall_score, pillar_scores, total_checks, passed_checks, failed_checks, critical_count, high_count, medium_count, low_count, pillar_details, failed_pillars, created_at
             FROM scan_history WHERE organization_id = ? ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .context("Failed to prepare select history query")?;

    let row = stmt
        .query_row(params![organization_id], HistoryRow::from_row)
        .optional()
        .context("Failed to query scan history")?;

    row.map(HistoryRow::into_entry).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_helpers::TestDbGuard;
    use crate::models::{
        AggregateScore, AssessmentResult, FailedPillar, FailureKind, PillarId, ScanSettings, Severity,
    };
    use crate::scoring::{score_pillar, ScoreAggregator};

    fn running_record(org: &str) -> ScanRecord {
        ScanRecord::new(org, ScanConfig::new(&[PillarId::Security, PillarId::Reliability], &ScanSettings::default()))
    }

    #[test]
    fn test_insert_and_select_scan() {
        let guard = TestDbGuard::new();
        let conn = guard.init_db().unwrap();

        let id = insert_scan(&conn, &running_record("org-1")).unwrap();
        let scan = select_scan(&conn, id).unwrap().unwrap();

        assert_eq!(scan.id, id);
        assert_eq!(scan.organization_id, "org-1");
        assert_eq!(scan.status, ScanStatus::Running);
        assert_eq!(scan.scan_config.pillars, vec![PillarId::Security, PillarId::Reliability]);
        assert!(scan.completed_at.is_none());
    }

    #[test]
    fn test_select_scan_missing() {
        let guard = TestDbGuard::new();
        let conn = guard.init_db().unwrap();
        assert!(select_scan(&conn, 999).unwrap().is_none());
    }

    #[test]
    fn test_select_scans_filters_by_organization() {
        let guard = TestDbGuard::new();
        let conn = guard.init_db().unwrap();

        insert_scan(&conn, &running_record("org-1")).unwrap();
        insert_scan(&conn, &running_record("org-1")).unwrap();
        insert_scan(&conn, &running_record("org-2")).unwrap();

        assert_eq!(select_scans(&conn, "org-1").unwrap().len(), 2);
        assert_eq!(select_scans(&conn, "org-2").unwrap().len(), 1);
        assert!(select_scans(&conn, "org-3").unwrap().is_empty());
    }

    #[test]
    fn test_update_scan_status_once() {
        let guard = TestDbGuard::new();
        let conn = guard.init_db().unwrap();
        let id = insert_scan(&conn, &running_record("org-1")).unwrap();

        update_scan_status(&conn, id, ScanStatus::Completed, Some("2026-01-01T00:00:00Z")).unwrap();
        let scan = select_scan(&conn, id).unwrap().unwrap();
        assert_eq!(scan.status, ScanStatus::Completed);
        assert_eq!(scan.completed_at.as_deref(), Some("2026-01-01T00:00:00Z"));

        // already terminal
        assert!(update_scan_status(&conn, id, ScanStatus::Failed, None).is_err());
    }

    #[test]
    fn test_history_entry_round_trip() {
        let guard = TestDbGuard::new();
        let conn = guard.init_db().unwrap();
        let scan_id = insert_scan(&conn, &running_record("org-1")).unwrap();

        let pillars = vec![score_pillar(
            PillarId::Security,
            vec![
                AssessmentResult::passed("SEC01"),
                AssessmentResult::failed("SEC02", Severity::Critical, "Enforce MFA"),
            ],
        )];
        let failed = vec![FailedPillar {
            pillar_id: PillarId::Reliability,
            kind: FailureKind::OracleTimeout,
            reason: "Oracle timed out after 12000ms".to_string(),
        }];
        let aggregate = ScoreAggregator::default().aggregate(&pillars);
        let entry = ScanHistoryEntry::new(scan_id, "org-1", &aggregate, &pillars, &failed);

        let id = insert_history_entry(&conn, &entry).unwrap();
        let loaded = select_latest_history(&conn, "org-1").unwrap().unwrap();

        assert_eq!(loaded.id, id);
        assert_eq!(loaded.overall_score, OverallScore::Score(50.0));
        assert_eq!(loaded.pillar_scores[&PillarId::Security], 50.0);
        assert_eq!(loaded.severity_totals.critical, 1);
        assert_eq!(loaded.pillar_details, pillars);
        assert_eq!(loaded.failed_pillars, failed);
    }

    #[test]
    fn test_history_no_data_stored_as_null() {
        let guard = TestDbGuard::new();
        let conn = guard.init_db().unwrap();
        let scan_id = insert_scan(&conn, &running_record("org-1")).unwrap();

        let aggregate: AggregateScore = ScoreAggregator::default().aggregate(&[]);
        let entry = ScanHistoryEntry::new(scan_id, "org-1", &aggregate, &[], &[]);
        insert_history_entry(&conn, &entry).unwrap();

        let raw: Option<f64> = conn
            .query_row("SELECT overall_score FROM scan_history WHERE scan_id = ?", params![scan_id], |row| row.get(0))
            .unwrap();
        assert!(raw.is_none());

        let loaded = select_latest_history(&conn, "org-1").unwrap().unwrap();
        assert!(loaded.overall_score.is_no_data());
    }

    #[test]
    fn test_history_entry_once_per_scan() {
        let guard = TestDbGuard::new();
        let conn = guard.init_db().unwrap();
        let scan_id = insert_scan(&conn, &running_record("org-1")).unwrap();

        let aggregate = ScoreAggregator::default().aggregate(&[]);
        let entry = ScanHistoryEntry::new(scan_id, "org-1", &aggregate, &[], &[]);
        insert_history_entry(&conn, &entry).unwrap();
        assert!(insert_history_entry(&conn, &entry).is_err());
    }
}
