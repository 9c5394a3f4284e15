use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{AggregateScore, FailedPillar, OverallScore, PillarId, PillarScore, SeverityCounts};

/// Append-only snapshot written once per scan after aggregation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanHistoryEntry {
    pub id: i64,
    pub scan_id: i64,
    pub organization_id: String,
    pub overall_score: OverallScore,
    pub pillar_scores: BTreeMap<PillarId, f64>,
    pub total_checks: u32,
    pub passed_checks: u32,
    pub failed_checks: u32,
    pub severity_totals: SeverityCounts,
    pub pillar_details: Vec<PillarScore>,
    pub failed_pillars: Vec<FailedPillar>,
    pub created_at: String,
}

impl ScanHistoryEntry {
    pub fn new(
        scan_id: i64,
        organization_id: &str,
        aggregate: &AggregateScore,
        pillars: &[PillarScore],
        failed_pillars: &[FailedPillar],
    ) -> Self {
        Self {
            id: 0,
            scan_id,
            organization_id: organization_id.to_string(),
            overall_score: aggregate.overall_score,
            pillar_scores: aggregate.pillar_scores.clone(),
            total_checks: aggregate.totals.total_checks,
            passed_checks: aggregate.totals.passed_checks,
            failed_checks: aggregate.totals.failed_checks,
            severity_totals: aggregate.totals.severity_totals,
            pillar_details: pillars.to_vec(),
            failed_pillars: failed_pillars.to_vec(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
