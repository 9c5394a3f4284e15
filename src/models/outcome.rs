use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{PillarId, PillarScore, ScanStatus, SeverityCounts};

/// Overall score, or an explicit marker that no pillar produced data.
///
/// Serializes as a bare number or `null`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OverallScore {
    Score(f64),
    NoData,
}

impl OverallScore {
    pub fn value(&self) -> Option<f64> {
        match self {
            OverallScore::Score(v) => Some(*v),
            OverallScore::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, OverallScore::NoData)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    OracleUnavailable,
    OracleTimeout,
    Parse,
    Cancelled,
    Aborted,
}

/// A pillar that produced no score, and why
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailedPillar {
    pub pillar_id: PillarId,
    pub kind: FailureKind,
    pub reason: String,
}

/// Check counts summed over the surviving pillars
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ScanTotals {
    pub total_checks: u32,
    pub passed_checks: u32,
    pub failed_checks: u32,
    pub severity_totals: SeverityCounts,
}

/// Output of the score aggregator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateScore {
    pub overall_score: OverallScore,
    pub pillar_scores: BTreeMap<PillarId, f64>,
    pub totals: ScanTotals,
}

/// What a caller gets back from a scan run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanOutcome {
    pub scan_id: i64,
    pub organization_id: String,
    pub status: ScanStatus,
    pub overall_score: OverallScore,
    pub pillars: Vec<PillarScore>,
    pub failed_pillars: Vec<FailedPillar>,
    pub totals: ScanTotals,
}

impl ScanOutcome {
    pub fn failed_pillar_ids(&self) -> Vec<PillarId> {
        self.failed_pillars.iter().map(|f| f.pillar_id).collect()
    }

    pub fn pillar(&self, pillar_id: PillarId) -> Option<&PillarScore> {
        self.pillars.iter().find(|p| p.pillar_id == pillar_id)
    }
}
