//! Scan-level aggregation over surviving pillars

use std::collections::BTreeMap;

use super::pillar::round_two;
use crate::models::{AggregateScore, OverallScore, PillarScore, ScanTotals, ScoreWeighting};

/// Combines surviving pillar scores into the scan-level score
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreAggregator {
    weighting: ScoreWeighting,
}

impl ScoreAggregator {
    pub fn new(weighting: ScoreWeighting) -> Self {
        Self { weighting }
    }

    /// Aggregate the pillars that produced a score.
    ///
    /// Failed pillars are simply absent from `pillars`; they never count as
    /// zero. With no pillars at all the overall score is `NoData`.
    pub fn aggregate(&self, pillars: &[PillarScore]) -> AggregateScore {
        let mut totals = ScanTotals::default();
        let mut pillar_scores = BTreeMap::new();

        for pillar in pillars {
            totals.total_checks += pillar.total_checks();
            totals.passed_checks += pillar.passed_count;
            totals.failed_checks += pillar.failed_count;
            totals.severity_totals.add(&pillar.severity_counts);
            pillar_scores.insert(pillar.pillar_id, pillar.score);
        }

        AggregateScore {
            overall_score: self.overall(pillars),
            pillar_scores,
            totals,
        }
    }

    fn overall(&self, pillars: &[PillarScore]) -> OverallScore {
        if pillars.is_empty() {
            return OverallScore::NoData;
        }

        let unweighted = || {
            let sum: f64 = pillars.iter().map(|p| p.score).sum();
            sum / pillars.len() as f64
        };

        let mean = match self.weighting {
            ScoreWeighting::Unweighted => unweighted(),
            ScoreWeighting::ByCheckCount => {
                let weight: u32 = pillars.iter().map(|p| p.total_checks()).sum();
                if weight == 0 {
                    unweighted()
                } else {
                    let weighted: f64 = pillars
                        .iter()
                        .map(|p| p.score * p.total_checks() as f64)
                        .sum();
                    weighted / weight as f64
                }
            }
        };

        OverallScore::Score(round_two(mean))
    }
}
