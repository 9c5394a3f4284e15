//! Per-pillar score from assessment results

use crate::models::{AssessmentResult, PillarId, PillarScore, SeverityCounts};

/// Round to two decimal places
pub fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Turn one pillar's results into its score.
///
/// Score is the pass percentage. A pillar with no checks scores 100.
/// Severity counts cover failed results only; a failed result with no
/// severity is counted as failed but in no bucket.
pub fn score_pillar(pillar_id: PillarId, results: Vec<AssessmentResult>) -> PillarScore {
    let mut passed_count = 0u32;
    let mut failed_count = 0u32;
    let mut severity_counts = SeverityCounts::default();

    for result in &results {
        if result.is_failed() {
            failed_count += 1;
            if let Some(severity) = result.severity {
                severity_counts.record(severity);
            }
        } else {
            passed_count += 1;
        }
    }

    let total = passed_count + failed_count;
    let score = if total == 0 {
        100.0
    } else {
        round_two(passed_count as f64 / total as f64 * 100.0)
    };

    PillarScore {
        pillar_id,
        score,
        passed_count,
        failed_count,
        severity_counts,
        results,
    }
}
