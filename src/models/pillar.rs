use serde::{Deserialize, Serialize};

use super::{AssessmentResult, PillarId, Severity};

/// Failed-check counts bucketed by severity
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeverityCounts {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl SeverityCounts {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    pub fn add(&mut self, other: &SeverityCounts) {
        self.critical += other.critical;
        self.high += other.high;
        self.medium += other.medium;
        self.low += other.low;
    }
}

/// Score for one pillar, derived from its assessment results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PillarScore {
    pub pillar_id: PillarId,
    pub score: f64,
    pub passed_count: u32,
    pub failed_count: u32,
    pub severity_counts: SeverityCounts,
    pub results: Vec<AssessmentResult>,
}

impl PillarScore {
    pub fn total_checks(&self) -> u32 {
        self.passed_count + self.failed_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_counts_record_and_add() {
        let mut a = SeverityCounts::default();
        a.record(Severity::High);
        a.record(Severity::High);
        a.record(Severity::Low);

        let mut b = SeverityCounts::default();
        b.record(Severity::Critical);
        b.add(&a);

        assert_eq!(
            b,
            SeverityCounts {
                critical: 1,
                high: 2,
                medium: 0,
                low: 1,
            }
        );
    }
}
