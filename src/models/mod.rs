// Vigil data models

pub mod assessment;
pub mod control;
pub mod history;
pub mod outcome;
pub mod pillar;
pub mod scan;
pub mod settings;

// Re-exports for convenience
pub use assessment::{AssessmentResult, AssessmentStatus, Severity};
pub use control::{ControlSpec, PillarId, ScanFlavor};
pub use history::ScanHistoryEntry;
pub use outcome::{AggregateScore, FailedPillar, FailureKind, OverallScore, ScanOutcome, ScanTotals};
pub use pillar::{PillarScore, SeverityCounts};
pub use scan::{ScanConfig, ScanRecord, ScanStatus};
pub use settings::{OracleSettings, ScanSettings, ScoreWeighting};
