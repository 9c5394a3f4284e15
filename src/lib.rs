// Vigil - cloud posture assessment scan orchestrator
// Module re-exports

pub mod catalog;
pub mod db;
pub mod error;
pub mod models;
pub mod oracle;
pub mod parser;
pub mod scan;
pub mod scoring;
pub mod utils;

// Re-export commonly used types
pub use models::{
    AggregateScore, AssessmentResult, AssessmentStatus, FailedPillar, FailureKind, OverallScore,
    PillarId, PillarScore, ScanHistoryEntry, ScanOutcome, ScanRecord, ScanSettings, ScanStatus,
    Severity,
};

pub use catalog::ControlCatalog;
pub use db::{get_db_path, ScanRecordStore, SqliteScanStore};
pub use error::{ConfigError, ParseError, ScanError, TaskFailure, ValidationError};
pub use oracle::{HttpOracleClient, OracleError, OracleRequest, ReasoningOracle};
pub use parser::ResponseRecoveryParser;
pub use scan::{AssessmentTask, ScanCoordinator};
pub use scoring::ScoreAggregator;
