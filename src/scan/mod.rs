//! Scan coordination and per-pillar assessment tasks

pub mod coordinator;
pub mod task;

pub use coordinator::ScanCoordinator;
pub use task::AssessmentTask;
