use serde::{Deserialize, Serialize};

use super::{PillarId, ScanSettings, ScoreWeighting};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "failed")]
    Failed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Pending => "pending",
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ScanStatus::Pending),
            "running" => Some(ScanStatus::Running),
            "completed" => Some(ScanStatus::Completed),
            "failed" => Some(ScanStatus::Failed),
            _ => None,
        }
    }
}

/// Parameters a scan was launched with, stored alongside the record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanConfig {
    pub pillars: Vec<PillarId>,
    pub task_timeout_ms: u64,
    pub scan_timeout_ms: Option<u64>,
    pub max_output_tokens: u32,
    pub max_retries: u32,
    pub weighting: ScoreWeighting,
}

impl ScanConfig {
    pub fn new(pillars: &[PillarId], settings: &ScanSettings) -> Self {
        Self {
            pillars: pillars.to_vec(),
            task_timeout_ms: settings.task_timeout.as_millis() as u64,
            scan_timeout_ms: settings.scan_timeout.map(|t| t.as_millis() as u64),
            max_output_tokens: settings.max_output_tokens,
            max_retries: settings.max_retries,
            weighting: settings.weighting,
        }
    }
}

/// Lifecycle record of one scan execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanRecord {
    pub id: i64,
    pub organization_id: String,
    pub status: ScanStatus,
    pub scan_config: ScanConfig,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl ScanRecord {
    pub fn new(organization_id: &str, scan_config: ScanConfig) -> Self {
        Self {
            id: 0,
            organization_id: organization_id.to_string(),
            status: ScanStatus::Running,
            scan_config,
            created_at: chrono::Utc::now().to_rfc3339(),
            completed_at: None,
        }
    }
}
