use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(12);
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4096;
pub const DEFAULT_MAX_RETRIES: u32 = 1;
pub const DEFAULT_API_BASE: &str = "https://api.x.ai/v1";
pub const DEFAULT_MODEL: &str = "grok-code-fast-1";

/// How pillar scores combine into the overall score
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoreWeighting {
    #[default]
    Unweighted,
    ByCheckCount,
}

impl ScoreWeighting {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreWeighting::Unweighted => "unweighted",
            ScoreWeighting::ByCheckCount => "by_check_count",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "unweighted" => Some(ScoreWeighting::Unweighted),
            "by_check_count" => Some(ScoreWeighting::ByCheckCount),
            _ => None,
        }
    }
}

/// Runtime knobs for a scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSettings {
    /// Deadline for each assessment task, retries included
    pub task_timeout: Duration,
    /// Optional deadline for the whole scan
    pub scan_timeout: Option<Duration>,
    pub max_output_tokens: u32,
    /// Extra attempts for transient oracle errors
    pub max_retries: u32,
    pub weighting: ScoreWeighting,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            task_timeout: DEFAULT_TASK_TIMEOUT,
            scan_timeout: None,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            max_retries: DEFAULT_MAX_RETRIES,
            weighting: ScoreWeighting::Unweighted,
        }
    }
}

/// Connection details for the HTTP oracle
#[derive(Clone, PartialEq)]
pub struct OracleSettings {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
}

// Keeps the key out of logs
impl std::fmt::Debug for OracleSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleSettings")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}
