use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[serde(rename = "critical")]
    Critical,
    #[serde(rename = "high")]
    High,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "low")]
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    /// Case-insensitive, since the oracle is inconsistent about casing
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentStatus {
    #[serde(rename = "passed")]
    Passed,
    #[serde(rename = "failed")]
    Failed,
}

impl AssessmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentStatus::Passed => "passed",
            AssessmentStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "passed" | "pass" => Some(AssessmentStatus::Passed),
            "failed" | "fail" => Some(AssessmentStatus::Failed),
            _ => None,
        }
    }
}

/// One control judged by the oracle.
///
/// `control_name` and `severity` stay `None` when the oracle omitted them;
/// nothing here is ever synthesized from outside the response text except
/// a catalog name copied in by the assessment task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssessmentResult {
    pub control_id: String,
    pub control_name: Option<String>,
    pub status: AssessmentStatus,
    pub severity: Option<Severity>,
    #[serde(default)]
    pub evidence: Value,
    pub remediation_steps: Option<String>,
}

impl AssessmentResult {
    pub fn passed(control_id: &str) -> Self {
        Self {
            control_id: control_id.to_string(),
            control_name: None,
            status: AssessmentStatus::Passed,
            severity: None,
            evidence: Value::Null,
            remediation_steps: None,
        }
    }

    pub fn failed(control_id: &str, severity: Severity, remediation: &str) -> Self {
        Self {
            control_id: control_id.to_string(),
            control_name: None,
            status: AssessmentStatus::Failed,
            severity: Some(severity),
            evidence: Value::Null,
            remediation_steps: Some(remediation.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == AssessmentStatus::Failed
    }

    /// Failed results are expected to carry remediation steps
    pub fn missing_remediation(&self) -> bool {
        self.is_failed() && self.remediation_steps.is_none()
    }
}
