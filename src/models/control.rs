use serde::{Deserialize, Serialize};

/// A single checkable requirement inside a pillar
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ControlSpec {
    pub control_id: &'static str,
    pub control_name: &'static str,
}

impl ControlSpec {
    pub const fn new(control_id: &'static str, control_name: &'static str) -> Self {
        Self {
            control_id,
            control_name,
        }
    }
}

/// Which family of assessment a pillar belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScanFlavor {
    WellArchitected,
    Compliance,
}

/// Closed set of pillars and compliance frameworks a scan can evaluate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PillarId {
    OperationalExcellence,
    Security,
    Reliability,
    PerformanceEfficiency,
    CostOptimization,
    Sustainability,
    CisAws,
    Lgpd,
    PciDss,
    Soc2,
}

impl PillarId {
    pub const ALL: [PillarId; 10] = [
        PillarId::OperationalExcellence,
        PillarId::Security,
        PillarId::Reliability,
        PillarId::PerformanceEfficiency,
        PillarId::CostOptimization,
        PillarId::Sustainability,
        PillarId::CisAws,
        PillarId::Lgpd,
        PillarId::PciDss,
        PillarId::Soc2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PillarId::OperationalExcellence => "operational_excellence",
            PillarId::Security => "security",
            PillarId::Reliability => "reliability",
            PillarId::PerformanceEfficiency => "performance_efficiency",
            PillarId::CostOptimization => "cost_optimization",
            PillarId::Sustainability => "sustainability",
            PillarId::CisAws => "cis_aws",
            PillarId::Lgpd => "lgpd",
            PillarId::PciDss => "pci_dss",
            PillarId::Soc2 => "soc2",
        }
    }

    /// Accepts the snake_case id, case-insensitively, with `-` allowed for `_`
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        PillarId::ALL
            .into_iter()
            .find(|pillar| pillar.as_str() == normalized)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PillarId::OperationalExcellence => "Operational Excellence",
            PillarId::Security => "Security",
            PillarId::Reliability => "Reliability",
            PillarId::PerformanceEfficiency => "Performance Efficiency",
            PillarId::CostOptimization => "Cost Optimization",
            PillarId::Sustainability => "Sustainability",
            PillarId::CisAws => "CIS AWS Foundations Benchmark",
            PillarId::Lgpd => "LGPD",
            PillarId::PciDss => "PCI DSS",
            PillarId::Soc2 => "SOC 2",
        }
    }

    pub fn flavor(&self) -> ScanFlavor {
        match self {
            PillarId::CisAws | PillarId::Lgpd | PillarId::PciDss | PillarId::Soc2 => {
                ScanFlavor::Compliance
            }
            _ => ScanFlavor::WellArchitected,
        }
    }

    /// The six AWS Well-Architected pillars
    pub fn well_architected() -> Vec<PillarId> {
        PillarId::ALL
            .into_iter()
            .filter(|p| p.flavor() == ScanFlavor::WellArchitected)
            .collect()
    }

    pub fn compliance_frameworks() -> Vec<PillarId> {
        PillarId::ALL
            .into_iter()
            .filter(|p| p.flavor() == ScanFlavor::Compliance)
            .collect()
    }
}

impl std::fmt::Display for PillarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
