//! Static control catalog
//!
//! Maps each `PillarId` to its ordered, immutable list of controls. Pillar
//! names coming from callers are resolved here once; nothing deeper in the
//! scan path matches on strings.

use std::collections::HashSet;

use crate::error::ScanError;
use crate::models::{ControlSpec, PillarId};

const OPERATIONAL_EXCELLENCE: &[ControlSpec] = &[
    ControlSpec::new("OPS01", "CloudTrail enabled in all regions"),
    ControlSpec::new("OPS02", "CloudWatch alarms on critical metrics"),
    ControlSpec::new("OPS03", "Infrastructure managed as code"),
    ControlSpec::new("OPS04", "Resources consistently tagged"),
    ControlSpec::new("OPS05", "Runbooks automated with Systems Manager"),
];

const SECURITY: &[ControlSpec] = &[
    ControlSpec::new("SEC01", "Root account protected with MFA"),
    ControlSpec::new("SEC02", "IAM users enforce MFA"),
    ControlSpec::new("SEC03", "No wildcard IAM policies attached"),
    ControlSpec::new("SEC04", "S3 buckets block public access"),
    ControlSpec::new("SEC05", "Security groups restrict 0.0.0.0/0 ingress"),
    ControlSpec::new("SEC06", "Data at rest encrypted with KMS"),
    ControlSpec::new("SEC07", "GuardDuty enabled"),
];

const RELIABILITY: &[ControlSpec] = &[
    ControlSpec::new("REL01", "Databases deployed Multi-AZ"),
    ControlSpec::new("REL02", "Automated backups with retention"),
    ControlSpec::new("REL03", "Auto Scaling groups span availability zones"),
    ControlSpec::new("REL04", "Load balancer health checks configured"),
    ControlSpec::new("REL05", "Service quotas monitored"),
];

const PERFORMANCE_EFFICIENCY: &[ControlSpec] = &[
    ControlSpec::new("PERF01", "Instance families are current generation"),
    ControlSpec::new("PERF02", "Compute right-sized to utilization"),
    ControlSpec::new("PERF03", "Caching layer in front of hot reads"),
    ControlSpec::new("PERF04", "CDN used for static content"),
];

const COST_OPTIMIZATION: &[ControlSpec] = &[
    ControlSpec::new("COST01", "No idle or unattached resources"),
    ControlSpec::new("COST02", "Savings Plans or Reserved Instances cover steady load"),
    ControlSpec::new("COST03", "S3 lifecycle policies configured"),
    ControlSpec::new("COST04", "Budgets and cost anomaly alerts configured"),
    ControlSpec::new("COST05", "Unused Elastic IPs released"),
];

const SUSTAINABILITY: &[ControlSpec] = &[
    ControlSpec::new("SUS01", "Graviton instances used where compatible"),
    ControlSpec::new("SUS02", "Non-production workloads scheduled off-hours"),
    ControlSpec::new("SUS03", "Regions selected for lower carbon intensity"),
    ControlSpec::new("SUS04", "Data retention minimized"),
];

const CIS_AWS: &[ControlSpec] = &[
    ControlSpec::new("CIS-1.4", "No root account access keys exist"),
    ControlSpec::new("CIS-1.5", "MFA enabled for the root account"),
    ControlSpec::new("CIS-1.8", "IAM password policy requires minimum length of 14"),
    ControlSpec::new("CIS-2.1.1", "S3 bucket default encryption enabled"),
    ControlSpec::new("CIS-3.1", "CloudTrail enabled in all regions"),
    ControlSpec::new("CIS-4.1", "Log metric filter for unauthorized API calls"),
    ControlSpec::new("CIS-5.2", "No security group allows ingress from 0.0.0.0/0 to admin ports"),
];

const LGPD: &[ControlSpec] = &[
    ControlSpec::new("LGPD-ART37", "Records of personal data processing operations kept"),
    ControlSpec::new("LGPD-ART46", "Technical measures protect personal data"),
    ControlSpec::new("LGPD-ART47", "Data security maintained after processing ends"),
    ControlSpec::new("LGPD-ART48", "Security incidents reported to the ANPD"),
    ControlSpec::new("LGPD-ART49", "Systems designed to meet security standards"),
];

const PCI_DSS: &[ControlSpec] = &[
    ControlSpec::new("PCI-1.3", "Network access to cardholder data environment restricted"),
    ControlSpec::new("PCI-3.5", "Stored account data protected with strong cryptography"),
    ControlSpec::new("PCI-8.4", "MFA implemented for access to the CDE"),
    ControlSpec::new("PCI-10.2", "Audit logs capture user activity"),
    ControlSpec::new("PCI-11.3", "Vulnerability scans performed regularly"),
];

const SOC2: &[ControlSpec] = &[
    ControlSpec::new("CC6.1", "Logical Access Controls"),
    ControlSpec::new("CC6.6", "Boundary Protection"),
    ControlSpec::new("CC6.7", "Cryptography - Encryption and Secrets"),
    ControlSpec::new("CC7.2", "Monitoring and Logging"),
    ControlSpec::new("A1.2", "Resilience and Error Handling"),
];

/// Read-only registry of controls per pillar
pub struct ControlCatalog;

impl ControlCatalog {
    pub fn controls(pillar: PillarId) -> &'static [ControlSpec] {
        match pillar {
            PillarId::OperationalExcellence => OPERATIONAL_EXCELLENCE,
            PillarId::Security => SECURITY,
            PillarId::Reliability => RELIABILITY,
            PillarId::PerformanceEfficiency => PERFORMANCE_EFFICIENCY,
            PillarId::CostOptimization => COST_OPTIMIZATION,
            PillarId::Sustainability => SUSTAINABILITY,
            PillarId::CisAws => CIS_AWS,
            PillarId::Lgpd => LGPD,
            PillarId::PciDss => PCI_DSS,
            PillarId::Soc2 => SOC2,
        }
    }

    pub fn find(pillar: PillarId, control_id: &str) -> Option<&'static ControlSpec> {
        Self::controls(pillar)
            .iter()
            .find(|c| c.control_id == control_id)
    }

    /// Resolve caller-supplied pillar names into a validated pillar set.
    ///
    /// # Errors
    /// `ScanError::Configuration` if the set is empty, names an unknown
    /// pillar, or repeats one.
    pub fn resolve<S: AsRef<str>>(names: &[S]) -> Result<Vec<PillarId>, ScanError> {
        let pillars = names
            .iter()
            .map(|name| {
                PillarId::from_str(name.as_ref()).ok_or_else(|| {
                    ScanError::Configuration(format!("Unknown framework or pillar: {}", name.as_ref()))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::validate(&pillars)?;
        Ok(pillars)
    }

    /// Check an already-typed pillar set
    pub fn validate(pillars: &[PillarId]) -> Result<(), ScanError> {
        if pillars.is_empty() {
            return Err(ScanError::Configuration(
                "At least one pillar or framework is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for pillar in pillars {
            if !seen.insert(*pillar) {
                return Err(ScanError::Configuration(format!(
                    "Pillar listed more than once: {}",
                    pillar
                )));
            }
        }

        Ok(())
    }
}
