//! Core types shared across Cumulo components

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque account identifier, the partition key for every cache entry
/// and region-activity lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geographic provider region identifier (e.g. "us-east-1")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolved account identity, the single-shot lookup every aggregate
/// starts from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentity {
    pub account: AccountId,
    pub arn: String,
    pub alias: Option<String>,
}

/// Resource family, one per independent listing operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceFamily {
    Compute,
    BlockStorage,
    Database,
    Serverless,
    Cluster,
    ObjectStorage,
}

impl ResourceFamily {
    /// Families listed per active region (object storage is a single
    /// global unit, not per-region)
    pub const REGIONAL: [ResourceFamily; 5] = [
        ResourceFamily::Compute,
        ResourceFamily::BlockStorage,
        ResourceFamily::Database,
        ResourceFamily::Serverless,
        ResourceFamily::Cluster,
    ];
}

impl std::fmt::Display for ResourceFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceFamily::Compute => write!(f, "compute"),
            ResourceFamily::BlockStorage => write!(f, "block-storage"),
            ResourceFamily::Database => write!(f, "database"),
            ResourceFamily::Serverless => write!(f, "serverless"),
            ResourceFamily::Cluster => write!(f, "cluster"),
            ResourceFamily::ObjectStorage => write!(f, "object-storage"),
        }
    }
}

/// Lifecycle state shared by all resource families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceState {
    Running,
    Stopped,
    Available,
    Terminated,
    Unknown,
}

/// Per-family detail payload. Tagged so consumers that need family-specific
/// fields get them typed, while grouping and listing go through the shared
/// ResourceRecord shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResourceDetails {
    Compute {
        instance_type: String,
        spot: bool,
    },
    BlockStorage {
        size_gb: i32,
        volume_type: String,
        encrypted: bool,
        attached: bool,
    },
    Database {
        engine: String,
        instance_class: String,
    },
    Serverless {
        runtime: String,
        memory_mb: i32,
    },
    Cluster {
        version: String,
    },
    ObjectStorage {
        location: RegionId,
    },
    None,
}

/// The narrow record shape every listed resource is normalized into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: String,
    pub name: String,
    pub family: ResourceFamily,
    pub region: RegionId,
    pub state: ResourceState,
    pub created_at: Option<DateTime<Utc>>,
    pub details: ResourceDetails,
}

/// Evidence signal used by region-activity detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbeSignal {
    Compute,
    Database,
    Serverless,
    Cluster,
    StorageLocation,
}

impl std::fmt::Display for ProbeSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeSignal::Compute => write!(f, "compute"),
            ProbeSignal::Database => write!(f, "database"),
            ProbeSignal::Serverless => write!(f, "serverless"),
            ProbeSignal::Cluster => write!(f, "cluster"),
            ProbeSignal::StorageLocation => write!(f, "storage-location"),
        }
    }
}

/// Whether a service answered in a region, and how a non-answer should be
/// read. "Not enabled here" and "isolated failure" must never be conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceSupport {
    Supported,
    NotEnabled,
    TransientError,
}

/// One active region with the evidence that made it active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionStatus {
    pub region: RegionId,
    pub active: bool,
    pub evidence: Vec<ProbeSignal>,
}

/// One line of spend attributed to a service, possibly region-scoped.
/// Amounts are optional; merge steps substitute 0.0 before summing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    pub service: String,
    pub region: Option<RegionId>,
    pub amount_usd: Option<f64>,
}

/// Security finding severity, ordered most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Informational,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
            Severity::Informational => write!(f, "informational"),
        }
    }
}

/// Security finding from a regional scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    pub region: Option<RegionId>,
    pub resource_id: Option<String>,
}

/// Cost-optimization recommendation for one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub family: ResourceFamily,
    pub region: Option<RegionId>,
    pub action: String,
    pub est_monthly_savings_usd: Option<f64>,
}

/// Commitment-discount mechanism. Two independently licensed sources
/// measure the same utilization concept; redundant percentages merge
/// with max.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommitmentSource {
    ReservedInstances,
    SavingsPlans,
}

impl std::fmt::Display for CommitmentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitmentSource::ReservedInstances => write!(f, "reserved-instances"),
            CommitmentSource::SavingsPlans => write!(f, "savings-plans"),
        }
    }
}

/// Utilization report from one commitment-discount source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitmentUtilization {
    pub source: CommitmentSource,
    pub utilization_pct: Option<f64>,
    pub coverage_pct: Option<f64>,
    pub active_commitments: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(AccountId::new("123456789012").to_string(), "123456789012");
        assert_eq!(RegionId::new("eu-west-1").to_string(), "eu-west-1");
    }

    #[test]
    fn test_family_display_is_lowercase() {
        for family in ResourceFamily::REGIONAL {
            let token = family.to_string();
            assert_eq!(token, token.to_lowercase());
        }
        assert_eq!(ResourceFamily::ObjectStorage.to_string(), "object-storage");
    }

    #[test]
    fn test_severity_orders_most_severe_first() {
        assert!(Severity::Critical < Severity::High);
        assert!(Severity::High < Severity::Medium);
        assert!(Severity::Low < Severity::Informational);
    }

    #[test]
    fn test_resource_details_tagged_serialization() {
        let details = ResourceDetails::Compute {
            instance_type: "m5.large".to_string(),
            spot: true,
        };
        let json = serde_json::to_string(&details).unwrap();
        assert!(json.contains("\"kind\":\"compute\""));
        assert!(json.contains("\"spot\":true"));
    }

    #[test]
    fn test_region_status_roundtrip() {
        let status = RegionStatus {
            region: RegionId::new("ap-southeast-2"),
            active: true,
            evidence: vec![ProbeSignal::Compute, ProbeSignal::StorageLocation],
        };
        let json = serde_json::to_string(&status).unwrap();
        let back: RegionStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }
}
