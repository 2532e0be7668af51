//! Composite report types
//!
//! Each scan family merges its fan-out output into one of these reports.
//! Merge rules are deliberately commutative and associative - counts are
//! sums, money is summed with missing amounts read as zero, redundant
//! percentages merge with max - so the result content is identical no matter
//! which order the concurrent units completed in. Collections are sorted on
//! the way in for the same reason.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geo::{GeoTable, SustainabilityTag};
use cumulo_core::{
    AccountId, CommitmentUtilization, CostLine, Finding, Recommendation, RegionStatus,
    ResourceRecord, Severity,
};

/// Severity weights for the posture score
const SCORE_PENALTY: [(Severity, u32); 4] = [
    (Severity::Critical, 15),
    (Severity::High, 8),
    (Severity::Medium, 3),
    (Severity::Low, 1),
];

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// One active region as plotted on the dashboard map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    /// Region id
    pub region: String,
    /// Resources counted in this region
    pub resource_count: usize,
    /// Data-center latitude
    pub latitude: f64,
    /// Data-center longitude
    pub longitude: f64,
    /// Grid classification
    pub sustainability: SustainabilityTag,
}

/// Composite inventory across all active regions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryReport {
    /// Account the scan ran against
    pub account: AccountId,
    /// When this composite was computed
    pub generated_at: DateTime<Utc>,
    /// Total resources found
    pub total_resources: usize,
    /// Count per resource family
    pub by_family: BTreeMap<String, usize>,
    /// Count per region
    pub by_region: BTreeMap<String, usize>,
    /// Map view: only regions present in the geo reference table
    pub map_regions: Vec<RegionSummary>,
    /// Every resource, sorted by family, region, id
    pub resources: Vec<ResourceRecord>,
    /// Whether any fan-out unit failed; totals are then a lower bound
    pub degraded: bool,
}

impl InventoryReport {
    /// Merge flattened fan-out output into the composite
    pub fn merge(
        account: &AccountId,
        mut resources: Vec<ResourceRecord>,
        geo: &GeoTable,
        degraded: bool,
    ) -> Self {
        resources.sort_by(|a, b| {
            (a.family, &a.region, &a.id).cmp(&(b.family, &b.region, &b.id))
        });

        let mut by_family: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_region: BTreeMap<String, usize> = BTreeMap::new();
        for record in &resources {
            *by_family.entry(record.family.to_string()).or_default() += 1;
            *by_region.entry(record.region.to_string()).or_default() += 1;
        }

        // Tabular views keep every region; the map drops the ones the
        // reference table does not know.
        let map_regions = by_region
            .iter()
            .filter_map(|(region, count)| {
                let entry = geo.lookup(&cumulo_core::RegionId::new(region.clone()))?;
                Some(RegionSummary {
                    region: region.clone(),
                    resource_count: *count,
                    latitude: entry.latitude,
                    longitude: entry.longitude,
                    sustainability: entry.sustainability,
                })
            })
            .collect();

        Self {
            account: account.clone(),
            generated_at: Utc::now(),
            total_resources: resources.len(),
            by_family,
            by_region,
            map_regions,
            resources,
            degraded,
        }
    }
}

/// Composite spend summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostReport {
    /// Account the scan ran against
    pub account: AccountId,
    /// When this composite was computed
    pub generated_at: DateTime<Utc>,
    /// Total monthly spend in USD
    pub total_monthly_usd: f64,
    /// Spend per service
    pub by_service: BTreeMap<String, f64>,
    /// Spend per region (region-less lines excluded)
    pub by_region: BTreeMap<String, f64>,
    /// Whether any fan-out unit failed; totals are then a lower bound
    pub degraded: bool,
}

impl CostReport {
    /// Merge cost lines. Missing amounts substitute 0.0 before summing;
    /// lines are sorted first so float accumulation order is fixed.
    pub fn merge(account: &AccountId, mut lines: Vec<CostLine>, degraded: bool) -> Self {
        lines.sort_by(|a, b| {
            (&a.service, &a.region)
                .cmp(&(&b.service, &b.region))
                .then(a.amount_usd.unwrap_or(0.0).total_cmp(&b.amount_usd.unwrap_or(0.0)))
        });

        let mut total = 0.0;
        let mut by_service: BTreeMap<String, f64> = BTreeMap::new();
        let mut by_region: BTreeMap<String, f64> = BTreeMap::new();
        for line in &lines {
            let amount = line.amount_usd.unwrap_or(0.0);
            total += amount;
            *by_service.entry(line.service.clone()).or_default() += amount;
            if let Some(region) = &line.region {
                *by_region.entry(region.to_string()).or_default() += amount;
            }
        }

        by_service.values_mut().for_each(|v| *v = round_cents(*v));
        by_region.values_mut().for_each(|v| *v = round_cents(*v));

        Self {
            account: account.clone(),
            generated_at: Utc::now(),
            total_monthly_usd: round_cents(total),
            by_service,
            by_region,
            degraded,
        }
    }
}

/// Composite security posture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityReport {
    /// Account the scan ran against
    pub account: AccountId,
    /// When this composite was computed
    pub generated_at: DateTime<Utc>,
    /// Total findings across all regions
    pub total_findings: usize,
    /// Finding count per severity category
    pub by_severity: BTreeMap<String, usize>,
    /// 0-100, lower means worse posture
    pub score: u32,
    /// Every finding, sorted by severity then id
    pub findings: Vec<Finding>,
    /// Whether any fan-out unit failed; counts are then a lower bound
    pub degraded: bool,
}

impl SecurityReport {
    /// Group findings by severity category and derive the posture score
    pub fn merge(account: &AccountId, mut findings: Vec<Finding>, degraded: bool) -> Self {
        findings.sort_by(|a, b| (a.severity, &a.id).cmp(&(b.severity, &b.id)));

        let mut by_severity: BTreeMap<String, usize> = BTreeMap::new();
        for finding in &findings {
            *by_severity.entry(finding.severity.to_string()).or_default() += 1;
        }

        let mut penalty = 0u32;
        for (severity, weight) in SCORE_PENALTY {
            let count = findings.iter().filter(|f| f.severity == severity).count() as u32;
            penalty = penalty.saturating_add(count.saturating_mul(weight));
        }
        let score = 100u32.saturating_sub(penalty);

        Self {
            account: account.clone(),
            generated_at: Utc::now(),
            total_findings: findings.len(),
            by_severity,
            score,
            findings,
            degraded,
        }
    }
}

/// Composite optimization recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    /// Account the scan ran against
    pub account: AccountId,
    /// When this composite was computed
    pub generated_at: DateTime<Utc>,
    /// Total recommendations
    pub total_recommendations: usize,
    /// Sum of the savings estimates that carried a figure
    pub est_monthly_savings_usd: f64,
    /// Recommendation count per resource family
    pub by_family: BTreeMap<String, usize>,
    /// Every recommendation, sorted by family, region, id
    pub recommendations: Vec<Recommendation>,
    /// Whether any fan-out unit failed; counts are then a lower bound
    pub degraded: bool,
}

impl OptimizationReport {
    /// Merge recommendations; missing savings estimates read as zero
    pub fn merge(
        account: &AccountId,
        mut recommendations: Vec<Recommendation>,
        degraded: bool,
    ) -> Self {
        recommendations.sort_by(|a, b| {
            (a.family, &a.region, &a.id).cmp(&(b.family, &b.region, &b.id))
        });

        let mut by_family: BTreeMap<String, usize> = BTreeMap::new();
        let mut savings = 0.0;
        for rec in &recommendations {
            *by_family.entry(rec.family.to_string()).or_default() += 1;
            savings += rec.est_monthly_savings_usd.unwrap_or(0.0);
        }

        Self {
            account: account.clone(),
            generated_at: Utc::now(),
            total_recommendations: recommendations.len(),
            est_monthly_savings_usd: round_cents(savings),
            by_family,
            recommendations,
            degraded,
        }
    }
}

/// Composite commitment-discount utilization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationReport {
    /// Account the scan ran against
    pub account: AccountId,
    /// When this composite was computed
    pub generated_at: DateTime<Utc>,
    /// Max across sources: two mechanisms measure the same concept and the
    /// better signal wins
    pub utilization_pct: f64,
    /// Max across sources, as for utilization
    pub coverage_pct: f64,
    /// Active commitments summed across sources
    pub active_commitments: u32,
    /// The per-source signals the maxima were taken over
    pub sources: Vec<CommitmentUtilization>,
    /// Whether any source failed to answer
    pub degraded: bool,
}

impl ReservationReport {
    /// Merge per-source utilization. Percentages merge with max, commitment
    /// counts with sum.
    pub fn merge(
        account: &AccountId,
        mut sources: Vec<CommitmentUtilization>,
        degraded: bool,
    ) -> Self {
        sources.sort_by_key(|s| s.source.to_string());

        let utilization_pct = sources
            .iter()
            .filter_map(|s| s.utilization_pct)
            .fold(0.0f64, f64::max);
        let coverage_pct = sources
            .iter()
            .filter_map(|s| s.coverage_pct)
            .fold(0.0f64, f64::max);
        let active_commitments = sources.iter().map(|s| s.active_commitments).sum();

        Self {
            account: account.clone(),
            generated_at: Utc::now(),
            utilization_pct,
            coverage_pct,
            active_commitments,
            sources,
            degraded,
        }
    }
}

/// Probe output as returned to callers of the `regions` operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionReport {
    /// Account the probe ran against
    pub account: AccountId,
    /// When this report was assembled
    pub generated_at: DateTime<Utc>,
    /// Active regions with their evidence, sorted by region id
    pub active_regions: Vec<RegionStatus>,
}

impl RegionReport {
    /// Wrap a probe result for presentation
    pub fn new(account: &AccountId, active_regions: Vec<RegionStatus>) -> Self {
        Self {
            account: account.clone(),
            generated_at: Utc::now(),
            active_regions,
        }
    }
}
