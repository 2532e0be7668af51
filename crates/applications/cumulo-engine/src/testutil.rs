//! Scripted CloudInspector for tests
//!
//! The engine works through the CloudInspector interface only, so tests
//! script a provider instead of a network: which regions exist, which signals
//! fire where, which units fail, and how long each region takes to answer.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use cumulo_core::{
    AccountId, AccountIdentity, CloudInspector, CommitmentSource, CommitmentUtilization, CostLine,
    Finding, ProviderError, Recommendation, RegionId, ResourceDetails, ResourceFamily,
    ResourceRecord, ResourceState, Severity,
};

type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Build a minimal resource record for scripting
pub(crate) fn record(id: &str, family: ResourceFamily, region: &str) -> ResourceRecord {
    ResourceRecord {
        id: id.to_string(),
        name: id.to_string(),
        family,
        region: RegionId::new(region),
        state: ResourceState::Running,
        created_at: None,
        details: ResourceDetails::None,
    }
}

/// Build a minimal finding for scripting
pub(crate) fn finding(id: &str, severity: Severity, region: &str) -> Finding {
    Finding {
        id: id.to_string(),
        title: id.to_string(),
        severity,
        region: Some(RegionId::new(region)),
        resource_id: None,
    }
}

#[derive(Default)]
pub(crate) struct MockInspector {
    regions: Vec<RegionId>,
    compute_regions: HashSet<RegionId>,
    database_regions: HashSet<RegionId>,
    serverless_regions: HashSet<RegionId>,
    cluster_regions: HashSet<RegionId>,
    storage_locations: HashSet<RegionId>,

    database_failures: HashSet<RegionId>,
    listing_failures: HashSet<RegionId>,
    cost_failures: HashSet<RegionId>,
    finding_failures: HashSet<RegionId>,
    region_listing_outage: bool,
    storage_outage: bool,
    resolve_failure: bool,

    resources: HashMap<(RegionId, ResourceFamily), Vec<ResourceRecord>>,
    buckets: Vec<ResourceRecord>,
    regional_cost_lines: HashMap<RegionId, Vec<CostLine>>,
    global_cost_lines: Vec<CostLine>,
    findings: HashMap<RegionId, Vec<Finding>>,
    recommendation_lists: HashMap<(RegionId, ResourceFamily), Vec<Recommendation>>,
    reservations: HashMap<CommitmentSource, ProviderResult<CommitmentUtilization>>,
    unit_delays: HashMap<RegionId, Duration>,

    region_list_calls: AtomicUsize,
    resolve_calls: AtomicUsize,
    listing_calls: AtomicUsize,
}

impl MockInspector {
    pub(crate) fn new(regions: &[&str]) -> Self {
        Self {
            regions: regions.iter().map(|r| RegionId::new(*r)).collect(),
            ..Default::default()
        }
    }

    pub(crate) fn with_compute_in(mut self, region: &str) -> Self {
        self.compute_regions.insert(RegionId::new(region));
        self
    }

    pub(crate) fn with_databases_in(mut self, region: &str) -> Self {
        self.database_regions.insert(RegionId::new(region));
        self
    }

    pub(crate) fn with_serverless_in(mut self, region: &str) -> Self {
        self.serverless_regions.insert(RegionId::new(region));
        self
    }

    pub(crate) fn with_clusters_in(mut self, region: &str) -> Self {
        self.cluster_regions.insert(RegionId::new(region));
        self
    }

    pub(crate) fn with_storage_location(mut self, region: &str) -> Self {
        self.storage_locations.insert(RegionId::new(region));
        self
    }

    pub(crate) fn with_database_failure_in(mut self, region: &str) -> Self {
        self.database_failures.insert(RegionId::new(region));
        self
    }

    /// All list_resources calls for this region raise
    pub(crate) fn with_listing_failure_in(mut self, region: &str) -> Self {
        self.listing_failures.insert(RegionId::new(region));
        self
    }

    pub(crate) fn with_cost_failure_in(mut self, region: &str) -> Self {
        self.cost_failures.insert(RegionId::new(region));
        self
    }

    pub(crate) fn with_finding_failure_in(mut self, region: &str) -> Self {
        self.finding_failures.insert(RegionId::new(region));
        self
    }

    pub(crate) fn with_region_listing_outage(mut self) -> Self {
        self.region_listing_outage = true;
        self
    }

    pub(crate) fn with_storage_outage(mut self) -> Self {
        self.storage_outage = true;
        self
    }

    pub(crate) fn with_resolve_failure(mut self) -> Self {
        self.resolve_failure = true;
        self
    }

    /// Script one listed resource; also marks its region's matching signal
    pub(crate) fn with_resource(mut self, resource: ResourceRecord) -> Self {
        match resource.family {
            ResourceFamily::Compute => {
                self.compute_regions.insert(resource.region.clone());
            }
            ResourceFamily::Database => {
                self.database_regions.insert(resource.region.clone());
            }
            ResourceFamily::Serverless => {
                self.serverless_regions.insert(resource.region.clone());
            }
            ResourceFamily::Cluster => {
                self.cluster_regions.insert(resource.region.clone());
            }
            _ => {}
        }
        self.resources
            .entry((resource.region.clone(), resource.family))
            .or_default()
            .push(resource);
        self
    }

    pub(crate) fn with_bucket(mut self, bucket: ResourceRecord) -> Self {
        self.storage_locations.insert(bucket.region.clone());
        self.buckets.push(bucket);
        self
    }

    pub(crate) fn with_regional_cost(
        mut self,
        region: &str,
        service: &str,
        amount: Option<f64>,
    ) -> Self {
        self.regional_cost_lines
            .entry(RegionId::new(region))
            .or_default()
            .push(CostLine {
                service: service.to_string(),
                region: Some(RegionId::new(region)),
                amount_usd: amount,
            });
        self
    }

    pub(crate) fn with_global_cost(mut self, service: &str, amount: Option<f64>) -> Self {
        self.global_cost_lines.push(CostLine {
            service: service.to_string(),
            region: None,
            amount_usd: amount,
        });
        self
    }

    pub(crate) fn with_finding(mut self, finding: Finding) -> Self {
        let region = finding
            .region
            .clone()
            .unwrap_or_else(|| RegionId::new("global"));
        self.findings.entry(region).or_default().push(finding);
        self
    }

    pub(crate) fn with_recommendation(mut self, region: &str, rec: Recommendation) -> Self {
        self.recommendation_lists
            .entry((RegionId::new(region), rec.family))
            .or_default()
            .push(rec);
        self
    }

    pub(crate) fn with_reservation(mut self, utilization: CommitmentUtilization) -> Self {
        self.reservations
            .insert(utilization.source, Ok(utilization));
        self
    }

    pub(crate) fn with_reservation_failure(mut self, source: CommitmentSource) -> Self {
        self.reservations.insert(
            source,
            Err(ProviderError::AccessDenied(format!(
                "no license for {source}"
            ))),
        );
        self
    }

    /// Delay every listing answer from this region, to vary completion order
    pub(crate) fn with_unit_delay(mut self, region: &str, delay: Duration) -> Self {
        self.unit_delays.insert(RegionId::new(region), delay);
        self
    }

    pub(crate) fn region_listings(&self) -> usize {
        self.region_list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn resolves(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn listings(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    async fn delay_for(&self, region: &RegionId) {
        if let Some(delay) = self.unit_delays.get(region) {
            tokio::time::sleep(*delay).await;
        }
    }
}

#[async_trait]
impl CloudInspector for MockInspector {
    async fn resolve_account(&self, account: &AccountId) -> ProviderResult<AccountIdentity> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if self.resolve_failure {
            return Err(ProviderError::AccountNotFound(account.to_string()));
        }
        Ok(AccountIdentity {
            account: account.clone(),
            arn: format!("arn:aws:iam::{account}:root"),
            alias: None,
        })
    }

    async fn list_regions(&self, _account: &AccountId) -> ProviderResult<Vec<RegionId>> {
        self.region_list_calls.fetch_add(1, Ordering::SeqCst);
        if self.region_listing_outage {
            return Err(ProviderError::Network("provider unreachable".to_string()));
        }
        Ok(self.regions.clone())
    }

    async fn has_compute(&self, _account: &AccountId, region: &RegionId) -> ProviderResult<bool> {
        Ok(self.compute_regions.contains(region))
    }

    async fn has_databases(&self, _account: &AccountId, region: &RegionId) -> ProviderResult<bool> {
        if self.database_failures.contains(region) {
            return Err(ProviderError::Api("internal error".to_string()));
        }
        Ok(self.database_regions.contains(region))
    }

    async fn has_functions(&self, _account: &AccountId, region: &RegionId) -> ProviderResult<bool> {
        Ok(self.serverless_regions.contains(region))
    }

    async fn has_clusters(&self, _account: &AccountId, region: &RegionId) -> ProviderResult<bool> {
        Ok(self.cluster_regions.contains(region))
    }

    async fn storage_regions(&self, _account: &AccountId) -> ProviderResult<HashSet<RegionId>> {
        if self.storage_outage {
            return Err(ProviderError::Network("provider unreachable".to_string()));
        }
        Ok(self.storage_locations.clone())
    }

    async fn list_resources(
        &self,
        _account: &AccountId,
        region: &RegionId,
        family: ResourceFamily,
    ) -> ProviderResult<Vec<ResourceRecord>> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        self.delay_for(region).await;
        if self.listing_failures.contains(region) {
            return Err(ProviderError::RateLimited(format!(
                "throttled listing {family} in {region}"
            )));
        }
        Ok(self
            .resources
            .get(&(region.clone(), family))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_buckets(&self, _account: &AccountId) -> ProviderResult<Vec<ResourceRecord>> {
        Ok(self.buckets.clone())
    }

    async fn regional_costs(
        &self,
        _account: &AccountId,
        region: &RegionId,
    ) -> ProviderResult<Vec<CostLine>> {
        self.delay_for(region).await;
        if self.cost_failures.contains(region) {
            return Err(ProviderError::RateLimited(format!(
                "throttled cost lookup in {region}"
            )));
        }
        Ok(self
            .regional_cost_lines
            .get(region)
            .cloned()
            .unwrap_or_default())
    }

    async fn global_costs(&self, _account: &AccountId) -> ProviderResult<Vec<CostLine>> {
        Ok(self.global_cost_lines.clone())
    }

    async fn security_findings(
        &self,
        _account: &AccountId,
        region: &RegionId,
    ) -> ProviderResult<Vec<Finding>> {
        self.delay_for(region).await;
        if self.finding_failures.contains(region) {
            return Err(ProviderError::Api(format!(
                "findings backend error in {region}"
            )));
        }
        Ok(self.findings.get(region).cloned().unwrap_or_default())
    }

    async fn recommendations(
        &self,
        _account: &AccountId,
        region: &RegionId,
        family: ResourceFamily,
    ) -> ProviderResult<Vec<Recommendation>> {
        self.delay_for(region).await;
        Ok(self
            .recommendation_lists
            .get(&(region.clone(), family))
            .cloned()
            .unwrap_or_default())
    }

    async fn reservation_utilization(
        &self,
        _account: &AccountId,
        source: CommitmentSource,
    ) -> ProviderResult<CommitmentUtilization> {
        match self.reservations.get(&source) {
            Some(result) => result.clone(),
            None => Ok(CommitmentUtilization {
                source,
                utilization_pct: None,
                coverage_pct: None,
                active_commitments: 0,
            }),
        }
    }
}
