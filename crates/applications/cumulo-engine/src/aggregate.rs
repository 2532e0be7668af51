//! Composite aggregation over fan-outs
//!
//! One InspectionService method per scan family. Every method follows the
//! same shape:
//!
//! ```text
//! cache read (skipped on force-refresh)
//!     │ miss
//!     ├── resolve account         - fatal on failure, never isolated
//!     ├── active regions          - probe, cached on its own coarser TTL
//!     ├── sibling sub-computations - fan-outs and single-shots, all joined
//!     ├── deterministic merge      - sum / group-count / max
//!     └── cache write-through      - always, even on force-refresh
//! ```
//!
//! A composite is never assembled from a subset of its declared sources: the
//! join waits for everything. Partial data WITHIN one source (an isolated
//! region or sub-service failure) is fine and flagged via `degraded`.
//!
//! Cache state machine per family key: MISSING -> compute -> FRESH ->
//! (ttl elapses) -> STALE -> recompute on next read. force-refresh jumps to
//! compute from any state but still performs the terminal write.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::{CacheStore, cache_key};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::fanout::{FanOut, SubTask};
use crate::geo::GeoTable;
use crate::probe::RegionActivityProbe;
use crate::report::{
    CostReport, InventoryReport, OptimizationReport, RegionReport, ReservationReport,
    SecurityReport,
};
use cumulo_core::{AccountId, CloudInspector, CommitmentSource, RegionId, ResourceFamily};

/// Families that get optimization recommendations
const RECOMMENDATION_FAMILIES: [ResourceFamily; 3] = [
    ResourceFamily::Compute,
    ResourceFamily::BlockStorage,
    ResourceFamily::Database,
];

/// One cacheable scan family and its key domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanFamily {
    /// The probe's active-region set
    ActiveRegions,
    /// Resource inventory
    Inventory,
    /// Spend summary
    Cost,
    /// Security posture
    Security,
    /// Optimization recommendations
    Optimization,
    /// Commitment-discount utilization
    Reservations,
}

impl ScanFamily {
    /// Lowercase domain token for the cache key grammar
    pub fn domain(&self) -> &'static str {
        match self {
            ScanFamily::ActiveRegions => "activeregions",
            ScanFamily::Inventory => "cloudinventory",
            ScanFamily::Cost => "costsummary",
            ScanFamily::Security => "securityposture",
            ScanFamily::Optimization => "optimizerecs",
            ScanFamily::Reservations => "reservations",
        }
    }
}

impl std::fmt::Display for ScanFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.domain())
    }
}

/// Produces the composite reports for one provider, behind the cache
pub struct InspectionService {
    provider: Arc<dyn CloudInspector>,
    cache: Arc<CacheStore>,
    probe: RegionActivityProbe,
    fanout: FanOut,
    geo: GeoTable,
    config: EngineConfig,
}

impl InspectionService {
    /// Create a service with its own cache store
    pub fn new(provider: Arc<dyn CloudInspector>, config: EngineConfig) -> Result<Self> {
        Self::with_cache(provider, Arc::new(CacheStore::new()), config)
    }

    /// Create a service on a shared cache store (tests inject a manual
    /// clock this way)
    pub fn with_cache(
        provider: Arc<dyn CloudInspector>,
        cache: Arc<CacheStore>,
        config: EngineConfig,
    ) -> Result<Self> {
        let geo = GeoTable::load()?;
        let fanout = FanOut::new(config.unit_timeout);
        let probe = RegionActivityProbe::new(
            provider.clone(),
            cache.clone(),
            fanout.clone(),
            config.probe_ttl,
            config.region_allowlist.clone(),
        );
        Ok(Self {
            provider,
            cache,
            probe,
            fanout,
            geo,
            config,
        })
    }

    /// The active-region set with its evidence. Cached by the probe on the
    /// coarser probe TTL.
    pub async fn regions(&self, account: &AccountId, force: bool) -> Result<RegionReport> {
        let statuses = self.probe.active_regions(account, force).await?;
        Ok(RegionReport::new(account, statuses))
    }

    /// Composite resource inventory across all active regions
    pub async fn inventory(&self, account: &AccountId, force: bool) -> Result<InventoryReport> {
        self.cached(
            ScanFamily::Inventory,
            account,
            force,
            self.compute_inventory(account),
        )
        .await
    }

    /// Composite spend summary
    pub async fn cost(&self, account: &AccountId, force: bool) -> Result<CostReport> {
        self.cached(ScanFamily::Cost, account, force, self.compute_cost(account))
            .await
    }

    /// Composite security posture
    pub async fn security(&self, account: &AccountId, force: bool) -> Result<SecurityReport> {
        self.cached(
            ScanFamily::Security,
            account,
            force,
            self.compute_security(account),
        )
        .await
    }

    /// Composite optimization recommendations
    pub async fn optimize(&self, account: &AccountId, force: bool) -> Result<OptimizationReport> {
        self.cached(
            ScanFamily::Optimization,
            account,
            force,
            self.compute_optimize(account),
        )
        .await
    }

    /// Composite commitment-discount utilization
    pub async fn reservations(
        &self,
        account: &AccountId,
        force: bool,
    ) -> Result<ReservationReport> {
        self.cached(
            ScanFamily::Reservations,
            account,
            force,
            self.compute_reservations(account),
        )
        .await
    }

    /// Drop one family's cached aggregate for an account. Called when
    /// dependent state is mutated out-of-band.
    pub async fn invalidate(&self, account: &AccountId, family: ScanFamily) {
        let key = cache_key(family.domain(), account, None);
        self.cache.evict(&key).await;
        info!(account = %account, family = %family, "invalidated cached aggregate");
    }

    /// Cache-or-compute for one family key. The compute future is only
    /// awaited on a miss or a force-refresh; either way the fresh value
    /// overwrites the entry.
    async fn cached<T, Fut>(
        &self,
        family: ScanFamily,
        account: &AccountId,
        force: bool,
        compute: Fut,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        Fut: Future<Output = Result<T>>,
    {
        let key = cache_key(family.domain(), account, None);
        if !force {
            if let Some(hit) = self.cache.get::<T>(&key).await {
                debug!(key = %key, "aggregate served from cache");
                return Ok(hit);
            }
        }

        let scan_id = Uuid::new_v4();
        debug!(key = %key, %scan_id, force, "computing aggregate");
        let value = compute.await?;
        self.cache
            .put(&key, &value, self.config.aggregate_ttl)
            .await?;
        info!(key = %key, %scan_id, "aggregate computed and cached");
        Ok(value)
    }

    /// Resolve the account and the regions every composite fans out over
    async fn scan_scope(&self, account: &AccountId) -> Result<Vec<RegionId>> {
        self.provider
            .resolve_account(account)
            .await
            .map_err(EngineError::AccountResolution)?;
        let active = self.probe.active_regions(account, false).await?;
        Ok(active.into_iter().map(|status| status.region).collect())
    }

    async fn compute_inventory(&self, account: &AccountId) -> Result<InventoryReport> {
        let regions = self.scan_scope(account).await?;

        // One named unit per (family, region) pair, plus the bucket listing
        // as a single global unit.
        let mut tasks = Vec::new();
        for family in ResourceFamily::REGIONAL {
            for region in &regions {
                let provider = self.provider.clone();
                let account = account.clone();
                let region = region.clone();
                tasks.push(SubTask::new(format!("{family}/{region}"), async move {
                    provider.list_resources(&account, &region, family).await
                }));
            }
        }
        let provider = self.provider.clone();
        let global_account = account.clone();
        tasks.push(SubTask::new("object-storage/global", async move {
            provider.list_buckets(&global_account).await
        }));

        let gathered = self.fanout.run_tasks("inventory", tasks).await;
        Ok(InventoryReport::merge(
            account,
            gathered.items,
            &self.geo,
            gathered.degraded(),
        ))
    }

    async fn compute_cost(&self, account: &AccountId) -> Result<CostReport> {
        let regions = self.scan_scope(account).await?;

        let provider = self.provider.clone();
        let account_key = account.clone();
        let regional = self.fanout.run("cost", regions, move |region| {
            let provider = provider.clone();
            let account = account_key.clone();
            async move { provider.regional_costs(&account, &region).await }
        });

        let provider = self.provider.clone();
        let global_account = account.clone();
        let global = self.fanout.run_tasks(
            "cost-global",
            vec![SubTask::new("global-services", async move {
                provider.global_costs(&global_account).await
            })],
        );

        // Sibling sub-computations, joined before any assembly
        let (regional, global) = tokio::join!(regional, global);

        let degraded = regional.degraded() || global.degraded();
        let mut lines = regional.items;
        lines.extend(global.items);
        Ok(CostReport::merge(account, lines, degraded))
    }

    async fn compute_security(&self, account: &AccountId) -> Result<SecurityReport> {
        let regions = self.scan_scope(account).await?;

        let provider = self.provider.clone();
        let account_key = account.clone();
        let gathered = self
            .fanout
            .run("security", regions, move |region| {
                let provider = provider.clone();
                let account = account_key.clone();
                async move { provider.security_findings(&account, &region).await }
            })
            .await;

        Ok(SecurityReport::merge(
            account,
            gathered.items,
            gathered.degraded(),
        ))
    }

    async fn compute_optimize(&self, account: &AccountId) -> Result<OptimizationReport> {
        let regions = self.scan_scope(account).await?;

        let mut tasks = Vec::new();
        for family in RECOMMENDATION_FAMILIES {
            for region in &regions {
                let provider = self.provider.clone();
                let account = account.clone();
                let region = region.clone();
                tasks.push(SubTask::new(format!("{family}/{region}"), async move {
                    provider.recommendations(&account, &region, family).await
                }));
            }
        }

        let gathered = self.fanout.run_tasks("optimize", tasks).await;
        Ok(OptimizationReport::merge(
            account,
            gathered.items,
            gathered.degraded(),
        ))
    }

    async fn compute_reservations(&self, account: &AccountId) -> Result<ReservationReport> {
        // No regional fan-out here; both commitment-discount sources are
        // account-wide lookups. Resolution stays fatal.
        self.provider
            .resolve_account(account)
            .await
            .map_err(EngineError::AccountResolution)?;

        let sources = [
            CommitmentSource::ReservedInstances,
            CommitmentSource::SavingsPlans,
        ];
        let tasks: Vec<SubTask<cumulo_core::CommitmentUtilization>> = sources
            .into_iter()
            .map(|source| {
                let provider = self.provider.clone();
                let account = account.clone();
                SubTask::new(source.to_string(), async move {
                    provider
                        .reservation_utilization(&account, source)
                        .await
                        .map(|utilization| vec![utilization])
                })
            })
            .collect();

        let gathered = self.fanout.run_tasks("reservations", tasks).await;
        Ok(ReservationReport::merge(
            account,
            gathered.items,
            gathered.degraded(),
        ))
    }
}
