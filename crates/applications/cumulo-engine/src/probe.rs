//! Region activity detection
//!
//! Scans fan out only over regions that actually hold something. The probe
//! decides which those are: every opted-in region gets four cheap existence
//! checks (compute, database, serverless, cluster), all regions concurrently
//! and all four signals within a region concurrently, plus membership in the
//! global storage-location set, which is queried once. A region is active iff
//! any signal fired - a region with zero compute but one storage bucket is
//! still active.
//!
//! The result is cached under its own entry with a coarser TTL than the
//! downstream aggregates: the set of regions holding resources changes far
//! less often than the resources themselves.
//!
//! A total provider outage degrades to an empty active set, which turns every
//! downstream fan-out into a no-op. Fail-safe, not fail-fatal.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, cache_key};
use crate::error::Result;
use crate::fanout::FanOut;
use cumulo_core::{
    AccountId, CloudInspector, ProbeSignal, RegionId, RegionStatus, ServiceSupport,
};

/// Cache domain for the active-region set
const PROBE_CACHE_DOMAIN: &str = "activeregions";

/// The four per-region existence signals. Storage-location membership is the
/// fifth signal but comes from the global set, not a per-region call.
const REGION_SIGNALS: [ProbeSignal; 4] = [
    ProbeSignal::Compute,
    ProbeSignal::Database,
    ProbeSignal::Serverless,
    ProbeSignal::Cluster,
];

/// Determines the subset of provider regions that currently hold resources
pub struct RegionActivityProbe {
    provider: Arc<dyn CloudInspector>,
    cache: Arc<CacheStore>,
    fanout: FanOut,
    ttl: Duration,
    allowlist: Option<Vec<RegionId>>,
}

impl RegionActivityProbe {
    /// Create a probe
    pub fn new(
        provider: Arc<dyn CloudInspector>,
        cache: Arc<CacheStore>,
        fanout: FanOut,
        ttl: Duration,
        allowlist: Option<Vec<RegionId>>,
    ) -> Self {
        Self {
            provider,
            cache,
            fanout,
            ttl,
            allowlist,
        }
    }

    /// Resolve the active regions for an account, with evidence.
    ///
    /// Serves the cached set when present unless `force` is set; the fresh
    /// result always overwrites the cache entry.
    pub async fn active_regions(
        &self,
        account: &AccountId,
        force: bool,
    ) -> Result<Vec<RegionStatus>> {
        let key = cache_key(PROBE_CACHE_DOMAIN, account, None);
        if !force {
            if let Some(cached) = self.cache.get::<Vec<RegionStatus>>(&key).await {
                debug!(account = %account, regions = cached.len(), "active-region set served from cache");
                return Ok(cached);
            }
        }

        let active = self.probe(account).await;
        self.cache.put(&key, &active, self.ttl).await?;
        Ok(active)
    }

    /// Run the full probe once, uncached
    async fn probe(&self, account: &AccountId) -> Vec<RegionStatus> {
        // Candidate enumeration and the global storage-location set are
        // independent lookups; run them as siblings.
        let (candidates, storage) = tokio::join!(
            self.provider.list_regions(account),
            self.provider.storage_regions(account),
        );

        let candidates = match candidates {
            Ok(regions) => self.apply_allowlist(regions),
            Err(e) => {
                warn!(account = %account, error = %e, "region enumeration failed, degrading to empty active set");
                Vec::new()
            }
        };

        let storage: Arc<HashSet<RegionId>> = Arc::new(match storage {
            Ok(set) => set,
            Err(e) => {
                warn!(account = %account, error = %e, "storage-location lookup failed, no evidence from this signal");
                HashSet::new()
            }
        });

        let provider = self.provider.clone();
        let account_key = account.clone();
        let gathered = self
            .fanout
            .run("region-probe", candidates, move |region| {
                let provider = provider.clone();
                let account = account_key.clone();
                let storage = storage.clone();
                async move { Ok(vec![probe_region(provider, account, region, storage).await]) }
            })
            .await;

        let mut active: Vec<RegionStatus> = gathered
            .items
            .into_iter()
            .filter(|status| status.active)
            .collect();
        active.sort_by(|a, b| a.region.cmp(&b.region));

        info!(
            account = %account,
            active = active.len(),
            probed = gathered.total_units,
            "region probe complete"
        );
        active
    }

    fn apply_allowlist(&self, regions: Vec<RegionId>) -> Vec<RegionId> {
        match &self.allowlist {
            Some(allowed) => regions
                .into_iter()
                .filter(|r| allowed.contains(r))
                .collect(),
            None => regions,
        }
    }
}

/// Probe one region: the four existence signals concurrently, storage
/// membership from the precomputed global set
async fn probe_region(
    provider: Arc<dyn CloudInspector>,
    account: AccountId,
    region: RegionId,
    storage: Arc<HashSet<RegionId>>,
) -> RegionStatus {
    let (compute, database, serverless, cluster) = tokio::join!(
        signal_evidence(&provider, &account, &region, ProbeSignal::Compute),
        signal_evidence(&provider, &account, &region, ProbeSignal::Database),
        signal_evidence(&provider, &account, &region, ProbeSignal::Serverless),
        signal_evidence(&provider, &account, &region, ProbeSignal::Cluster),
    );

    let mut evidence: Vec<ProbeSignal> = [compute, database, serverless, cluster]
        .into_iter()
        .flatten()
        .collect();
    if storage.contains(&region) {
        evidence.push(ProbeSignal::StorageLocation);
    }

    RegionStatus {
        active: !evidence.is_empty(),
        region,
        evidence,
    }
}

/// One existence check. Any failure means "no evidence from this signal",
/// never an aborted probe; "not enabled here" is logged apart from transient
/// faults so the two are never conflated.
async fn signal_evidence(
    provider: &Arc<dyn CloudInspector>,
    account: &AccountId,
    region: &RegionId,
    signal: ProbeSignal,
) -> Option<ProbeSignal> {
    let result = match signal {
        ProbeSignal::Compute => provider.has_compute(account, region).await,
        ProbeSignal::Database => provider.has_databases(account, region).await,
        ProbeSignal::Serverless => provider.has_functions(account, region).await,
        ProbeSignal::Cluster => provider.has_clusters(account, region).await,
        // Membership in the global set, not a per-region call
        ProbeSignal::StorageLocation => return None,
    };

    match result {
        Ok(true) => Some(signal),
        Ok(false) => None,
        Err(e) => {
            match e.support() {
                ServiceSupport::NotEnabled => {
                    debug!(region = %region, signal = %signal, "service not enabled in this region")
                }
                _ => {
                    warn!(region = %region, signal = %signal, error = %e, "probe signal failed, no evidence from this signal")
                }
            }
            None
        }
    }
}
