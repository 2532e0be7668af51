//! Core traits for Cumulo
//!
//! The CloudInspector trait defines the interface ALL cloud provider facades
//! must implement. The engine works through this interface ONLY - never
//! concrete SDK clients.
//!
//! Every method is one remote call against the provider: a listing, an
//! existence check, or an analysis lookup. The facade does not retry and does
//! not aggregate; failure isolation, caching, and merging are the engine's
//! concern.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::error::ProviderError;
use crate::types::*;

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// All cloud provider facades must implement this trait.
#[async_trait]
pub trait CloudInspector: Send + Sync {
    /// Resolve the account identity. The one lookup the engine treats as
    /// fatal: without a resolved account there is no meaningful partial
    /// result.
    async fn resolve_account(&self, account: &AccountId) -> Result<AccountIdentity>;

    /// Every region the provider exposes to this account (opted-in only)
    async fn list_regions(&self, account: &AccountId) -> Result<Vec<RegionId>>;

    /// Cheap existence checks, one call per signal per region
    async fn has_compute(&self, account: &AccountId, region: &RegionId) -> Result<bool>;
    async fn has_databases(&self, account: &AccountId, region: &RegionId) -> Result<bool>;
    async fn has_functions(&self, account: &AccountId, region: &RegionId) -> Result<bool>;
    async fn has_clusters(&self, account: &AccountId, region: &RegionId) -> Result<bool>;

    /// Regions referenced by location-scoped storage. Global, queried once
    /// per probe.
    async fn storage_regions(&self, account: &AccountId) -> Result<HashSet<RegionId>>;

    /// List one regional resource family in one region
    async fn list_resources(
        &self,
        account: &AccountId,
        region: &RegionId,
        family: ResourceFamily,
    ) -> Result<Vec<ResourceRecord>>;

    /// List location-scoped storage containers. A single global unit in the
    /// fan-out, not a per-region one.
    async fn list_buckets(&self, account: &AccountId) -> Result<Vec<ResourceRecord>>;

    /// Spend attributed to one region
    async fn regional_costs(&self, account: &AccountId, region: &RegionId)
    -> Result<Vec<CostLine>>;

    /// Spend for account-wide services with no region dimension
    async fn global_costs(&self, account: &AccountId) -> Result<Vec<CostLine>>;

    /// Security findings for one region
    async fn security_findings(
        &self,
        account: &AccountId,
        region: &RegionId,
    ) -> Result<Vec<Finding>>;

    /// Optimization recommendations for one family in one region
    async fn recommendations(
        &self,
        account: &AccountId,
        region: &RegionId,
        family: ResourceFamily,
    ) -> Result<Vec<Recommendation>>;

    /// Utilization of one commitment-discount mechanism (account-wide)
    async fn reservation_utilization(
        &self,
        account: &AccountId,
        source: CommitmentSource,
    ) -> Result<CommitmentUtilization>;
}
