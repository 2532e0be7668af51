//! Engine configuration

use cumulo_core::RegionId;
use std::time::Duration;

/// Default TTL for the active-region set. Coarser than the aggregates:
/// the set of regions holding resources changes far less often than the
/// resources themselves.
pub const DEFAULT_PROBE_TTL_SECS: u64 = 900;

/// Default TTL for composite aggregates
pub const DEFAULT_AGGREGATE_TTL_SECS: u64 = 300;

/// Default per-unit deadline for fan-out units
pub const DEFAULT_UNIT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// TTL for the cached active-region set
    pub probe_ttl: Duration,

    /// TTL for cached composite aggregates
    pub aggregate_ttl: Duration,

    /// Deadline for one fan-out unit. A unit that outlives it is converted
    /// into the same isolated-failure path as any provider error. `None`
    /// means a hung remote call stalls its fan-out's final join
    /// indefinitely.
    pub unit_timeout: Option<Duration>,

    /// Restrict the probe to these regions instead of everything the
    /// provider exposes
    pub region_allowlist: Option<Vec<RegionId>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            probe_ttl: Duration::from_secs(DEFAULT_PROBE_TTL_SECS),
            aggregate_ttl: Duration::from_secs(DEFAULT_AGGREGATE_TTL_SECS),
            unit_timeout: Some(Duration::from_secs(DEFAULT_UNIT_TIMEOUT_SECS)),
            region_allowlist: None,
        }
    }
}

impl EngineConfig {
    /// Create a config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the active-region TTL
    pub fn with_probe_ttl(mut self, ttl: Duration) -> Self {
        self.probe_ttl = ttl;
        self
    }

    /// Set the aggregate TTL
    pub fn with_aggregate_ttl(mut self, ttl: Duration) -> Self {
        self.aggregate_ttl = ttl;
        self
    }

    /// Set the per-unit deadline (`None` disables it)
    pub fn with_unit_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.unit_timeout = timeout;
        self
    }

    /// Restrict probing to a fixed region list
    pub fn with_region_allowlist(mut self, regions: Vec<RegionId>) -> Self {
        self.region_allowlist = Some(regions);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.probe_ttl, Duration::from_secs(900));
        assert_eq!(config.aggregate_ttl, Duration::from_secs(300));
        assert_eq!(config.unit_timeout, Some(Duration::from_secs(30)));
        assert!(config.region_allowlist.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::new()
            .with_probe_ttl(Duration::from_secs(60))
            .with_aggregate_ttl(Duration::from_secs(30))
            .with_unit_timeout(None)
            .with_region_allowlist(vec![RegionId::new("us-east-1")]);

        assert_eq!(config.probe_ttl, Duration::from_secs(60));
        assert_eq!(config.aggregate_ttl, Duration::from_secs(30));
        assert_eq!(config.unit_timeout, None);
        assert_eq!(
            config.region_allowlist,
            Some(vec![RegionId::new("us-east-1")])
        );
    }
}
