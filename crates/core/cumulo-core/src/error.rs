//! Error types for provider facades

use std::time::Duration;
use thiserror::Error;

use crate::types::ServiceSupport;

/// Errors a cloud provider facade can surface for one remote call.
///
/// These are transient, per-unit errors: the engine isolates them at the
/// fan-out boundary rather than letting them abort a whole scan. The facade
/// does not retry internally.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("region unavailable: {0}")]
    RegionUnavailable(String),

    #[error("service not enabled: {0}")]
    NotEnabled(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider API error: {0}")]
    Api(String),
}

impl ProviderError {
    /// Classify this error for the supported/not-enabled/transient split.
    ///
    /// "Service not enabled in this region" is an answer, not a failure;
    /// everything else an errored call can tell us is transient.
    pub fn support(&self) -> ServiceSupport {
        match self {
            ProviderError::NotEnabled(_) => ServiceSupport::NotEnabled,
            _ => ServiceSupport::TransientError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_enabled_is_not_transient() {
        let err = ProviderError::NotEnabled("config service disabled".to_string());
        assert_eq!(err.support(), ServiceSupport::NotEnabled);
    }

    #[test]
    fn test_other_errors_are_transient() {
        let errors = [
            ProviderError::RateLimited("throttled".to_string()),
            ProviderError::AccessDenied("no permission".to_string()),
            ProviderError::RegionUnavailable("down".to_string()),
            ProviderError::Network("reset".to_string()),
            ProviderError::Timeout(Duration::from_secs(30)),
            ProviderError::Api("internal".to_string()),
        ];
        for err in errors {
            assert_eq!(err.support(), ServiceSupport::TransientError);
        }
    }
}
