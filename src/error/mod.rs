use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum BenchError {
    /// Malformed or semantically invalid metric inputs (negative balance, NaN, empty set)
    #[error("Invalid Input: {0}")]
    InvalidInput(String),

    /// Illegal job status transition; indicates a coordination bug
    #[error("Invalid Transition: {0}")]
    InvalidTransition(String),

    /// Another refresh is already in flight for the same resource key
    #[error("Refresh Busy: {0}")]
    Busy(String),

    /// Admission denied by the rate limiter
    #[error("Rate Limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Raw-data collaborator failure
    #[error("Upstream Unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The raw-data provider itself throttled us
    #[error("Rate Limited By Provider: {0}")]
    ProviderRateLimited(String),

    /// Snapshot store / ledger structural failure
    #[error("Storage Error: {0}")]
    StorageError(String),

    /// Job id not present in the ledger
    #[error("Job Not Found: {0}")]
    JobNotFound(String),

    /// Configuration errors
    #[error("Config Error: {0}")]
    ConfigError(String),

    /// Unknown/unclassified errors
    #[error("Unknown Error: {0}")]
    Unknown(String),
}

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::ConfigError(format!("JSON serialization/deserialization error: {}", err))
    }
}

impl From<std::io::Error> for BenchError {
    fn from(err: std::io::Error) -> Self {
        BenchError::StorageError(format!("I/O error: {}", err))
    }
}

impl BenchError {
    /// Determines if an error is recoverable through a later retry by the caller
    pub fn is_recoverable(&self) -> bool {
        match self {
            BenchError::InvalidInput(_) => false, // Data needs fixing first
            BenchError::InvalidTransition(_) => false, // Coordination bug
            BenchError::Busy(_) => true,          // In-flight refresh will finish
            BenchError::RateLimited { .. } => true, // Window will roll over
            BenchError::UpstreamUnavailable(_) => true,
            BenchError::ProviderRateLimited(_) => true,
            BenchError::StorageError(_) => true, // Store might recover
            BenchError::JobNotFound(_) => false,
            BenchError::ConfigError(_) => false, // Config needs fixing
            BenchError::Unknown(_) => true,
        }
    }

    /// Categorizes error for metrics and monitoring
    pub fn categorize(&self) -> ErrorCategory {
        match self {
            BenchError::InvalidInput(_) => ErrorCategory::Data,
            BenchError::InvalidTransition(_) => ErrorCategory::Coordination,
            BenchError::Busy(_) => ErrorCategory::Coordination,
            BenchError::RateLimited { .. } => ErrorCategory::Admission,
            BenchError::UpstreamUnavailable(_) => ErrorCategory::Upstream,
            BenchError::ProviderRateLimited(_) => ErrorCategory::Upstream,
            BenchError::StorageError(_) => ErrorCategory::Infrastructure,
            BenchError::JobNotFound(_) => ErrorCategory::Data,
            BenchError::ConfigError(_) => ErrorCategory::Configuration,
            BenchError::Unknown(_) => ErrorCategory::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Admission,
    Coordination,
    Upstream,
    Data,
    Infrastructure,
    Configuration,
    Critical,
}

/// Closed, caller-facing failure taxonomy. Refresh outcomes carry one of these
/// stable codes instead of raw error strings so that history aggregation and
/// dashboards group exactly, never by substring matching.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    RateLimited { retry_after_ms: u64 },
    InvalidInput,
    UpstreamUnavailable,
    ProviderRateLimited,
    Storage,
    Internal,
}

impl FailureReason {
    /// Stable reason code, safe to persist and aggregate on
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::RateLimited { .. } => "rate_limited",
            FailureReason::InvalidInput => "invalid_input",
            FailureReason::UpstreamUnavailable => "upstream_unavailable",
            FailureReason::ProviderRateLimited => "provider_rate_limited",
            FailureReason::Storage => "storage",
            FailureReason::Internal => "internal",
        }
    }
}

impl From<&BenchError> for FailureReason {
    fn from(err: &BenchError) -> Self {
        match err {
            BenchError::RateLimited { retry_after_ms } => FailureReason::RateLimited {
                retry_after_ms: *retry_after_ms,
            },
            BenchError::InvalidInput(_) => FailureReason::InvalidInput,
            BenchError::UpstreamUnavailable(_) => FailureReason::UpstreamUnavailable,
            BenchError::ProviderRateLimited(_) => FailureReason::ProviderRateLimited,
            BenchError::StorageError(_) => FailureReason::Storage,
            _ => FailureReason::Internal,
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

// Convenience type alias
pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverability_matrix() {
        assert!(BenchError::Busy("in flight".into()).is_recoverable());
        assert!(BenchError::RateLimited { retry_after_ms: 500 }.is_recoverable());
        assert!(BenchError::UpstreamUnavailable("rpc down".into()).is_recoverable());
        assert!(!BenchError::InvalidInput("negative balance".into()).is_recoverable());
        assert!(!BenchError::InvalidTransition("success -> running".into()).is_recoverable());
        assert!(!BenchError::ConfigError("bad weights".into()).is_recoverable());
    }

    #[test]
    fn failure_reason_codes_are_stable() {
        assert_eq!(FailureReason::InvalidInput.code(), "invalid_input");
        assert_eq!(
            FailureReason::RateLimited { retry_after_ms: 10 }.code(),
            "rate_limited"
        );
        assert_eq!(FailureReason::UpstreamUnavailable.code(), "upstream_unavailable");
    }

    #[test]
    fn bench_error_maps_to_closed_reason() {
        let err = BenchError::ProviderRateLimited("429 from indexer".into());
        assert_eq!(FailureReason::from(&err), FailureReason::ProviderRateLimited);

        let err = BenchError::Unknown("???".into());
        assert_eq!(FailureReason::from(&err), FailureReason::Internal);
    }
}
