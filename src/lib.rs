pub mod benchmark;
pub mod config;
pub mod error;
pub mod history;
pub mod ledger;
pub mod locks;
pub mod metrics;
pub mod providers;
pub mod rate_limit;
pub mod utils;

// Re-export the surface the dashboard/API layer consumes
pub use benchmark::{
    compute_benchmark, BenchmarkScores, BenchmarkSnapshot, RefreshOptions, RefreshOrchestrator,
    RefreshOutcome,
};
pub use error::{BenchError, FailureReason, Result};
pub use utils::{ResourceKind, TokenResourceKey};
