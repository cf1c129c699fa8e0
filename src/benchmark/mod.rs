// src/benchmark/mod.rs
pub mod concentration;
pub mod engine;
pub mod orchestrator;
pub mod scoring;
pub mod types;

pub use concentration::{gini, hhi, nakamoto};
pub use engine::compute_benchmark;
pub use orchestrator::RefreshOrchestrator;
pub use types::{BenchmarkScores, BenchmarkSnapshot, RefreshOptions, RefreshOutcome};
