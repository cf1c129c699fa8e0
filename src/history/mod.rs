// src/history/mod.rs
//! Append-only audit log of refresh attempts, totally ordered by append per
//! resource key. Entries are never mutated or deleted.

use crate::error::FailureReason;
use crate::utils::TokenResourceKey;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOutcome {
    Success,
    Error(FailureReason),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshHistoryEntry {
    pub resource_key: TokenResourceKey,
    pub job_id: Uuid,
    pub outcome: HistoryOutcome,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Default)]
pub struct RefreshHistory {
    entries: DashMap<TokenResourceKey, Vec<RefreshHistoryEntry>>,
    total_appends: AtomicU64,
}

impl RefreshHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &self,
        resource_key: TokenResourceKey,
        job_id: Uuid,
        outcome: HistoryOutcome,
        duration_ms: u64,
    ) {
        let entry = RefreshHistoryEntry {
            resource_key: resource_key.clone(),
            job_id,
            outcome,
            duration_ms,
            timestamp: Utc::now(),
        };
        // The per-key Vec is only ever pushed to while the shard entry is
        // held, which gives the total append order per key.
        self.entries.entry(resource_key).or_default().push(entry);
        self.total_appends.fetch_add(1, Ordering::Relaxed);
    }

    pub fn entries_for(&self, key: &TokenResourceKey) -> Vec<RefreshHistoryEntry> {
        self.entries.get(key).map(|v| v.clone()).unwrap_or_default()
    }

    pub fn total_appends(&self) -> u64 {
        self.total_appends.load(Ordering::Relaxed)
    }
}
