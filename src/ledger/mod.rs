// src/ledger/mod.rs
//! Durable record of long-running refresh work, one `Job` per attempt. The
//! ledger is a passive store: the orchestrator owns every transition.

use crate::error::{BenchError, FailureReason, Result};
use crate::utils::TokenResourceKey;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Success,
    Error,
}

impl JobStatus {
    /// Monotonic lifecycle: queued -> running -> {success | error}.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Success)
                | (JobStatus::Running, JobStatus::Error)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Success => write!(f, "success"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// One refresh attempt for a resource key. Never mutated after reaching a
/// terminal state; a later job supersedes it instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub resource_key: TokenResourceKey,
    pub status: JobStatus,
    /// Present iff status == Error
    pub failure: Option<FailureReason>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 1 for a first attempt; previous attempt + 1 when retrying after an error
    pub attempt: u32,
    /// Snapshot produced by a successful attempt
    pub snapshot_id: Option<Uuid>,
}

/// In-process job store: jobs by id plus a per-key creation-order index, the
/// last entry of which is the latest job for the key.
#[derive(Default)]
pub struct JobLedger {
    jobs: DashMap<Uuid, Job>,
    jobs_by_key: DashMap<TokenResourceKey, Vec<Uuid>>,
}

impl JobLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a queued job with a caller-supplied id (the orchestrator mints
    /// the id first so the refresh lock can reference it before insertion).
    pub fn create_job(&self, id: Uuid, resource_key: TokenResourceKey) -> Job {
        let attempt = self
            .get_latest(&resource_key)
            .map(|prev| {
                if prev.status == JobStatus::Error {
                    prev.attempt + 1
                } else {
                    1
                }
            })
            .unwrap_or(1);

        let now = Utc::now();
        let job = Job {
            id,
            resource_key: resource_key.clone(),
            status: JobStatus::Queued,
            failure: None,
            created_at: now,
            updated_at: now,
            attempt,
            snapshot_id: None,
        };
        self.jobs.insert(id, job.clone());
        self.jobs_by_key.entry(resource_key).or_default().push(id);
        job
    }

    /// Removes a queued job that never started (its creator lost the lock
    /// race). Running and terminal jobs are never removed.
    pub fn abandon(&self, job_id: Uuid) {
        if let Some((_, job)) = self
            .jobs
            .remove_if(&job_id, |_, j| j.status == JobStatus::Queued)
        {
            if let Some(mut ids) = self.jobs_by_key.get_mut(&job.resource_key) {
                ids.retain(|id| *id != job_id);
            }
        }
    }

    pub fn mark_running(&self, job_id: Uuid) -> Result<()> {
        self.transition(job_id, JobStatus::Running, None, None)
    }

    pub fn mark_success(&self, job_id: Uuid, snapshot_id: Uuid) -> Result<()> {
        self.transition(job_id, JobStatus::Success, None, Some(snapshot_id))
    }

    pub fn mark_error(&self, job_id: Uuid, reason: FailureReason) -> Result<()> {
        self.transition(job_id, JobStatus::Error, Some(reason), None)
    }

    pub fn get(&self, job_id: Uuid) -> Option<Job> {
        self.jobs.get(&job_id).map(|j| j.clone())
    }

    /// Most recently created job for the key, used for staleness decisions.
    pub fn get_latest(&self, key: &TokenResourceKey) -> Option<Job> {
        let id = self.jobs_by_key.get(key).and_then(|ids| ids.last().copied())?;
        self.jobs.get(&id).map(|j| j.clone())
    }

    fn transition(
        &self,
        job_id: Uuid,
        next: JobStatus,
        failure: Option<FailureReason>,
        snapshot_id: Option<Uuid>,
    ) -> Result<()> {
        let mut job = self
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| BenchError::JobNotFound(job_id.to_string()))?;

        if !job.status.can_transition_to(next) {
            return Err(BenchError::InvalidTransition(format!(
                "job {}: {} -> {}",
                job_id, job.status, next
            )));
        }

        job.status = next;
        job.failure = failure;
        if snapshot_id.is_some() {
            job.snapshot_id = snapshot_id;
        }
        job.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> TokenResourceKey {
        TokenResourceKey::holder_benchmark(1, "0xabc")
    }

    #[test]
    fn happy_path_transitions() {
        let ledger = JobLedger::new();
        let job = ledger.create_job(Uuid::new_v4(), key());
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.attempt, 1);

        ledger.mark_running(job.id).unwrap();
        let snapshot_id = Uuid::new_v4();
        ledger.mark_success(job.id, snapshot_id).unwrap();

        let stored = ledger.get(job.id).unwrap();
        assert_eq!(stored.status, JobStatus::Success);
        assert_eq!(stored.snapshot_id, Some(snapshot_id));
        assert!(stored.failure.is_none());
    }

    #[test]
    fn queued_cannot_jump_to_terminal() {
        let ledger = JobLedger::new();
        let job = ledger.create_job(Uuid::new_v4(), key());

        let err = ledger.mark_success(job.id, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, BenchError::InvalidTransition(_)));
        let err = ledger.mark_error(job.id, FailureReason::Internal).unwrap_err();
        assert!(matches!(err, BenchError::InvalidTransition(_)));
    }

    #[test]
    fn terminal_jobs_are_never_mutated() {
        let ledger = JobLedger::new();
        let job = ledger.create_job(Uuid::new_v4(), key());
        ledger.mark_running(job.id).unwrap();
        ledger.mark_error(job.id, FailureReason::UpstreamUnavailable).unwrap();

        let err = ledger.mark_running(job.id).unwrap_err();
        assert!(matches!(err, BenchError::InvalidTransition(_)));
        let err = ledger.mark_success(job.id, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, BenchError::InvalidTransition(_)));
    }

    #[test]
    fn attempt_counts_continue_after_error_and_reset_after_success() {
        let ledger = JobLedger::new();

        let first = ledger.create_job(Uuid::new_v4(), key());
        ledger.mark_running(first.id).unwrap();
        ledger.mark_error(first.id, FailureReason::UpstreamUnavailable).unwrap();

        let retry = ledger.create_job(Uuid::new_v4(), key());
        assert_eq!(retry.attempt, 2);
        ledger.mark_running(retry.id).unwrap();
        ledger.mark_success(retry.id, Uuid::new_v4()).unwrap();

        let fresh = ledger.create_job(Uuid::new_v4(), key());
        assert_eq!(fresh.attempt, 1);
    }

    #[test]
    fn latest_tracks_most_recent_creation() {
        let ledger = JobLedger::new();
        let first = ledger.create_job(Uuid::new_v4(), key());
        let second = ledger.create_job(Uuid::new_v4(), key());
        assert_ne!(first.id, second.id);
        assert_eq!(ledger.get_latest(&key()).unwrap().id, second.id);
    }

    #[test]
    fn abandoned_queued_job_vanishes_and_latest_rolls_back() {
        let ledger = JobLedger::new();
        let winner = ledger.create_job(Uuid::new_v4(), key());
        ledger.mark_running(winner.id).unwrap();

        // A contender creates its record, loses the lock race, and backs out
        let loser = ledger.create_job(Uuid::new_v4(), key());
        ledger.abandon(loser.id);

        assert!(ledger.get(loser.id).is_none());
        assert_eq!(ledger.get_latest(&key()).unwrap().id, winner.id);
    }

    #[test]
    fn abandon_never_removes_a_started_job() {
        let ledger = JobLedger::new();
        let job = ledger.create_job(Uuid::new_v4(), key());
        ledger.mark_running(job.id).unwrap();

        ledger.abandon(job.id);
        assert_eq!(ledger.get(job.id).unwrap().status, JobStatus::Running);
        assert_eq!(ledger.get_latest(&key()).unwrap().id, job.id);
    }

    #[test]
    fn abandon_tolerates_interleaved_creations() {
        let ledger = JobLedger::new();
        let stray = ledger.create_job(Uuid::new_v4(), key());
        let newer = ledger.create_job(Uuid::new_v4(), key());

        ledger.abandon(stray.id);
        assert!(ledger.get(stray.id).is_none());
        assert_eq!(ledger.get_latest(&key()).unwrap().id, newer.id);
    }

    #[test]
    fn unknown_job_is_reported() {
        let ledger = JobLedger::new();
        let err = ledger.mark_running(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, BenchError::JobNotFound(_)));
    }
}
