// src/locks/mod.rs
//! Mutual exclusion for refresh work: at most one non-expired lock per
//! resource key. Expiry is a read-time check, never a background sweep; an
//! expired lock is simply reclaimable by the next acquirer.

use crate::utils::TokenResourceKey;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, warn};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RefreshLock {
    pub resource_key: TokenResourceKey,
    pub holder_job_id: Uuid,
    /// Per-acquisition ownership token; a stale guard cannot release a lock it
    /// no longer owns after a steal
    token: Uuid,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RefreshLock {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Read-time expiry check, exposed standalone for callers holding a lock copy.
pub fn is_expired(lock: &RefreshLock, now: DateTime<Utc>) -> bool {
    lock.is_expired(now)
}

#[derive(Debug)]
pub enum AcquireOutcome {
    Acquired(LockGuard),
    /// Another refresh holds the key; `holder_job_id` is the job to poll
    Busy {
        holder_job_id: Uuid,
        expires_at: DateTime<Utc>,
    },
}

/// Shared lock table. Cheap to clone; all clones see the same locks.
#[derive(Debug, Clone, Default)]
pub struct RefreshLockManager {
    locks: Arc<DashMap<TokenResourceKey, RefreshLock>>,
}

impl RefreshLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-blocking acquire: exactly one caller gets the guard for a given
    /// non-expired key; everyone else sees `Busy`. The DashMap entry holds the
    /// shard lock across the check-and-insert, which is what makes acquisition
    /// atomic with respect to concurrent attempts on the same key.
    pub fn try_acquire(
        &self,
        key: &TokenResourceKey,
        holder_job_id: Uuid,
        ttl: Duration,
    ) -> AcquireOutcome {
        let now = Utc::now();
        let lock = RefreshLock {
            resource_key: key.clone(),
            holder_job_id,
            token: Uuid::new_v4(),
            acquired_at: now,
            expires_at: now + ttl,
        };
        let token = lock.token;

        match self.locks.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get();
                if existing.is_expired(now) {
                    warn!(
                        "Reclaiming expired refresh lock for {} (previous holder job {})",
                        key, existing.holder_job_id
                    );
                    entry.insert(lock);
                    AcquireOutcome::Acquired(self.guard(key.clone(), token))
                } else {
                    debug!(
                        "Refresh lock busy for {} (holder job {})",
                        key, existing.holder_job_id
                    );
                    AcquireOutcome::Busy {
                        holder_job_id: existing.holder_job_id,
                        expires_at: existing.expires_at,
                    }
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(lock);
                debug!("Refresh lock acquired for {} (job {})", key, holder_job_id);
                AcquireOutcome::Acquired(self.guard(key.clone(), token))
            }
        }
    }

    /// Current non-expired holder, if any. Readers only; never blocks writers.
    pub fn holder(&self, key: &TokenResourceKey) -> Option<RefreshLock> {
        let now = Utc::now();
        self.locks
            .get(key)
            .filter(|l| !l.is_expired(now))
            .map(|l| l.clone())
    }

    fn guard(&self, key: TokenResourceKey, token: Uuid) -> LockGuard {
        LockGuard {
            manager: self.clone(),
            key,
            token,
            released: false,
        }
    }

    fn release(&self, key: &TokenResourceKey, token: Uuid) {
        // Ownership-checked: a guard whose lock was stolen after expiry must
        // not remove the new holder's lock.
        let removed = self.locks.remove_if(key, |_, l| l.token == token);
        if removed.is_some() {
            debug!("Refresh lock released for {}", key);
        }
    }
}

/// RAII handle for a held refresh lock. Releasing is idempotent and also
/// happens on drop, so the lock can never outlive the orchestrated attempt,
/// whatever exit path it takes.
#[derive(Debug)]
pub struct LockGuard {
    manager: RefreshLockManager,
    key: TokenResourceKey,
    token: Uuid,
    released: bool,
}

impl LockGuard {
    pub fn key(&self) -> &TokenResourceKey {
        &self.key
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.manager.release(&self.key, self.token);
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.release();
    }
}
