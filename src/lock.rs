// ABOUTME: Per-project deployment lock over the record store.
// ABOUTME: Distinguishes system-acquired locks from operator locks that must never auto-release.

use thiserror::Error;

use crate::store::{LockRecord, RecordStore, StoreError};
use crate::webhook::ProjectId;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("no lock record for project: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Mutual-exclusion state for projects, backed by durable lock records.
///
/// The record is durable and shared through the store file, so it also
/// excludes concurrent deployments across separate server processes. Absence
/// of a record is not defaulted here; callers decide what it means.
#[derive(Debug, Clone)]
pub struct LockManager {
    store: RecordStore,
}

impl LockManager {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Look up the lock record for a project. Fails with `NotFound` when the
    /// project has never been locked or unlocked.
    pub async fn lookup(&self, project: &ProjectId) -> Result<LockRecord, LockError> {
        self.store
            .lock_record(&project.key())
            .await?
            .ok_or_else(|| LockError::NotFound(project.full_name().to_string()))
    }

    /// Write the lock state for a project and return it. Idempotent.
    ///
    /// `system_lock` is recorded only while locking; unlocking always clears
    /// it. The pipeline passes `system_lock = true`; the operator surface
    /// passes `false` so the finalizer will not auto-release the lock.
    pub async fn set(
        &self,
        project: &ProjectId,
        locked: bool,
        system_lock: bool,
    ) -> Result<bool, LockError> {
        let record = LockRecord {
            locked,
            system_lock: locked.then_some(system_lock),
        };
        self.store.put_lock_record(&project.key(), &record).await?;
        Ok(locked)
    }
}
