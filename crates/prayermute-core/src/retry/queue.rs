//! Job queue persisted in the key-value store.
//!
//! Used by hosts without a native job scheduler: pending jobs are written
//! under `job.<name>` and drained by a periodic tick.

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{JobQueue, JobRequest};
use crate::error::{SchedulerError, StoreError};
use crate::storage::KvStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingJob {
    pub name: String,
    pub request: JobRequest,
}

pub struct StoredJobQueue {
    store: Arc<dyn KvStore>,
}

impl StoredJobQueue {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    fn key(name: &str) -> String {
        format!("job.{name}")
    }

    /// Pending job with this name, if any.
    pub fn pending(&self, name: &str) -> Result<Option<PendingJob>, StoreError> {
        let Some(raw) = self.store.get(&Self::key(name))? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(job) => Ok(Some(job)),
            Err(e) => {
                warn!(job = name, error = %e, "dropping unreadable pending job");
                self.store.remove(&Self::key(name))?;
                Ok(None)
            }
        }
    }

    /// Remove and return the job if it is due at `now`.
    pub fn take_due(&self, name: &str, now: NaiveDateTime) -> Result<Option<PendingJob>, StoreError> {
        match self.pending(name)? {
            Some(job) if job.request.run_at <= now => {
                self.store.remove(&Self::key(name))?;
                Ok(Some(job))
            }
            _ => Ok(None),
        }
    }
}

impl JobQueue for StoredJobQueue {
    fn enqueue_unique(&self, name: &str, request: JobRequest) -> Result<(), SchedulerError> {
        let job = PendingJob {
            name: name.to_string(),
            request,
        };
        let raw = serde_json::to_string(&job).map_err(|e| SchedulerError::Job {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        self.store.set(&Self::key(name), &raw)?;
        debug!(job = name, run_at = %request.run_at, "job enqueued");
        Ok(())
    }

    fn cancel_unique(&self, name: &str) -> Result<(), SchedulerError> {
        self.store.remove(&Self::key(name))?;
        Ok(())
    }
}
