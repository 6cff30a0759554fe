//! Wake timer persisted in the key-value store.
//!
//! Triggers are written under `alarm.slot.<n>`; a host tick fires the due
//! ones through [`StoredWakeTimer::take_due`].

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{TriggerPayload, WakeTimer, REFRESH_SLOT};
use crate::error::{SchedulerError, StoreError};
use crate::storage::KvStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTrigger {
    pub slot: u8,
    pub at: NaiveDateTime,
    pub payload: TriggerPayload,
}

pub struct StoredWakeTimer {
    store: Arc<dyn KvStore>,
}

impl StoredWakeTimer {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    fn key(slot: u8) -> String {
        format!("alarm.slot.{slot}")
    }

    pub fn get(&self, slot: u8) -> Result<Option<PendingTrigger>, StoreError> {
        let Some(raw) = self.store.get(&Self::key(slot))? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(trigger) => Ok(Some(trigger)),
            Err(e) => {
                warn!(slot, error = %e, "dropping unreadable trigger");
                self.store.remove(&Self::key(slot))?;
                Ok(None)
            }
        }
    }

    /// All pending triggers ordered by instant.
    pub fn pending(&self) -> Result<Vec<PendingTrigger>, StoreError> {
        let mut triggers = Vec::new();
        for slot in 0..=REFRESH_SLOT {
            if let Some(trigger) = self.get(slot)? {
                triggers.push(trigger);
            }
        }
        triggers.sort_by_key(|t| (t.at, t.slot));
        Ok(triggers)
    }

    /// Remove and return every trigger due at `now`, oldest first.
    pub fn take_due(&self, now: NaiveDateTime) -> Result<Vec<PendingTrigger>, StoreError> {
        let due: Vec<PendingTrigger> = self
            .pending()?
            .into_iter()
            .filter(|t| t.at <= now)
            .collect();
        for trigger in &due {
            self.store.remove(&Self::key(trigger.slot))?;
        }
        Ok(due)
    }
}

impl WakeTimer for StoredWakeTimer {
    fn set_exact(
        &self,
        slot: u8,
        at: NaiveDateTime,
        payload: TriggerPayload,
    ) -> Result<(), SchedulerError> {
        let trigger = PendingTrigger { slot, at, payload };
        let raw = serde_json::to_string(&trigger).map_err(|e| SchedulerError::Timer {
            slot,
            message: e.to_string(),
        })?;
        self.store.set(&Self::key(slot), &raw)?;
        Ok(())
    }

    fn cancel(&self, slot: u8) -> Result<(), SchedulerError> {
        self.store.remove(&Self::key(slot))?;
        Ok(())
    }
}
