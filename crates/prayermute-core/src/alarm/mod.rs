//! Wake trigger installation.
//!
//! Each prayer boundary owns a fixed slot (see [`MuteAction::slot_for`]), so
//! installing the same plan twice leaves exactly one trigger per slot. The
//! daily refresh trigger lives in its own slot outside the prayer range.

mod stored;

pub use stored::{PendingTrigger, StoredWakeTimer};

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SchedulerError;
use crate::planner::{MuteAction, ScheduledEvent, PRAYER_SLOTS};
use crate::prayer::Prayer;

/// Slot of the day-rollover refresh trigger.
pub const REFRESH_SLOT: u8 = PRAYER_SLOTS;

/// Data delivered back to the core when a trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerPayload {
    Prayer { action: MuteAction, prayer: Prayer },
    DailyRefresh,
}

/// Host primitive for exact, device-waking one-shot timers.
///
/// `set_exact` replaces whatever the slot held.
pub trait WakeTimer: Send + Sync {
    fn set_exact(
        &self,
        slot: u8,
        at: NaiveDateTime,
        payload: TriggerPayload,
    ) -> Result<(), SchedulerError>;
    fn cancel(&self, slot: u8) -> Result<(), SchedulerError>;
}

pub struct AlarmScheduler {
    timer: Arc<dyn WakeTimer>,
}

impl AlarmScheduler {
    pub fn new(timer: Arc<dyn WakeTimer>) -> Self {
        Self { timer }
    }

    pub fn schedule(&self, event: &ScheduledEvent) -> Result<(), SchedulerError> {
        debug!(slot = event.slot, prayer = %event.prayer, action = ?event.action, at = %event.trigger_at, "setting trigger");
        self.timer.set_exact(
            event.slot,
            event.trigger_at,
            TriggerPayload::Prayer {
                action: event.action,
                prayer: event.prayer,
            },
        )
    }

    /// Cancel every prayer slot. Slots with nothing pending are fine.
    pub fn cancel_all(&self) -> Result<(), SchedulerError> {
        for slot in 0..PRAYER_SLOTS {
            self.timer.cancel(slot)?;
        }
        Ok(())
    }

    /// Replace the installed prayer triggers with `events`.
    pub fn install(&self, events: &[ScheduledEvent]) -> Result<(), SchedulerError> {
        self.cancel_all()?;
        for event in events {
            self.schedule(event)?;
        }
        info!(triggers = events.len(), "prayer triggers installed");
        Ok(())
    }

    pub fn schedule_refresh(&self, at: NaiveDateTime) -> Result<(), SchedulerError> {
        debug!(%at, "setting daily refresh trigger");
        self.timer
            .set_exact(REFRESH_SLOT, at, TriggerPayload::DailyRefresh)
    }

    pub fn cancel_refresh(&self) -> Result<(), SchedulerError> {
        self.timer.cancel(REFRESH_SLOT)
    }
}
