use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::audio::{MuteMode, RestoreSkipReason};
use crate::prayer::Prayer;

/// Every state change in the core produces an Event.
/// The host journals them; `RetryExhausted` is the user-visible
/// permanent-failure notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    MuteStarted {
        prayer: Prayer,
        mode: MuteMode,
        at: NaiveDateTime,
    },
    /// Device was already quiet when the window opened; nothing to undo.
    MuteSkipped {
        prayer: Prayer,
        at: NaiveDateTime,
    },
    /// `prayer` is `None` when the window was closed by disabling.
    AudioRestored {
        prayer: Option<Prayer>,
        at: NaiveDateTime,
    },
    RestoreSkipped {
        prayer: Option<Prayer>,
        reason: RestoreSkipReason,
        at: NaiveDateTime,
    },
    TimesFetched {
        location_id: u32,
        date: NaiveDate,
        at: NaiveDateTime,
    },
    FetchFailed {
        location_id: u32,
        error: String,
        at: NaiveDateTime,
    },
    RetryScheduled {
        attempt: u32,
        delay_minutes: i64,
        run_at: NaiveDateTime,
        at: NaiveDateTime,
    },
    /// The backoff ladder ran out for the day.
    RetryExhausted {
        day: NaiveDate,
        at: NaiveDateTime,
    },
    PlanInstalled {
        date: NaiveDate,
        triggers: usize,
        at: NaiveDateTime,
    },
}

impl Event {
    /// Stable snake_case discriminator used by the journal.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::MuteStarted { .. } => "mute_started",
            Event::MuteSkipped { .. } => "mute_skipped",
            Event::AudioRestored { .. } => "audio_restored",
            Event::RestoreSkipped { .. } => "restore_skipped",
            Event::TimesFetched { .. } => "times_fetched",
            Event::FetchFailed { .. } => "fetch_failed",
            Event::RetryScheduled { .. } => "retry_scheduled",
            Event::RetryExhausted { .. } => "retry_exhausted",
            Event::PlanInstalled { .. } => "plan_installed",
        }
    }
}

/// Receives every [`Event`]. Implementations must not fail the caller:
/// a journal write error is theirs to log.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &Event);
}

/// Discards events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &Event) {}
}

/// Keeps events in memory, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of recorded events of the given [`Event::kind`].
    pub fn count(&self, kind: &str) -> usize {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|e| e.kind() == kind)
            .count()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &Event) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }
}
