//! Fetch retry policy.
//!
//! Failed fetches are retried through a deferred host job on a fixed
//! backoff ladder. The attempt counter lives in the store and resets at the
//! first access on a new calendar day. Once the ladder is used up the user
//! is notified at most once per day.

mod queue;

pub use queue::{PendingJob, StoredJobQueue};

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::{Result, SchedulerError};
use crate::events::{Event, EventSink};
use crate::storage::Preferences;

/// Delay before each retry, in minutes.
pub const BACKOFF_LADDER_MINUTES: [i64; 4] = [30, 60, 120, 240];

/// Unique name of the deferred retry job.
pub const RETRY_JOB_NAME: &str = "prayer_times_retry";

/// Persisted attempt counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryState {
    pub attempt_count: u32,
    pub attempt_day: NaiveDate,
}

impl RetryState {
    pub fn fresh(day: NaiveDate) -> Self {
        Self {
            attempt_count: 0,
            attempt_day: day,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt_count as usize >= BACKOFF_LADDER_MINUTES.len()
    }

    /// Delay for the next attempt, `None` once the ladder is used up.
    pub fn next_delay(&self) -> Option<Duration> {
        BACKOFF_LADDER_MINUTES
            .get(self.attempt_count as usize)
            .map(|m| Duration::minutes(*m))
    }
}

/// Network condition a deferred job waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkRequirement {
    Unmetered,
    AnyConnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub run_at: NaiveDateTime,
    pub network: NetworkRequirement,
}

/// Host primitive for deferred, network-constrained one-shot jobs.
///
/// `enqueue_unique` replaces any pending job with the same name.
pub trait JobQueue: Send + Sync {
    fn enqueue_unique(&self, name: &str, request: JobRequest) -> Result<(), SchedulerError>;
    fn cancel_unique(&self, name: &str) -> Result<(), SchedulerError>;
}

/// What `schedule_retry` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    Scheduled {
        /// 1-based attempt number for today.
        attempt: u32,
        delay_minutes: i64,
        run_at: NaiveDateTime,
    },
    /// Ladder used up; `notified` is true only for the first call of the day.
    Exhausted { notified: bool },
}

pub struct RetryPolicy {
    prefs: Preferences,
    jobs: Arc<dyn JobQueue>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl RetryPolicy {
    pub fn new(
        prefs: Preferences,
        jobs: Arc<dyn JobQueue>,
        events: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            prefs,
            jobs,
            events,
            clock,
        }
    }

    /// Today's counter. A counter stamped with an earlier day reads as fresh.
    pub fn current_state(&self) -> Result<RetryState> {
        let today = self.clock.today();
        Ok(match self.prefs.retry_state()? {
            Some(state) if state.attempt_day == today => state,
            _ => RetryState::fresh(today),
        })
    }

    /// Reserve the next attempt and enqueue the retry job.
    ///
    /// The counter is persisted before the job is enqueued, so a job that
    /// runs immediately already sees its own attempt.
    pub fn schedule_retry(&self) -> Result<RetryOutcome> {
        let mut state = self.current_state()?;
        let Some(delay) = state.next_delay() else {
            let notified = self.on_exhausted()?;
            return Ok(RetryOutcome::Exhausted { notified });
        };

        state.attempt_count += 1;
        self.prefs.set_retry_state(&state)?;

        let now = self.clock.now();
        let run_at = now + delay;
        let network = if self.prefs.allow_metered()? {
            NetworkRequirement::AnyConnected
        } else {
            NetworkRequirement::Unmetered
        };
        self.jobs
            .enqueue_unique(RETRY_JOB_NAME, JobRequest { run_at, network })?;

        info!(
            attempt = state.attempt_count,
            delay_minutes = delay.num_minutes(),
            %run_at,
            ?network,
            "fetch retry scheduled"
        );
        self.events.emit(&Event::RetryScheduled {
            attempt: state.attempt_count,
            delay_minutes: delay.num_minutes(),
            run_at,
            at: now,
        });

        Ok(RetryOutcome::Scheduled {
            attempt: state.attempt_count,
            delay_minutes: delay.num_minutes(),
            run_at,
        })
    }

    /// Reset the counter after a successful fetch and drop any pending retry.
    pub fn on_success(&self) -> Result<()> {
        self.prefs
            .set_retry_state(&RetryState::fresh(self.clock.today()))?;
        self.jobs.cancel_unique(RETRY_JOB_NAME)?;
        Ok(())
    }

    /// Emit the permanent-failure notification unless today's was already sent.
    /// Returns whether a notification went out.
    pub fn on_exhausted(&self) -> Result<bool> {
        let today = self.clock.today();
        if self.prefs.exhausted_notified_day()? == Some(today) {
            return Ok(false);
        }
        self.prefs.set_exhausted_notified_day(today)?;
        warn!(day = %today, "all fetch retries failed for today");
        self.events.emit(&Event::RetryExhausted {
            day: today,
            at: self.clock.now(),
        });
        Ok(true)
    }

    /// Cancel the pending retry job without touching the counter.
    pub fn cancel(&self) -> Result<()> {
        self.jobs.cancel_unique(RETRY_JOB_NAME)?;
        Ok(())
    }
}
