//! Daily reschedule coordinator.
//!
//! Entry point for every user action and every fired trigger. Each call is a
//! short-lived handler: read preferences, apply the effect, then re-plan.
//!
//! ## Fetch rules
//!
//! - The cached set is used while it is dated today.
//! - A missing or stale cache triggers a fetch, unless the last fetch failed;
//!   recovery from a failure belongs to the retry job.
//! - Enable, location change, the daily refresh trigger and the retry job
//!   always fetch.
//! - When a fetch fails but an older set is cached, that set is planned as a
//!   best effort so the device still mutes around approximately right times.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::alarm::{AlarmScheduler, TriggerPayload, WakeTimer};
use crate::audio::{
    AudioDevice, DeviceMuteStateMachine, MuteMode, MuteOutcome, MuteState, RestoreOutcome,
};
use crate::clock::Clock;
use crate::error::Result;
use crate::events::{Event, EventSink};
use crate::fetch::FetchOrchestrator;
use crate::planner::{MuteAction, Plan};
use crate::prayer::{Location, OffsetConfig, OffsetPair, Prayer, PrayerTimeSet};
use crate::provider::TimeTableProvider;
use crate::retry::{JobQueue, RetryPolicy, RetryState};
use crate::storage::{KvStore, Preferences};

/// Host primitives the core runs on.
#[derive(Clone)]
pub struct Host {
    pub store: Arc<dyn KvStore>,
    pub audio: Arc<dyn AudioDevice>,
    pub timer: Arc<dyn WakeTimer>,
    pub jobs: Arc<dyn JobQueue>,
    pub provider: Arc<dyn TimeTableProvider>,
    pub events: Arc<dyn EventSink>,
    pub clock: Arc<dyn Clock>,
}

/// What a planning pass ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Reschedule {
    /// Feature disabled or no location selected; nothing installed.
    Inactive,
    /// Planned from the cached set without a network call.
    FromCache { triggers: usize },
    /// Fresh set fetched and planned.
    Fetched { triggers: usize },
    /// Fetch failed; a retry was handed to the job queue.
    FetchFailed { planned_stale: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodayStatus {
    pub enabled: bool,
    pub location: Option<Location>,
    pub cached: Option<PrayerTimeSet>,
    /// No set is cached, or the cached set is not dated today.
    pub stale: bool,
    pub fetch_failed: bool,
    pub mute_state: MuteState,
    pub mute_mode: MuteMode,
    pub retry: RetryState,
}

pub struct Coordinator {
    prefs: Preferences,
    audio: DeviceMuteStateMachine,
    fetch: FetchOrchestrator,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl Coordinator {
    pub fn new(host: Host) -> Self {
        let prefs = Preferences::new(host.store);
        let retry = RetryPolicy::new(
            prefs.clone(),
            host.jobs,
            host.events.clone(),
            host.clock.clone(),
        );
        let fetch = FetchOrchestrator::new(
            host.provider,
            prefs.clone(),
            retry,
            AlarmScheduler::new(host.timer),
            host.events.clone(),
            host.clock.clone(),
        );
        Self {
            audio: DeviceMuteStateMachine::new(host.audio, prefs.clone()),
            prefs,
            fetch,
            events: host.events,
            clock: host.clock,
        }
    }

    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    // ── User actions ────────────────────────────────────────────────

    pub async fn enable(&self) -> Result<Reschedule> {
        self.prefs.set_enabled(true)?;
        info!("auto-mute enabled");
        self.run(true).await
    }

    /// Disable, drop every pending trigger and job, and end an active window.
    pub fn disable(&self) -> Result<()> {
        self.prefs.set_enabled(false)?;
        self.clear_schedule()?;
        self.fetch.retry().cancel()?;

        if self.audio.state()?.is_active() {
            let outcome = self.audio.on_mute_end()?;
            self.journal_restore(None, outcome);
        }
        info!("auto-mute disabled");
        Ok(())
    }

    /// Persist a new location. Its predecessor's cached set is dropped.
    pub async fn select_location(&self, location: &Location) -> Result<Reschedule> {
        self.prefs.set_location(Some(location))?;
        self.prefs.set_cached_times(None)?;
        self.prefs.set_last_fetch_failed(false)?;
        info!(location_id = location.id, %location, "location selected");
        self.run(true).await
    }

    pub async fn set_offsets(&self, offsets: &OffsetConfig) -> Result<Reschedule> {
        self.prefs.set_offsets(offsets)?;
        self.reschedule().await
    }

    pub async fn set_prayer_offsets(&self, prayer: Prayer, pair: OffsetPair) -> Result<Reschedule> {
        let mut offsets = self.prefs.offsets()?;
        offsets.set(prayer, pair);
        self.set_offsets(&offsets).await
    }

    pub async fn set_friday_override(&self, pair: OffsetPair) -> Result<Reschedule> {
        let mut offsets = self.prefs.offsets()?;
        offsets.friday_dhuhr = pair;
        self.set_offsets(&offsets).await
    }

    /// Takes effect at the next window start.
    pub fn set_mute_mode(&self, mode: MuteMode) -> Result<()> {
        self.prefs.set_mute_mode(mode)?;
        Ok(())
    }

    /// Takes effect at the next retry reservation.
    pub fn set_allow_metered(&self, allow: bool) -> Result<()> {
        self.prefs.set_allow_metered(allow)?;
        Ok(())
    }

    // ── Host callbacks ──────────────────────────────────────────────

    /// Handle a fired trigger: apply its effect, then always re-plan.
    ///
    /// An audio failure is returned only after the re-plan ran.
    pub async fn on_trigger(&self, payload: TriggerPayload) -> Result<Reschedule> {
        let (effect, force_fetch) = match payload {
            TriggerPayload::Prayer {
                action: MuteAction::MuteStart,
                prayer,
            } => (self.open_window(prayer), false),
            TriggerPayload::Prayer {
                action: MuteAction::MuteEnd,
                prayer,
            } => (self.close_window(prayer), false),
            TriggerPayload::DailyRefresh => {
                debug!("daily refresh trigger fired");
                (Ok(()), true)
            }
        };

        let rescheduled = self.run(force_fetch).await;
        effect?;
        rescheduled
    }

    /// Body of the deferred retry job.
    pub async fn run_retry_job(&self) -> Result<Reschedule> {
        debug!("retry job running");
        self.run(true).await
    }

    /// Re-arm after the host lost its timers (reboot, reinstall).
    pub async fn boot(&self) -> Result<Reschedule> {
        debug!("re-arming after host restart");
        self.reschedule().await
    }

    /// Re-plan from cache, fetching only when today's set is missing.
    pub async fn reschedule(&self) -> Result<Reschedule> {
        self.run(false).await
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn today_status(&self) -> Result<TodayStatus> {
        let cached = self.prefs.cached_times()?;
        let stale = cached
            .as_ref()
            .map_or(true, |set| set.is_stale(self.clock.today()));
        Ok(TodayStatus {
            enabled: self.prefs.is_enabled()?,
            location: self.prefs.location()?,
            cached,
            stale,
            fetch_failed: self.prefs.last_fetch_failed()?,
            mute_state: self.audio.state()?,
            mute_mode: self.prefs.mute_mode()?,
            retry: self.fetch.retry().current_state()?,
        })
    }

    /// Plan the cached set against now without installing it.
    pub fn plan_preview(&self) -> Result<Option<Plan>> {
        match self.prefs.cached_times()? {
            Some(set) => Ok(Some(self.fetch.preview(&set)?)),
            None => Ok(None),
        }
    }

    // ── Internals ───────────────────────────────────────────────────

    async fn run(&self, force_fetch: bool) -> Result<Reschedule> {
        let location = match (self.prefs.is_enabled()?, self.prefs.location()?) {
            (true, Some(location)) => location,
            (enabled, _) => {
                debug!(enabled, "nothing to schedule");
                self.clear_schedule()?;
                return Ok(Reschedule::Inactive);
            }
        };

        let (outcome, plan) = self.plan_day(&location, force_fetch).await?;
        self.end_uncovered_window(plan.as_ref())?;
        Ok(outcome)
    }

    async fn plan_day(
        &self,
        location: &Location,
        force_fetch: bool,
    ) -> Result<(Reschedule, Option<Plan>)> {
        let cached = self.prefs.cached_times()?;
        let fresh = cached
            .as_ref()
            .filter(|set| !set.is_stale(self.clock.today()));

        if let (Some(set), false) = (fresh, force_fetch) {
            let plan = self.fetch.schedule_from(set)?;
            let outcome = Reschedule::FromCache {
                triggers: plan.events.len(),
            };
            return Ok((outcome, Some(plan)));
        }

        if !force_fetch && self.prefs.last_fetch_failed()? {
            debug!("last fetch failed, leaving recovery to the retry job");
            return self.plan_stale(cached.as_ref());
        }

        if self.fetch.fetch_and_schedule_with_retry(location.id).await {
            let plan = self
                .prefs
                .cached_times()?
                .map(|set| self.fetch.preview(&set))
                .transpose()?;
            let outcome = Reschedule::Fetched {
                triggers: plan.as_ref().map_or(0, |plan| plan.events.len()),
            };
            Ok((outcome, plan))
        } else {
            self.plan_stale(cached.as_ref())
        }
    }

    fn plan_stale(&self, cached: Option<&PrayerTimeSet>) -> Result<(Reschedule, Option<Plan>)> {
        match cached {
            Some(set) => {
                warn!(date = %set.date, "planning from an outdated prayer time set");
                let plan = self.fetch.schedule_from(set)?;
                let outcome = Reschedule::FetchFailed {
                    planned_stale: true,
                };
                Ok((outcome, Some(plan)))
            }
            None => {
                let outcome = Reschedule::FetchFailed {
                    planned_stale: false,
                };
                Ok((outcome, None))
            }
        }
    }

    /// An open window no planned window covers has no MuteEnd left to fire.
    fn end_uncovered_window(&self, plan: Option<&Plan>) -> Result<()> {
        if !self.audio.state()?.is_active() {
            return Ok(());
        }
        let now = self.clock.now();
        if plan.is_some_and(|plan| plan.window_covering(now).is_some()) {
            return Ok(());
        }
        info!("open window is no longer planned, ending it");
        let outcome = self.audio.on_mute_end()?;
        self.journal_restore(None, outcome);
        Ok(())
    }

    fn clear_schedule(&self) -> Result<()> {
        self.fetch.alarms().cancel_all()?;
        self.fetch.alarms().cancel_refresh()?;
        Ok(())
    }

    fn open_window(&self, prayer: Prayer) -> Result<()> {
        if !self.prefs.is_enabled()? {
            debug!(%prayer, "ignoring mute start while disabled");
            return Ok(());
        }
        let mode = self.prefs.mute_mode()?;
        let at = self.clock.now();
        match self.audio.on_mute_start(mode)? {
            MuteOutcome::Muted => self.events.emit(&Event::MuteStarted { prayer, mode, at }),
            MuteOutcome::AlreadySilent => self.events.emit(&Event::MuteSkipped { prayer, at }),
            MuteOutcome::AlreadyActive => debug!(%prayer, "window already open"),
        }
        Ok(())
    }

    fn close_window(&self, prayer: Prayer) -> Result<()> {
        let outcome = self.audio.on_mute_end()?;
        self.journal_restore(Some(prayer), outcome);
        Ok(())
    }

    fn journal_restore(&self, prayer: Option<Prayer>, outcome: RestoreOutcome) {
        let at = self.clock.now();
        match outcome {
            RestoreOutcome::Restored => self.events.emit(&Event::AudioRestored { prayer, at }),
            RestoreOutcome::Skipped(reason) => {
                self.events
                    .emit(&Event::RestoreSkipped { prayer, reason, at })
            }
        }
    }
}
