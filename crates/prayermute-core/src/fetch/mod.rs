//! Today's time table: fetch, cache, and hand off to scheduling.

use std::sync::Arc;

use chrono::{Days, Duration, NaiveDateTime, NaiveTime};
use tracing::{info, warn};

use crate::alarm::AlarmScheduler;
use crate::clock::Clock;
use crate::error::{FetchError, Result};
use crate::events::{Event, EventSink};
use crate::planner::{Plan, TimeWindowPlanner};
use crate::prayer::PrayerTimeSet;
use crate::provider::{select_today, TimeTableProvider};
use crate::retry::{RetryOutcome, RetryPolicy};
use crate::storage::Preferences;

/// Minutes after local midnight at which the refresh trigger fires.
pub const DAILY_REFRESH_MINUTE: i64 = 5;

pub struct FetchOrchestrator {
    provider: Arc<dyn TimeTableProvider>,
    prefs: Preferences,
    retry: RetryPolicy,
    alarms: AlarmScheduler,
    planner: TimeWindowPlanner,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl FetchOrchestrator {
    pub fn new(
        provider: Arc<dyn TimeTableProvider>,
        prefs: Preferences,
        retry: RetryPolicy,
        alarms: AlarmScheduler,
        events: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            prefs,
            retry,
            alarms,
            planner: TimeWindowPlanner::new(),
            events,
            clock,
        }
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn alarms(&self) -> &AlarmScheduler {
        &self.alarms
    }

    /// Fetch and cache today's set.
    ///
    /// Store failures while recording the outcome are logged, never returned:
    /// the only error a caller sees is the fetch itself failing.
    pub async fn fetch_today(&self, location_id: u32) -> Result<PrayerTimeSet, FetchError> {
        let today = self.clock.today();
        let result = match self.provider.prayer_times(location_id).await {
            Ok(records) => select_today(records, today),
            Err(e) => Err(e),
        };

        match result {
            Ok(set) => {
                info!(location_id, date = %set.date, "prayer times fetched");
                if let Err(e) = self.prefs.set_cached_times(Some(&set)) {
                    warn!(error = %e, "cannot cache prayer times");
                }
                if let Err(e) = self.prefs.set_last_fetch_failed(false) {
                    warn!(error = %e, "cannot clear fetch failure flag");
                }
                if let Err(e) = self.retry.on_success() {
                    warn!(error = %e, "cannot reset retry state");
                }
                self.events.emit(&Event::TimesFetched {
                    location_id,
                    date: set.date,
                    at: self.clock.now(),
                });
                Ok(set)
            }
            Err(e) => {
                warn!(location_id, error = %e, "prayer time fetch failed");
                if let Err(store_err) = self.prefs.set_last_fetch_failed(true) {
                    warn!(error = %store_err, "cannot set fetch failure flag");
                }
                self.events.emit(&Event::FetchFailed {
                    location_id,
                    error: e.to_string(),
                    at: self.clock.now(),
                });
                Err(e)
            }
        }
    }

    /// Fetch, then plan and install; on failure hand over to the retry policy.
    ///
    /// Returns whether the fetch succeeded.
    pub async fn fetch_and_schedule_with_retry(&self, location_id: u32) -> bool {
        match self.fetch_today(location_id).await {
            Ok(set) => {
                if let Err(e) = self.schedule_from(&set) {
                    warn!(error = %e, "cannot install plan for fetched times");
                }
                true
            }
            Err(_) => {
                match self.retry.schedule_retry() {
                    Ok(RetryOutcome::Scheduled { attempt, run_at, .. }) => {
                        info!(attempt, %run_at, "will retry fetch");
                    }
                    Ok(RetryOutcome::Exhausted { .. }) => {}
                    Err(e) => warn!(error = %e, "cannot schedule fetch retry"),
                }
                false
            }
        }
    }

    /// Plan `times` against now, replace the installed prayer triggers and
    /// arm the next daily refresh.
    pub fn schedule_from(&self, times: &PrayerTimeSet) -> Result<Plan> {
        let now = self.clock.now();
        let offsets = self.prefs.offsets()?;
        let plan = self.planner.plan(times, &offsets, now);

        self.alarms.install(&plan.events)?;
        self.alarms.schedule_refresh(next_refresh_at(now))?;

        self.events.emit(&Event::PlanInstalled {
            date: times.date,
            triggers: plan.events.len(),
            at: now,
        });
        Ok(plan)
    }

    /// Compute the plan for `times` without installing anything.
    pub fn preview(&self, times: &PrayerTimeSet) -> Result<Plan> {
        let offsets = self.prefs.offsets()?;
        Ok(self.planner.plan(times, &offsets, self.clock.now()))
    }
}

/// Refresh instant following `now`: 00:05 of the next day.
pub fn next_refresh_at(now: NaiveDateTime) -> NaiveDateTime {
    let date = now.date();
    date.checked_add_days(Days::new(1))
        .unwrap_or(date)
        .and_time(NaiveTime::default())
        + Duration::minutes(DAILY_REFRESH_MINUTE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{StoredWakeTimer, TriggerPayload};
    use crate::clock::FixedClock;
    use crate::events::MemorySink;
    use crate::prayer::Location;
    use crate::provider::DayRecord;
    use crate::retry::{StoredJobQueue, RETRY_JOB_NAME};
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    /// Answers from a queue of canned results.
    struct ScriptedProvider {
        answers: Mutex<Vec<Result<Vec<DayRecord>, FetchError>>>,
    }

    #[async_trait]
    impl TimeTableProvider for ScriptedProvider {
        async fn search_locations(&self, _query: &str) -> Result<Vec<Location>, FetchError> {
            Ok(Vec::new())
        }
        async fn list_locations(
            &self,
            _country: &str,
            _city: Option<&str>,
        ) -> Result<Vec<Location>, FetchError> {
            Ok(Vec::new())
        }
        async fn prayer_times(&self, _location_id: u32) -> Result<Vec<DayRecord>, FetchError> {
            self.answers.lock().unwrap().remove(0)
        }
    }

    fn record(date: &str) -> DayRecord {
        DayRecord {
            date: date.into(),
            fajr: "05:40".into(),
            sun: "07:05".into(),
            dhuhr: "13:05".into(),
            asr: "16:20".into(),
            maghrib: "18:55".into(),
            isha: "20:15".into(),
        }
    }

    struct Fixture {
        prefs: Preferences,
        timer: Arc<StoredWakeTimer>,
        jobs: Arc<StoredJobQueue>,
        sink: Arc<MemorySink>,
        orchestrator: FetchOrchestrator,
    }

    fn fixture(answers: Vec<Result<Vec<DayRecord>, FetchError>>) -> Fixture {
        let now = NaiveDate::from_ymd_opt(2024, 3, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now));
        let store = Arc::new(MemoryStore::new());
        let prefs = Preferences::new(store.clone());
        let timer = Arc::new(StoredWakeTimer::new(store.clone()));
        let jobs = Arc::new(StoredJobQueue::new(store));
        let sink = Arc::new(MemorySink::new());
        let retry = RetryPolicy::new(prefs.clone(), jobs.clone(), sink.clone(), clock.clone());
        let orchestrator = FetchOrchestrator::new(
            Arc::new(ScriptedProvider {
                answers: Mutex::new(answers),
            }),
            prefs.clone(),
            retry,
            AlarmScheduler::new(timer.clone()),
            sink.clone(),
            clock,
        );
        Fixture {
            prefs,
            timer,
            jobs,
            sink,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn success_caches_plans_and_arms_refresh() {
        let f = fixture(vec![Ok(vec![record("2024-03-02T00:00:00")])]);
        assert!(f.orchestrator.fetch_and_schedule_with_retry(9541).await);

        assert_eq!(
            f.prefs.cached_times().unwrap().unwrap().date,
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
        assert!(!f.prefs.last_fetch_failed().unwrap());

        let pending = f.timer.pending().unwrap();
        let refresh = pending
            .iter()
            .find(|t| t.payload == TriggerPayload::DailyRefresh)
            .unwrap();
        assert_eq!(
            refresh.at,
            NaiveDate::from_ymd_opt(2024, 3, 3)
                .unwrap()
                .and_hms_opt(0, 5, 0)
                .unwrap()
        );
        // Fajr and Sunrise are already over at 09:00 and roll to tomorrow.
        assert_eq!(pending.len(), 13);
        assert_eq!(f.sink.count("plan_installed"), 1);
    }

    #[tokio::test]
    async fn failure_sets_flag_and_enqueues_retry() {
        let f = fixture(vec![Err(FetchError::Transport("timed out".into()))]);
        assert!(!f.orchestrator.fetch_and_schedule_with_retry(9541).await);

        assert!(f.prefs.last_fetch_failed().unwrap());
        assert!(f.prefs.cached_times().unwrap().is_none());
        assert!(f.jobs.pending(RETRY_JOB_NAME).unwrap().is_some());
        assert_eq!(f.sink.count("fetch_failed"), 1);
        assert!(f.timer.pending().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_response_is_a_failure() {
        let f = fixture(vec![Ok(Vec::new())]);
        assert_eq!(
            f.orchestrator.fetch_today(1).await,
            Err(FetchError::EmptyResult)
        );
        assert!(f.prefs.last_fetch_failed().unwrap());
    }

    #[tokio::test]
    async fn success_after_failure_resets_retry_state() {
        let f = fixture(vec![
            Err(FetchError::Status { status: 502 }),
            Ok(vec![record("2024-03-02")]),
        ]);
        assert!(!f.orchestrator.fetch_and_schedule_with_retry(7).await);
        assert_eq!(f.orchestrator.retry().current_state().unwrap().attempt_count, 1);

        assert!(f.orchestrator.fetch_and_schedule_with_retry(7).await);
        assert_eq!(f.orchestrator.retry().current_state().unwrap().attempt_count, 0);
        assert!(f.jobs.pending(RETRY_JOB_NAME).unwrap().is_none());
        assert!(!f.prefs.last_fetch_failed().unwrap());
    }

    #[test]
    fn refresh_is_just_after_midnight() {
        let late = NaiveDate::from_ymd_opt(2024, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        assert_eq!(
            next_refresh_at(late),
            NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 5, 0)
                .unwrap()
        );
    }
}
