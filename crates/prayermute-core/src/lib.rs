//! # Prayermute Core Library
//!
//! This library provides the scheduling core of prayermute: it silences a
//! device around the daily prayer times and restores its audio profile
//! afterward. Hosts (the CLI, or a mobile shell) supply the platform
//! primitives through traits and forward fired triggers back in.
//!
//! ## Architecture
//!
//! - **Planner**: Turns a day's prayer times and per-prayer offsets into
//!   mute-start/mute-end triggers still ahead of now
//! - **Alarm**: Installs triggers on a wake timer, one stable slot per boundary
//! - **Audio**: Snapshot/restore state machine that respects changes made by
//!   the user during a window
//! - **Fetch/Retry**: Obtains today's table from the provider and retries on a
//!   fixed backoff ladder, notifying once per day when it runs out
//! - **Storage**: Key-value preferences (SQLite-backed) and TOML host settings
//!
//! ## Key Components
//!
//! - [`Coordinator`]: Entry point for user actions and fired triggers
//! - [`TimeWindowPlanner`]: Pure planning function
//! - [`DeviceMuteStateMachine`]: Mute/restore decisions
//! - [`RetryPolicy`]: Backoff ladder and daily attempt counter
//! - [`Database`]: SQLite key-value store and event journal

pub mod alarm;
pub mod audio;
pub mod clock;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod fetch;
pub mod planner;
pub mod prayer;
pub mod provider;
pub mod retry;
pub mod storage;

pub use alarm::{AlarmScheduler, StoredWakeTimer, TriggerPayload, WakeTimer, REFRESH_SLOT};
pub use audio::{AudioDevice, AudioSnapshot, DeviceMuteStateMachine, MuteMode, MuteState, RingerMode, Stream};
pub use clock::{Clock, FixedClock, SystemClock};
pub use coordinator::{Coordinator, Host, Reschedule, TodayStatus};
pub use error::{AudioError, ConfigError, CoreError, FetchError, SchedulerError, StoreError, ValidationError};
pub use events::{Event, EventSink, MemorySink, NullSink};
pub use fetch::FetchOrchestrator;
pub use planner::{MuteAction, MuteWindow, Plan, ScheduledEvent, TimeWindowPlanner};
pub use prayer::{Location, OffsetConfig, OffsetPair, Prayer, PrayerTimeSet};
pub use provider::{HttpTimeTableProvider, TimeTableProvider};
pub use retry::{JobQueue, RetryPolicy, RetryState, StoredJobQueue, RETRY_JOB_NAME};
pub use storage::{Database, KvStore, MemoryStore, Preferences, Settings};
