//! Mute window planning.
//!
//! Turns a day's [`PrayerTimeSet`] and the user's [`OffsetConfig`] into the
//! trigger events still ahead of "now":
//! - Resolves offsets per prayer (Friday Dhuhr override included)
//! - Skips prayers whose offsets are both zero and prayers with a malformed time
//! - Rolls a window that has fully elapsed forward by one day
//! - Keeps yesterday's window while it is still open past midnight
//! - Merges overlapping windows so only one snapshot is ever active
//! - Emits start and end events independently, allowing end-only partial windows

use chrono::{Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::prayer::{parse_hhmm, OffsetConfig, Prayer, PrayerTimeSet};

/// Number of prayer slots (6 prayers x start/end).
pub const PRAYER_SLOTS: u8 = 12;

/// Trigger kind at a window boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuteAction {
    MuteStart,
    MuteEnd,
}

impl MuteAction {
    /// Stable replace/cancel key for this prayer boundary.
    pub fn slot_for(self, prayer: Prayer) -> u8 {
        let base = prayer.ordinal() * 2;
        match self {
            MuteAction::MuteStart => base,
            MuteAction::MuteEnd => base + 1,
        }
    }
}

/// Interval during which the device stays muted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuteWindow {
    /// Prayer whose MuteStart opens the window.
    pub prayer: Prayer,
    /// Prayer whose MuteEnd closes the window; differs from `prayer`
    /// only for merged windows.
    pub closing_prayer: Prayer,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl MuteWindow {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn overlaps(&self, other: &MuteWindow) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Whether the device should be muted at `at`.
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at < self.end
    }
}

/// One trigger to install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub action: MuteAction,
    pub prayer: Prayer,
    pub trigger_at: NaiveDateTime,
    pub slot: u8,
}

impl ScheduledEvent {
    pub fn new(action: MuteAction, prayer: Prayer, trigger_at: NaiveDateTime) -> Self {
        Self {
            action,
            prayer,
            trigger_at,
            slot: action.slot_for(prayer),
        }
    }
}

/// Output of one planning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Windows after merging, ordered by start.
    pub windows: Vec<MuteWindow>,
    /// Future triggers, ordered by instant.
    pub events: Vec<ScheduledEvent>,
}

impl Plan {
    /// The window open at `at`, if any.
    pub fn window_covering(&self, at: NaiveDateTime) -> Option<&MuteWindow> {
        self.windows.iter().find(|w| w.contains(at))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TimeWindowPlanner;

impl TimeWindowPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Window for one prayer anchored on `date`, or `None` when its offsets
    /// are both zero or its time is malformed.
    pub fn window_for(
        &self,
        prayer: Prayer,
        time: &str,
        offsets: &OffsetConfig,
        date: NaiveDate,
    ) -> Option<MuteWindow> {
        let time = parse_time(prayer, time)?;
        self.window_at(prayer, time, offsets, date)
    }

    fn window_at(
        &self,
        prayer: Prayer,
        time: NaiveTime,
        offsets: &OffsetConfig,
        date: NaiveDate,
    ) -> Option<MuteWindow> {
        let pair = offsets.resolve(prayer, date);
        if pair.is_disabled() {
            return None;
        }
        let instant = date.and_time(time);
        Some(MuteWindow {
            prayer,
            closing_prayer: prayer,
            start: instant - Duration::minutes(i64::from(pair.before)),
            end: instant + Duration::minutes(i64::from(pair.after)),
        })
    }

    /// Plan the triggers still ahead of `now`.
    ///
    /// Each prayer gets the first of its windows anchored on yesterday,
    /// today and tomorrow that has not yet ended. A window opened before
    /// midnight therefore keeps its end after a re-plan past midnight, and
    /// a plan computed late in the evening already covers tomorrow's early
    /// prayers. One window per prayer keeps every slot unique.
    pub fn plan(&self, times: &PrayerTimeSet, offsets: &OffsetConfig, now: NaiveDateTime) -> Plan {
        let today = now.date();
        let days = [
            today.checked_sub_days(Days::new(1)),
            Some(today),
            today.checked_add_days(Days::new(1)),
        ];

        let mut windows: Vec<MuteWindow> = times
            .entries()
            .filter_map(|(prayer, time)| {
                let time = parse_time(prayer, time)?;
                days.iter()
                    .flatten()
                    .filter_map(|&date| self.window_at(prayer, time, offsets, date))
                    .find(|window| window.end > now)
            })
            .collect();
        windows.sort_by_key(|w| w.start);

        let windows = merge_overlapping(windows);

        let mut events = Vec::with_capacity(windows.len() * 2);
        for window in &windows {
            if window.start > now {
                events.push(ScheduledEvent::new(MuteAction::MuteStart, window.prayer, window.start));
            }
            if window.end > now {
                events.push(ScheduledEvent::new(MuteAction::MuteEnd, window.closing_prayer, window.end));
            }
        }
        events.sort_by_key(|e| (e.trigger_at, e.slot));

        Plan { windows, events }
    }
}

fn parse_time(prayer: Prayer, value: &str) -> Option<NaiveTime> {
    match parse_hhmm(value) {
        Ok(time) => Some(time),
        Err(e) => {
            warn!(%prayer, error = %e, "skipping prayer with malformed time");
            None
        }
    }
}

/// Merge windows that overlap or touch. Input must be sorted by start.
fn merge_overlapping(windows: Vec<MuteWindow>) -> Vec<MuteWindow> {
    let mut merged: Vec<MuteWindow> = Vec::with_capacity(windows.len());
    for window in windows {
        match merged.last_mut() {
            Some(current) if window.start <= current.end => {
                if window.end > current.end {
                    current.end = window.end;
                    current.closing_prayer = window.closing_prayer;
                }
            }
            _ => merged.push(window),
        }
    }
    merged
}
