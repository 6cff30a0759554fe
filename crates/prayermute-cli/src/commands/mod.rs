pub mod config;
pub mod device;
pub mod history;
pub mod lifecycle;
pub mod location;
pub mod offsets;
pub mod prefs;
pub mod status;

use prayermute_core::Reschedule;

/// One-line summary of a planning pass.
pub fn describe(outcome: Reschedule) -> String {
    match outcome {
        Reschedule::Inactive => "inactive (disabled or no location selected)".into(),
        Reschedule::FromCache { triggers } => format!("{triggers} triggers scheduled from cached times"),
        Reschedule::Fetched { triggers } => format!("times fetched, {triggers} triggers scheduled"),
        Reschedule::FetchFailed { planned_stale: true } => {
            "fetch failed, retry queued; scheduled from last known times".into()
        }
        Reschedule::FetchFailed { planned_stale: false } => "fetch failed, retry queued".into(),
    }
}
