//! Per-prayer mute offsets.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::Prayer;

/// Minutes to stay muted before and after a prayer time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetPair {
    pub before: u32,
    pub after: u32,
}

impl OffsetPair {
    pub const fn new(before: u32, after: u32) -> Self {
        Self { before, after }
    }

    /// No window exists for a prayer whose offsets are both zero.
    pub fn is_disabled(&self) -> bool {
        self.before == 0 && self.after == 0
    }
}

const DEFAULT_PAIR: OffsetPair = OffsetPair::new(5, 30);
const DEFAULT_SUNRISE_PAIR: OffsetPair = OffsetPair::new(30, 0);
const DEFAULT_FRIDAY_PAIR: OffsetPair = OffsetPair::new(10, 45);

fn default_friday_dhuhr() -> OffsetPair {
    DEFAULT_FRIDAY_PAIR
}

/// Offsets for all six prayers plus the Friday Dhuhr override.
///
/// Prayers absent from `prayers` fall back to the built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetConfig {
    #[serde(default)]
    pub prayers: BTreeMap<Prayer, OffsetPair>,
    #[serde(default = "default_friday_dhuhr")]
    pub friday_dhuhr: OffsetPair,
}

impl Default for OffsetConfig {
    fn default() -> Self {
        Self {
            prayers: BTreeMap::new(),
            friday_dhuhr: DEFAULT_FRIDAY_PAIR,
        }
    }
}

impl OffsetConfig {
    /// Built-in offsets for a prayer.
    pub fn default_for(prayer: Prayer) -> OffsetPair {
        match prayer {
            Prayer::Sunrise => DEFAULT_SUNRISE_PAIR,
            _ => DEFAULT_PAIR,
        }
    }

    /// Configured offsets for a prayer, ignoring the Friday override.
    pub fn get(&self, prayer: Prayer) -> OffsetPair {
        self.prayers
            .get(&prayer)
            .copied()
            .unwrap_or_else(|| Self::default_for(prayer))
    }

    pub fn set(&mut self, prayer: Prayer, pair: OffsetPair) {
        self.prayers.insert(prayer, pair);
    }

    /// Offsets in effect for `prayer` on `date`; Dhuhr on a Friday uses
    /// the override pair.
    pub fn resolve(&self, prayer: Prayer, date: NaiveDate) -> OffsetPair {
        if prayer == Prayer::Dhuhr && date.weekday() == Weekday::Fri {
            self.friday_dhuhr
        } else {
            self.get(prayer)
        }
    }
}
