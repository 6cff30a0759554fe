//! Typed view over the injected [`KvStore`].
//!
//! Values are stored as JSON. A value that no longer decodes (older format,
//! manual edit, truncated write) reads as absent and is logged; it never
//! fails the caller.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use super::KvStore;
use crate::audio::{MuteMode, MuteState};
use crate::error::StoreError;
use crate::prayer::{Location, OffsetConfig, PrayerTimeSet};
use crate::retry::RetryState;

/// Every key the core persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefKey {
    Location,
    Enabled,
    Offsets,
    MuteMode,
    AllowMetered,
    RetryState,
    CachedTimes,
    LastFetchFailed,
    MuteState,
    ExhaustedNotifiedDay,
}

impl PrefKey {
    pub fn as_str(self) -> &'static str {
        match self {
            PrefKey::Location => "prefs.location",
            PrefKey::Enabled => "prefs.enabled",
            PrefKey::Offsets => "prefs.offsets",
            PrefKey::MuteMode => "prefs.mute_mode",
            PrefKey::AllowMetered => "prefs.allow_metered",
            PrefKey::RetryState => "state.retry",
            PrefKey::CachedTimes => "state.cached_times",
            PrefKey::LastFetchFailed => "state.last_fetch_failed",
            PrefKey::MuteState => "state.mute",
            PrefKey::ExhaustedNotifiedDay => "state.exhausted_notified_day",
        }
    }
}

#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KvStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    fn get_json<T: DeserializeOwned>(&self, key: PrefKey) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.store.get(key.as_str())? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "stored value is unreadable, treating as absent");
                Ok(None)
            }
        }
    }

    fn set_json<T: Serialize>(&self, key: PrefKey, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|e| StoreError::Encoding {
            key: key.as_str().to_string(),
            message: e.to_string(),
        })?;
        self.store.set(key.as_str(), &raw)
    }

    fn remove(&self, key: PrefKey) -> Result<(), StoreError> {
        self.store.remove(key.as_str())
    }

    // ── User preferences ─────────────────────────────────────────────

    pub fn location(&self) -> Result<Option<Location>, StoreError> {
        self.get_json(PrefKey::Location)
    }

    pub fn set_location(&self, location: Option<&Location>) -> Result<(), StoreError> {
        match location {
            Some(loc) => self.set_json(PrefKey::Location, loc),
            None => self.remove(PrefKey::Location),
        }
    }

    pub fn is_enabled(&self) -> Result<bool, StoreError> {
        Ok(self.get_json(PrefKey::Enabled)?.unwrap_or(false))
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        self.set_json(PrefKey::Enabled, &enabled)
    }

    pub fn offsets(&self) -> Result<OffsetConfig, StoreError> {
        Ok(self.get_json(PrefKey::Offsets)?.unwrap_or_default())
    }

    pub fn set_offsets(&self, offsets: &OffsetConfig) -> Result<(), StoreError> {
        self.set_json(PrefKey::Offsets, offsets)
    }

    pub fn mute_mode(&self) -> Result<MuteMode, StoreError> {
        Ok(self.get_json(PrefKey::MuteMode)?.unwrap_or_default())
    }

    pub fn set_mute_mode(&self, mode: MuteMode) -> Result<(), StoreError> {
        self.set_json(PrefKey::MuteMode, &mode)
    }

    /// Whether retries may run on metered networks. Off unless the user opts in.
    pub fn allow_metered(&self) -> Result<bool, StoreError> {
        Ok(self.get_json(PrefKey::AllowMetered)?.unwrap_or(false))
    }

    pub fn set_allow_metered(&self, allow: bool) -> Result<(), StoreError> {
        self.set_json(PrefKey::AllowMetered, &allow)
    }

    // ── Runtime state ────────────────────────────────────────────────

    pub fn retry_state(&self) -> Result<Option<RetryState>, StoreError> {
        self.get_json(PrefKey::RetryState)
    }

    pub fn set_retry_state(&self, state: &RetryState) -> Result<(), StoreError> {
        self.set_json(PrefKey::RetryState, state)
    }

    pub fn cached_times(&self) -> Result<Option<PrayerTimeSet>, StoreError> {
        self.get_json(PrefKey::CachedTimes)
    }

    pub fn set_cached_times(&self, times: Option<&PrayerTimeSet>) -> Result<(), StoreError> {
        match times {
            Some(set) => self.set_json(PrefKey::CachedTimes, set),
            None => self.remove(PrefKey::CachedTimes),
        }
    }

    pub fn last_fetch_failed(&self) -> Result<bool, StoreError> {
        Ok(self.get_json(PrefKey::LastFetchFailed)?.unwrap_or(false))
    }

    pub fn set_last_fetch_failed(&self, failed: bool) -> Result<(), StoreError> {
        self.set_json(PrefKey::LastFetchFailed, &failed)
    }

    pub fn mute_state(&self) -> Result<MuteState, StoreError> {
        Ok(self.get_json(PrefKey::MuteState)?.unwrap_or_default())
    }

    pub fn set_mute_state(&self, state: &MuteState) -> Result<(), StoreError> {
        match state {
            MuteState::Normal => self.remove(PrefKey::MuteState),
            active => self.set_json(PrefKey::MuteState, active),
        }
    }

    pub fn exhausted_notified_day(&self) -> Result<Option<NaiveDate>, StoreError> {
        self.get_json(PrefKey::ExhaustedNotifiedDay)
    }

    pub fn set_exhausted_notified_day(&self, day: NaiveDate) -> Result<(), StoreError> {
        self.set_json(PrefKey::ExhaustedNotifiedDay, &day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prayer::{OffsetPair, Prayer};
    use crate::storage::MemoryStore;

    fn prefs() -> (Arc<MemoryStore>, Preferences) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), Preferences::new(store))
    }

    #[test]
    fn defaults_when_store_is_empty() {
        let (_, prefs) = prefs();
        assert!(!prefs.is_enabled().unwrap());
        assert!(!prefs.allow_metered().unwrap());
        assert_eq!(prefs.mute_mode().unwrap(), MuteMode::Silent);
        assert_eq!(prefs.mute_state().unwrap(), MuteState::Normal);
        assert!(prefs.location().unwrap().is_none());
        assert_eq!(prefs.offsets().unwrap(), OffsetConfig::default());
    }

    #[test]
    fn corrupted_cached_times_read_as_absent() {
        let (store, prefs) = prefs();
        store
            .set(PrefKey::CachedTimes.as_str(), "2024-03-01|05:40|07:05")
            .unwrap();
        assert!(prefs.cached_times().unwrap().is_none());
    }

    #[test]
    fn offsets_roundtrip() {
        let (_, prefs) = prefs();
        let mut offsets = OffsetConfig::default();
        offsets.set(Prayer::Isha, OffsetPair::new(0, 0));
        prefs.set_offsets(&offsets).unwrap();
        assert!(prefs.offsets().unwrap().get(Prayer::Isha).is_disabled());
    }

    #[test]
    fn normal_mute_state_clears_the_key() {
        let (store, prefs) = prefs();
        prefs.set_mute_state(&MuteState::AlreadySilent).unwrap();
        assert!(store.get(PrefKey::MuteState.as_str()).unwrap().is_some());
        prefs.set_mute_state(&MuteState::Normal).unwrap();
        assert!(store.get(PrefKey::MuteState.as_str()).unwrap().is_none());
    }
}
