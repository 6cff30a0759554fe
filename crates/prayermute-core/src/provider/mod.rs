//! Prayer time table provider.
//!
//! The core only depends on [`TimeTableProvider`]; [`HttpTimeTableProvider`]
//! talks to the public Diyanet mirror over HTTPS.

mod http;

pub use http::HttpTimeTableProvider;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::prayer::{Location, PrayerTimeSet};

/// One day as returned by the provider, times still raw "HH:MM".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    /// ISO date, possibly followed by a time part.
    pub date: String,
    pub fajr: String,
    pub sun: String,
    pub dhuhr: String,
    pub asr: String,
    pub maghrib: String,
    pub isha: String,
}

impl DayRecord {
    /// Calendar date from the first ten characters of `date`.
    pub fn day(&self) -> Result<NaiveDate, FetchError> {
        let head = self.date.get(..10).unwrap_or(&self.date);
        NaiveDate::parse_from_str(head, "%Y-%m-%d")
            .map_err(|e| FetchError::Malformed(format!("date '{}': {e}", self.date)))
    }

    pub fn into_time_set(self) -> Result<PrayerTimeSet, FetchError> {
        Ok(PrayerTimeSet {
            date: self.day()?,
            fajr: self.fajr,
            sunrise: self.sun,
            dhuhr: self.dhuhr,
            asr: self.asr,
            maghrib: self.maghrib,
            isha: self.isha,
        })
    }
}

/// Pick today's record, falling back to the first one.
pub fn select_today(records: Vec<DayRecord>, today: NaiveDate) -> Result<PrayerTimeSet, FetchError> {
    let index = records
        .iter()
        .position(|r| r.day().is_ok_and(|d| d == today))
        .unwrap_or(0);
    records
        .into_iter()
        .nth(index)
        .ok_or(FetchError::EmptyResult)?
        .into_time_set()
}

#[async_trait]
pub trait TimeTableProvider: Send + Sync {
    /// Free-text location search.
    async fn search_locations(&self, query: &str) -> Result<Vec<Location>, FetchError>;

    /// Browse the directory by country, optionally narrowed to a city.
    async fn list_locations(
        &self,
        country: &str,
        city: Option<&str>,
    ) -> Result<Vec<Location>, FetchError>;

    /// Upcoming days for a location, in provider order.
    async fn prayer_times(&self, location_id: u32) -> Result<Vec<DayRecord>, FetchError>;
}
