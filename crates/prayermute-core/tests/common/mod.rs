//! Fake host shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use prayermute_core::audio::{AudioDevice, RingerMode, Stream};
use prayermute_core::error::{AudioError, FetchError};
use prayermute_core::provider::{DayRecord, TimeTableProvider};
use prayermute_core::{
    Clock, Coordinator, FixedClock, Host, Location, MemorySink, MemoryStore, StoredJobQueue,
    StoredWakeTimer,
};

/// Saturday 2024-03-02 at the given time.
pub fn saturday(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 2)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

pub fn istanbul() -> Location {
    Location {
        id: 9541,
        country: "TURKIYE".into(),
        city: "ISTANBUL".into(),
        region: None,
    }
}

#[derive(Debug)]
pub struct FakeDevice {
    mode: Mutex<RingerMode>,
    volumes: Mutex<[u32; 3]>,
}

impl FakeDevice {
    pub fn new(mode: RingerMode, ring: u32, media: u32, alarm: u32) -> Self {
        Self {
            mode: Mutex::new(mode),
            volumes: Mutex::new([ring, media, alarm]),
        }
    }

    pub fn mode(&self) -> RingerMode {
        *self.mode.lock().unwrap()
    }

    pub fn volumes(&self) -> [u32; 3] {
        *self.volumes.lock().unwrap()
    }

    fn index(stream: Stream) -> usize {
        match stream {
            Stream::Ring => 0,
            Stream::Media => 1,
            Stream::Alarm => 2,
        }
    }
}

impl AudioDevice for FakeDevice {
    fn ringer_mode(&self) -> Result<RingerMode, AudioError> {
        Ok(self.mode())
    }

    fn set_ringer_mode(&self, mode: RingerMode) -> Result<(), AudioError> {
        *self.mode.lock().unwrap() = mode;
        Ok(())
    }

    fn volume(&self, stream: Stream) -> Result<u32, AudioError> {
        Ok(self.volumes()[Self::index(stream)])
    }

    fn set_volume(&self, stream: Stream, level: u32) -> Result<(), AudioError> {
        self.volumes.lock().unwrap()[Self::index(stream)] = level;
        Ok(())
    }
}

/// Serves a fixed table dated "today" unless failures are queued.
pub struct FakeProvider {
    clock: Arc<FixedClock>,
    failures: Mutex<VecDeque<FetchError>>,
    always_fail: Mutex<bool>,
    calls: Mutex<usize>,
}

impl FakeProvider {
    pub fn new(clock: Arc<FixedClock>) -> Self {
        Self {
            clock,
            failures: Mutex::new(VecDeque::new()),
            always_fail: Mutex::new(false),
            calls: Mutex::new(0),
        }
    }

    pub fn fail_next(&self, error: FetchError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn set_always_fail(&self, fail: bool) {
        *self.always_fail.lock().unwrap() = fail;
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl TimeTableProvider for FakeProvider {
    async fn search_locations(&self, _query: &str) -> Result<Vec<Location>, FetchError> {
        Ok(vec![istanbul()])
    }

    async fn list_locations(
        &self,
        _country: &str,
        _city: Option<&str>,
    ) -> Result<Vec<Location>, FetchError> {
        Ok(vec![istanbul()])
    }

    async fn prayer_times(&self, _location_id: u32) -> Result<Vec<DayRecord>, FetchError> {
        *self.calls.lock().unwrap() += 1;
        if *self.always_fail.lock().unwrap() {
            return Err(FetchError::Transport("network unreachable".into()));
        }
        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        Ok(vec![DayRecord {
            date: format!("{}T00:00:00", self.clock.today()),
            fajr: "05:40".into(),
            sun: "07:05".into(),
            dhuhr: "13:05".into(),
            asr: "16:20".into(),
            maghrib: "18:55".into(),
            isha: "20:15".into(),
        }])
    }
}

pub struct TestHost {
    pub clock: Arc<FixedClock>,
    pub store: Arc<MemoryStore>,
    pub device: Arc<FakeDevice>,
    pub timer: Arc<StoredWakeTimer>,
    pub jobs: Arc<StoredJobQueue>,
    pub provider: Arc<FakeProvider>,
    pub sink: Arc<MemorySink>,
    pub coordinator: Coordinator,
}

impl TestHost {
    /// Host at Saturday 09:00 with a loud device (ring 5, media 10, alarm 7).
    pub fn new() -> Self {
        Self::with_device(FakeDevice::new(RingerMode::Normal, 5, 10, 7))
    }

    pub fn with_device(device: FakeDevice) -> Self {
        let clock = Arc::new(FixedClock::new(saturday(9, 0)));
        let store = Arc::new(MemoryStore::new());
        let device = Arc::new(device);
        let timer = Arc::new(StoredWakeTimer::new(store.clone()));
        let jobs = Arc::new(StoredJobQueue::new(store.clone()));
        let provider = Arc::new(FakeProvider::new(clock.clone()));
        let sink = Arc::new(MemorySink::new());

        let coordinator = Coordinator::new(Host {
            store: store.clone(),
            audio: device.clone(),
            timer: timer.clone(),
            jobs: jobs.clone(),
            provider: provider.clone(),
            events: sink.clone(),
            clock: clock.clone(),
        });

        Self {
            clock,
            store,
            device,
            timer,
            jobs,
            provider,
            sink,
            coordinator,
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }
}
