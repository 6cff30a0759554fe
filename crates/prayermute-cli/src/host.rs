//! Wires the core onto the CLI's SQLite-backed host primitives.

use std::error::Error;
use std::sync::Arc;

use prayermute_core::events::{Event, EventSink};
use prayermute_core::{
    Coordinator, Database, Host, HttpTimeTableProvider, Settings, StoredJobQueue,
    StoredWakeTimer, SystemClock,
};

use crate::device::StoredAudioDevice;

/// Journals events and surfaces the once-a-day failure notice on stderr.
pub struct JournalSink {
    db: Arc<Database>,
    journal: bool,
}

impl EventSink for JournalSink {
    fn emit(&self, event: &Event) {
        if let Event::RetryExhausted { day, .. } = event {
            eprintln!("notice: prayer times for {day} could not be fetched after all retries");
        }
        if self.journal {
            self.db.emit(event);
        }
    }
}

pub struct Context {
    pub db: Arc<Database>,
    pub settings: Settings,
    pub timer: Arc<StoredWakeTimer>,
    pub jobs: Arc<StoredJobQueue>,
    pub device: Arc<StoredAudioDevice>,
    pub provider: Arc<HttpTimeTableProvider>,
    pub coordinator: Coordinator,
}

impl Context {
    pub fn open(settings: Settings) -> Result<Self, Box<dyn Error>> {
        let db = Arc::new(Database::open()?.with_journal_limit(settings.log.journal_limit));
        let timer = Arc::new(StoredWakeTimer::new(db.clone()));
        let jobs = Arc::new(StoredJobQueue::new(db.clone()));
        let device = Arc::new(StoredAudioDevice::new(db.clone()));
        let provider = Arc::new(HttpTimeTableProvider::from_settings(&settings.provider)?);
        let events = Arc::new(JournalSink {
            db: db.clone(),
            journal: settings.log.journal,
        });

        let coordinator = Coordinator::new(Host {
            store: db.clone(),
            audio: device.clone(),
            timer: timer.clone(),
            jobs: jobs.clone(),
            provider: provider.clone(),
            events,
            clock: Arc::new(SystemClock),
        });

        Ok(Self {
            db,
            settings,
            timer,
            jobs,
            device,
            provider,
            coordinator,
        })
    }
}
