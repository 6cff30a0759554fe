//! Simulated audio device persisted in the state store.
//!
//! A desktop host has no phone ringer; the profile lives under `device.*`
//! keys so `prayermute device` can inspect it and play the user changing it
//! during a window.

use std::sync::Arc;

use prayermute_core::audio::{AudioDevice, RingerMode, Stream};
use prayermute_core::error::AudioError;
use prayermute_core::KvStore;

const MODE_KEY: &str = "device.ringer_mode";

fn volume_key(stream: Stream) -> String {
    format!("device.volume.{stream}")
}

fn default_volume(stream: Stream) -> u32 {
    match stream {
        Stream::Ring => 5,
        Stream::Media => 10,
        Stream::Alarm => 7,
    }
}

pub struct StoredAudioDevice {
    store: Arc<dyn KvStore>,
}

impl StoredAudioDevice {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    fn read(&self, key: &str) -> Result<Option<String>, AudioError> {
        self.store
            .get(key)
            .map_err(|e| AudioError::Unavailable(e.to_string()))
    }
}

impl AudioDevice for StoredAudioDevice {
    fn ringer_mode(&self) -> Result<RingerMode, AudioError> {
        match self.read(MODE_KEY)? {
            Some(raw) => raw
                .parse::<RingerMode>()
                .map_err(|e| AudioError::Unavailable(e.to_string())),
            None => Ok(RingerMode::Normal),
        }
    }

    fn set_ringer_mode(&self, mode: RingerMode) -> Result<(), AudioError> {
        self.store
            .set(MODE_KEY, &mode.to_string())
            .map_err(|e| AudioError::RingerMode(e.to_string()))
    }

    fn volume(&self, stream: Stream) -> Result<u32, AudioError> {
        match self.read(&volume_key(stream))? {
            Some(raw) => raw.parse().map_err(|_| AudioError::Volume {
                stream: stream.to_string(),
                message: format!("stored level '{raw}' is not a number"),
            }),
            None => Ok(default_volume(stream)),
        }
    }

    fn set_volume(&self, stream: Stream, level: u32) -> Result<(), AudioError> {
        self.store
            .set(&volume_key(stream), &level.to_string())
            .map_err(|e| AudioError::Volume {
                stream: stream.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prayermute_core::MemoryStore;

    #[test]
    fn defaults_until_written() {
        let device = StoredAudioDevice::new(Arc::new(MemoryStore::new()));
        assert_eq!(device.ringer_mode().unwrap(), RingerMode::Normal);
        assert_eq!(device.volume(Stream::Media).unwrap(), 10);

        device.set_ringer_mode(RingerMode::Vibrate).unwrap();
        device.set_volume(Stream::Ring, 2).unwrap();
        assert_eq!(device.ringer_mode().unwrap(), RingerMode::Vibrate);
        assert_eq!(device.volume(Stream::Ring).unwrap(), 2);
    }

    #[test]
    fn garbage_volume_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        store.set("device.volume.alarm", "loud").unwrap();
        let device = StoredAudioDevice::new(store);
        assert!(matches!(
            device.volume(Stream::Alarm),
            Err(AudioError::Volume { .. })
        ));
    }
}
