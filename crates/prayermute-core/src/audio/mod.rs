//! Device audio profile and the mute/restore state machine.

mod machine;

pub use machine::{DeviceMuteStateMachine, MuteOutcome, RestoreOutcome};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AudioError, ValidationError};

/// Device audio profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RingerMode {
    Normal,
    Vibrate,
    Silent,
}

impl RingerMode {
    /// Vibrate and Silent both count as quiet.
    pub fn is_quiet(self) -> bool {
        matches!(self, RingerMode::Vibrate | RingerMode::Silent)
    }
}

impl fmt::Display for RingerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RingerMode::Normal => "normal",
            RingerMode::Vibrate => "vibrate",
            RingerMode::Silent => "silent",
        })
    }
}

impl FromStr for RingerMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(RingerMode::Normal),
            "vibrate" => Ok(RingerMode::Vibrate),
            "silent" => Ok(RingerMode::Silent),
            other => Err(ValidationError::UnknownRingerMode(other.to_string())),
        }
    }
}

/// Ringer mode applied while a window is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuteMode {
    #[default]
    Silent,
    Vibrate,
}

impl MuteMode {
    pub fn ringer_mode(self) -> RingerMode {
        match self {
            MuteMode::Silent => RingerMode::Silent,
            MuteMode::Vibrate => RingerMode::Vibrate,
        }
    }
}

impl fmt::Display for MuteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.ringer_mode().fmt(f)
    }
}

impl FromStr for MuteMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silent" => Ok(MuteMode::Silent),
            "vibrate" => Ok(MuteMode::Vibrate),
            other => Err(ValidationError::UnknownMuteMode(other.to_string())),
        }
    }
}

/// Volume streams captured in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    Ring,
    Media,
    Alarm,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stream::Ring => "ring",
            Stream::Media => "media",
            Stream::Alarm => "alarm",
        })
    }
}

/// The host's audio controls.
pub trait AudioDevice: Send + Sync {
    fn ringer_mode(&self) -> Result<RingerMode, AudioError>;
    fn set_ringer_mode(&self, mode: RingerMode) -> Result<(), AudioError>;
    fn volume(&self, stream: Stream) -> Result<u32, AudioError>;
    fn set_volume(&self, stream: Stream, level: u32) -> Result<(), AudioError>;
}

/// Audio profile captured when a window opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSnapshot {
    pub ringer_mode: RingerMode,
    pub ring_volume: u32,
    pub media_volume: u32,
    pub alarm_volume: u32,
}

impl AudioSnapshot {
    pub fn capture(device: &dyn AudioDevice) -> Result<Self, AudioError> {
        Ok(Self {
            ringer_mode: device.ringer_mode()?,
            ring_volume: device.volume(Stream::Ring)?,
            media_volume: device.volume(Stream::Media)?,
            alarm_volume: device.volume(Stream::Alarm)?,
        })
    }
}

/// Persisted mute tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MuteState {
    #[default]
    Normal,
    /// A window is active but the device was already quiet when it opened.
    AlreadySilent,
    Muted {
        snapshot: AudioSnapshot,
        mode_set: RingerMode,
    },
}

impl MuteState {
    pub fn is_active(&self) -> bool {
        !matches!(self, MuteState::Normal)
    }
}

/// Why a window closed without touching the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreSkipReason {
    /// The device was already quiet when the window opened.
    WasAlreadySilent,
    /// Someone changed the ringer mode during the window.
    ChangedDuringWindow,
    /// No window was active.
    NotMuted,
}
