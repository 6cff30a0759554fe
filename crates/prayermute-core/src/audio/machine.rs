//! Mute/restore state machine.
//!
//! ## State Transitions
//!
//! ```text
//! Normal --mute_start(quiet device)--> AlreadySilent --mute_end--> Normal
//! Normal --mute_start(loud device)---> Muted(snapshot) --mute_end--> Normal
//! ```
//!
//! `mute_end` restores the snapshot only when the ringer mode is still the
//! one this machine set. Any other mode means the user changed it during the
//! window, and that choice wins.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AudioDevice, AudioSnapshot, MuteMode, MuteState, RestoreSkipReason, Stream};
use crate::error::Result;
use crate::storage::Preferences;

/// Result of opening a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuteOutcome {
    Muted,
    /// Device was already quiet; nothing changed and nothing will be restored.
    AlreadySilent,
    /// A window was already active; its snapshot is kept.
    AlreadyActive,
}

/// Result of closing a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreOutcome {
    Restored,
    Skipped(RestoreSkipReason),
}

pub struct DeviceMuteStateMachine {
    device: Arc<dyn AudioDevice>,
    prefs: Preferences,
}

impl DeviceMuteStateMachine {
    pub fn new(device: Arc<dyn AudioDevice>, prefs: Preferences) -> Self {
        Self { device, prefs }
    }

    pub fn state(&self) -> Result<MuteState> {
        Ok(self.prefs.mute_state()?)
    }

    pub fn on_mute_start(&self, mode: MuteMode) -> Result<MuteOutcome> {
        if self.prefs.mute_state()?.is_active() {
            debug!("mute window already active, keeping existing snapshot");
            return Ok(MuteOutcome::AlreadyActive);
        }

        if self.device.ringer_mode()?.is_quiet() {
            self.prefs.set_mute_state(&MuteState::AlreadySilent)?;
            info!("device already quiet, nothing to mute");
            return Ok(MuteOutcome::AlreadySilent);
        }

        let snapshot = AudioSnapshot::capture(self.device.as_ref())?;
        let mode_set = mode.ringer_mode();
        // Persist before touching the device so a crash mid-way still restores.
        self.prefs
            .set_mute_state(&MuteState::Muted { snapshot, mode_set })?;
        self.device.set_ringer_mode(mode_set)?;
        info!(?snapshot, mode = %mode, "device muted");
        Ok(MuteOutcome::Muted)
    }

    pub fn on_mute_end(&self) -> Result<RestoreOutcome> {
        let outcome = match self.prefs.mute_state()? {
            MuteState::Normal => {
                debug!("no active mute window, nothing to restore");
                return Ok(RestoreOutcome::Skipped(RestoreSkipReason::NotMuted));
            }
            MuteState::AlreadySilent => RestoreOutcome::Skipped(RestoreSkipReason::WasAlreadySilent),
            MuteState::Muted { snapshot, mode_set } => {
                let current = self.device.ringer_mode()?;
                if current != mode_set {
                    info!(%current, expected = %mode_set, "ringer mode changed during window, leaving it");
                    RestoreOutcome::Skipped(RestoreSkipReason::ChangedDuringWindow)
                } else {
                    self.restore(&snapshot)?;
                    info!(?snapshot, "audio restored");
                    RestoreOutcome::Restored
                }
            }
        };

        self.prefs.set_mute_state(&MuteState::Normal)?;
        Ok(outcome)
    }

    fn restore(&self, snapshot: &AudioSnapshot) -> Result<()> {
        self.device.set_ringer_mode(snapshot.ringer_mode)?;
        self.device.set_volume(Stream::Ring, snapshot.ring_volume)?;
        self.device.set_volume(Stream::Media, snapshot.media_volume)?;
        self.device.set_volume(Stream::Alarm, snapshot.alarm_volume)?;
        Ok(())
    }
}
