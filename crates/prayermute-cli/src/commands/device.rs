use clap::Subcommand;
use prayermute_core::audio::{AudioDevice, AudioSnapshot, RingerMode, Stream};
use prayermute_core::Settings;

use crate::host::Context;

#[derive(Subcommand)]
pub enum DeviceAction {
    /// Print the current ringer mode and volumes as JSON
    Show,
    /// Change the simulated device, as a user would
    Set {
        /// Ringer mode (normal, vibrate, silent)
        #[arg(long)]
        mode: Option<RingerMode>,
        #[arg(long)]
        ring: Option<u32>,
        #[arg(long)]
        media: Option<u32>,
        #[arg(long)]
        alarm: Option<u32>,
    },
}

pub fn run(action: DeviceAction, settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(settings)?;
    let device = ctx.device.as_ref();
    match action {
        DeviceAction::Show => {
            let snapshot = AudioSnapshot::capture(device)?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        DeviceAction::Set {
            mode,
            ring,
            media,
            alarm,
        } => {
            if let Some(mode) = mode {
                device.set_ringer_mode(mode)?;
            }
            for (stream, level) in [(Stream::Ring, ring), (Stream::Media, media), (Stream::Alarm, alarm)] {
                if let Some(level) = level {
                    device.set_volume(stream, level)?;
                }
            }
            println!("ok");
        }
    }
    Ok(())
}
