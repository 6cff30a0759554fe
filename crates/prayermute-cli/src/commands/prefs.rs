use clap::Subcommand;
use prayermute_core::{MuteMode, Settings};

use crate::host::Context;

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Print mute mode and network preference
    Show,
    /// Ringer mode used while muted (silent or vibrate)
    MuteMode { mode: MuteMode },
    /// Allow fetch retries over metered networks
    AllowMetered {
        #[arg(action = clap::ArgAction::Set)]
        allow: bool,
    },
}

pub fn run(action: PrefsAction, settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(settings)?;
    let prefs = ctx.coordinator.prefs();
    match action {
        PrefsAction::Show => {
            println!("mute_mode     = {}", prefs.mute_mode()?);
            println!("allow_metered = {}", prefs.allow_metered()?);
        }
        PrefsAction::MuteMode { mode } => {
            ctx.coordinator.set_mute_mode(mode)?;
            println!("ok");
        }
        PrefsAction::AllowMetered { allow } => {
            ctx.coordinator.set_allow_metered(allow)?;
            println!("ok");
        }
    }
    Ok(())
}
