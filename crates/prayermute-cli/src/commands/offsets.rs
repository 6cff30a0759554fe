use clap::Subcommand;
use prayermute_core::{OffsetConfig, OffsetPair, Prayer, Settings};

use super::describe;
use crate::host::Context;

#[derive(Subcommand)]
pub enum OffsetsAction {
    /// Print the offsets of every prayer
    Show,
    /// Set minutes before/after a prayer (0 0 disables it)
    Set {
        /// Prayer name (fajr, sunrise, dhuhr, asr, maghrib, isha)
        prayer: Prayer,
        before: u32,
        after: u32,
    },
    /// Set the Friday Dhuhr override
    Friday { before: u32, after: u32 },
    /// Restore the default offsets
    Reset,
}

pub async fn run(action: OffsetsAction, settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(settings)?;
    let outcome = match action {
        OffsetsAction::Show => {
            let offsets = ctx.coordinator.prefs().offsets()?;
            for prayer in Prayer::ALL {
                let pair = offsets.get(prayer);
                let note = if pair.is_disabled() { "  (off)" } else { "" };
                println!("{:<8} -{:>3} / +{:>3}{note}", prayer.as_str(), pair.before, pair.after);
            }
            let friday = offsets.friday_dhuhr;
            println!("{:<8} -{:>3} / +{:>3}", "friday", friday.before, friday.after);
            return Ok(());
        }
        OffsetsAction::Set {
            prayer,
            before,
            after,
        } => {
            ctx.coordinator
                .set_prayer_offsets(prayer, OffsetPair::new(before, after))
                .await?
        }
        OffsetsAction::Friday { before, after } => {
            ctx.coordinator
                .set_friday_override(OffsetPair::new(before, after))
                .await?
        }
        OffsetsAction::Reset => ctx.coordinator.set_offsets(&OffsetConfig::default()).await?,
    };
    println!("ok: {}", describe(outcome));
    Ok(())
}
