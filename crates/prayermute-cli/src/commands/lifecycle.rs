use prayermute_core::retry::RETRY_JOB_NAME;
use prayermute_core::{Clock, Settings, SystemClock, WakeTimer, REFRESH_SLOT};
use tracing::{info, warn};

use super::describe;
use crate::host::Context;

pub async fn enable(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(settings)?;
    if ctx.coordinator.prefs().location()?.is_none() {
        eprintln!("no location selected yet; run `prayermute location select <id>`");
    }
    let outcome = ctx.coordinator.enable().await?;
    println!("enabled: {}", describe(outcome));
    Ok(())
}

pub fn disable(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(settings)?;
    ctx.coordinator.disable()?;
    println!("disabled");
    Ok(())
}

pub async fn boot(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(settings)?;
    let outcome = ctx.coordinator.boot().await?;
    println!("{}", describe(outcome));
    Ok(())
}

/// Fire every due trigger in order, then the retry job if it is due.
pub async fn tick(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(settings)?;
    let now = SystemClock.now();

    let due = ctx.timer.take_due(now)?;
    for trigger in &due {
        info!(slot = trigger.slot, at = %trigger.at, "firing trigger");
        match ctx.coordinator.on_trigger(trigger.payload).await {
            Ok(outcome) => println!("slot {}: {}", trigger.slot, describe(outcome)),
            Err(e) => warn!(slot = trigger.slot, error = %e, "trigger handler failed"),
        }
    }

    if let Some(job) = ctx.jobs.take_due(RETRY_JOB_NAME, now)? {
        info!(network = ?job.request.network, "running retry job");
        let outcome = ctx.coordinator.run_retry_job().await?;
        println!("retry: {}", describe(outcome));
    }
    Ok(())
}

pub async fn fire(settings: Settings, slot: u8) -> Result<(), Box<dyn std::error::Error>> {
    if slot > REFRESH_SLOT {
        return Err(format!("slot must be between 0 and {REFRESH_SLOT}").into());
    }
    let ctx = Context::open(settings)?;
    let trigger = ctx
        .timer
        .get(slot)?
        .ok_or_else(|| format!("no trigger pending in slot {slot}"))?;
    ctx.timer.cancel(slot)?;
    let outcome = ctx.coordinator.on_trigger(trigger.payload).await?;
    println!("slot {slot}: {}", describe(outcome));
    Ok(())
}
