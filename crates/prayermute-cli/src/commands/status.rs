use prayermute_core::Settings;

use crate::host::Context;

pub fn status(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(settings)?;
    let status = ctx.coordinator.today_status()?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

pub fn plan(settings: Settings, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(settings)?;
    let Some(plan) = ctx.coordinator.plan_preview()? else {
        return Err("no prayer times cached; run `prayermute enable` first".into());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    for window in &plan.windows {
        let name = if window.prayer == window.closing_prayer {
            window.prayer.to_string()
        } else {
            format!("{}..{}", window.prayer, window.closing_prayer)
        };
        println!(
            "{name:<16} {} - {}  ({} min)",
            window.start.format("%a %H:%M"),
            window.end.format("%a %H:%M"),
            window.duration_minutes()
        );
    }
    let pending = ctx.timer.pending()?;
    println!("{} triggers pending", pending.len());
    Ok(())
}
