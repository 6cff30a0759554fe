use prayermute_core::Settings;

use crate::host::Context;

pub fn run(settings: Settings, limit: usize, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::open(settings)?;
    let entries = ctx.db.recent_events(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("journal is empty");
    }
    for entry in entries.iter().rev() {
        println!("{}  {:<16} {}", entry.recorded_at, entry.kind, entry.event);
    }
    Ok(())
}
