use clap::{ArgAction, Parser, Subcommand};
use prayermute_core::Settings;
use tracing_subscriber::EnvFilter;

mod commands;
mod device;
mod host;

#[derive(Parser)]
#[command(name = "prayermute", version, about = "Silence the device around prayer times")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enable auto-mute and schedule today's windows
    Enable,
    /// Disable auto-mute, cancel triggers and restore audio
    Disable,
    /// Search, browse and select the location
    Location {
        #[command(subcommand)]
        action: commands::location::LocationAction,
    },
    /// Print today's status as JSON
    Status,
    /// Show or change per-prayer mute offsets
    Offsets {
        #[command(subcommand)]
        action: commands::offsets::OffsetsAction,
    },
    /// Mute mode and network preferences
    Prefs {
        #[command(subcommand)]
        action: commands::prefs::PrefsAction,
    },
    /// Host settings management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Show the mute windows planned from the cached times
    Plan {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the event journal
    History {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect or change the simulated audio device
    Device {
        #[command(subcommand)]
        action: commands::device::DeviceAction,
    },
    /// Re-arm triggers after a restart
    Boot,
    /// Fire due triggers and the due retry job (run every minute)
    Tick,
    /// Fire the trigger pending in a slot now
    Fire {
        /// Slot index (0-11 prayers, 12 daily refresh)
        slot: u8,
    },
}

fn init_tracing(verbose: u8, settings: &Settings) {
    let level = match verbose {
        0 => settings.log.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(format!("prayermute={level},prayermute_core={level},warn"))
            }),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let settings = Settings::load_or_default();
    init_tracing(cli.verbose, &settings);

    let result = match cli.command {
        Commands::Enable => commands::lifecycle::enable(settings).await,
        Commands::Disable => commands::lifecycle::disable(settings),
        Commands::Location { action } => commands::location::run(action, settings).await,
        Commands::Status => commands::status::status(settings),
        Commands::Offsets { action } => commands::offsets::run(action, settings).await,
        Commands::Prefs { action } => commands::prefs::run(action, settings),
        Commands::Config { action } => commands::config::run(action),
        Commands::Plan { json } => commands::status::plan(settings, json),
        Commands::History { limit, json } => commands::history::run(settings, limit, json),
        Commands::Device { action } => commands::device::run(action, settings),
        Commands::Boot => commands::lifecycle::boot(settings).await,
        Commands::Tick => commands::lifecycle::tick(settings).await,
        Commands::Fire { slot } => commands::lifecycle::fire(settings, slot).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
